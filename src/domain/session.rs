//! Client session handles used to route replies.

use crate::domain::attributes::{BeginString, ClientSubId, SenderCompId, TargetCompId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A client trading session established over FIX.
///
/// Two FIX sessions are the same session iff `begin_string`,
/// `sender_comp_id` and `target_comp_id` all match. The optional
/// `client_sub_id` is preserved so replies can be routed to the right
/// sub-identity, but it never participates in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixSession {
    pub begin_string: BeginString,
    pub sender_comp_id: SenderCompId,
    pub target_comp_id: TargetCompId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub client_sub_id: Option<ClientSubId>,
}

impl FixSession {
    #[must_use]
    pub fn new(
        begin_string: BeginString,
        sender_comp_id: SenderCompId,
        target_comp_id: TargetCompId,
    ) -> Self {
        Self { begin_string, sender_comp_id, target_comp_id, client_sub_id: None }
    }

    #[must_use]
    pub fn with_client_sub_id(mut self, client_sub_id: ClientSubId) -> Self {
        self.client_sub_id = Some(client_sub_id);
        self
    }
}

impl PartialEq for FixSession {
    fn eq(&self, other: &Self) -> bool {
        self.begin_string == other.begin_string
            && self.sender_comp_id == other.sender_comp_id
            && self.target_comp_id == other.target_comp_id
    }
}

impl Eq for FixSession {}

impl Hash for FixSession {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.begin_string.hash(state);
        self.sender_comp_id.hash(state);
        self.target_comp_id.hash(state);
    }
}

impl fmt::Display for FixSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}",
            self.begin_string, self.sender_comp_id, self.target_comp_id
        )
    }
}

/// An opaque handle identifying the originator of a request.
///
/// The generator variant represents the synthetic order generator; all
/// generator sessions compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    Fix(FixSession),
    Generator,
}

impl Session {
    /// Convenience constructor for a FIX session without a sub-identity.
    #[must_use]
    pub fn fix(
        begin_string: impl Into<BeginString>,
        sender_comp_id: impl Into<SenderCompId>,
        target_comp_id: impl Into<TargetCompId>,
    ) -> Self {
        Session::Fix(FixSession::new(
            begin_string.into(),
            sender_comp_id.into(),
            target_comp_id.into(),
        ))
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Session::Fix(session) => write!(f, "fix({session})"),
            Session::Generator => f.write_str("generator"),
        }
    }
}
