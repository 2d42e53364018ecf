//! Domain enumerations with lossless string round-trips.
//!
//! Every enum renders to a canonical string (the value used on the wire and
//! in persisted state) and parses back from exactly that string. Unknown
//! strings produce an [`EnumParseError`] naming the enumeration, never a
//! silent default.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure to map a string onto an enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a known {enumeration} value")]
pub struct EnumParseError {
    /// Name of the enumeration that was being parsed.
    pub enumeration: &'static str,
    /// The string that failed to parse.
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Canonical string representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = EnumParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(EnumParseError {
                        enumeration: stringify!($name),
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(
    /// Order side. Short-sale variants validate like `Sell` and match on the
    /// sell side of the book.
    Side {
        Buy => "Buy",
        Sell => "Sell",
        SellShort => "SellShort",
        SellShortExempt => "SellShortExempt",
    }
);

impl Side {
    /// Whether the side rests on (and aggresses from) the buy side.
    #[must_use]
    pub const fn is_buy(self) -> bool {
        matches!(self, Side::Buy)
    }
}

string_enum!(
    /// Order type.
    OrderType {
        Limit => "Limit",
        Market => "Market",
    }
);

string_enum!(
    /// Order time-in-force.
    TimeInForce {
        Day => "Day",
        ImmediateOrCancel => "ImmediateOrCancel",
        FillOrKill => "FillOrKill",
        GoodTillDate => "GoodTillDate",
        GoodTillCancel => "GoodTillCancel",
    }
);

impl TimeInForce {
    /// Whether orders with this time-in-force may rest in the book.
    #[must_use]
    pub const fn may_rest(self) -> bool {
        !matches!(self, TimeInForce::ImmediateOrCancel | TimeInForce::FillOrKill)
    }
}

string_enum!(
    /// Lifecycle status of an order as reported to clients. Only `New`,
    /// `PartiallyFilled` and `Modified` describe resting orders; the rest
    /// are terminal report statuses.
    OrderStatus {
        New => "New",
        PartiallyFilled => "PartiallyFilled",
        Modified => "Modified",
        Filled => "Filled",
        Cancelled => "Cancelled",
        Rejected => "Rejected",
    }
);

string_enum!(
    /// Trading phase of an instrument.
    TradingPhase {
        Open => "Open",
        Closed => "Closed",
        PostTrading => "PostTrading",
        OpeningAuction => "OpeningAuction",
        IntradayAuction => "IntradayAuction",
        ClosingAuction => "ClosingAuction",
    }
);

string_enum!(
    /// Trading status overlaying the phase.
    TradingStatus {
        Halt => "Halt",
        Resume => "Resume",
    }
);

string_enum!(
    /// Market-data entry type a subscription may request.
    MdEntryType {
        Bid => "Bid",
        Offer => "Offer",
        Trade => "Trade",
        LowPrice => "LowPrice",
        MidPrice => "MidPrice",
        HighPrice => "HighPrice",
    }
);

string_enum!(
    /// Action attached to an incremental market-data entry.
    MdEntryAction {
        New => "New",
        Change => "Change",
        Delete => "Delete",
    }
);

string_enum!(
    /// How a market-data subscription wants to be served.
    MdUpdateMode {
        Snapshot => "Snapshot",
        Incremental => "Incremental",
        SnapshotPlusUpdates => "SnapshotPlusUpdates",
    }
);

string_enum!(
    /// Subscription action carried on market-data and security-status
    /// requests.
    MdSubscriptionAction {
        Subscribe => "Subscribe",
        Unsubscribe => "Unsubscribe",
        Snapshot => "Snapshot",
    }
);

string_enum!(
    /// Reason attached to a market-data reject.
    MdRejectReason {
        UnknownSymbol => "UnknownSymbol",
        DuplicateMdReqId => "DuplicateMdReqId",
    }
);

string_enum!(
    /// Security type of an instrument.
    SecurityType {
        CommonStock => "CommonStock",
        Future => "Future",
        Option => "Option",
        Bond => "Bond",
        Index => "Index",
        FxSpot => "FxSpot",
    }
);

string_enum!(
    /// Source qualifying an alternative security identifier.
    SecurityIdSource {
        Cusip => "CUSIP",
        Sedol => "SEDOL",
        Isin => "ISIN",
        Ric => "RIC",
        ExchangeSymbol => "ExchangeSymbol",
        BloombergSymbol => "BloombergSymbol",
    }
);

string_enum!(
    /// Role of a party attached to an order or instrument.
    PartyRole {
        ExecutingFirm => "ExecutingFirm",
        ClearingFirm => "ClearingFirm",
        ClientId => "ClientID",
        InvestorId => "InvestorID",
        OrderOriginationFirm => "OrderOriginationFirm",
        LiquidityProvider => "LiquidityProvider",
    }
);

string_enum!(
    /// Source qualifying a party identifier.
    PartyIdSource {
        Bic => "BIC",
        Proprietary => "Proprietary",
        IsoCountryCode => "ISOCountryCode",
    }
);

string_enum!(
    /// Reason attached to a business-level reject.
    BusinessRejectReason {
        Other => "Other",
        UnknownId => "UnknownID",
        UnknownSecurity => "UnknownSecurity",
        UnsupportedMessageType => "UnsupportedMessageType",
    }
);

string_enum!(
    /// Message kind a business reject refers to.
    RejectedMessageType {
        OrderPlacement => "OrderPlacement",
        OrderModification => "OrderModification",
        OrderCancellation => "OrderCancellation",
        MarketDataRequest => "MarketDataRequest",
        SecurityStatusRequest => "SecurityStatusRequest",
        InstrumentStateRequest => "InstrumentStateRequest",
    }
);
