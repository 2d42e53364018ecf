//! Market-data subscriptions, snapshots and incremental updates.

use crate::book::{OrderBook, Trade};
use crate::domain::{
    InstrumentDescriptor, MarketPhase, MdEntryAction, MdEntryType, MdRejectReason, MdRequestId,
    MdSubscriptionAction, MdUpdateMode, Price, Quantity, RejectText, Session,
};
use crate::protocol::{
    ClientNotification, MarketDataEntry, MarketDataReject, MarketDataRequest, MarketDataSnapshot,
    MarketDataUpdate,
};
use bitflags::bitflags;
use std::collections::HashMap;
use tracing::debug;

bitflags! {
    /// The set of entry types a subscription asked for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MdEntryFlags: u8 {
        const BID        = 1 << 0;
        const OFFER      = 1 << 1;
        const TRADE      = 1 << 2;
        const LOW_PRICE  = 1 << 3;
        const MID_PRICE  = 1 << 4;
        const HIGH_PRICE = 1 << 5;
    }
}

impl MdEntryFlags {
    /// Collects request entry types into a flag set. An empty request list
    /// subscribes to everything.
    #[must_use]
    pub fn from_entry_types(entry_types: &[MdEntryType]) -> Self {
        if entry_types.is_empty() {
            return Self::all();
        }
        entry_types.iter().fold(Self::empty(), |flags, entry_type| {
            flags
                | match entry_type {
                    MdEntryType::Bid => Self::BID,
                    MdEntryType::Offer => Self::OFFER,
                    MdEntryType::Trade => Self::TRADE,
                    MdEntryType::LowPrice => Self::LOW_PRICE,
                    MdEntryType::MidPrice => Self::MID_PRICE,
                    MdEntryType::HighPrice => Self::HIGH_PRICE,
                }
        })
    }
}

/// Read-only view of the engine state a publication is computed from.
#[derive(Clone, Copy)]
pub struct MarketView<'a> {
    pub book: &'a OrderBook,
    pub phase: MarketPhase,
    pub last_trade: Option<&'a Trade>,
    pub low_price: Option<Price>,
    pub high_price: Option<Price>,
}

#[derive(Debug)]
struct Subscription {
    session: Session,
    request_id: MdRequestId,
    flags: MdEntryFlags,
    /// Requested depth; 0 means the full book.
    depth: usize,
    #[allow(dead_code)]
    mode: MdUpdateMode,
    last_bid: Vec<(Price, Quantity)>,
    last_offer: Vec<(Price, Quantity)>,
    last_mid: Option<Price>,
    last_low: Option<Price>,
    last_high: Option<Price>,
}

/// Per-engine market-data publisher.
///
/// Holds the subscriptions keyed by `(session, request id)` and computes
/// the per-subscription diff against the last published book view on every
/// mutation.
#[derive(Debug)]
pub struct MarketDataPublisher {
    instrument: InstrumentDescriptor,
    subscriptions: HashMap<(Session, MdRequestId), Subscription>,
}

impl MarketDataPublisher {
    #[must_use]
    pub fn new(instrument: InstrumentDescriptor) -> Self {
        Self { instrument, subscriptions: HashMap::new() }
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Handles a market-data request addressed to this engine.
    pub fn process(
        &mut self,
        request: &MarketDataRequest,
        view: MarketView<'_>,
        out: &mut Vec<ClientNotification>,
    ) {
        let Some(request_id) = request.request_id.clone() else {
            out.push(reject(request, None, "market data request id is missing"));
            return;
        };
        let Some(action) = request.action else {
            out.push(reject(request, None, "market data subscription action is missing"));
            return;
        };

        let flags = MdEntryFlags::from_entry_types(&request.entry_types);
        let depth = request.depth.unwrap_or(0) as usize;
        let key = (request.session.clone(), request_id.clone());

        match action {
            MdSubscriptionAction::Snapshot => {
                out.push(self.snapshot_reply(&request.session, &request_id, flags, depth, view));
            }
            MdSubscriptionAction::Subscribe => {
                if self.subscriptions.contains_key(&key) {
                    out.push(reject(
                        request,
                        Some(MdRejectReason::DuplicateMdReqId),
                        "market data request id is already in use",
                    ));
                    return;
                }

                out.push(self.snapshot_reply(&request.session, &request_id, flags, depth, view));

                let mode = request.update_mode.unwrap_or(MdUpdateMode::SnapshotPlusUpdates);
                if mode != MdUpdateMode::Snapshot {
                    let subscription = Subscription {
                        session: request.session.clone(),
                        request_id,
                        flags,
                        depth,
                        mode,
                        last_bid: depth_levels(view.book, true, depth),
                        last_offer: depth_levels(view.book, false, depth),
                        last_mid: mid_price(view.book),
                        last_low: view.low_price,
                        last_high: view.high_price,
                    };
                    debug!(session = %subscription.session, "installed market data subscription");
                    self.subscriptions.insert(key, subscription);
                }
            }
            MdSubscriptionAction::Unsubscribe => {
                if self.subscriptions.remove(&key).is_none() {
                    out.push(reject(
                        request,
                        None,
                        "no subscription found for the market data request id",
                    ));
                }
            }
        }
    }

    /// Publishes incremental updates after a book mutation.
    pub fn on_book_changed(&mut self, view: MarketView<'_>, out: &mut Vec<ClientNotification>) {
        for subscription in self.subscriptions.values_mut() {
            let mut entries = Vec::new();

            if subscription.flags.contains(MdEntryFlags::BID) {
                let current = depth_levels(view.book, true, subscription.depth);
                diff_levels(
                    MdEntryType::Bid,
                    &subscription.last_bid,
                    &current,
                    view.phase,
                    &mut entries,
                );
                subscription.last_bid = current;
            }
            if subscription.flags.contains(MdEntryFlags::OFFER) {
                let current = depth_levels(view.book, false, subscription.depth);
                diff_levels(
                    MdEntryType::Offer,
                    &subscription.last_offer,
                    &current,
                    view.phase,
                    &mut entries,
                );
                subscription.last_offer = current;
            }
            if subscription.flags.contains(MdEntryFlags::MID_PRICE) {
                let current = mid_price(view.book);
                diff_scalar(
                    MdEntryType::MidPrice,
                    subscription.last_mid,
                    current,
                    view.phase,
                    &mut entries,
                );
                subscription.last_mid = current;
            }

            if !entries.is_empty() {
                out.push(ClientNotification::MarketDataUpdate(MarketDataUpdate {
                    session: subscription.session.clone(),
                    request_id: Some(subscription.request_id.clone()),
                    entries,
                }));
            }
        }
    }

    /// Publishes a trade (and any low/high move it caused) to subscribers.
    pub fn on_trade(
        &mut self,
        trade: &Trade,
        low_price: Option<Price>,
        high_price: Option<Price>,
        phase: MarketPhase,
        out: &mut Vec<ClientNotification>,
    ) {
        for subscription in self.subscriptions.values_mut() {
            let mut entries = Vec::new();

            if subscription.flags.contains(MdEntryFlags::TRADE) {
                entries.push(MarketDataEntry {
                    entry_type: MdEntryType::Trade,
                    action: Some(MdEntryAction::New),
                    price: Some(trade.price),
                    quantity: Some(trade.quantity),
                    aggressor_side: Some(trade.aggressor_side),
                    time: Some(trade.time),
                    phase: Some(phase),
                });
            }
            if subscription.flags.contains(MdEntryFlags::LOW_PRICE) {
                diff_scalar(
                    MdEntryType::LowPrice,
                    subscription.last_low,
                    low_price,
                    phase,
                    &mut entries,
                );
                subscription.last_low = low_price;
            }
            if subscription.flags.contains(MdEntryFlags::HIGH_PRICE) {
                diff_scalar(
                    MdEntryType::HighPrice,
                    subscription.last_high,
                    high_price,
                    phase,
                    &mut entries,
                );
                subscription.last_high = high_price;
            }

            if !entries.is_empty() {
                out.push(ClientNotification::MarketDataUpdate(MarketDataUpdate {
                    session: subscription.session.clone(),
                    request_id: Some(subscription.request_id.clone()),
                    entries,
                }));
            }
        }
    }

    /// Drops every subscription belonging to the session.
    pub fn drop_session(&mut self, session: &Session) {
        self.subscriptions.retain(|(owner, _), _| owner != session);
    }

    fn snapshot_reply(
        &self,
        session: &Session,
        request_id: &MdRequestId,
        flags: MdEntryFlags,
        depth: usize,
        view: MarketView<'_>,
    ) -> ClientNotification {
        let mut entries = Vec::new();

        if flags.contains(MdEntryFlags::BID) {
            for (price, quantity) in depth_levels(view.book, true, depth) {
                entries.push(level_entry(MdEntryType::Bid, price, quantity, None, view.phase));
            }
        }
        if flags.contains(MdEntryFlags::OFFER) {
            for (price, quantity) in depth_levels(view.book, false, depth) {
                entries.push(level_entry(MdEntryType::Offer, price, quantity, None, view.phase));
            }
        }
        if flags.contains(MdEntryFlags::TRADE) {
            if let Some(trade) = view.last_trade {
                entries.push(MarketDataEntry {
                    entry_type: MdEntryType::Trade,
                    action: None,
                    price: Some(trade.price),
                    quantity: Some(trade.quantity),
                    aggressor_side: Some(trade.aggressor_side),
                    time: Some(trade.time),
                    phase: Some(view.phase),
                });
            }
        }
        if flags.contains(MdEntryFlags::LOW_PRICE) {
            if let Some(low) = view.low_price {
                entries.push(scalar_entry(MdEntryType::LowPrice, low, None, view.phase));
            }
        }
        if flags.contains(MdEntryFlags::MID_PRICE) {
            if let Some(mid) = mid_price(view.book) {
                entries.push(scalar_entry(MdEntryType::MidPrice, mid, None, view.phase));
            }
        }
        if flags.contains(MdEntryFlags::HIGH_PRICE) {
            if let Some(high) = view.high_price {
                entries.push(scalar_entry(MdEntryType::HighPrice, high, None, view.phase));
            }
        }

        ClientNotification::MarketDataSnapshot(MarketDataSnapshot {
            session: session.clone(),
            request_id: Some(request_id.clone()),
            instrument: self.instrument.clone(),
            entries,
        })
    }
}

fn reject(
    request: &MarketDataRequest,
    reason: Option<MdRejectReason>,
    text: &str,
) -> ClientNotification {
    ClientNotification::MarketDataReject(MarketDataReject {
        session: request.session.clone(),
        request_id: request.request_id.clone(),
        reject_reason: reason,
        reject_text: Some(RejectText::from(text)),
    })
}

fn depth_levels(book: &OrderBook, is_buy: bool, depth: usize) -> Vec<(Price, Quantity)> {
    let levels = book.levels(is_buy);
    if depth == 0 { levels.collect() } else { levels.take(depth).collect() }
}

fn mid_price(book: &OrderBook) -> Option<Price> {
    let (bid, _) = book.best(true)?;
    let (offer, _) = book.best(false)?;
    Some(Price::new((bid.value() + offer.value()) / 2.0))
}

fn level_entry(
    entry_type: MdEntryType,
    price: Price,
    quantity: Quantity,
    action: Option<MdEntryAction>,
    phase: MarketPhase,
) -> MarketDataEntry {
    MarketDataEntry {
        entry_type,
        action,
        price: Some(price),
        quantity: Some(quantity),
        aggressor_side: None,
        time: None,
        phase: Some(phase),
    }
}

fn scalar_entry(
    entry_type: MdEntryType,
    price: Price,
    action: Option<MdEntryAction>,
    phase: MarketPhase,
) -> MarketDataEntry {
    MarketDataEntry {
        entry_type,
        action,
        price: Some(price),
        quantity: None,
        aggressor_side: None,
        time: None,
        phase: Some(phase),
    }
}

/// Emits New/Change entries for the current levels and Delete entries for
/// levels that disappeared, in book order.
fn diff_levels(
    entry_type: MdEntryType,
    previous: &[(Price, Quantity)],
    current: &[(Price, Quantity)],
    phase: MarketPhase,
    entries: &mut Vec<MarketDataEntry>,
) {
    for (price, quantity) in current {
        match previous.iter().find(|(old_price, _)| old_price == price) {
            None => entries.push(level_entry(
                entry_type,
                *price,
                *quantity,
                Some(MdEntryAction::New),
                phase,
            )),
            Some((_, old_quantity)) if old_quantity != quantity => entries.push(level_entry(
                entry_type,
                *price,
                *quantity,
                Some(MdEntryAction::Change),
                phase,
            )),
            Some(_) => {}
        }
    }
    for (price, _) in previous {
        if !current.iter().any(|(new_price, _)| new_price == price) {
            let mut entry =
                level_entry(entry_type, *price, Quantity::ZERO, Some(MdEntryAction::Delete), phase);
            entry.quantity = None;
            entries.push(entry);
        }
    }
}

/// New/Change/Delete for a single scalar entry such as the mid price.
fn diff_scalar(
    entry_type: MdEntryType,
    previous: Option<Price>,
    current: Option<Price>,
    phase: MarketPhase,
    entries: &mut Vec<MarketDataEntry>,
) {
    match (previous, current) {
        (None, Some(price)) => {
            entries.push(scalar_entry(entry_type, price, Some(MdEntryAction::New), phase));
        }
        (Some(old), Some(new)) if old != new => {
            entries.push(scalar_entry(entry_type, new, Some(MdEntryAction::Change), phase));
        }
        (Some(old), None) => {
            entries.push(scalar_entry(entry_type, old, Some(MdEntryAction::Delete), phase));
        }
        _ => {}
    }
}
