//! Strongly-typed domain model: attributes, enumerations, instruments,
//! parties, sessions and the market phase.

pub mod attributes;
pub mod enums;
pub mod instrument;
pub mod market_phase;
pub mod party;
pub mod session;

pub use attributes::{
    BeginString, ClientOrderId, ClientSubId, Currency, ExecutionId, ExpireDate, ExpireTime,
    InstrumentId, MaxQuantity, MdRequestId, MinQuantity, OrderId, OrderTime, PartyId, Price,
    PriceTick, Quantity, QuantityTick, RejectText, SecurityExchange, SecurityId,
    SecurityStatusReqId, SenderCompId, ShortSaleExemptionReason, Symbol, TargetCompId,
};
pub use enums::{
    BusinessRejectReason, EnumParseError, MdEntryAction, MdEntryType, MdRejectReason,
    MdSubscriptionAction, MdUpdateMode, OrderStatus, OrderType, PartyIdSource, PartyRole,
    RejectedMessageType, SecurityIdSource, SecurityType, Side, TimeInForce, TradingPhase,
    TradingStatus,
};
pub use instrument::{Instrument, InstrumentDescriptor, SecurityIdentifiers};
pub use market_phase::MarketPhase;
pub use party::Party;
pub use session::{FixSession, Session};
