//! Order book error types.

use crate::domain::{OrderId, Quantity};
use std::fmt;

/// Errors produced by order book operations.
///
/// These never cross the engine's public boundary directly; the engine maps
/// each of them onto a typed reject notification with a stable text.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BookError {
    /// The targeted order is not present in the book.
    OrderNotFound(OrderId),

    /// A modification that changes nothing about the resting order.
    NoEffect {
        /// The order that was targeted.
        order_id: OrderId,
    },

    /// A modification tried to shrink the total quantity to or below the
    /// quantity already executed.
    UnderflowExecuted {
        /// The order that was targeted.
        order_id: OrderId,
        /// The requested new total quantity.
        requested_quantity: Quantity,
        /// The quantity already executed.
        executed_quantity: Quantity,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::OrderNotFound(order_id) => {
                write!(f, "order {order_id} is not found in the order book")
            }
            BookError::NoEffect { order_id } => {
                write!(f, "modification of order {order_id} has no effect")
            }
            BookError::UnderflowExecuted { order_id, requested_quantity, executed_quantity } => {
                write!(
                    f,
                    "modification of order {order_id} requests total quantity \
                     {requested_quantity} not above the executed quantity {executed_quantity}"
                )
            }
        }
    }
}

impl std::error::Error for BookError {}
