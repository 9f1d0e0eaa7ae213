//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of a finalized order.
///
/// Status transitions:
/// ```text
/// Pending ──► Preparing ──► Ready ──► Delivered
///    │            │           │
///    └────────────┴───────────┴──► Cancelled
/// ```
/// Forward skips are allowed (Pending straight to Delivered, say); moving
/// backwards is not. Cancelled is only reached by removing the order.
///
/// Persisted data written by older versions uses Spanish status names; those
/// are accepted on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order placed, not yet worked on.
    #[default]
    #[serde(alias = "pendiente")]
    Pending,

    /// Order is being put together.
    #[serde(alias = "preparando")]
    Preparing,

    /// Order is packed and waiting for pickup or delivery.
    #[serde(alias = "listo")]
    Ready,

    /// Order handed to the customer (terminal state).
    #[serde(alias = "entregado")]
    Delivered,

    /// Order was withdrawn and its stock released (terminal state).
    #[serde(alias = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    /// Statuses that keep an order in the pending queue.
    pub const OPEN: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
    ];

    /// Returns true while the order is still in the pending queue.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position along the fulfilment path. Cancelled sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Preparing => Some(1),
            OrderStatus::Ready => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if an order in this status may move to `next`.
    ///
    /// Staying in the same open status is allowed (it updates notes), as is
    /// re-delivering a delivered order.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (*self, next) {
            (OrderStatus::Delivered, OrderStatus::Delivered) => true,
            (current, OrderStatus::Cancelled) => current.is_open(),
            (current, next) if current.is_open() => match (current.rank(), next.rank()) {
                (Some(from), Some(to)) => to >= from,
                _ => false,
            },
            _ => false,
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendiente" => Ok(OrderStatus::Pending),
            "preparing" | "preparando" => Ok(OrderStatus::Preparing),
            "ready" | "listo" => Ok(OrderStatus::Ready),
            "delivered" | "entregado" => Ok(OrderStatus::Delivered),
            "cancelled" | "cancelado" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}
