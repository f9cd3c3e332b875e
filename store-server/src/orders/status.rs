//! Order status state machine
//!
//! One explicit transition table shared by the customer and admin mutation
//! paths, so the lifecycle invariant is enforced centrally instead of ad hoc
//! per caller. `cancelled` has no outgoing transitions, which also rules out
//! double stock restoration: an order can enter `cancelled` exactly once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Shipping,
    Delivered,
    Cancelled,
}

/// Order payment status (on the order document itself)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl OrderStatus {
    /// The states this status may transition into
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Preparing, Cancelled],
            Confirmed => &[Preparing, Shipping, Cancelled],
            Preparing => &[Shipping, Cancelled],
            Shipping => &[Delivered],
            Delivered => &[],
            Cancelled => &[],
        }
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Whether the owning customer may still self-service cancel
    pub fn customer_cancellable(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;

    #[test]
    fn test_happy_path() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Shipping));
        assert!(Shipping.can_transition_to(Delivered));
    }

    #[test]
    fn test_cancellation_window() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Preparing.can_transition_to(Cancelled));
        assert!(!Shipping.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states() {
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        // re-cancelling is not a legal transition
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!Shipping.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Shipping));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_customer_cancellable() {
        assert!(Pending.customer_cancellable());
        assert!(Confirmed.customer_cancellable());
        assert!(!Preparing.customer_cancellable());
        assert!(!Shipping.customer_cancellable());
        assert!(!Cancelled.customer_cancellable());
    }

    #[test]
    fn test_serde_wire_format() {
        assert_eq!(serde_json::to_string(&Shipping).unwrap(), "\"shipping\"");
        let s: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(s, Cancelled);
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"paid\""
        );
    }
}
