use serde::{Deserialize, Serialize};

/// The resolution state of an order. There is no enforced transition
/// ordering; any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    InTransit,
    Delivered,
    Returned,
    Cancelled,
}

impl OrderStatus {
    /// Strictly parses a status name, accepting the canonical forms and
    /// the legacy spellings (`pending`, `in-transit`, `canceled`).
    /// Unrecognized names return `None`; query filters use this so that a
    /// garbage `?status=` reads as "no status filter" instead of silently
    /// filtering to in-transit orders.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "intransit" | "in-transit" | "in_transit" | "pending" => {
                Some(OrderStatus::InTransit)
            }
            "delivered" => Some(OrderStatus::Delivered),
            "returned" => Some(OrderStatus::Returned),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Normalizes a status string from a caller into the canonical set.
    ///
    /// Used at the ingestion boundary, where anything unrecognized maps to
    /// `InTransit` to match how unresolved orders enter the system.
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(OrderStatus::InTransit)
    }

    /// The canonical string form, used for persistence and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InTransit => "InTransit",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Returned => "Returned",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_legacy_strings() {
        assert_eq!(OrderStatus::normalize("delivered"), OrderStatus::Delivered);
        assert_eq!(OrderStatus::normalize("RETURNED"), OrderStatus::Returned);
        assert_eq!(OrderStatus::normalize("Cancelled"), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::normalize("pending"), OrderStatus::InTransit);
        assert_eq!(OrderStatus::normalize("in-transit"), OrderStatus::InTransit);
    }

    #[test]
    fn unknown_strings_fall_back_to_in_transit() {
        assert_eq!(OrderStatus::normalize(""), OrderStatus::InTransit);
        assert_eq!(OrderStatus::normalize("shipped?"), OrderStatus::InTransit);
    }

    #[test]
    fn strict_parsing_rejects_unknown_names() {
        assert_eq!(OrderStatus::parse("garbage"), None);
        assert_eq!(OrderStatus::parse(""), None);
        assert_eq!(OrderStatus::parse("pending"), Some(OrderStatus::InTransit));
        assert_eq!(OrderStatus::parse("Delivered"), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::parse("canceled"), Some(OrderStatus::Cancelled));
    }

    #[test]
    fn round_trips_canonical_form() {
        for status in [
            OrderStatus::InTransit,
            OrderStatus::Delivered,
            OrderStatus::Returned,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::normalize(status.as_str()), status);
        }
    }
}
