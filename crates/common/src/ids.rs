//! Typed identifiers.
//!
//! Every persisted row is keyed by a `BIGSERIAL`. Wrapping the raw `i64`
//! keeps a branch id from being passed where a product id is expected.

use serde::{Deserialize, Serialize};

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw database key.
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Identifiers are positive; zero and negatives never name a row.
            pub const fn is_valid(&self) -> bool {
                self.0 >= 1
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

integer_id!(
    /// Identifier of a purchased line item.
    LineItemId
);
integer_id!(
    /// Identifier of an order aggregate (one checkout).
    AggregateId
);
integer_id!(
    /// Identifier of a purchasing user.
    UserId
);
integer_id!(
    /// Identifier of a branch (physical store location).
    BranchId
);
integer_id!(
    /// Identifier of an operator (admin) account.
    OperatorId
);
integer_id!(ProductId);
integer_id!(PaymentTypeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_ids_are_valid() {
        assert!(BranchId::new(1).is_valid());
        assert!(!BranchId::new(0).is_valid());
        assert!(!ProductId::new(-4).is_valid());
    }

    #[test]
    fn ids_serialize_as_bare_integers() {
        let json = serde_json::to_string(&AggregateId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: OperatorId = serde_json::from_str("7").unwrap();
        assert_eq!(id, OperatorId::new(7));
    }

    #[test]
    fn display_prints_raw_value() {
        assert_eq!(UserId::new(19).to_string(), "19");
    }
}
