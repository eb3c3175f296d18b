//! Type-safe entity identifiers.
//!
//! Every server entity is keyed by a UUID. Each kind gets its own newtype so
//! a participant id can never be passed where a user id is expected, which
//! matters here because the server mixes both in the same payloads (turn
//! order is by user, transactions are by participant).

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifier of a game session. Scopes every cache key and the event
    /// stream URL.
    GameId
);
uuid_id!(
    /// Identifier of a registered user account.
    UserId
);
uuid_id!(
    /// Identifier of a user's seat in one game. Transactions and trades
    /// reference participants, not users.
    ParticipantId
);
uuid_id!(
    /// Identifier of a ledger transaction.
    TransactionId
);
uuid_id!(
    /// Identifier of a dice roll.
    RollId
);
uuid_id!(
    /// Identifier of a static property definition.
    PropertyId
);
uuid_id!(
    /// Identifier of an auction.
    AuctionId
);
uuid_id!(
    /// Identifier of a trade offer.
    TradeId
);
uuid_id!(
    /// Identifier of a card definition.
    CardId
);
uuid_id!(
    /// Identifier of an owned card row in a participant's inventory.
    InventoryId
);
