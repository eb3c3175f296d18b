//! Service layer: game mutations with cache upkeep.
//!
//! [`GameActions`] calls the REST client and, once the server has accepted
//! a change, marks the affected views in the [`crate::cache::QueryCache`]
//! stale.

pub mod game_actions;

pub use game_actions::GameActions;
