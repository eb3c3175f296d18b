//! # polycomp-sync
//!
//! Client-side synchronization layer for a Monopoly-style companion app.
//!
//! The game server owns every balance, position and deed. This crate keeps
//! one live event stream per game, turns pushed events into cache
//! invalidations and UI effects, derives the bank balance from the
//! transaction log, and wraps the REST endpoints that perform every
//! mutation. Nothing is committed locally ahead of the server.
//!
//! ## Architecture
//!
//! ```text
//! Game server (REST, WebSocket)
//!     │
//!     ├── ApiClient (rest/) ◄── SessionContext (session)
//!     ├── SyncManager / GameSync (sync/)
//!     │       └── EventDispatcher ── invalidations ──► QueryCache (cache/)
//!     │
//!     ├── GameActions (service/)  REST call, then invalidate
//!     ├── NotificationCoordinator (notify/)
//!     │
//!     ├── UpdateBus (sync/) ──► views
//!     │
//!     └── Domain model, ledger fold, board, rule hints (domain/)
//! ```

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod rest;
pub mod service;
pub mod session;
pub mod sync;
