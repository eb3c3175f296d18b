//! REST client for the game server.
//!
//! Every mutation in the app goes through here; the event stream only
//! tells the client that something changed. Endpoints are grouped by area:
//!
//! | Module      | Endpoints                                              |
//! |-------------|--------------------------------------------------------|
//! | `users`     | register, login, logout, profile, game lists           |
//! | `games`     | create, join, update, delete, leave, end turn, moves   |
//! | `economy`   | transactions, jackpot, dice, roulette, special dice    |
//! | `estate`    | properties, auctions, trades                           |
//! | `cards`     | draw, inventory, use, discard, market, special actions |

pub mod cards;
pub mod client;
pub mod economy;
pub mod estate;
pub mod games;
pub mod users;

pub use cards::SpecialAction;
pub use client::ApiClient;
pub use economy::{RollRequest, RouletteRecord, SpecialDiceRecord};
pub use estate::{PropertyAction, TradeProposal};
pub use games::GameUpdate;
pub use users::{ProfileUpdate, RegisterRequest};
