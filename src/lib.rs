//! Auction data normalizer for the Doma AI auto-bidder.
//!
//! The `doma-auctions` binary serves [`api::routes::router`]; the
//! `dashboard` binary consumes it through [`hooks`].

pub mod api;
pub mod config;
pub mod error;
pub mod hooks;
pub mod normalizer;
pub mod types;
pub mod upstream;
pub mod valuation;
