//! sieveplay — a terminal playground that live-compiles Sieve mail filters
//! into Cloudflare Email Workers.

pub mod config;
pub mod controller;
pub mod demo;
pub mod jsfmt;
pub mod logging;
pub mod pipeline;
pub mod runs;
pub mod sieve;
pub mod state;
pub mod tui;
