//! Shared helpers for the `flightdeck` command line tool.

pub mod client;
pub mod replay;
pub mod source;

pub use client::FlightdeckClient;
