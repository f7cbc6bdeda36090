//! Change the hardware (MAC) address of a network interface on macOS,
//! Linux and Windows through each system's own configuration tools.
//!
//! [`session::Spoofer`] is the entry point: it pairs a
//! [`platform::PlatformAdapter`] for the running OS with a
//! [`ledger::ChangeLedger`] that remembers original addresses and logs
//! every change.

pub mod address;
pub mod cli;
pub mod error;
pub mod ledger;
pub mod platform;
pub mod prompt;
pub mod session;

pub use error::{Result, SpoofError};
