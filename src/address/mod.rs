//! MAC address handling
//!
//! Parsing, canonical formatting and random generation of hardware
//! addresses.

pub mod codec;
pub mod mac;

pub use codec::{generate, normalize, validate};
pub use mac::MacAddress;
