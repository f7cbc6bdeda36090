use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

use super::MacAddress;
use crate::error::{Result, SpoofError};

/// First octets with the locally administered bit set and the multicast bit clear.
pub const LOCAL_UNICAST_PREFIXES: [u8; 4] = [0x02, 0x06, 0x0A, 0x0E];

fn mac_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // One separator per string: all colons or all hyphens.
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?:[0-9A-Fa-f]{2}:){5}|(?:[0-9A-Fa-f]{2}-){5})[0-9A-Fa-f]{2}$")
            .expect("static MAC pattern compiles")
    })
}

/// Returns true for six two-digit hex groups separated uniformly by `:` or `-`.
pub fn validate(text: &str) -> bool {
    mac_pattern().is_match(text)
}

/// Parses `text` into its canonical form (colon separated, uppercase).
pub fn normalize(text: &str) -> Result<MacAddress> {
    if !validate(text) {
        return Err(SpoofError::InvalidFormat(text.to_string()));
    }

    let mut octets = [0u8; 6];
    for (slot, group) in octets.iter_mut().zip(text.split(|c: char| c == ':' || c == '-')) {
        *slot = u8::from_str_radix(group, 16)
            .map_err(|_| SpoofError::InvalidFormat(text.to_string()))?;
    }
    Ok(MacAddress::new(octets))
}

/// Random locally administered unicast address from the thread RNG.
pub fn generate() -> MacAddress {
    generate_with(&mut rand::thread_rng())
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> MacAddress {
    let mut octets = [0u8; 6];
    octets[0] = LOCAL_UNICAST_PREFIXES[rng.gen_range(0..LOCAL_UNICAST_PREFIXES.len())];
    rng.fill(&mut octets[1..]);
    MacAddress::new(octets)
}
