//! Shared test helpers for licence tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use licence::{Signer, Verifier};

pub const ISSUER_A_KEY: &str = include_str!("../fixtures/issuer_a.key");
pub const ISSUER_A_PUB: &str = include_str!("../fixtures/issuer_a.pub");
pub const ISSUER_B_KEY: &str = include_str!("../fixtures/issuer_b.key");
pub const ISSUER_B_PUB: &str = include_str!("../fixtures/issuer_b.pub");

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

pub fn signer_a() -> Signer {
    Signer::from_hex(ISSUER_A_KEY).unwrap()
}

pub fn signer_b() -> Signer {
    Signer::from_hex(ISSUER_B_KEY).unwrap()
}

pub fn verifier_a() -> Verifier {
    Verifier::from_hex(ISSUER_A_PUB).unwrap()
}

pub fn verifier_b() -> Verifier {
    Verifier::from_hex(ISSUER_B_PUB).unwrap()
}

/// Start of the 2024 licence year.
pub fn start_2024() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Last second of the 2024 licence year.
pub fn end_2024() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()
}
