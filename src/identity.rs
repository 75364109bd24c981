//! Licence identity allocation.
//!
//! Every licence gets a random UUID (version 4) drawn from the operating
//! system's entropy source. Nothing is persisted, so two issuers never need
//! to coordinate.

use rand::rngs::OsRng;
use rand::TryRngCore;
use uuid::{Builder, Uuid};

use crate::errors::{LicenceError, LicenceResult};

/// Number of random bytes behind an id.
const ID_BYTES: usize = 16;

/// Allocate a new licence id.
///
/// Fails only if the OS entropy source fails, in which case issuance must
/// not proceed.
pub fn new_id() -> LicenceResult<String> {
    let mut bytes = [0u8; ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| LicenceError::AllocationError(format!("entropy source failed: {e}")))?;

    let id = Builder::from_random_bytes(bytes).into_uuid();
    Ok(id.hyphenated().to_string())
}

/// Returns true if `id` has the shape produced by [`new_id`].
pub fn is_well_formed(id: &str) -> bool {
    Uuid::try_parse(id)
        .map(|u| u.get_version_num() == 4)
        .unwrap_or(false)
}
