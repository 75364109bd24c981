//! Canonical encoding of the signed licence fields.
//!
//! [`SignableFields`] holds exactly the fields a signature covers. Signer
//! and verifier both build it from a licence and hash its encoding, so a
//! field can only be signed if it is listed here, and the signature itself
//! cannot be.
//!
//! Encoding (all integers big-endian):
//!
//! ```text
//! "netviper-licence:signable:v1\0"
//! u32 id length || id bytes
//! u8  mode (0x01 fixed, 0x02 trial)
//! i64 valid_from secs  || u32 valid_from nanos
//! i64 valid_until secs || u32 valid_until nanos
//! i64 run_period secs  || u32 run_period nanos
//! u64 max_count
//! ```
//!
//! Fixed licences encode a zero run period. Trial licences encode zero
//! timestamps whether or not they have been activated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{LicenceError, LicenceResult};
use crate::licence::{Licence, Validity};

/// Domain separation prefix for signed licence bytes.
pub const SIGNABLE_DOMAIN: &[u8] = b"netviper-licence:signable:v1\0";

/// Mode tag for fixed-window licences.
pub const MODE_FIXED: u8 = 0x01;

/// Mode tag for trial licences.
pub const MODE_TRIAL: u8 = 0x02;

/// SHA-256 digest length.
pub const DIGEST_LEN: usize = 32;

const NANOS_PER_SEC: i32 = 1_000_000_000;

/// A timestamp or duration split into whole seconds and sub-second nanos.
///
/// Seconds are floored, so `nanos` is always below one second and every
/// value has exactly one representation. Ordering follows the value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SecsNanos {
    pub secs: i64,
    pub nanos: u32,
}

impl SecsNanos {
    /// The sentinel used for fields that do not apply to a licence's mode.
    pub const ZERO: SecsNanos = SecsNanos { secs: 0, nanos: 0 };

    pub fn from_datetime(t: DateTime<Utc>) -> Self {
        Self {
            secs: t.timestamp(),
            nanos: t.timestamp_subsec_nanos(),
        }
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.secs, self.nanos)
    }

    pub fn from_duration(d: Duration) -> Self {
        let secs = d.num_seconds();
        let nanos = d.subsec_nanos();
        if nanos < 0 {
            Self {
                secs: secs - 1,
                nanos: (nanos + NANOS_PER_SEC).unsigned_abs(),
            }
        } else {
            Self {
                secs,
                nanos: nanos.unsigned_abs(),
            }
        }
    }

    pub fn to_duration(self) -> Option<Duration> {
        Duration::new(self.secs, self.nanos)
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.secs.to_be_bytes());
        out.extend_from_slice(&self.nanos.to_be_bytes());
    }
}

/// The closed set of fields covered by a licence signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignableFields {
    pub id: String,
    pub mode: u8,
    pub valid_from: SecsNanos,
    pub valid_until: SecsNanos,
    pub run_period: SecsNanos,
    pub max_count: u64,
}

impl From<&Licence> for SignableFields {
    fn from(licence: &Licence) -> Self {
        let (mode, valid_from, valid_until, run_period) = match licence.validity() {
            Validity::Fixed(window) => (
                MODE_FIXED,
                SecsNanos::from_datetime(window.valid_from),
                SecsNanos::from_datetime(window.valid_until),
                SecsNanos::ZERO,
            ),
            // The activation window is set after signing and is left out.
            Validity::Trial { run_period, .. } => (
                MODE_TRIAL,
                SecsNanos::ZERO,
                SecsNanos::ZERO,
                SecsNanos::from_duration(*run_period),
            ),
        };

        Self {
            id: licence.id().to_string(),
            mode,
            valid_from,
            valid_until,
            run_period,
            max_count: licence.max_count(),
        }
    }
}

impl SignableFields {
    /// Refuse terms no licence may be signed with: an inverted window or a
    /// trial without a positive run period.
    fn check_terms(&self) -> LicenceResult<()> {
        match self.mode {
            MODE_FIXED if self.valid_from > self.valid_until => Err(LicenceError::EncodingError(
                "valid_from is after valid_until".to_string(),
            )),
            MODE_TRIAL if self.run_period <= SecsNanos::ZERO => Err(LicenceError::EncodingError(
                "trial run period must be positive".to_string(),
            )),
            MODE_FIXED | MODE_TRIAL => Ok(()),
            other => Err(LicenceError::EncodingError(format!(
                "unknown licence mode {other:#04x}"
            ))),
        }
    }

    /// Deterministic bytes for signing and verification.
    ///
    /// Fails with `EncodingError` for terms [`Licence`] constructors refuse.
    pub fn encode(&self) -> LicenceResult<Vec<u8>> {
        self.check_terms()?;
        let id_len = u32::try_from(self.id.len()).map_err(|_| {
            LicenceError::EncodingError(format!("licence id too long ({} bytes)", self.id.len()))
        })?;

        let mut out =
            Vec::with_capacity(SIGNABLE_DOMAIN.len() + 4 + self.id.len() + 1 + 3 * 12 + 8);
        out.extend_from_slice(SIGNABLE_DOMAIN);
        out.extend_from_slice(&id_len.to_be_bytes());
        out.extend_from_slice(self.id.as_bytes());
        out.push(self.mode);
        self.valid_from.write(&mut out);
        self.valid_until.write(&mut out);
        self.run_period.write(&mut out);
        out.extend_from_slice(&self.max_count.to_be_bytes());
        Ok(out)
    }

    /// SHA-256 over [`SignableFields::encode`].
    pub fn digest(&self) -> LicenceResult<[u8; DIGEST_LEN]> {
        Ok(digest(&self.encode()?))
    }
}

/// SHA-256 of already-encoded signable bytes.
pub fn digest(encoded: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(encoded).into()
}

/// Canonical bytes of a licence, signature excluded.
pub fn encode_licence(licence: &Licence) -> LicenceResult<Vec<u8>> {
    SignableFields::from(licence).encode()
}
