//! Transport form of a licence.
//!
//! A licence travels as a single line of standard base64 wrapping a JSON
//! record. Unlike the canonical encoding, the record holds every field:
//! the signature (hex) and, for trial licences, the activation window, so
//! an activated licence can be stored and reloaded as is.
//!
//! Decoding checks structure only. The signature is left to `Verifier`.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::canonical::SecsNanos;
use crate::errors::{LicenceError, LicenceResult};
use crate::licence::{Licence, Validity, Window};

/// Record format version.
pub const RECORD_VERSION: u32 = 1;

/// Serialized licence.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LicenceRecord {
    version: u32,
    id: String,
    validity: ValidityRecord,
    max_count: u64,
    /// Hex-encoded RSA signature.
    signature: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum ValidityRecord {
    Fixed {
        window: Window,
    },
    Trial {
        run_period: SecsNanos,
        activation: Option<Window>,
    },
}

impl From<&Licence> for LicenceRecord {
    fn from(licence: &Licence) -> Self {
        let validity = match licence.validity() {
            Validity::Fixed(window) => ValidityRecord::Fixed { window: *window },
            Validity::Trial {
                run_period,
                activation,
            } => ValidityRecord::Trial {
                run_period: SecsNanos::from_duration(*run_period),
                activation: *activation,
            },
        };

        Self {
            version: RECORD_VERSION,
            id: licence.id().to_string(),
            validity,
            max_count: licence.max_count(),
            signature: hex::encode(licence.signature()),
        }
    }
}

impl TryFrom<LicenceRecord> for Licence {
    type Error = LicenceError;

    fn try_from(record: LicenceRecord) -> Result<Self, Self::Error> {
        if record.version != RECORD_VERSION {
            return Err(LicenceError::DecodeError(format!(
                "unsupported record version {}",
                record.version
            )));
        }

        let validity = match record.validity {
            ValidityRecord::Fixed { window } => Validity::Fixed(checked_window(window)?),
            ValidityRecord::Trial {
                run_period,
                activation,
            } => {
                let run_period = run_period.to_duration().ok_or_else(|| {
                    LicenceError::DecodeError("run period out of range".to_string())
                })?;
                trial_validity(run_period, activation.map(checked_window).transpose()?)?
            }
        };

        let signature = hex::decode(&record.signature)
            .map_err(|e| LicenceError::DecodeError(format!("invalid signature hex: {e}")))?;

        Ok(Licence::from_parts(
            record.id,
            validity,
            record.max_count,
            signature,
        ))
    }
}

/// Re-run the window constructor on deserialized bounds.
fn checked_window(window: Window) -> LicenceResult<Window> {
    Window::new(window.valid_from, window.valid_until)
        .map_err(|e| LicenceError::DecodeError(e.to_string()))
}

/// Rebuild a trial validity, requiring an activation window to span
/// exactly the run period.
fn trial_validity(run_period: Duration, activation: Option<Window>) -> LicenceResult<Validity> {
    if run_period <= Duration::zero() {
        return Err(LicenceError::DecodeError(format!(
            "run period must be positive, got {run_period}"
        )));
    }

    if let Some(window) = activation {
        if window.valid_until - window.valid_from != run_period {
            return Err(LicenceError::DecodeError(
                "activation window does not match run period".to_string(),
            ));
        }
    }

    Ok(Validity::Trial {
        run_period,
        activation,
    })
}

/// Encode the whole licence as a single line of base64.
pub fn marshal(licence: &Licence) -> LicenceResult<String> {
    let json = serde_json::to_vec(&LicenceRecord::from(licence))
        .map_err(|e| LicenceError::EncodingError(format!("failed to serialize licence: {e}")))?;
    Ok(B64.encode(json))
}

/// Decode a licence produced by [`marshal`].
pub fn unmarshal(text: &str) -> LicenceResult<Licence> {
    let bytes = B64
        .decode(text.trim())
        .map_err(|e| LicenceError::DecodeError(format!("base64 decode failed: {e}")))?;

    let record: LicenceRecord = serde_json::from_slice(&bytes)
        .map_err(|e| LicenceError::DecodeError(format!("failed to deserialize licence: {e}")))?;

    Licence::try_from(record)
}

impl Licence {
    /// The transport string for this licence.
    pub fn to_transport(&self) -> LicenceResult<String> {
        marshal(self)
    }
}

impl FromStr for Licence {
    type Err = LicenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        unmarshal(s)
    }
}
