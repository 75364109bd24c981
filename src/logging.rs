//! Structured logging for licence operations.
//!
//! The library only emits `tracing` events. Binaries call [`init_logging`]
//! once to install a subscriber that writes to stderr, keeping stdout free
//! for the licence itself.

use std::str::FromStr;

use tracing::{info, info_span, warn, Level};

use crate::config::LoggingConfig;
use crate::errors::{LicenceError, LicenceResult};

/// Licence lifecycle event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenceEvent {
    /// Licence was created and signed by an issuer
    Issued,
    /// Signature and validity window checked out
    Verified,
    /// Trial licence window was fixed from the current time
    Activated,
    /// Signature did not match the licence or the public key
    SignatureRejected,
    /// Licence is authentic but not valid at the requested time
    WindowRejected,
}

impl std::fmt::Display for LicenceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LicenceEvent::Issued => "issued",
            LicenceEvent::Verified => "verified",
            LicenceEvent::Activated => "activated",
            LicenceEvent::SignatureRejected => "signature_rejected",
            LicenceEvent::WindowRejected => "window_rejected",
        };
        write!(f, "{}", s)
    }
}

impl LicenceEvent {
    /// Returns true for events that report a failed verification attempt.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LicenceEvent::SignatureRejected | LicenceEvent::WindowRejected
        )
    }
}

/// Log a licence lifecycle event.
///
/// Rejections are logged at `warn`, everything else at `info`.
pub fn log_licence_event(event: LicenceEvent, licence_id: &str, details: Option<&str>) {
    let span = info_span!(
        "licence_event",
        event = %event,
        licence_id = %licence_id,
    );
    let _enter = span.enter();

    if event.is_rejection() {
        if let Some(d) = details {
            warn!(reason = %d, "Licence event occurred");
        } else {
            warn!("Licence event occurred");
        }
    } else if let Some(d) = details {
        info!(details = %d, "Licence event occurred");
    } else {
        info!("Licence event occurred");
    }
}

/// Parse a configured log level.
pub fn parse_level(level: &str) -> LicenceResult<Level> {
    Level::from_str(level.trim()).map_err(|_| {
        LicenceError::ConfigError(format!(
            "logging.level must be one of: trace, debug, info, warn, error. Got '{level}'"
        ))
    })
}

/// Install the global stderr subscriber described by `config`.
///
/// Does nothing when logging is disabled. Fails if a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> LicenceResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let level = parse_level(&config.level)?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| LicenceError::ConfigError(format!("failed to install logger: {e}")))
}
