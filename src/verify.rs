//! Licence verification.
//!
//! The signature is always checked first. A licence that fails it never
//! reaches the temporal checks, so a forged window cannot influence the
//! outcome.
//!
//! Trial licences are activated by their first successful verification.
//! Activation fires once per licence value: later verifications check the
//! activated window like a fixed one. Callers that keep licences outside
//! memory should persist the licence after a successful verification (the
//! transport form carries the activation window) and must serialize
//! verification of a single trial licence themselves.

use chrono::{DateTime, Utc};
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256};
use tracing::debug;

use crate::canonical::{digest, SignableFields};
use crate::errors::{LicenceError, LicenceResult};
use crate::keys::decode_hex_key;
use crate::licence::Licence;
use crate::logging::{log_licence_event, LicenceEvent};

/// Verifies licences against an issuer's public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verifier {
    /// PKCS#1 `RSAPublicKey` DER.
    public_key: Vec<u8>,
}

impl Verifier {
    /// Wrap a PKCS#1 DER public key.
    ///
    /// The key is parsed when a signature is checked; a malformed key
    /// rejects every licence with `InvalidSignature`.
    pub fn from_pkcs1_der(der: &[u8]) -> Self {
        Self {
            public_key: der.to_vec(),
        }
    }

    /// Decode a hex-encoded PKCS#1 DER public key.
    pub fn from_hex(text: &str) -> LicenceResult<Self> {
        Ok(Self::from_pkcs1_der(&decode_hex_key(text)?))
    }

    /// Check only the signature, leaving the licence untouched.
    pub fn verify_signature(&self, licence: &Licence) -> LicenceResult<()> {
        let message = SignableFields::from(licence).encode()?;
        debug!(
            licence_id = %licence.id(),
            digest = %hex::encode(digest(&message)),
            "Checking licence signature"
        );

        UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, &self.public_key)
            .verify(&message, licence.signature())
            .map_err(|_| {
                log_licence_event(LicenceEvent::SignatureRejected, licence.id(), None);
                LicenceError::InvalidSignature
            })
    }

    /// Check the signature, then the validity window at `now`.
    ///
    /// A trial licence that has not been activated is activated here and
    /// always passes the temporal check.
    pub fn verify(&self, licence: &mut Licence, now: DateTime<Utc>) -> LicenceResult<()> {
        self.verify_signature(licence)?;

        if licence.activate_in_place(now)? {
            log_licence_event(LicenceEvent::Verified, licence.id(), Some("trial activated"));
            return Ok(());
        }

        let window = licence.window().ok_or_else(|| {
            LicenceError::InvalidTerms("trial licence has no activation window".to_string())
        })?;

        if let Err(e) = window.enforce(now) {
            log_licence_event(
                LicenceEvent::WindowRejected,
                licence.id(),
                Some(&format!("checked at {now}")),
            );
            return Err(e);
        }

        log_licence_event(LicenceEvent::Verified, licence.id(), None);
        Ok(())
    }

    /// [`Verifier::verify`] at the current time.
    pub fn verify_now(&self, licence: &mut Licence) -> LicenceResult<()> {
        self.verify(licence, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::Signer;
    use chrono::{Duration, TimeZone};

    const ISSUER_A: &str = include_str!("../tests/fixtures/issuer_a.key");
    const ISSUER_A_PUB: &str = include_str!("../tests/fixtures/issuer_a.pub");

    #[test]
    fn signer_verifier_matches_public_key_file() {
        let signer = Signer::from_hex(ISSUER_A).unwrap();
        let from_file = Verifier::from_hex(ISSUER_A_PUB).unwrap();
        assert_eq!(signer.verifier(), from_file);
    }

    #[test]
    fn unsigned_licence_is_rejected() {
        let verifier = Verifier::from_hex(ISSUER_A_PUB).unwrap();
        let mut licence = Licence::new_trial(Duration::minutes(5), 0).unwrap();
        let err = verifier.verify_now(&mut licence).unwrap_err();
        assert!(err.is_forged());
        assert!(!licence.is_activated());
    }

    #[test]
    fn malformed_public_key_rejects_everything() {
        let signer = Signer::from_hex(ISSUER_A).unwrap();
        let mut licence = Licence::issue_trial(&signer, Duration::minutes(5), 0).unwrap();
        let verifier = Verifier::from_pkcs1_der(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(
            verifier.verify_now(&mut licence),
            Err(LicenceError::InvalidSignature)
        ));
    }

    #[test]
    fn activated_trial_expires() {
        let signer = Signer::from_hex(ISSUER_A).unwrap();
        let verifier = signer.verifier();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        let mut licence = Licence::issue_trial(&signer, Duration::minutes(60), 0).unwrap();
        verifier.verify(&mut licence, t).unwrap();
        verifier.verify(&mut licence, t + Duration::minutes(59)).unwrap();

        let err = verifier
            .verify(&mut licence, t + Duration::minutes(61))
            .unwrap_err();
        assert!(err.is_expired());
        assert_eq!(licence.valid_from(), Some(t));
    }
}
