//! Licence signing.
//!
//! Signatures are RSA PKCS#1 v1.5 over the SHA-256 digest of the canonical
//! encoding (`RSA_PKCS1_SHA256`). The issuer's private key is an RSA
//! `RSAPrivateKey` in PKCS#1 DER form.

use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use tracing::debug;

use crate::canonical::{digest, SignableFields};
use crate::errors::{LicenceError, LicenceResult};
use crate::keys::decode_hex_key;
use crate::licence::Licence;
use crate::verify::Verifier;

/// Signs licences with an issuer's private key.
pub struct Signer {
    key_pair: RsaKeyPair,
    rng: SystemRandom,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("modulus_bits", &(self.key_pair.public().modulus_len() * 8))
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Parse a PKCS#1 DER private key.
    pub fn from_pkcs1_der(der: &[u8]) -> LicenceResult<Self> {
        let key_pair = RsaKeyPair::from_der(der)
            .map_err(|e| LicenceError::SigningError(format!("private key rejected: {e}")))?;
        Ok(Self {
            key_pair,
            rng: SystemRandom::new(),
        })
    }

    /// Parse a hex-encoded PKCS#1 DER private key.
    pub fn from_hex(text: &str) -> LicenceResult<Self> {
        let der = decode_hex_key(text)?;
        Self::from_pkcs1_der(&der)
    }

    /// The verifier for this signer's public key.
    pub fn verifier(&self) -> Verifier {
        Verifier::from_pkcs1_der(self.key_pair.public().as_ref())
    }

    /// Sign `licence`, replacing any previous signature.
    pub fn sign(&self, licence: &mut Licence) -> LicenceResult<()> {
        let message = SignableFields::from(&*licence).encode()?;

        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&RSA_PKCS1_SHA256, &self.rng, &message, &mut signature)
            .map_err(|_| LicenceError::SigningError("RSA signing failed".to_string()))?;

        debug!(
            licence_id = %licence.id(),
            digest = %hex::encode(digest(&message)),
            "Licence signed"
        );
        licence.set_signature(signature);
        Ok(())
    }
}
