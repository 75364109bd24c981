//! Key file loading.
//!
//! Keys are stored as hex text of their PKCS#1 DER encoding: `RSAPrivateKey`
//! for the issuer's `.key` file, `RSAPublicKey` for the `.pub` file shipped
//! with the licensed application.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::{LicenceError, LicenceResult};
use crate::signing::Signer;
use crate::verify::Verifier;

/// Decode hex key text, ignoring any whitespace.
pub fn decode_hex_key(text: &str) -> LicenceResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(LicenceError::KeyError("key file is empty".to_string()));
    }
    hex::decode(&compact).map_err(|e| LicenceError::KeyError(format!("invalid key hex: {e}")))
}

/// Load an issuer's private key file.
pub fn load_signer(path: impl AsRef<Path>) -> LicenceResult<Signer> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), "Loaded private key file");
    Signer::from_hex(&text)
}

/// Load an issuer's public key file.
pub fn load_verifier(path: impl AsRef<Path>) -> LicenceResult<Verifier> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), "Loaded public key file");
    Verifier::from_hex(&text)
}
