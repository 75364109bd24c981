//! Netviper Licence - signed offline licences for Rust applications
//!
//! A licence is a small signed token: a unique id, either a fixed validity
//! window or a trial run period that starts on first verification, and a
//! usage ceiling. Issuers sign with an RSA private key; applications verify
//! with the matching public key, without any network access.
//!
//! # Flow
//!
//! - Issuer: [`Licence::issue_fixed`] / [`Licence::issue_trial`] allocate an
//!   id, sign the canonical fields, and [`marshal`] produces the string to
//!   hand to the customer.
//! - Application: [`unmarshal`] the string, then [`Verifier::verify`] checks
//!   the signature before the validity window, activating trial licences.
//!
//! # Example
//!
//! ```rust,ignore
//! use licence::{keys, Licence};
//!
//! let signer = keys::load_signer("issuer.key")?;
//! let licence = Licence::issue_for_days(&signer, chrono::Utc::now(), 30, 5)?;
//! let text = licence.to_transport()?;
//!
//! let verifier = keys::load_verifier("issuer.pub")?;
//! let mut received: Licence = text.parse()?;
//! verifier.verify_now(&mut received)?;
//! ```

pub mod canonical;
pub mod config;
pub mod errors;
pub mod identity;
pub mod keys;
pub mod licence;
pub mod logging;
pub mod presentation;
pub mod signing;
pub mod transport;
pub mod verify;

pub use canonical::{encode_licence, SignableFields};
pub use errors::{LicenceError, LicenceResult};
pub use identity::new_id;
pub use licence::{Licence, Validity, Window};
pub use presentation::render;
pub use signing::Signer;
pub use transport::{marshal, unmarshal};
pub use verify::Verifier;
