//! This crate provides types, traits and functions to generate RSA and ECDSA
//! key pairs and to convert them to and from their PEM-encoded text
//! representation.
//!
//! All cryptographic primitives are provided by the RustCrypto crates. This
//! crate only glues them together and chooses the on-disk formats:
//!
//! | Algorithm | Private key                   | Public key                               |
//! |-----------|-------------------------------|------------------------------------------|
//! | RSA       | PKCS#1, `RSA PRIVATE KEY`     | SubjectPublicKeyInfo, `PUBLIC KEY`       |
//! | ECDSA     | SEC1, `EC PRIVATE KEY`        | SubjectPublicKeyInfo, `ECDSA PUBLIC KEY` |
//!
//! ## References
//!
//! - <https://datatracker.ietf.org/doc/html/rfc7468>
//! - <https://datatracker.ietf.org/doc/html/rfc8017>
//! - <https://datatracker.ietf.org/doc/html/rfc5915>
pub mod keys;
pub mod pem;

pub use keys::{PemEncodedKeyPair, PemKeypair, PublicKey};
pub use x509_cert::der::pem::LineEnding;
