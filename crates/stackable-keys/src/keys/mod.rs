//! Contains primitives to create key pairs and to convert them to and from
//! their PEM-encoded text representation.
//!
//! This module currently provides the following algorithms:
//!
//! ## ECDSA
//!
//! ECDSA keys can be created on the NIST curves P-224, P-256, P-384 and
//! P-521, provided by the [`p224`], [`p256`], [`p384`] and [`p521`] crates.
//! Private keys are encoded as SEC1 (`EC PRIVATE KEY`), public keys as
//! SubjectPublicKeyInfo (`ECDSA PUBLIC KEY`).
//!
//! ```no_run
//! use stackable_keys::keys::{ecdsa::{EllipticCurve, KeyPair}, PemKeypair};
//! let key = KeyPair::new(EllipticCurve::P384).unwrap();
//! ```
//!
//! ## RSA
//!
//! In order to work with RSA keys, this crate requires the [`rsa`] dependency.
//! Private keys are encoded as PKCS#1 (`RSA PRIVATE KEY`), public keys as
//! SubjectPublicKeyInfo (`PUBLIC KEY`).
//!
//! ```no_run
//! use stackable_keys::keys::{rsa::{KeyPair, KeySize}, PemKeypair};
//! let key = KeyPair::new(KeySize::Rsa2048).unwrap();
//! ```
//!
//! It should be noted, that the crate is currently vulnerable to the recently
//! discovered Marvin attack. The `openssl` crate is also impacted by this. See:
//!
//! - <https://people.redhat.com/~hkario/marvin/>
//! - <https://rustsec.org/advisories/RUSTSEC-2023-0071.html>
//! - <https://github.com/RustCrypto/RSA/issues/19>
use std::{fmt::Debug, io::Read};

use const_oid::{
    ObjectIdentifier,
    db::rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION},
};
use rand_core::CryptoRngCore;
use snafu::{ResultExt, Snafu};
use tracing::instrument;
use x509_cert::{
    der::{Decode, pem::LineEnding},
    spki::{DecodePublicKey, SubjectPublicKeyInfoRef},
};
use zeroize::Zeroizing;

use crate::pem;

pub mod ecdsa;
pub mod rsa;

/// PEM labels accepted when reading a public key, regardless of the
/// algorithm. The algorithm itself is determined by the SubjectPublicKeyInfo.
pub const PUBLIC_KEY_LABELS: &[&str] = &[rsa::PUBLIC_KEY_LABEL, ecdsa::PUBLIC_KEY_LABEL];

#[derive(Debug, Snafu)]
pub enum PublicKeyError {
    #[snafu(display("failed to read PEM-encoded public key"))]
    ReadPem { source: pem::Error },

    #[snafu(display("failed to deserialize SubjectPublicKeyInfo"))]
    DeserializeSubjectPublicKeyInfo { source: x509_cert::der::Error },

    #[snafu(display("failed to read the algorithm identifier of the public key"))]
    ReadAlgorithmIdentifier { source: x509_cert::spki::Error },

    #[snafu(display("failed to deserialize RSA public key"))]
    DeserializeRsaPublicKey { source: x509_cert::spki::Error },

    #[snafu(display("failed to deserialize ECDSA public key on curve {curve}"))]
    DeserializeEcdsaPublicKey {
        source: x509_cert::spki::Error,
        curve: ecdsa::EllipticCurve,
    },
}

/// A public key parsed from a SubjectPublicKeyInfo structure.
///
/// Parsing never fails because of an unknown algorithm. Such keys are
/// returned as [`PublicKey::Unsupported`], which leaves it to the caller to
/// decide how to handle them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(::rsa::RsaPublicKey),
    Ecdsa(ecdsa::CurvePublicKey),
    Unsupported {
        algorithm: ObjectIdentifier,
        parameters: Option<ObjectIdentifier>,
    },
}

impl PublicKey {
    /// A human readable name of the key algorithm, used in error messages.
    pub fn algorithm_name(&self) -> String {
        match self {
            Self::Rsa(_) => rsa::KeyPair::algorithm_name().to_owned(),
            Self::Ecdsa(public_key) => {
                format!("{} ({})", ecdsa::KeyPair::algorithm_name(), public_key.curve())
            }
            Self::Unsupported { algorithm, .. } => algorithm.to_string(),
        }
    }

    /// Decodes a DER-encoded SubjectPublicKeyInfo into the matching variant.
    #[instrument(name = "decode_public_key_from_der", skip_all)]
    pub fn from_der(der: &[u8]) -> Result<Self, PublicKeyError> {
        let spki = SubjectPublicKeyInfoRef::from_der(der)
            .context(DeserializeSubjectPublicKeyInfoSnafu)?;
        let (algorithm, parameters) = spki
            .algorithm
            .oids()
            .map_err(x509_cert::spki::Error::from)
            .context(ReadAlgorithmIdentifierSnafu)?;

        if algorithm == RSA_ENCRYPTION {
            let public_key = ::rsa::RsaPublicKey::from_public_key_der(der)
                .context(DeserializeRsaPublicKeySnafu)?;
            return Ok(Self::Rsa(public_key));
        }

        if algorithm == ID_EC_PUBLIC_KEY {
            if let Some(curve) = parameters.and_then(ecdsa::EllipticCurve::from_oid) {
                let public_key = ecdsa::CurvePublicKey::from_public_key_der(curve, der)
                    .context(DeserializeEcdsaPublicKeySnafu { curve })?;
                return Ok(Self::Ecdsa(public_key));
            }
        }

        Ok(Self::Unsupported {
            algorithm,
            parameters,
        })
    }
}

/// Reads a PEM-encoded SubjectPublicKeyInfo from `reader`. Both the
/// `PUBLIC KEY` and `ECDSA PUBLIC KEY` labels are accepted.
#[instrument(name = "read_public_key_from_pem", skip_all)]
pub fn public_key_from_pem(reader: impl Read) -> Result<PublicKey, PublicKeyError> {
    let der = pem::read_block(reader, PUBLIC_KEY_LABELS).context(ReadPemSnafu)?;
    PublicKey::from_der(&der)
}

/// The PEM-encoded public and private halves of a key pair.
#[derive(Debug)]
pub struct PemEncodedKeyPair {
    public_key_pem: String,
    private_key_pem: Zeroizing<String>,
}

impl PemEncodedKeyPair {
    pub fn new(public_key_pem: String, private_key_pem: Zeroizing<String>) -> Self {
        Self {
            public_key_pem,
            private_key_pem,
        }
    }

    /// Returns the PEM-encoded public key.
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// Returns the PEM-encoded private key.
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }
}

/// A key pair which can be generated and converted to and from PEM.
pub trait PemKeypair: Debug + Sized {
    /// The parameters used to generate a new key, such as the key size or the
    /// elliptic curve.
    type Parameters: Debug + Copy + Default;

    type Error: std::error::Error + Send + Sync + 'static;

    /// The PEM label used for the private key.
    const PRIVATE_KEY_LABEL: &'static str;

    /// The PEM label used for the public key.
    const PUBLIC_KEY_LABEL: &'static str;

    /// Generates a new key with the default random-number generator
    /// [`rand_core::OsRng`].
    fn new(parameters: Self::Parameters) -> Result<Self, Self::Error>;

    /// Generates a new key with a custom random-number generator.
    fn new_with_rng<Rng>(rng: &mut Rng, parameters: Self::Parameters) -> Result<Self, Self::Error>
    where
        Rng: CryptoRngCore + Sized;

    /// Encodes the public and the private half of the key pair as PEM.
    fn to_pem(&self, line_ending: LineEnding) -> Result<PemEncodedKeyPair, Self::Error>;

    /// Reads a key pair from the PEM-encoded private key.
    fn private_key_from_pem(reader: impl Read) -> Result<Self, Self::Error>;

    /// Reads a key pair from separate PEM-encoded public and private keys.
    ///
    /// The public key is trusted to belong to the private key and replaces
    /// the public half of the parsed private key. No mathematical cross-check
    /// is performed.
    fn key_from_pem(public: impl Read, private: impl Read) -> Result<Self, Self::Error>;

    /// The name of the algorithm such as `rsa` or `ecdsa`.
    fn algorithm_name() -> &'static str;
}
