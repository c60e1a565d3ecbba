//! Abstraction layer around the [`rsa`] crate. This module provides a key
//! pair type which abstracts away the generation of RSA keys and their
//! conversion to and from PEM.
use std::io::Read;

use rand_core::{CryptoRngCore, OsRng};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs1::{self, DecodeRsaPrivateKey, EncodeRsaPrivateKey, UintRef},
    pkcs8::EncodePublicKey,
    traits::PublicKeyParts,
};
use snafu::{OptionExt, ResultExt, Snafu};
use strum::Display;
use tracing::{debug, instrument};
use x509_cert::der::{Decode, Encode, pem::LineEnding};
use zeroize::Zeroizing;

use crate::{
    keys::{PemEncodedKeyPair, PemKeypair, PublicKey, PublicKeyError},
    pem,
};

/// PEM label of a PKCS#1 encoded RSA private key.
pub const PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// PEM label of a SubjectPublicKeyInfo encoded RSA public key.
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to create {key_size} RSA key"))]
    CreateKey {
        source: rsa::Error,
        key_size: KeySize,
    },

    #[snafu(display(
        "unsupported RSA key size {size}, expected one of 128, 256, 512 (bytes) or 1024, 2048, 4096 (bits)"
    ))]
    UnsupportedKeySize { size: usize },

    #[snafu(display("failed to serialize the public key as SubjectPublicKeyInfo PEM"))]
    SerializePublicKey { source: x509_cert::spki::Error },

    #[snafu(display("failed to serialize the private key as PKCS1 DER"))]
    SerializePrivateKey { source: rsa::pkcs1::Error },

    #[snafu(display("failed to replace the public components of the PKCS1 private key"))]
    ReplacePublicComponents { source: x509_cert::der::Error },

    #[snafu(display("failed to encode key as PEM"))]
    EncodePem { source: pem::Error },

    #[snafu(display("failed to read PEM-encoded private key"))]
    ReadPrivateKeyPem { source: pem::Error },

    #[snafu(display("failed to deserialize the private key from PKCS1 DER"))]
    DeserializePrivateKey { source: rsa::pkcs1::Error },

    #[snafu(display("failed to read public key"))]
    ReadPublicKey { source: PublicKeyError },

    #[snafu(display("expected an RSA public key, got {found}"))]
    PublicKeyTypeMismatch { found: String },
}

/// The supported RSA modulus sizes.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq)]
pub enum KeySize {
    #[strum(to_string = "1024-bit")]
    Rsa1024,

    #[default]
    #[strum(to_string = "2048-bit")]
    Rsa2048,

    #[strum(to_string = "4096-bit")]
    Rsa4096,
}

impl KeySize {
    /// The modulus size in bits.
    pub fn bits(self) -> usize {
        match self {
            Self::Rsa1024 => 128 * 8,
            Self::Rsa2048 => 256 * 8,
            Self::Rsa4096 => 512 * 8,
        }
    }

    /// Maps a modulus size in bytes to the matching preset.
    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            128 => Some(Self::Rsa1024),
            256 => Some(Self::Rsa2048),
            512 => Some(Self::Rsa4096),
            _ => None,
        }
    }

    /// Maps a modulus size in bits to the matching preset.
    pub fn from_bits(bits: usize) -> Option<Self> {
        [Self::Rsa1024, Self::Rsa2048, Self::Rsa4096]
            .into_iter()
            .find(|key_size| key_size.bits() == bits)
    }
}

impl TryFrom<usize> for KeySize {
    type Error = Error;

    /// Accepts both the byte sizes (`128`, `256`, `512`) and the bit sizes
    /// (`1024`, `2048`, `4096`). The two ranges don't overlap.
    fn try_from(size: usize) -> Result<Self> {
        Self::from_bytes(size)
            .or_else(|| Self::from_bits(size))
            .context(UnsupportedKeySizeSnafu { size })
    }
}

/// An RSA key pair.
///
/// The public key is stored next to the private key, as it can be replaced by
/// a public key read from a different file. Both the SPKI public key and the
/// modulus and public exponent of the PKCS#1 private key are taken from the
/// stored public key.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl KeyPair {
    /// Returns the private key.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Returns the public half of the key pair.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Returns the modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public_key.n().bits()
    }

    /// Encodes the private key as PKCS#1 DER, with the modulus and public
    /// exponent of the stored public key.
    fn private_key_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let der = self
            .private_key
            .to_pkcs1_der()
            .context(SerializePrivateKeySnafu)?;

        let modulus = self.public_key.n().to_bytes_be();
        let public_exponent = self.public_key.e().to_bytes_be();

        let private_key =
            pkcs1::RsaPrivateKey::from_der(der.as_bytes()).context(ReplacePublicComponentsSnafu)?;
        pkcs1::RsaPrivateKey {
            modulus: UintRef::new(&modulus).context(ReplacePublicComponentsSnafu)?,
            public_exponent: UintRef::new(&public_exponent)
                .context(ReplacePublicComponentsSnafu)?,
            ..private_key
        }
        .to_der()
        .map(Zeroizing::new)
        .context(ReplacePublicComponentsSnafu)
    }
}

impl From<RsaPrivateKey> for KeyPair {
    fn from(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            private_key,
            public_key,
        }
    }
}

impl PemKeypair for KeyPair {
    type Error = Error;
    type Parameters = KeySize;

    const PRIVATE_KEY_LABEL: &'static str = PRIVATE_KEY_LABEL;
    const PUBLIC_KEY_LABEL: &'static str = PUBLIC_KEY_LABEL;

    /// Generates a new RSA key with the default random-number generator
    /// [`OsRng`].
    ///
    /// It should be noted that the generation of the key takes longer for
    /// larger key sizes. The generation of an RSA key with a key size of
    /// `4096` can take up to multiple seconds.
    #[instrument(name = "create_rsa_key_pair")]
    fn new(key_size: KeySize) -> Result<Self> {
        let mut csprng = OsRng;
        Self::new_with_rng(&mut csprng, key_size)
    }

    #[instrument(name = "create_rsa_key_pair_custom_rng", skip(rng))]
    fn new_with_rng<Rng>(rng: &mut Rng, key_size: KeySize) -> Result<Self>
    where
        Rng: CryptoRngCore + Sized,
    {
        let private_key =
            RsaPrivateKey::new(rng, key_size.bits()).context(CreateKeySnafu { key_size })?;

        Ok(Self::from(private_key))
    }

    #[instrument(name = "encode_rsa_key_pair_as_pem", skip_all)]
    fn to_pem(&self, line_ending: LineEnding) -> Result<PemEncodedKeyPair> {
        let public_key_pem = self
            .public_key
            .to_public_key_pem(line_ending)
            .context(SerializePublicKeySnafu)?;

        let private_key_der = self.private_key_der()?;
        let private_key_pem =
            pem::encode_secret_block(Self::PRIVATE_KEY_LABEL, &private_key_der, line_ending)
                .context(EncodePemSnafu)?;

        Ok(PemEncodedKeyPair::new(public_key_pem, private_key_pem))
    }

    #[instrument(name = "read_rsa_private_key_from_pem", skip_all)]
    fn private_key_from_pem(reader: impl Read) -> Result<Self> {
        let der = pem::read_block(reader, &[PRIVATE_KEY_LABEL]).context(ReadPrivateKeyPemSnafu)?;
        let private_key =
            RsaPrivateKey::from_pkcs1_der(&der).context(DeserializePrivateKeySnafu)?;

        Ok(Self::from(private_key))
    }

    #[instrument(name = "read_rsa_key_pair_from_pem", skip_all)]
    fn key_from_pem(public: impl Read, private: impl Read) -> Result<Self> {
        let public_key = public_key_from_pem(public)?;
        let Self { private_key, .. } = Self::private_key_from_pem(private)?;

        let PublicKey::Rsa(public_key) = public_key else {
            return PublicKeyTypeMismatchSnafu {
                found: public_key.algorithm_name(),
            }
            .fail();
        };

        // Trusted as is, no check against the private key.
        debug!(bits = public_key.n().bits(), "assigned RSA public key");
        Ok(Self {
            private_key,
            public_key,
        })
    }

    fn algorithm_name() -> &'static str {
        "rsa"
    }
}

/// Reads a PEM-encoded public key. The returned key is not necessarily an RSA
/// key, callers have to match on the [`PublicKey`] variant.
pub fn public_key_from_pem(reader: impl Read) -> Result<PublicKey> {
    super::public_key_from_pem(reader).context(ReadPublicKeySnafu)
}

/// Reads a PEM-encoded PKCS#1 private key.
pub fn private_key_from_pem(reader: impl Read) -> Result<KeyPair> {
    KeyPair::private_key_from_pem(reader)
}
