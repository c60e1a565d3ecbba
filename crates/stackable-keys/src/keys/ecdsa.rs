//! Abstraction layer around the NIST curve crates [`p224`], [`p256`],
//! [`p384`] and [`p521`]. This module provides a key pair type which abstracts
//! away the generation of ECDSA keys and their conversion to and from PEM.
use std::io::Read;

use const_oid::{AssociatedOid, ObjectIdentifier};
use p224::NistP224;
use p256::{
    NistP256,
    elliptic_curve::{
        AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey as EcPublicKey, SecretKey,
        sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    },
};
use p384::NistP384;
use p521::NistP521;
use rand_core::{CryptoRngCore, OsRng};
use sec1::{EcParameters, EcPrivateKey};
use snafu::{OptionExt, ResultExt, Snafu};
use strum::Display;
use tracing::{debug, instrument};
use x509_cert::{
    der::{Decode, Encode, pem::LineEnding},
    spki::{DecodePublicKey, EncodePublicKey},
};
use zeroize::Zeroizing;

use crate::{
    keys::{PemEncodedKeyPair, PemKeypair, PublicKey, PublicKeyError},
    pem,
};

/// PEM label of a SEC1 encoded EC private key.
pub const PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";

/// PEM label of a SubjectPublicKeyInfo encoded ECDSA public key.
pub const PUBLIC_KEY_LABEL: &str = "ECDSA PUBLIC KEY";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("unsupported curve size {size}, expected one of 224, 256, 384 or 521"))]
    UnsupportedCurveSize { size: usize },

    #[snafu(display("failed to serialize the public key as SubjectPublicKeyInfo DER"))]
    SerializePublicKey { source: x509_cert::spki::Error },

    #[snafu(display("failed to serialize the private key as SEC1 DER"))]
    SerializePrivateKey { source: x509_cert::der::Error },

    #[snafu(display("failed to encode key as PEM"))]
    EncodePem { source: pem::Error },

    #[snafu(display("failed to read PEM-encoded private key"))]
    ReadPrivateKeyPem { source: pem::Error },

    #[snafu(display("failed to deserialize the SEC1 private key structure"))]
    DeserializeEcPrivateKey { source: x509_cert::der::Error },

    #[snafu(display("the private key does not specify a named curve"))]
    MissingCurveParameters,

    #[snafu(display("unsupported named curve {oid}"))]
    UnsupportedCurve { oid: ObjectIdentifier },

    #[snafu(display("failed to deserialize the private key on curve {curve}"))]
    DeserializePrivateKey {
        source: p256::elliptic_curve::Error,
        curve: EllipticCurve,
    },

    #[snafu(display("failed to read public key"))]
    ReadPublicKey { source: PublicKeyError },

    #[snafu(display("expected an ECDSA public key, got {found}"))]
    PublicKeyTypeMismatch { found: String },

    #[snafu(display("the private key uses curve {private}, but the public key uses {public}"))]
    CurveMismatch {
        private: EllipticCurve,
        public: EllipticCurve,
    },
}

/// The supported named elliptic curves.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum EllipticCurve {
    #[strum(to_string = "P-224")]
    P224,

    #[default]
    #[strum(to_string = "P-256")]
    P256,

    #[strum(to_string = "P-384")]
    P384,

    #[strum(to_string = "P-521")]
    P521,
}

impl EllipticCurve {
    const ALL: [Self; 4] = [Self::P224, Self::P256, Self::P384, Self::P521];

    /// The size of the curve in bits.
    pub fn bits(self) -> usize {
        match self {
            Self::P224 => 224,
            Self::P256 => 256,
            Self::P384 => 384,
            Self::P521 => 521,
        }
    }

    /// The object identifier of the named curve.
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            Self::P224 => NistP224::OID,
            Self::P256 => NistP256::OID,
            Self::P384 => NistP384::OID,
            Self::P521 => NistP521::OID,
        }
    }

    pub fn from_oid(oid: ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|curve| curve.oid() == oid)
    }
}

impl TryFrom<usize> for EllipticCurve {
    type Error = Error;

    fn try_from(size: usize) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|curve| curve.bits() == size)
            .context(UnsupportedCurveSizeSnafu { size })
    }
}

/// A public key on one of the supported curves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurvePublicKey {
    P224(p224::PublicKey),
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl CurvePublicKey {
    pub fn curve(&self) -> EllipticCurve {
        match self {
            Self::P224(_) => EllipticCurve::P224,
            Self::P256(_) => EllipticCurve::P256,
            Self::P384(_) => EllipticCurve::P384,
            Self::P521(_) => EllipticCurve::P521,
        }
    }

    pub(crate) fn from_public_key_der(
        curve: EllipticCurve,
        der: &[u8],
    ) -> x509_cert::spki::Result<Self> {
        Ok(match curve {
            EllipticCurve::P224 => Self::P224(p224::PublicKey::from_public_key_der(der)?),
            EllipticCurve::P256 => Self::P256(p256::PublicKey::from_public_key_der(der)?),
            EllipticCurve::P384 => Self::P384(p384::PublicKey::from_public_key_der(der)?),
            EllipticCurve::P521 => Self::P521(p521::PublicKey::from_public_key_der(der)?),
        })
    }
}

/// The secret scalar and public point of a key pair on curve `C`.
///
/// The public point is stored separately, because it can be replaced by a
/// public key read from a different file.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CurveKeyPair<C>
where
    C: CurveArithmetic,
{
    secret_key: SecretKey<C>,
    public_key: EcPublicKey<C>,
}

impl<C> CurveKeyPair<C>
where
    C: CurveArithmetic + AssociatedOid,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    fn generate<Rng>(rng: &mut Rng) -> Self
    where
        Rng: CryptoRngCore + Sized,
    {
        Self::from(SecretKey::<C>::random(rng))
    }

    fn from_sec1_der(der: &[u8]) -> p256::elliptic_curve::Result<Self> {
        SecretKey::<C>::from_sec1_der(der).map(Self::from)
    }

    fn with_public_key(self, public_key: EcPublicKey<C>) -> Self {
        Self {
            secret_key: self.secret_key,
            public_key,
        }
    }

    fn public_key_der(&self) -> x509_cert::spki::Result<Vec<u8>> {
        Ok(self.public_key.to_public_key_der()?.as_bytes().to_vec())
    }

    /// Encodes the key as SEC1 `ECPrivateKey`, including the named curve and
    /// the stored public point.
    fn private_key_der(&self) -> x509_cert::der::Result<Zeroizing<Vec<u8>>> {
        let private_key = Zeroizing::new(self.secret_key.to_bytes().to_vec());
        let public_key = self.public_key.to_encoded_point(false);

        EcPrivateKey {
            private_key: private_key.as_slice(),
            parameters: Some(EcParameters::NamedCurve(C::OID)),
            public_key: Some(public_key.as_bytes()),
        }
        .to_der()
        .map(Zeroizing::new)
    }
}

impl<C> From<SecretKey<C>> for CurveKeyPair<C>
where
    C: CurveArithmetic,
{
    fn from(secret_key: SecretKey<C>) -> Self {
        let public_key = secret_key.public_key();
        Self {
            secret_key,
            public_key,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Inner {
    P224(CurveKeyPair<NistP224>),
    P256(CurveKeyPair<NistP256>),
    P384(CurveKeyPair<NistP384>),
    P521(CurveKeyPair<NistP521>),
}

/// Expands `$body` once per curve with `$key_pair` bound to the concrete
/// [`CurveKeyPair`].
macro_rules! with_curve_key_pair {
    ($inner:expr, |$key_pair:ident| $body:expr) => {
        match $inner {
            Inner::P224($key_pair) => $body,
            Inner::P256($key_pair) => $body,
            Inner::P384($key_pair) => $body,
            Inner::P521($key_pair) => $body,
        }
    };
}

impl Inner {
    fn curve(&self) -> EllipticCurve {
        match self {
            Self::P224(_) => EllipticCurve::P224,
            Self::P256(_) => EllipticCurve::P256,
            Self::P384(_) => EllipticCurve::P384,
            Self::P521(_) => EllipticCurve::P521,
        }
    }
}

/// An ECDSA key pair on one of the [supported curves](EllipticCurve).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair(Inner);

impl KeyPair {
    /// Returns the curve this key pair lives on.
    pub fn curve(&self) -> EllipticCurve {
        self.0.curve()
    }

    /// Returns the public half of the key pair.
    pub fn public_key(&self) -> CurvePublicKey {
        match &self.0 {
            Inner::P224(key_pair) => CurvePublicKey::P224(key_pair.public_key.clone()),
            Inner::P256(key_pair) => CurvePublicKey::P256(key_pair.public_key.clone()),
            Inner::P384(key_pair) => CurvePublicKey::P384(key_pair.public_key.clone()),
            Inner::P521(key_pair) => CurvePublicKey::P521(key_pair.public_key.clone()),
        }
    }
}

impl PemKeypair for KeyPair {
    type Error = Error;
    type Parameters = EllipticCurve;

    const PRIVATE_KEY_LABEL: &'static str = PRIVATE_KEY_LABEL;
    const PUBLIC_KEY_LABEL: &'static str = PUBLIC_KEY_LABEL;

    #[instrument(name = "create_ecdsa_key_pair")]
    fn new(curve: EllipticCurve) -> Result<Self> {
        let mut csprng = OsRng;
        Self::new_with_rng(&mut csprng, curve)
    }

    #[instrument(name = "create_ecdsa_key_pair_custom_rng", skip(rng))]
    fn new_with_rng<Rng>(rng: &mut Rng, curve: EllipticCurve) -> Result<Self>
    where
        Rng: CryptoRngCore + Sized,
    {
        let inner = match curve {
            EllipticCurve::P224 => Inner::P224(CurveKeyPair::generate(rng)),
            EllipticCurve::P256 => Inner::P256(CurveKeyPair::generate(rng)),
            EllipticCurve::P384 => Inner::P384(CurveKeyPair::generate(rng)),
            EllipticCurve::P521 => Inner::P521(CurveKeyPair::generate(rng)),
        };

        Ok(Self(inner))
    }

    #[instrument(name = "encode_ecdsa_key_pair_as_pem", skip_all)]
    fn to_pem(&self, line_ending: LineEnding) -> Result<PemEncodedKeyPair> {
        let (public_key_der, private_key_der) = with_curve_key_pair!(&self.0, |key_pair| (
            key_pair.public_key_der().context(SerializePublicKeySnafu)?,
            key_pair
                .private_key_der()
                .context(SerializePrivateKeySnafu)?,
        ));

        let public_key_pem =
            pem::encode_block(Self::PUBLIC_KEY_LABEL, &public_key_der, line_ending)
                .context(EncodePemSnafu)?;
        let private_key_pem =
            pem::encode_secret_block(Self::PRIVATE_KEY_LABEL, &private_key_der, line_ending)
                .context(EncodePemSnafu)?;

        Ok(PemEncodedKeyPair::new(public_key_pem, private_key_pem))
    }

    #[instrument(name = "read_ecdsa_private_key_from_pem", skip_all)]
    fn private_key_from_pem(reader: impl Read) -> Result<Self> {
        let der = pem::read_block(reader, &[PRIVATE_KEY_LABEL]).context(ReadPrivateKeyPemSnafu)?;

        let oid = EcPrivateKey::from_der(&der)
            .context(DeserializeEcPrivateKeySnafu)?
            .parameters
            .and_then(|parameters| parameters.named_curve())
            .context(MissingCurveParametersSnafu)?;
        let curve = EllipticCurve::from_oid(oid).context(UnsupportedCurveSnafu { oid })?;
        debug!(%curve, "read SEC1 private key");

        let inner = match curve {
            EllipticCurve::P224 => CurveKeyPair::from_sec1_der(&der).map(Inner::P224),
            EllipticCurve::P256 => CurveKeyPair::from_sec1_der(&der).map(Inner::P256),
            EllipticCurve::P384 => CurveKeyPair::from_sec1_der(&der).map(Inner::P384),
            EllipticCurve::P521 => CurveKeyPair::from_sec1_der(&der).map(Inner::P521),
        }
        .context(DeserializePrivateKeySnafu { curve })?;

        Ok(Self(inner))
    }

    #[instrument(name = "read_ecdsa_key_pair_from_pem", skip_all)]
    fn key_from_pem(public: impl Read, private: impl Read) -> Result<Self> {
        let public_key = public_key_from_pem(public)?;
        let Self(private_key) = Self::private_key_from_pem(private)?;

        let PublicKey::Ecdsa(public_key) = public_key else {
            return PublicKeyTypeMismatchSnafu {
                found: public_key.algorithm_name(),
            }
            .fail();
        };

        let inner = match (private_key, public_key) {
            (Inner::P224(key_pair), CurvePublicKey::P224(public_key)) => {
                Inner::P224(key_pair.with_public_key(public_key))
            }
            (Inner::P256(key_pair), CurvePublicKey::P256(public_key)) => {
                Inner::P256(key_pair.with_public_key(public_key))
            }
            (Inner::P384(key_pair), CurvePublicKey::P384(public_key)) => {
                Inner::P384(key_pair.with_public_key(public_key))
            }
            (Inner::P521(key_pair), CurvePublicKey::P521(public_key)) => {
                Inner::P521(key_pair.with_public_key(public_key))
            }
            (private_key, public_key) => {
                return CurveMismatchSnafu {
                    private: private_key.curve(),
                    public: public_key.curve(),
                }
                .fail();
            }
        };

        Ok(Self(inner))
    }

    fn algorithm_name() -> &'static str {
        "ecdsa"
    }
}

/// Reads a PEM-encoded public key. The returned key is not necessarily an
/// ECDSA key, callers have to match on the [`PublicKey`] variant.
pub fn public_key_from_pem(reader: impl Read) -> Result<PublicKey> {
    super::public_key_from_pem(reader).context(ReadPublicKeySnafu)
}

/// Reads a PEM-encoded SEC1 private key.
pub fn private_key_from_pem(reader: impl Read) -> Result<KeyPair> {
    KeyPair::private_key_from_pem(reader)
}
