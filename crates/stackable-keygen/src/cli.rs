//! Command line options of the `keygen` binary and their validation.
//!
//! The raw [`Cli`] arguments are parsed once and converted into a validated
//! [`KeygenOptions`], which is then passed down explicitly.
//!
//! ```
//! use clap::Parser;
//! use stackable_keygen::cli::{Cli, KeygenOptions, normalize_args};
//!
//! let cli = Cli::parse_from(normalize_args(["keygen", "-type", "rsa", "-size", "256"]));
//! let options = KeygenOptions::try_from(cli).unwrap();
//! assert_eq!(options.output.private_key.to_str(), Some("id_rsa"));
//! ```
use std::{ffi::OsString, path::PathBuf};

use clap::{Parser, ValueEnum};
use snafu::{ResultExt, Snafu};
use stackable_keys::keys::{
    ecdsa::{self, EllipticCurve},
    rsa::{self, KeySize},
};

use crate::output::OutputPaths;

/// Long options which are also accepted with a single leading dash.
const SINGLE_DASH_OPTIONS: &[&str] = &["type", "size", "out"];

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("invalid RSA key size"))]
    InvalidKeySize { source: rsa::Error },

    #[snafu(display("invalid ECDSA curve"))]
    InvalidCurve { source: ecdsa::Error },
}

/// Generate an RSA or ECDSA key pair and write it as PEM files.
///
/// The private key is written to the output path, the public key to the same
/// path with an additional `.pub` extension.
#[derive(Debug, PartialEq, Eq, Parser)]
#[command(name = "keygen", version, long_about = None)]
pub struct Cli {
    /// The type of key to generate
    #[arg(long = "type", value_enum, env = "KEYGEN_TYPE")]
    pub key_type: KeyType,

    /// The key size. RSA: 128, 256 or 512 bytes (or 1024, 2048, 4096 bits),
    /// defaults to 256 bytes. ECDSA: 224, 256, 384 or 521, defaults to 256.
    #[arg(long, env = "KEYGEN_SIZE")]
    pub size: Option<usize>,

    /// The path of the private key file [default: id_rsa or id_ecdsa]
    #[arg(long, short, value_name = "FILE", env = "KEYGEN_OUT")]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeyType {
    Ecdsa,
    Rsa,
}

impl KeyType {
    /// The file name used when no output path is given.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Ecdsa => "id_ecdsa",
            Self::Rsa => "id_rsa",
        }
    }
}

/// The algorithm and its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Rsa(KeySize),
    Ecdsa(EllipticCurve),
}

/// Validated options which drive a single key generation.
#[derive(Debug, PartialEq, Eq)]
pub struct KeygenOptions {
    pub algorithm: Algorithm,
    pub output: OutputPaths,
}

impl TryFrom<Cli> for KeygenOptions {
    type Error = Error;

    fn try_from(cli: Cli) -> Result<Self> {
        let algorithm = match (cli.key_type, cli.size) {
            (KeyType::Rsa, None) => Algorithm::Rsa(KeySize::default()),
            (KeyType::Rsa, Some(size)) => {
                Algorithm::Rsa(KeySize::try_from(size).context(InvalidKeySizeSnafu)?)
            }
            (KeyType::Ecdsa, None) => Algorithm::Ecdsa(EllipticCurve::default()),
            (KeyType::Ecdsa, Some(size)) => {
                Algorithm::Ecdsa(EllipticCurve::try_from(size).context(InvalidCurveSnafu)?)
            }
        };

        let private_key = cli
            .out
            .unwrap_or_else(|| PathBuf::from(cli.key_type.default_file_name()));

        Ok(Self {
            algorithm,
            output: OutputPaths::new(private_key),
        })
    }
}

/// Rewrites single-dash long options like `-type rsa` or `-out=key` into
/// their double-dash form, so that they are understood by clap. The first
/// argument (the binary name) and all other arguments are left untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);

    args.next()
        .into_iter()
        .chain(args.map(normalize_arg))
        .collect()
}

fn normalize_arg(arg: OsString) -> OsString {
    let Some(option) = arg.to_str().and_then(|arg| arg.strip_prefix('-')) else {
        return arg;
    };

    let name = option.split_once('=').map_or(option, |(name, _)| name);
    if SINGLE_DASH_OPTIONS.contains(&name) {
        format!("--{option}").into()
    } else {
        arg
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(args: &[&str]) -> Result<KeygenOptions> {
        let cli = Cli::try_parse_from(normalize_args(args.iter().copied()))
            .expect("arguments must parse");
        KeygenOptions::try_from(cli)
    }

    #[rstest]
    #[case(&["keygen", "--type", "rsa"], Algorithm::Rsa(KeySize::Rsa2048), "id_rsa")]
    #[case(&["keygen", "-type", "rsa", "-size", "128"], Algorithm::Rsa(KeySize::Rsa1024), "id_rsa")]
    #[case(&["keygen", "-type", "rsa", "-size", "512", "-out", "/tmp/k"], Algorithm::Rsa(KeySize::Rsa4096), "/tmp/k")]
    #[case(&["keygen", "--type=rsa", "--size=2048"], Algorithm::Rsa(KeySize::Rsa2048), "id_rsa")]
    #[case(&["keygen", "-type", "ecdsa"], Algorithm::Ecdsa(EllipticCurve::P256), "id_ecdsa")]
    #[case(&["keygen", "-type=ecdsa", "-size=521"], Algorithm::Ecdsa(EllipticCurve::P521), "id_ecdsa")]
    #[case(&["keygen", "--type", "ecdsa", "--size", "224", "-o", "key"], Algorithm::Ecdsa(EllipticCurve::P224), "key")]
    fn valid_options(
        #[case] args: &[&str],
        #[case] algorithm: Algorithm,
        #[case] private_key: &str,
    ) {
        let options = parse(args).expect("options must be valid");

        assert_eq!(options.algorithm, algorithm);
        assert_eq!(options.output, OutputPaths::new(PathBuf::from(private_key)));
    }

    #[rstest]
    #[case(&["keygen", "-type", "rsa", "-size", "100"])]
    #[case(&["keygen", "-type", "rsa", "-size", "384"])]
    fn invalid_rsa_size(#[case] args: &[&str]) {
        let err = parse(args).expect_err("must fail");
        assert!(matches!(err, Error::InvalidKeySize { .. }), "got {err:?}");
    }

    #[rstest]
    #[case(&["keygen", "-type", "ecdsa", "-size", "128"])]
    #[case(&["keygen", "-type", "ecdsa", "-size", "2048"])]
    fn invalid_ecdsa_size(#[case] args: &[&str]) {
        let err = parse(args).expect_err("must fail");
        assert!(matches!(err, Error::InvalidCurve { .. }), "got {err:?}");
    }

    #[rstest]
    #[case(&["keygen", "-type", "dsa"])]
    #[case(&["keygen", "-size", "256"])]
    #[case(&["keygen", "-type", "rsa", "-size", "big"])]
    fn rejected_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(normalize_args(args.iter().copied())).is_err());
    }

    #[rstest]
    #[case(&["keygen", "-type", "rsa"], &["keygen", "--type", "rsa"])]
    #[case(&["keygen", "-out=/tmp/k"], &["keygen", "--out=/tmp/k"])]
    #[case(&["keygen", "--size", "-o", "x"], &["keygen", "--size", "-o", "x"])]
    #[case(&["-type"], &["-type"])]
    fn normalize(#[case] input: &[&str], #[case] expected: &[&str]) {
        let expected = expected.iter().map(OsString::from).collect::<Vec<_>>();
        assert_eq!(normalize_args(input.iter().copied()), expected);
    }
}
