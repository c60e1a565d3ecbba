//! Thin helpers around the PEM armor provided by the [`der`](x509_cert::der)
//! crate. Key modules use these to read a single labeled block from any
//! [`Read`] source and to wrap DER documents which carry a non-standard
//! label.
use std::io::Read;

use snafu::{ResultExt, Snafu, ensure};
use tracing::debug;
use x509_cert::der::pem::{self, LineEnding};
use zeroize::Zeroizing;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read PEM input"))]
    ReadInput { source: std::io::Error },

    #[snafu(display("failed to decode PEM block"))]
    DecodePem { source: pem::Error },

    #[snafu(display("unexpected PEM label {label:?}, expected one of {expected:?}"))]
    UnexpectedLabel {
        label: String,
        expected: &'static [&'static str],
    },

    #[snafu(display("failed to encode {label:?} PEM block"))]
    EncodePem {
        source: pem::Error,
        label: &'static str,
    },
}

/// Reads all of `reader` and decodes exactly one PEM block from it. The label
/// of the block must be contained in `expected_labels`.
///
/// The decoded DER document is returned in a [`Zeroizing`] buffer, as it
/// might contain private key material.
pub fn read_block(
    mut reader: impl Read,
    expected_labels: &'static [&'static str],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut input = Zeroizing::new(Vec::new());
    reader.read_to_end(&mut input).context(ReadInputSnafu)?;

    let (label, der) = pem::decode_vec(&input).context(DecodePemSnafu)?;
    ensure!(
        expected_labels.contains(&label),
        UnexpectedLabelSnafu {
            label,
            expected: expected_labels,
        }
    );

    debug!(label, len = der.len(), "decoded PEM block");
    Ok(Zeroizing::new(der))
}

/// Wraps a DER document in PEM armor using the given `label`.
pub fn encode_block(label: &'static str, der: &[u8], line_ending: LineEnding) -> Result<String> {
    pem::encode_string(label, line_ending, der).context(EncodePemSnafu { label })
}

/// Same as [`encode_block`], but wipes the resulting string on drop.
pub fn encode_secret_block(
    label: &'static str,
    der: &[u8],
    line_ending: LineEnding,
) -> Result<Zeroizing<String>> {
    encode_block(label, der, line_ending).map(Zeroizing::new)
}
