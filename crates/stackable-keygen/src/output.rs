use std::{
    ffi::OsString,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use snafu::{ResultExt, Snafu};
use stackable_keys::PemEncodedKeyPair;
use tracing::{debug, instrument};

/// File mode of the private key, only readable and writable by the owner.
pub const PRIVATE_KEY_MODE: u32 = 0o600;

/// File mode of the public key, readable by everyone.
pub const PUBLIC_KEY_MODE: u32 = 0o644;

/// Extension appended to the private key path to get the public key path.
pub const PUBLIC_KEY_EXTENSION: &str = ".pub";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to open {path} for writing", path = path.display()))]
    OpenFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to set permissions {mode:o} on {path}", path = path.display()))]
    SetPermissions {
        source: std::io::Error,
        path: PathBuf,
        mode: u32,
    },

    #[snafu(display("failed to write {path}", path = path.display()))]
    WriteFile {
        source: std::io::Error,
        path: PathBuf,
    },
}

/// The locations of the private and the public key file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

impl OutputPaths {
    /// Derives the public key path by appending [`PUBLIC_KEY_EXTENSION`] to
    /// `private_key`.
    pub fn new(private_key: PathBuf) -> Self {
        let mut public_key = OsString::from(private_key.as_os_str());
        public_key.push(PUBLIC_KEY_EXTENSION);

        Self {
            private_key,
            public_key: public_key.into(),
        }
    }

    /// Writes the public key first and the private key second. Existing files
    /// are truncated and get their permissions reset.
    #[instrument(skip(pem))]
    pub fn write(&self, pem: &PemEncodedKeyPair) -> Result<()> {
        write_file(&self.public_key, pem.public_key_pem(), PUBLIC_KEY_MODE)?;
        write_file(&self.private_key, pem.private_key_pem(), PRIVATE_KEY_MODE)
    }
}

// The mode is only honoured by open for new files, existing files get it set
// explicitly before any content is written.
#[cfg_attr(not(unix), allow(unused_variables))]
fn write_file(path: &Path, contents: &str, mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, mode);

    let mut file = options.open(path).context(OpenFileSnafu { path })?;

    #[cfg(unix)]
    {
        use std::{fs::Permissions, os::unix::fs::PermissionsExt};

        file.set_permissions(Permissions::from_mode(mode))
            .context(SetPermissionsSnafu { path, mode })?;
    }

    file.write_all(contents.as_bytes())
        .context(WriteFileSnafu { path })?;

    debug!(path = %path.display(), len = contents.len(), "wrote file");
    Ok(())
}
