//! Session signing key loading.

use std::path::Path;

use actix_web::cookie::Key;
use tracing::warn;
use zeroize::Zeroizing;

/// Minimum key material accepted from the key file.
pub const SESSION_KEY_MIN_LEN: usize = 64;

/// Errors raised while loading the session key.
#[derive(Debug, thiserror::Error)]
pub enum SessionKeyError {
    #[error("failed to read session key at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {SESSION_KEY_MIN_LEN} bytes, got {length}")]
    TooShort { path: String, length: usize },
}

/// Derive the cookie key from `path`.
///
/// An unreadable or short file is fatal unless `allow_ephemeral` is set, in
/// which case a random key is generated and sessions do not survive restarts.
pub fn load_session_key(path: &Path, allow_ephemeral: bool) -> Result<Key, SessionKeyError> {
    match read_key(path) {
        Ok(key) => Ok(key),
        Err(error) if allow_ephemeral => {
            warn!(path = %path.display(), %error, "using temporary session key");
            Ok(Key::generate())
        }
        Err(error) => Err(error),
    }
}

fn read_key(path: &Path) -> Result<Key, SessionKeyError> {
    let bytes = Zeroizing::new(std::fs::read(path).map_err(|source| SessionKeyError::Read {
        path: path.display().to_string(),
        source,
    })?);
    if bytes.len() < SESSION_KEY_MIN_LEN {
        return Err(SessionKeyError::TooShort {
            path: path.display().to_string(),
            length: bytes.len(),
        });
    }
    Ok(Key::derive_from(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn key_file(len: usize) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&vec![b'k'; len]).expect("write key");
        file
    }

    #[rstest]
    fn derives_a_stable_key_from_the_file() {
        let file = key_file(SESSION_KEY_MIN_LEN);

        let first = load_session_key(file.path(), false).expect("key");
        let second = load_session_key(file.path(), false).expect("key");

        assert_eq!(first.master(), second.master());
    }

    #[rstest]
    fn short_keys_are_rejected() {
        let file = key_file(16);

        let err = load_session_key(file.path(), false).err().expect("short key");

        assert!(matches!(err, SessionKeyError::TooShort { length: 16, .. }));
    }

    #[rstest]
    #[case(false, false)]
    #[case(true, true)]
    fn missing_file_depends_on_ephemeral_flag(#[case] allow: bool, #[case] ok: bool) {
        let path = Path::new("/nonexistent/itinera/session_key");

        assert_eq!(load_session_key(path, allow).is_ok(), ok);
    }
}
