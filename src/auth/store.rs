use std::fs;
use std::path::{Path, PathBuf};

use super::error::AuthError;
use super::token::AccessToken;

const TOKEN_FILE_NAME: &str = ".cesium_ion_token";

/// Storage abstraction for the persisted ion access token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<AccessToken>, AuthError>;
    fn save(&self, token: &AccessToken) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// Plain-text token file under the user's home directory.
///
/// The file holds the bare token and nothing else; an empty file counts as
/// "not logged in".
///
/// # Example
/// ```no_run
/// use ion_publish::auth::{AccessToken, FileTokenStore, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.save(&AccessToken::new("token"))?;
/// # Ok::<(), ion_publish::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self::new(default_token_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AccessToken>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Ok(Some(AccessToken::new(trimmed)))
    }

    fn save(&self, token: &AccessToken) -> Result<(), AuthError> {
        Self::ensure_parent(&self.path)?;
        fs::write(&self.path, token.secret())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// `~/.cesium_ion_token`, or the working directory when no home is known.
pub fn default_token_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(TOKEN_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(TOKEN_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileTokenStore) {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("ion").join("token"));
        (dir, store)
    }

    #[test]
    fn token_round_trip_works() {
        let (_dir, store) = temp_store();
        store.save(&AccessToken::new("access")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.secret(), "access");
    }

    #[test]
    fn file_holds_plain_token() {
        let (_dir, store) = temp_store();
        store.save(&AccessToken::new("plain-value")).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "plain-value");
    }

    #[test]
    fn missing_file_is_absent() {
        let (_dir, store) = temp_store();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn whitespace_only_file_is_absent() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn trailing_newline_is_trimmed() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "edited-by-hand\n").unwrap();
        assert_eq!(store.load().unwrap().unwrap().secret(), "edited-by-hand");
    }

    #[test]
    fn clear_removes_token() {
        let (_dir, store) = temp_store();
        store.save(&AccessToken::new("access")).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = temp_store();
        store.save(&AccessToken::new("access")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
