//! The set of exported model files to upload.

use std::collections::BTreeMap;
use std::path::{Component, Path};

use bytes::Bytes;
use ignore::WalkBuilder;

use super::error::BundleError;

/// Exported model files keyed by forward-slash relative path.
///
/// Keys are unique; inserting an existing path replaces its content.
/// Iteration is in sorted key order so uploads run in a stable sequence.
///
/// # Example
/// ```
/// use ion_publish::assets::ModelBundle;
///
/// let mut bundle = ModelBundle::new();
/// bundle.insert("model.dae", b"<COLLADA/>".to_vec());
/// bundle.insert("images/tex.png", vec![0x89, b'P', b'N', b'G']);
/// assert_eq!(bundle.len(), 2);
/// assert_eq!(bundle.paths().collect::<Vec<_>>(), ["images/tex.png", "model.dae"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelBundle {
    files: BTreeMap<String, Bytes>,
}

impl ModelBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file under `path`, used verbatim as the key.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Bytes>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&Bytes> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|b| b.len() as u64).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read every regular file under `root` into a bundle.
    ///
    /// Hidden files and ignore files are not consulted; the directory is
    /// taken as the exporter wrote it. Any unreadable entry fails the whole
    /// load, so a bundle is never partial.
    pub fn from_dir(root: &Path) -> Result<Self, BundleError> {
        if !root.is_dir() {
            return Err(BundleError::NotADirectory(root.to_path_buf()));
        }

        let mut builder = WalkBuilder::new(root);
        builder.standard_filters(false);
        builder.follow_links(false);

        let mut bundle = Self::new();
        for entry in builder.build() {
            let entry = entry.map_err(|err| BundleError::Io {
                path: root.to_path_buf(),
                message: err.to_string(),
            })?;
            if !entry
                .file_type()
                .map(|file_type| file_type.is_file())
                .unwrap_or(false)
            {
                continue;
            }
            let path = entry.path();
            let key = relative_key(root, path)?;
            let content = std::fs::read(path).map_err(|err| BundleError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
            bundle.insert(key, content);
        }
        Ok(bundle)
    }
}

impl<K: Into<String>, V: Into<Bytes>> FromIterator<(K, V)> for ModelBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bundle = Self::new();
        for (path, content) in iter {
            bundle.insert(path, content);
        }
        bundle
    }
}

fn relative_key(root: &Path, path: &Path) -> Result<String, BundleError> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part
                .to_str()
                .ok_or_else(|| BundleError::NonUtf8Path(path.to_path_buf()))?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}
