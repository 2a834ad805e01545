use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;

use crate::assets::decode::{PreparedImage, decode_image};
use crate::foundation::error::{CollageError, CollageResult};

/// Where a member photo (or placeholder) comes from.
///
/// `Uri` accepts `data:` URIs, `http(s)://` URLs (with the `http` feature), `file://` URLs, and
/// plain filesystem paths. Relative paths resolve against the loader's assets root.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PhotoSource {
    Uri(String),
    Bytes(Arc<[u8]>),
}

impl PhotoSource {
    pub fn uri(s: impl Into<String>) -> Self {
        Self::Uri(s.into())
    }

    pub fn bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Short form for logs; never prints embedded payloads.
    pub fn describe(&self) -> String {
        match self {
            Self::Uri(s) if s.starts_with("data:") => {
                format!("data uri ({} bytes)", s.len())
            }
            Self::Uri(s) => s.clone(),
            Self::Bytes(b) => format!("embedded ({} bytes)", b.len()),
        }
    }
}

/// Fetches and decodes photos. Implementations must be shareable across render threads.
pub trait PhotoLoader: Send + Sync {
    fn load(&self, source: &PhotoSource) -> CollageResult<PreparedImage>;
}

/// Loader for embedded bytes, data URIs, local files, and (feature `http`) remote URLs.
#[derive(Clone, Debug)]
pub struct DefaultPhotoLoader {
    assets_root: PathBuf,
    max_bytes: usize,
}

impl DefaultPhotoLoader {
    pub const DEFAULT_MAX_BYTES: usize = 32 * 1024 * 1024;

    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            max_bytes: Self::DEFAULT_MAX_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    fn read_bytes(&self, uri: &str) -> CollageResult<Vec<u8>> {
        if let Some(rest) = uri.strip_prefix("data:") {
            return decode_data_uri(rest);
        }
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.fetch_http(uri);
        }
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        let full = self.resolve_path(path)?;
        let bytes = std::fs::read(&full).map_err(|e| {
            CollageError::image_load(format!("failed to read photo '{}': {e}", full.display()))
        })?;
        Ok(bytes)
    }

    fn resolve_path(&self, path: &str) -> CollageResult<PathBuf> {
        let p = Path::new(path);
        if p.is_absolute() {
            return Ok(p.to_path_buf());
        }
        resolve_under_root(&self.assets_root, path)
    }

    #[cfg(feature = "http")]
    fn fetch_http(&self, url: &str) -> CollageResult<Vec<u8>> {
        let resp = reqwest::blocking::get(url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| CollageError::image_load(format!("fetch '{url}': {e}")))?;
        let bytes = resp
            .bytes()
            .map_err(|e| CollageError::image_load(format!("read body of '{url}': {e}")))?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http"))]
    fn fetch_http(&self, url: &str) -> CollageResult<Vec<u8>> {
        Err(CollageError::image_load(format!(
            "cannot fetch '{url}': built without the `http` feature"
        )))
    }
}

impl PhotoLoader for DefaultPhotoLoader {
    fn load(&self, source: &PhotoSource) -> CollageResult<PreparedImage> {
        let bytes = match source {
            PhotoSource::Bytes(b) => b.to_vec(),
            PhotoSource::Uri(uri) => self.read_bytes(uri.trim())?,
        };
        if bytes.len() > self.max_bytes {
            return Err(CollageError::image_load(format!(
                "photo is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }
        decode_image(&bytes)
    }
}

/// Decode the part of a data URI after `data:` (`[mediatype][;base64],payload`).
pub fn decode_data_uri(rest: &str) -> CollageResult<Vec<u8>> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CollageError::image_load("data uri is missing ','"))?;
    if meta.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CollageError::image_load(format!("invalid base64 data uri: {e}")))
    } else {
        Ok(percent_encoding::percent_decode_str(payload).collect())
    }
}

/// Join a relative photo path onto `root`. Backslashes count as separators; `..` may only
/// undo a directory the path itself entered.
pub fn resolve_under_root(root: &Path, rel: &str) -> CollageResult<PathBuf> {
    let rel = rel.replace('\\', "/");
    let mut out = root.to_path_buf();
    let mut depth = 0usize;
    for comp in Path::new(&rel).components() {
        match comp {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                out.pop();
                depth -= 1;
            }
            Component::ParentDir => {
                return Err(CollageError::image_load(format!(
                    "photo path '{rel}' leaves the assets root"
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(CollageError::image_load(format!(
                    "photo path '{rel}' is not relative"
                )));
            }
        }
    }
    if depth == 0 {
        return Err(CollageError::image_load(format!(
            "photo path '{rel}' names no file"
        )));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/photo.rs"]
mod tests;
