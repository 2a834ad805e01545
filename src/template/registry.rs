use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{CollageError, CollageResult, TemplateFamily};
use crate::template::svg::{ExtractedTemplate, extract_svg};

/// Resolved hexagon-family asset for one member count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetHandle {
    pub member_count: u32,
    pub path: PathBuf,
}

/// Explicit member-count to SVG asset map.
///
/// Built once, either from configured entries or by listing a directory for `<N>.svg` files;
/// lookups never touch the filesystem.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HexTemplateRegistry {
    entries: BTreeMap<u32, PathBuf>,
}

impl HexTemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every `<N>.svg` in `dir`. Other files are ignored.
    pub fn from_dir(dir: impl AsRef<Path>) -> CollageResult<Self> {
        let dir = dir.as_ref();
        let mut out = Self::new();
        let read = std::fs::read_dir(dir)
            .with_context(|| format!("read template dir '{}'", dir.display()))?;
        for entry in read {
            let entry = entry.with_context(|| format!("list template dir '{}'", dir.display()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("svg") {
                continue;
            }
            let Some(n) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            else {
                tracing::debug!(path = %path.display(), "skipping non-numeric template file");
                continue;
            };
            out.entries.insert(n, path);
        }
        tracing::debug!(dir = %dir.display(), templates = out.len(), "loaded hexagon templates");
        Ok(out)
    }

    pub fn insert(&mut self, member_count: u32, path: impl Into<PathBuf>) -> Option<PathBuf> {
        self.entries.insert(member_count, path.into())
    }

    pub fn contains(&self, member_count: u32) -> bool {
        self.entries.contains_key(&member_count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn member_counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn resolve(&self, member_count: u32) -> CollageResult<AssetHandle> {
        self.entries
            .get(&member_count)
            .map(|path| AssetHandle {
                member_count,
                path: path.clone(),
            })
            .ok_or_else(|| CollageError::template_not_found(TemplateFamily::Hexagon, member_count))
    }
}

/// Read and parse a resolved template asset.
pub fn extract(handle: &AssetHandle) -> CollageResult<ExtractedTemplate> {
    let text = std::fs::read_to_string(&handle.path).map_err(|e| {
        CollageError::svg_parse(format!(
            "failed to read template '{}': {e}",
            handle.path.display()
        ))
    })?;
    extract_svg(&text)
}

#[cfg(test)]
#[path = "../../tests/unit/template/registry.rs"]
mod tests;
