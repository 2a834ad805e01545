use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::compose::assign::Placeholders;
use crate::foundation::error::{CollageError, CollageResult};
use crate::render::composite::CompositeStyle;
use crate::template::grid::GridMetrics;

/// Engine settings. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding `<member_count>.svg` hexagon templates. `None` disables that family.
    pub templates_dir: Option<PathBuf>,
    /// Root for relative photo paths.
    pub assets_root: PathBuf,
    pub placeholders: Placeholders,
    /// Output pixels per view box unit.
    pub scale: f64,
    pub dpi: f64,
    pub grid: GridMetrics,
    pub style: CompositeStyle,
    /// Rayon worker count for variant rendering; `None` uses the global pool.
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            templates_dir: None,
            assets_root: PathBuf::from("."),
            placeholders: Placeholders::default(),
            scale: 2.0,
            dpi: 300.0,
            grid: GridMetrics::default(),
            style: CompositeStyle::default(),
            threads: None,
        }
    }
}

impl EngineConfig {
    pub fn from_path(path: impl AsRef<Path>) -> CollageResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CollageError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        let mut cfg = Self::from_reader(BufReader::new(f))?;
        if let Some(base) = path.parent() {
            cfg.rebase(base);
        }
        Ok(cfg)
    }

    pub fn from_reader(r: impl Read) -> CollageResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| CollageError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CollageResult<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(CollageError::validation("config 'scale' must be > 0"));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(CollageError::validation("config 'dpi' must be > 0"));
        }
        if self.threads == Some(0) {
            return Err(CollageError::validation(
                "config 'threads' must be >= 1 when set",
            ));
        }
        if !(self.style.stroke_width.is_finite() && self.style.stroke_width >= 0.0) {
            return Err(CollageError::validation(
                "config 'style.stroke_width' must be >= 0",
            ));
        }
        self.grid.validate()
    }

    /// Resolve relative directories against the config file's location.
    fn rebase(&mut self, base: &Path) {
        if self.assets_root.is_relative() {
            self.assets_root = base.join(&self.assets_root);
        }
        if let Some(dir) = self.templates_dir.as_mut()
            && dir.is_relative()
        {
            *dir = base.join(&*dir);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
