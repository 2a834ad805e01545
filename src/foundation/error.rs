/// Convenience result type used across the collage engine.
pub type CollageResult<T> = Result<T, CollageError>;

/// Which template family a lookup was made against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateFamily {
    /// Programmatic ring/band grid layouts.
    Grid,
    /// Pre-authored polygon SVG templates.
    Hexagon,
}

impl std::fmt::Display for TemplateFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grid => f.write_str("grid"),
            Self::Hexagon => f.write_str("hexagon"),
        }
    }
}

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum CollageError {
    /// No layout or asset exists for the requested member count.
    #[error("template not found: no {family} template for {member_count} members")]
    TemplateNotFound {
        /// Family that was queried.
        family: TemplateFamily,
        /// Requested border member count.
        member_count: u32,
    },

    /// A template asset exists but could not be parsed.
    #[error("svg parse error: {0}")]
    SvgParse(String),

    /// A single photo could not be fetched or decoded.
    #[error("image load error: {0}")]
    ImageLoad(String),

    /// The drawing surface could not be allocated.
    #[error("canvas context error: {0}")]
    CanvasContext(String),

    /// The PNG byte stream did not have the expected chunk layout.
    #[error("png chunk insertion error: {0}")]
    PngChunkInsertion(String),

    /// Invalid user-provided configuration or request data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CollageError {
    /// Build a [`CollageError::TemplateNotFound`] value.
    pub fn template_not_found(family: TemplateFamily, member_count: u32) -> Self {
        Self::TemplateNotFound {
            family,
            member_count,
        }
    }

    /// Build a [`CollageError::SvgParse`] value.
    pub fn svg_parse(msg: impl Into<String>) -> Self {
        Self::SvgParse(msg.into())
    }

    /// Build a [`CollageError::ImageLoad`] value.
    pub fn image_load(msg: impl Into<String>) -> Self {
        Self::ImageLoad(msg.into())
    }

    /// Build a [`CollageError::CanvasContext`] value.
    pub fn canvas_context(msg: impl Into<String>) -> Self {
        Self::CanvasContext(msg.into())
    }

    /// Build a [`CollageError::PngChunkInsertion`] value.
    pub fn png_chunk(msg: impl Into<String>) -> Self {
        Self::PngChunkInsertion(msg.into())
    }

    /// Build a [`CollageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for errors that mean "no template yet" rather than a broken input.
    pub fn is_template_not_found(&self) -> bool {
        matches!(self, Self::TemplateNotFound { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
