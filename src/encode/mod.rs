//! Post-processing of encoded output.

/// `pHYs` chunk insertion for print resolution.
pub mod png_dpi;
