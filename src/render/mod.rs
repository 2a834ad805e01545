//! Rasterization of slot layouts and the per-variant render pipeline.

/// Slot filling, photo clipping, and PNG encoding.
pub mod composite;
/// At-most-once variant rendering and the [`Engine`](variant::Engine).
pub mod variant;
