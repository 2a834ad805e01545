//! Photo sources and decoding. All IO happens here, before compositing starts.

/// Image bytes to premultiplied RGBA8.
pub mod decode;
/// Photo sources and the loader trait.
pub mod photo;
