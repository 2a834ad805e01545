use std::sync::LazyLock;

use crate::foundation::error::{CollageError, CollageResult};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Signature (8) + IHDR length/type (8) + IHDR data (13) + CRC (4).
pub const IHDR_END: usize = 33;

/// Size of the serialized `pHYs` chunk: length (4) + type (4) + payload (9) + CRC (4).
pub const PHYS_CHUNK_LEN: usize = 21;

const INCHES_PER_METER: f64 = 39.3701;

static CRC_TABLE: LazyLock<[u32; 256]> = LazyLock::new(|| {
    let mut table = [0u32; 256];
    for (n, slot) in table.iter_mut().enumerate() {
        let mut c = n as u32;
        for _ in 0..8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
        }
        *slot = c;
    }
    table
});

/// PNG/zlib CRC-32 (reflected, polynomial `0xEDB88320`).
pub fn crc32(bytes: &[u8]) -> u32 {
    let table = &*CRC_TABLE;
    let mut c = 0xFFFF_FFFFu32;
    for &b in bytes {
        c = table[((c ^ u32::from(b)) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}

/// Pixels per meter for a DPI value, as stored in `pHYs`.
pub fn pixels_per_meter(dpi: f64) -> CollageResult<u32> {
    let ppm = (dpi * INCHES_PER_METER).round();
    if !dpi.is_finite() || dpi <= 0.0 || ppm < 1.0 || ppm > f64::from(u32::MAX) {
        return Err(CollageError::png_chunk(format!("unusable dpi {dpi}")));
    }
    Ok(ppm as u32)
}

/// Serialized `pHYs` chunk with the same density on both axes, unit = meter.
pub fn phys_chunk(dpi: f64) -> CollageResult<[u8; PHYS_CHUNK_LEN]> {
    let ppm = pixels_per_meter(dpi)?.to_be_bytes();

    let mut out = [0u8; PHYS_CHUNK_LEN];
    out[0..4].copy_from_slice(&9u32.to_be_bytes());
    out[4..8].copy_from_slice(b"pHYs");
    out[8..12].copy_from_slice(&ppm);
    out[12..16].copy_from_slice(&ppm);
    out[16] = 1;
    let crc = crc32(&out[4..17]);
    out[17..21].copy_from_slice(&crc.to_be_bytes());
    Ok(out)
}

/// Insert a `pHYs` chunk right after IHDR.
///
/// Only the signature and the IHDR header are checked; the rest of the stream is copied as is.
pub fn try_embed_dpi(png: &[u8], dpi: f64) -> CollageResult<Vec<u8>> {
    if png.len() < IHDR_END {
        return Err(CollageError::png_chunk(format!(
            "png is {} bytes, shorter than signature + IHDR",
            png.len()
        )));
    }
    if png[..8] != PNG_SIGNATURE {
        return Err(CollageError::png_chunk("missing png signature"));
    }
    if png[8..12] != 13u32.to_be_bytes() || &png[12..16] != b"IHDR" {
        return Err(CollageError::png_chunk("first chunk is not a 13-byte IHDR"));
    }

    let chunk = phys_chunk(dpi)?;
    let mut out = Vec::with_capacity(png.len() + PHYS_CHUNK_LEN);
    out.extend_from_slice(&png[..IHDR_END]);
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&png[IHDR_END..]);
    Ok(out)
}

/// Like [`try_embed_dpi`], but hands back the input unchanged when it cannot be patched.
pub fn embed_dpi(png: Vec<u8>, dpi: f64) -> Vec<u8> {
    match try_embed_dpi(&png, dpi) {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(error = %e, dpi, "leaving png without physical resolution");
            png
        }
    }
}

/// First `pHYs` chunk of a PNG as `(x_ppu, y_ppu, unit)`.
pub fn read_phys(png: &[u8]) -> Option<(u32, u32, u8)> {
    if png.get(..8)? != PNG_SIGNATURE {
        return None;
    }
    let mut pos = 8;
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().ok()?) as usize;
        let kind = &png[pos + 4..pos + 8];
        let data = png.get(pos + 8..pos + 8 + len)?;
        if kind == b"pHYs" && len == 9 {
            let x = u32::from_be_bytes(data[0..4].try_into().ok()?);
            let y = u32::from_be_bytes(data[4..8].try_into().ok()?);
            return Some((x, y, data[8]));
        }
        if kind == b"IDAT" || kind == b"IEND" {
            return None;
        }
        pos += 12 + len;
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png_dpi.rs"]
mod tests;
