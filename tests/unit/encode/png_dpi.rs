use super::*;

fn fake_png(len: usize) -> Vec<u8> {
    let mut png = PNG_SIGNATURE.to_vec();
    png.extend_from_slice(&13u32.to_be_bytes());
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
    let crc = crc32(&png[12..29]);
    png.extend_from_slice(&crc.to_be_bytes());
    png.resize(len, 0xAB);
    png
}

fn real_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn crc32_reference_vectors() {
    assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    assert_eq!(crc32(b"IEND"), 0xAE42_6082);
    assert_eq!(crc32(b""), 0);
}

#[test]
fn pixels_per_meter_rounds() {
    assert_eq!(pixels_per_meter(300.0).unwrap(), 11811);
    assert_eq!(pixels_per_meter(72.0).unwrap(), 2835);
    assert!(pixels_per_meter(0.0).is_err());
    assert!(pixels_per_meter(f64::INFINITY).is_err());
}

#[test]
fn phys_chunk_layout() {
    let chunk = phys_chunk(300.0).unwrap();
    assert_eq!(&chunk[0..4], &[0, 0, 0, 9]);
    assert_eq!(&chunk[4..8], b"pHYs");
    assert_eq!(&chunk[8..12], &11811u32.to_be_bytes());
    assert_eq!(&chunk[12..16], &11811u32.to_be_bytes());
    assert_eq!(chunk[16], 1);
    assert_eq!(&chunk[17..21], &crc32(&chunk[4..17]).to_be_bytes());
}

#[test]
fn hundred_byte_png_grows_to_121() {
    let png = fake_png(100);
    let out = try_embed_dpi(&png, 300.0).unwrap();
    assert_eq!(out.len(), 121);
    assert_eq!(&out[..33], &png[..33]);
    assert_eq!(&out[33..37], &[0, 0, 0, 9]);
    assert_eq!(&out[37..41], b"pHYs");
    assert_eq!(&out[54..], &png[33..]);
}

#[test]
fn embedded_chunk_reads_back_and_decoders_accept_it() {
    let png = real_png();
    assert_eq!(read_phys(&png), None);

    let out = embed_dpi(png.clone(), 300.0);
    assert_eq!(out.len(), png.len() + PHYS_CHUNK_LEN);
    assert_eq!(read_phys(&out), Some((11811, 11811, 1)));

    let img = image::load_from_memory(&out).unwrap();
    assert_eq!((img.width(), img.height()), (3, 3));
}

#[test]
fn malformed_input_is_rejected_or_passed_through() {
    let short = vec![0x89, b'P'];
    assert!(matches!(
        try_embed_dpi(&short, 300.0),
        Err(CollageError::PngChunkInsertion(_))
    ));
    assert_eq!(embed_dpi(short.clone(), 300.0), short);

    let mut bad_sig = fake_png(60);
    bad_sig[1] = b'X';
    assert!(try_embed_dpi(&bad_sig, 300.0).is_err());
    assert_eq!(embed_dpi(bad_sig.clone(), 300.0), bad_sig);

    let mut bad_ihdr = fake_png(60);
    bad_ihdr[12..16].copy_from_slice(b"IDAT");
    assert!(try_embed_dpi(&bad_ihdr, 300.0).is_err());

    let mut bad_len = fake_png(60);
    bad_len[11] = 12;
    assert!(try_embed_dpi(&bad_len, 300.0).is_err());

    assert!(try_embed_dpi(&fake_png(60), -5.0).is_err());
}
