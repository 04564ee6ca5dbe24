//! DDS header parsing and mip 0 decoding.

mod common;

use std::io::Cursor;

use common::{DDSD_LINEARSIZE, DDSD_PITCH, dds_dx10, dds_fourcc, dds_masks};
use rstest::rstest;

use romkit::Error;
use romkit::formats::dds::Dds;
use romkit::texture::pixel_format::dxgi;

/// One BC2 block: every alpha nibble 8, both endpoints 0x7BEF, index 0.
fn bc2_block() -> Vec<u8> {
    let mut b = vec![0x88; 8];
    b.extend_from_slice(&[0xEF, 0x7B, 0xEF, 0x7B, 0, 0, 0, 0]);
    b
}

fn open(bytes: Vec<u8>) -> Dds<Cursor<Vec<u8>>> {
    Dds::open(Cursor::new(bytes)).unwrap()
}

#[test]
fn parsing_is_repeatable() {
    let bytes = dds_fourcc(4, 4, b"DXT1", &[0; 8]);
    let a = open(bytes.clone());
    let b = open(bytes);
    assert_eq!(a.header, b.header);
    assert_eq!(a.pixel_format(), b.pixel_format());
    assert_eq!((a.width(), a.height()), (4, 4));
    assert_eq!(a.data_offset(), 128);
}

#[test]
fn premultiplied_bc2_is_unpremultiplied() {
    let mut dxt2 = open(dds_fourcc(4, 4, b"DXT2", &bc2_block()));
    let mut dxt3 = open(dds_fourcc(4, 4, b"DXT3", &bc2_block()));
    let p2 = dxt2.image(0).unwrap().pixel(0, 0).unwrap();
    let p3 = dxt3.image(0).unwrap().pixel(0, 0).unwrap();
    assert_eq!(p2 >> 24, 0x88);
    assert_eq!(p3 >> 24, 0x88);
    assert_ne!(p2, p3);
    // straight alpha leaves the colour at its endpoint value
    assert!((p2 & 0xFF) > (p3 & 0xFF));
}

#[test]
fn wrong_header_size_is_rejected() {
    let mut bytes = dds_fourcc(4, 4, b"DXT1", &[0; 8]);
    bytes[4..8].copy_from_slice(&100u32.to_le_bytes());
    assert!(matches!(
        Dds::open(Cursor::new(bytes)),
        Err(Error::BadStructSize {
            expected: 124,
            got: 100
        })
    ));
}

#[test]
fn reserved_dxgi_format_is_rejected() {
    let bytes = dds_dx10(4, 4, dxgi::FAKE_START, 0, false, &[0; 64]);
    assert!(matches!(
        Dds::open(Cursor::new(bytes)),
        Err(Error::UnsupportedFormat)
    ));
}

const ARGB_MASKS: [u32; 4] = [0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000];
const QUAD: [[u32; 2]; 2] = [[0xFFFF_0000, 0xFF00_FF00], [0xFF00_00FF, 0x80FF_FFFF]];

/// 2x2 ARGB8888 rows, each followed by `pad` filler bytes.
fn quad_rows(pad: usize) -> Vec<u8> {
    let mut data = Vec::new();
    for row in QUAD {
        for px in row {
            data.extend_from_slice(&px.to_le_bytes());
        }
        data.extend(std::iter::repeat_n(0xAA, pad));
    }
    data
}

#[rstest]
#[case::tight(0, 0)]
#[case::exact(8, 0)]
#[case::padded(12, 4)]
fn linear_image_honours_pitch(#[case] pitch: u32, #[case] pad: usize) {
    let mut dds = open(dds_masks(2, 2, pitch, 0x41, 32, ARGB_MASKS, &quad_rows(pad)));
    assert_eq!(dds.pixel_format().unwrap().name(), "ARGB8888");
    let img = dds.image(0).unwrap();
    assert_eq!(img.pixels(), QUAD.as_flattened());
}

#[test]
fn linear_size_is_divided_by_height() {
    let mut bytes = dds_masks(2, 2, 24, 0x41, 32, ARGB_MASKS, &quad_rows(4));
    let flags = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    let flags = (flags & !DDSD_PITCH) | DDSD_LINEARSIZE;
    bytes[8..12].copy_from_slice(&flags.to_le_bytes());

    let mut dds = open(bytes);
    assert_eq!(dds.image(0).unwrap().pixels(), QUAD.as_flattened());
}

#[test]
fn implausible_pitch_is_rejected() {
    // 4 pixels wide allows at most 64 bytes per row
    let mut dds = open(dds_masks(4, 1, 128, 0x41, 32, ARGB_MASKS, &[0; 128]));
    assert!(matches!(dds.image(0), Err(Error::OutOfRange)));
}

#[test]
fn pitch_narrower_than_a_row_is_rejected() {
    let mut dds = open(dds_masks(4, 1, 8, 0x41, 32, ARGB_MASKS, &[0; 16]));
    assert!(matches!(dds.image(0), Err(Error::OutOfRange)));
}

#[test]
fn short_image_data_is_a_size_mismatch() {
    let mut dds = open(dds_fourcc(8, 8, b"DXT1", &[0; 24]));
    assert!(matches!(
        dds.image(0),
        Err(Error::SizeMismatch {
            expected: 32,
            got: 24
        })
    ));
}

#[test]
fn only_the_first_mip_is_decoded() {
    let mut dds = open(dds_fourcc(4, 4, b"DXT1", &[0; 8]));
    assert!(dds.image(0).is_ok());
    assert!(matches!(dds.image(1), Err(Error::OutOfRange)));
}

#[test]
fn image_is_cached_after_close() {
    let mut dds = open(dds_fourcc(4, 4, b"DXT5", &[0xFF; 16]));
    let first = dds.image(0).unwrap().clone();
    dds.close();
    assert_eq!(dds.image(0).unwrap(), &first);
}

#[test]
fn unknown_fourcc_cannot_be_decoded() {
    let mut dds = open(dds_fourcc(4, 4, b"ZZZZ", &[0; 8]));
    assert!(dds.pixel_format().is_none());
    assert_eq!(dds.fields().get("Pixel Format").unwrap().to_string(), "ZZZZ");
    assert!(matches!(dds.image(0), Err(Error::UnsupportedFormat)));
}

#[test]
fn dx10_fields_name_the_dxgi_format() {
    let dds = open(dds_dx10(4, 4, dxgi::BC7_UNORM, 0, false, &[0; 16]));
    let fields = dds.fields();
    assert_eq!(
        fields.get("DX10 Format").unwrap().to_string(),
        "BC7_UNORM"
    );
    assert!(fields.get("Tile Mode").is_none());
}

#[test]
fn xbox_header_is_parsed() {
    let mut dds = open(dds_dx10(4, 4, dxgi::BC1_UNORM, 0, true, &[0; 8]));
    assert_eq!(dds.data_offset(), 128 + 20 + 16);
    let xbox = dds.xbox.unwrap();
    assert_eq!(xbox.tile_mode, 14);
    assert_eq!(xbox.data_size, 8);

    let fields = dds.fields();
    assert_eq!(fields.get("Tile Mode").unwrap().to_string(), "14");
    assert_eq!(fields.get("Base Alignment").unwrap().to_string(), "512");
    assert_eq!(fields.get("XDK Version").unwrap().to_string(), "0x2AC1");
    assert!(dds.image(0).is_ok());
}
