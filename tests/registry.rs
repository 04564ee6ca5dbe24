//! Format detection and the generic container.

mod common;

use std::io::{Cursor, Write};

use common::{DECRYPTED, KtxSpec, NeSpec, dds_fourcc, ktx_file, nds_rom, ne_exe, rgba};
use rstest::rstest;
use tempfile::Builder;

use romkit::Error;
use romkit::formats::{self, Container, DetectionInfo, FormatId};

fn ktx_sample() -> Vec<u8> {
    let level = rgba(&[[1, 2, 3, 4]]);
    ktx_file(&KtxSpec {
        levels: &[&level[..]],
        ..Default::default()
    })
}

fn ne_sample() -> Vec<u8> {
    ne_exe(&NeSpec {
        entry_table: vec![0],
        module_name: "SAMPLE",
        ..Default::default()
    })
}

#[rstest]
#[case::nds(nds_rom(0x8000, 0x8000, DECRYPTED), FormatId::Nds)]
#[case::dds(dds_fourcc(4, 4, b"DXT1", &[0; 8]), FormatId::Dds)]
#[case::ktx(ktx_sample(), FormatId::Ktx)]
#[case::ne(ne_sample(), FormatId::Ne)]
fn formats_are_detected(#[case] bytes: Vec<u8>, #[case] expected: FormatId) {
    let info = DetectionInfo {
        header: &bytes[..bytes.len().min(formats::PROBE_SIZE as usize)],
        file_size: bytes.len() as u64,
        ext: None,
    };
    assert_eq!(formats::detect(&info), Some(expected));

    let container = formats::open(Cursor::new(bytes)).unwrap();
    assert_eq!(container.id(), expected);
}

#[test]
fn unknown_data_is_not_detected() {
    let bytes = vec![0x42; 0x200];
    let info = DetectionInfo {
        header: &bytes,
        file_size: bytes.len() as u64,
        ext: Some("bin"),
    };
    assert_eq!(formats::detect(&info), None);
    assert!(matches!(
        formats::open(Cursor::new(bytes)),
        Err(Error::UnsupportedFormat)
    ));
}

#[test]
fn empty_file_is_not_detected() {
    assert!(matches!(
        formats::open(Cursor::new(Vec::new())),
        Err(Error::UnsupportedFormat)
    ));
}

#[test]
fn texture_containers_decode_images() {
    let mut c = formats::open(Cursor::new(ktx_sample())).unwrap();
    assert!(matches!(c, Container::Ktx(_)));
    let img = c.image(0).unwrap();
    assert_eq!(img.pixels(), &[0x0401_0203]);
    assert!(!c.fields().is_empty());
    c.close();
    // decoded levels survive close
    assert!(c.image(0).is_ok());
}

#[test]
fn executables_have_no_image() {
    let mut c = formats::open(Cursor::new(ne_sample())).unwrap();
    assert!(matches!(c.image(0), Err(Error::UnsupportedOperation)));
    assert_eq!(
        c.fields().get("Module Name").unwrap().to_string(),
        "SAMPLE"
    );
}

#[test]
fn open_path_reads_from_disk() {
    let mut tmp = Builder::new().suffix(".NDS").tempfile().unwrap();
    tmp.write_all(&nds_rom(0x8000, 0x8000, DECRYPTED)).unwrap();
    tmp.flush().unwrap();

    let mut c = formats::open_path(tmp.path()).unwrap();
    assert_eq!(c.id(), FormatId::Nds);
    assert_eq!(c.id().to_string(), "Nintendo DS ROM");
    assert_eq!(c.fields().get("Title").unwrap().to_string(), "ROMKITTEST");
}

#[test]
fn missing_file_maps_to_enoent() {
    let dir = tempfile::tempdir().unwrap();
    let err = formats::open_path(dir.path().join("absent.ktx")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.errno(), -2);
}
