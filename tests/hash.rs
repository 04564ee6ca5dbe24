//! Digest algorithms against published test vectors.

use rstest::rstest;

use romkit::hash::{self, Algorithm, Hash};

const FOX: &str = "The quick brown fox jumps over the lazy dog";

#[rstest]
#[case(Algorithm::Crc32, "", "00000000")]
#[case(Algorithm::Crc32, "abc", "352441c2")]
#[case(Algorithm::Crc32, FOX, "414fa339")]
#[case(Algorithm::Md5, "", "d41d8cd98f00b204e9800998ecf8427e")]
#[case(Algorithm::Md5, "abc", "900150983cd24fb0d6963f7d28e17f72")]
#[case(Algorithm::Md5, FOX, "9e107d9d372bb6826bd81d3542a419d6")]
#[case(Algorithm::Sha1, "", "da39a3ee5e6b4b0d3255bfef95601890afd80709")]
#[case(Algorithm::Sha1, "abc", "a9993e364706816aba3e25717850c26c9cd0d89d")]
#[case(Algorithm::Sha1, FOX, "2fd4e1c67a2d28fced849ee1bb76e7391b93eb12")]
#[case(
    Algorithm::Sha256,
    "",
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
)]
#[case(
    Algorithm::Sha256,
    "abc",
    "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
)]
#[case(
    Algorithm::Sha256,
    FOX,
    "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592"
)]
#[case(
    Algorithm::Sha512,
    "",
    "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
     47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
)]
fn known_digests(#[case] algorithm: Algorithm, #[case] input: &str, #[case] expected: &str) {
    let digest = hash::digest(algorithm, input.as_bytes());
    assert_eq!(digest.len(), algorithm.digest_len());
    assert_eq!(hex::encode(digest), expected);
}

#[rstest]
fn streaming_matches_one_shot(
    #[values(
        Algorithm::Crc32,
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha256,
        Algorithm::Sha512
    )]
    algorithm: Algorithm,
) {
    // split inside a multi-byte character
    let text = "Größe: 1/2 ½ ∑ 🦀".as_bytes();
    let mut h = Hash::new(algorithm);
    assert_eq!(h.algorithm(), algorithm);
    for chunk in text.chunks(3) {
        h.update(chunk);
    }
    assert_eq!(h.finish(), hash::digest(algorithm, text));
}

#[test]
fn crc32_is_big_endian() {
    assert_eq!(
        hash::digest(Algorithm::Crc32, b"abc"),
        0x3524_41C2u32.to_be_bytes()
    );
}
