use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use hachiman::{
    CodecConfig, DecodePolicy, HuffmanError, ImageCodec, ImageContainer, RawImage, TextArchive,
    TextCodec,
};

fn noisy_gradient(width: u32, height: u32, channels: u32) -> RawImage {
    let mut seed = 0x2545_f491u32;
    let pixels = (0..width * height * channels)
        .map(|i| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let base = (i / channels) % width * 255 / width;
            (base as u8).wrapping_add((seed % 5) as u8)
        })
        .collect();
    RawImage::new(pixels, width, height, channels).unwrap()
}

#[test]
fn image_container_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.huff");
    let image = noisy_gradient(32, 24, 3);
    let codec = ImageCodec::new(CodecConfig::new().with_verify_roundtrip(true));

    let mut writer = BufWriter::new(File::create(&path).unwrap());
    let encoding = codec.write_container(&image, &mut writer).unwrap();
    writer.flush().unwrap();
    drop(writer);

    assert!(encoding.stats.reduction_percent() > 0.0);
    assert!(encoding.report().iter().all(|row| row.symbol <= 510));

    let mut reader = BufReader::new(File::open(&path).unwrap());
    let restored = codec.read_container(&mut reader).unwrap();
    assert_eq!(restored, image);
}

#[test]
fn image_container_rejects_foreign_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not-ours.bin");
    std::fs::write(&path, b"\x00\x00\x00\x04\x00P\x00K").unwrap();

    let mut reader = BufReader::new(File::open(&path).unwrap());
    match ImageCodec::default().read_container(&mut reader) {
        Err(HuffmanError::UnsupportedFormatTag(tag)) => assert_eq!(tag, "PK"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn corrupted_bits_are_not_silently_accepted() {
    let image = noisy_gradient(8, 8, 1);
    let mut container = ImageCodec::default().compress(&image).unwrap().to_container();
    container.bits.truncate(container.bits.len() - 1);

    let strict = ImageCodec::new(CodecConfig::new().with_decode_policy(DecodePolicy::Strict));
    assert!(strict.decompress(&container).is_err());

    let mut bad = ImageContainer {
        tree_text: "IL255:3.".into(),
        ..container
    };
    assert!(matches!(
        strict.decompress(&bad),
        Err(HuffmanError::SerializationParse { .. })
    ));
    bad.tree_text = String::new();
    assert!(strict.decompress(&bad).is_err());
}

#[test]
fn text_archive_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let input = "It was a bright cold day in April, and the clocks were striking thirteen.\n";
    let codec = TextCodec::default();

    let encoding = codec.compress(input.as_bytes()).unwrap();
    std::fs::write(&path, encoding.archive().to_string()).unwrap();

    let archive: TextArchive = std::fs::read_to_string(&path).unwrap().parse().unwrap();
    assert_eq!(archive.bits, encoding.bits);
    assert_eq!(codec.decompress_archive(&archive).unwrap(), input.as_bytes());
}
