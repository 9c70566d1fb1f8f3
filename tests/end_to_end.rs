//! Builds a complete synthetic CR2 byte buffer by hand (TIFF/CR2 header,
//! raw IFD with a strip + slice layout, an embedded lossless-JPEG blob) and
//! drives it through the public `parse_container` + `decode_scan` API,
//! exactly the path the CLI binary takes.
use cr2_raw::errors::DecodeErrors;
use cr2_raw::{decode_scan, parse_container};

fn write_ifd_entry(buf: &mut [u8], at: usize, tag: u16, field_type: u16, count: u32, value: u32)
{
    buf[at..at + 2].copy_from_slice(&tag.to_le_bytes());
    buf[at + 2..at + 4].copy_from_slice(&field_type.to_le_bytes());
    buf[at + 4..at + 8].copy_from_slice(&count.to_le_bytes());
    buf[at + 8..at + 12].copy_from_slice(&value.to_le_bytes());
}

/// A minimal embedded lossless-JPEG blob: SOI, a two-code DHT, an SOF3 for a
/// 4x1 single-component scan, SOS, then an entropy stream that decodes (per
/// the worked minimal scenario) to `[128, 129, 129, 128]`.
fn build_jpeg_blob() -> Vec<u8>
{
    let mut blob = vec![0xFFu8, 0xD8];

    // DHT: two codes of length 1 -> symbols 0 and 1.
    blob.extend_from_slice(&[0xFF, 0xC4]);
    blob.extend_from_slice(&21u16.to_be_bytes());
    blob.push(0x00);
    blob.extend_from_slice(&[2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    blob.extend_from_slice(&[0, 1]);

    // SOF3: 8-bit precision, 1 line, 4 samples per line, 1 component.
    blob.extend_from_slice(&[0xFF, 0xC3]);
    blob.extend_from_slice(&11u16.to_be_bytes());
    blob.push(8);
    blob.extend_from_slice(&1u16.to_be_bytes());
    blob.extend_from_slice(&4u16.to_be_bytes());
    blob.push(1);
    blob.extend_from_slice(&[1, 0x11, 0]);

    // SOS: one component, predictor selector 1.
    blob.extend_from_slice(&[0xFF, 0xDA]);
    blob.extend_from_slice(&8u16.to_be_bytes());
    blob.push(1);
    blob.extend_from_slice(&[1, 0x00]);
    blob.extend_from_slice(&[1, 0, 0]);

    // Entropy stream: categories [0,1,0,1] -> diffs [0,1,0,-1].
    blob.extend_from_slice(&[0b0110_1001, 0xFF, 0xD9]);

    blob
}

fn build_synthetic_cr2() -> Vec<u8>
{
    let mut buf = Vec::new();

    buf.extend_from_slice(b"II");
    buf.extend_from_slice(&42u16.to_le_bytes());
    let ifd0_offset_pos = buf.len();
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(b"CR");
    buf.push(2);
    buf.push(0);
    let raw_ifd_offset_pos = buf.len();
    buf.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(buf.len(), 16);

    // IFD0: empty, just enough to satisfy the chain the sensor-info reader
    // walks best-effort.
    let ifd0_offset = buf.len() as u32;
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf[ifd0_offset_pos..ifd0_offset_pos + 4].copy_from_slice(&ifd0_offset.to_le_bytes());

    let raw_ifd_offset = buf.len() as u32;
    buf.extend_from_slice(&3u16.to_le_bytes());
    let entries_pos = buf.len();
    buf.extend(std::iter::repeat(0u8).take(3 * 12 + 4));

    let slice_data_offset = buf.len() as u32;
    for v in [1u16, 4, 0]
    {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    let jpeg_blob = build_jpeg_blob();
    let strip_offset = buf.len() as u32;
    let strip_len = jpeg_blob.len() as u32;
    buf.extend_from_slice(&jpeg_blob);

    write_ifd_entry(&mut buf, entries_pos, 273, 4, 1, strip_offset);
    write_ifd_entry(&mut buf, entries_pos + 12, 279, 4, 1, strip_len);
    write_ifd_entry(&mut buf, entries_pos + 24, 50752, 3, 3, slice_data_offset);

    buf[raw_ifd_offset_pos..raw_ifd_offset_pos + 4].copy_from_slice(&raw_ifd_offset.to_le_bytes());

    buf
}

#[test]
fn synthetic_cr2_decodes_through_the_public_api()
{
    let bytes = build_synthetic_cr2();
    let params = parse_container(&bytes).unwrap();

    assert_eq!(params.image_width, 4);
    assert_eq!(params.image_height, 1);
    assert_eq!(params.predictor_bits, 8);
    assert_eq!((params.slices.n, params.slices.w_common, params.slices.w_last), (1, 4, 0));

    let image = decode_scan(&params).unwrap();

    assert_eq!(image.samples(), &[128, 129, 129, 128]);
}

#[test]
fn non_tiff_file_is_rejected_before_decode()
{
    let bytes = vec![0u8; 64];
    assert!(matches!(parse_container(&bytes), Err(DecodeErrors::MalformedContainer(_))));
}

#[test]
fn truncated_strip_range_is_rejected()
{
    let mut bytes = build_synthetic_cr2();
    bytes.truncate(bytes.len() - 4);

    match parse_container(&bytes)
    {
        Err(DecodeErrors::MalformedContainer(_)) =>
        {}
        other => panic!("expected MalformedContainer from a truncated strip, got {other:?}"),
    }
}
