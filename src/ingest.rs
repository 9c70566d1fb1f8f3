//! Parses a CR2 file's TIFF/EXIF/MakerNote container and the embedded
//! lossless-JPEG segments into a [`ScanParams`] bundle for the core decoder.
//!
//! All multi-byte fields inside the TIFF/EXIF/MakerNote structures are
//! little-endian (CR2's only supported byte order); all multi-byte fields
//! inside the embedded JPEG segments are big-endian, per the JPEG standard.
//! The two readers below are kept separate on purpose so a stray
//! endianness mixup shows up as a type error, not a silent bug.
use crate::errors::DecodeErrors;
use crate::scan_params::{HuffmanTableDef, ScanParams, SensorBorder, SliceLayout};

const TAG_STRIP_OFFSET: u16 = 273;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_EXIF_IFD: u16 = 34665;
const TAG_MAKER_NOTE: u16 = 37500;
const TAG_CR2_SLICE: u16 = 50752;
const TAG_SENSOR_INFO: u16 = 224;

fn read_u16_le(bytes: &[u8], at: usize) -> Result<u16, DecodeErrors>
{
    let slice = bytes
        .get(at..at + 2)
        .ok_or_else(|| DecodeErrors::MalformedContainer(format!("truncated little-endian u16 at offset {at}")))?;

    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

fn read_u32_le(bytes: &[u8], at: usize) -> Result<u32, DecodeErrors>
{
    let slice = bytes
        .get(at..at + 4)
        .ok_or_else(|| DecodeErrors::MalformedContainer(format!("truncated little-endian u32 at offset {at}")))?;

    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_u16_be(bytes: &[u8], at: usize) -> Result<u16, DecodeErrors>
{
    let slice = bytes
        .get(at..at + 2)
        .ok_or_else(|| DecodeErrors::MalformedContainer(format!("truncated big-endian u16 at offset {at}")))?;

    Ok(u16::from_be_bytes([slice[0], slice[1]]))
}

/// One decoded TIFF IFD entry: `(tag, type, count, value_or_offset)`. The
/// last field is the raw 4-byte payload, which is either the value itself
/// (when it fits) or an offset to the value, depending on `type`/`count`;
/// the caller decides which, same as any TIFF reader must.
#[derive(Clone, Copy, Debug)]
struct IfdEntry
{
    tag:             u16,
    field_type:      u16,
    count:           u32,
    value_or_offset: u32,
}

/// Walk one IFD at byte offset `at`: a `u16` entry count, that many 12-byte
/// entries, then a 4-byte offset to the next IFD (ignored here since CR2's
/// relevant IFDs are referenced directly by tag, not by chain walking).
fn read_ifd(bytes: &[u8], at: usize) -> Result<Vec<IfdEntry>, DecodeErrors>
{
    let entry_count = read_u16_le(bytes, at)? as usize;
    let mut entries = Vec::with_capacity(entry_count);

    for i in 0..entry_count
    {
        let base = at + 2 + i * 12;

        entries.push(IfdEntry {
            tag:             read_u16_le(bytes, base)?,
            field_type:      read_u16_le(bytes, base + 2)?,
            count:           read_u32_le(bytes, base + 4)?,
            value_or_offset: read_u32_le(bytes, base + 8)?,
        });
    }

    Ok(entries)
}

fn find_tag(entries: &[IfdEntry], tag: u16) -> Option<IfdEntry>
{
    entries.iter().find(|e| e.tag == tag).copied()
}

/// Type size in bytes for the TIFF field types this parser cares about
/// (`3` = SHORT, `4` = LONG).
fn field_type_size(field_type: u16) -> usize
{
    match field_type
    {
        3 => 2,
        4 => 4,
        _ => 1,
    }
}

/// Read an entry's data as an array of `u16`s, resolving the inline-vs-
/// offset distinction TIFF entries require: a value fits inline in the
/// 4-byte `value_or_offset` field only if `count * type_size <= 4`.
fn read_short_array(bytes: &[u8], entry: &IfdEntry) -> Result<Vec<u16>, DecodeErrors>
{
    let byte_len = entry.count as usize * field_type_size(entry.field_type);
    let mut out = Vec::with_capacity(entry.count as usize);

    if byte_len <= 4
    {
        let inline = entry.value_or_offset.to_le_bytes();
        for i in 0..entry.count as usize
        {
            out.push(u16::from_le_bytes([inline[i * 2], inline[i * 2 + 1]]));
        }
    }
    else
    {
        let offset = entry.value_or_offset as usize;
        for i in 0..entry.count as usize
        {
            out.push(read_u16_le(bytes, offset + i * 2)?);
        }
    }

    Ok(out)
}

/// Parse the CR2 container: the TIFF/CR2 header, the raw IFD (strip
/// location and slice layout), the MakerNote `SensorInfo` border fields,
/// and the embedded lossless-JPEG segments (SOI/DHT/SOF3/SOS), yielding the
/// parameter bundle the core decoder consumes.
pub fn parse_container(bytes: &[u8]) -> Result<ScanParams, DecodeErrors>
{
    if bytes.len() < 16 || &bytes[0..2] != b"II"
    {
        return Err(DecodeErrors::MalformedContainer(
            "not a little-endian TIFF/CR2 file (missing 'II' byte-order mark)".to_string(),
        ));
    }

    if read_u16_le(bytes, 2)? != 42
    {
        return Err(DecodeErrors::MalformedContainer("TIFF magic number 42 not found".to_string()));
    }

    if &bytes[8..10] != b"CR" || bytes[10] != 2
    {
        return Err(DecodeErrors::MalformedContainer("CR2 magic/version not found at offset 8".to_string()));
    }

    let ifd0_offset = read_u32_le(bytes, 4)? as usize;
    let raw_ifd_offset = read_u32_le(bytes, 12)? as usize;

    info!("CR2 container recognised, ifd0 at {}, raw IFD at {}", ifd0_offset, raw_ifd_offset);

    let raw_ifd = read_ifd(bytes, raw_ifd_offset)?;

    let strip_offset_entry = find_tag(&raw_ifd, TAG_STRIP_OFFSET)
        .ok_or_else(|| DecodeErrors::MalformedContainer("raw IFD missing StripOffset (273)".to_string()))?;
    let strip_bytes_entry = find_tag(&raw_ifd, TAG_STRIP_BYTE_COUNTS)
        .ok_or_else(|| DecodeErrors::MalformedContainer("raw IFD missing StripByteCounts (279)".to_string()))?;
    let slice_entry = find_tag(&raw_ifd, TAG_CR2_SLICE)
        .ok_or_else(|| DecodeErrors::MalformedContainer("raw IFD missing CR2Slice (50752)".to_string()))?;

    let strip_offset = strip_offset_entry.value_or_offset as usize;
    let strip_byte_count = strip_bytes_entry.value_or_offset as usize;
    let slice_values = read_short_array(bytes, &slice_entry)?;

    if slice_values.len() != 3
    {
        return Err(DecodeErrors::MalformedContainer(format!(
            "CR2Slice tag carried {} values, expected 3",
            slice_values.len()
        )));
    }

    let slices = SliceLayout { n: slice_values[0], w_common: slice_values[1], w_last: slice_values[2] };

    let strip = bytes.get(strip_offset..strip_offset + strip_byte_count).ok_or_else(|| {
        DecodeErrors::MalformedContainer(format!(
            "strip range [{}, {}) exceeds file length {}",
            strip_offset,
            strip_offset + strip_byte_count,
            bytes.len()
        ))
    })?;

    let sensor_border = read_sensor_info(bytes, ifd0_offset).unwrap_or_else(|e| {
        warn!("no usable MakerNote SensorInfo found: {:?}", e);
        None
    });

    let (predictor_bits, image_width, image_height, huffman, scan_bytes) = parse_jpeg_segments(strip)?;

    slices.validate(image_width)?;

    info!(
        "scan accepted: {}x{}, {} bit samples, slices ({}, {}, {})",
        image_width, image_height, predictor_bits, slices.n, slices.w_common, slices.w_last
    );

    Ok(ScanParams { image_width, image_height, slices, huffman, predictor_bits, scan_bytes, sensor_border })
}

/// Walk IFD0 -> ExifIFD -> Canon MakerNote -> `SensorInfo` (tag 224) to
/// recover the border fields. Entirely best-effort: any failure here is
/// reported to the caller as an `Option::None` via a warning, never fatal,
/// since the core decode path never consumes these fields.
fn read_sensor_info(bytes: &[u8], ifd0_offset: usize) -> Result<Option<SensorBorder>, DecodeErrors>
{
    let ifd0 = read_ifd(bytes, ifd0_offset)?;

    let Some(exif_entry) = find_tag(&ifd0, TAG_EXIF_IFD)
    else
    {
        return Ok(None);
    };

    let exif_ifd = read_ifd(bytes, exif_entry.value_or_offset as usize)?;

    let Some(maker_note_entry) = find_tag(&exif_ifd, TAG_MAKER_NOTE)
    else
    {
        return Ok(None);
    };

    let maker_note = read_ifd(bytes, maker_note_entry.value_or_offset as usize)?;

    let Some(sensor_info_entry) = find_tag(&maker_note, TAG_SENSOR_INFO)
    else
    {
        return Ok(None);
    };

    let values = read_short_array(bytes, &sensor_info_entry)?;

    if values.len() < 9
    {
        return Ok(None);
    }

    Ok(Some(SensorBorder {
        top_border:    values[5],
        left_border:   values[6],
        bottom_border: values[7],
        right_border:  values[8],
    }))
}

/// Walk the embedded lossless-JPEG blob's marker segments: `SOI`, `DHT`,
/// `SOF3`, `SOS`. Everything from the byte after SOS to the end of the
/// strip is the entropy-coded scan.
fn parse_jpeg_segments(strip: &[u8]) -> Result<(u8, u32, u32, HuffmanTableDef, Vec<u8>), DecodeErrors>
{
    if strip.len() < 2 || strip[0] != 0xFF || strip[1] != 0xD8
    {
        return Err(DecodeErrors::MalformedContainer("embedded JPEG blob missing SOI marker".to_string()));
    }

    let mut pos = 2usize;
    let mut huffman: Option<HuffmanTableDef> = None;
    let mut predictor_bits: Option<u8> = None;
    let mut image_width: Option<u32> = None;
    let mut image_height: Option<u32> = None;

    loop
    {
        if pos + 1 >= strip.len() || strip[pos] != 0xFF
        {
            return Err(DecodeErrors::MalformedContainer(format!(
                "expected a marker at byte offset {pos} inside the embedded JPEG blob"
            )));
        }

        let marker = strip[pos + 1];
        pos += 2;

        match marker
        {
            0xC4 =>
            {
                // DHT: 2-byte length, 1-byte table class/id, 16 counts, then
                // the value list.
                let length = read_u16_be(strip, pos)? as usize;
                let mut counts = [0u16; 16];

                for (i, count) in counts.iter_mut().enumerate()
                {
                    let byte = strip.get(pos + 3 + i).copied().ok_or_else(|| {
                        DecodeErrors::MalformedContainer(format!("DHT segment truncated before count byte {i}"))
                    })?;
                    *count = u16::from(byte);
                }

                let total: usize = counts.iter().map(|&c| c as usize).sum();
                let values_start = pos + 3 + 16;
                let values = strip
                    .get(values_start..values_start + total)
                    .ok_or_else(|| DecodeErrors::MalformedContainer("DHT value list ran past segment end".to_string()))?
                    .to_vec();

                huffman = Some(HuffmanTableDef { counts, values });
                pos += length;
            }
            0xC3 =>
            {
                // SOF3: length, precision, num_lines, samples_per_line,
                // component count, then per-component descriptors.
                let _length = read_u16_be(strip, pos)? as usize;
                let precision = strip.get(pos + 2).copied().ok_or_else(|| {
                    DecodeErrors::MalformedContainer("SOF3 segment truncated before precision byte".to_string())
                })?;

                if !(1..=16).contains(&precision)
                {
                    return Err(DecodeErrors::MalformedContainer(format!(
                        "SOF3 precision {precision} is out of the supported 1..=16 range"
                    )));
                }

                predictor_bits = Some(precision);
                image_height = Some(u32::from(read_u16_be(strip, pos + 3)?));
                image_width = Some(u32::from(read_u16_be(strip, pos + 5)?));
                pos += read_u16_be(strip, pos)? as usize;
            }
            0xDA =>
            {
                // SOS: length, component count, per-component table
                // selectors, then three spectral-selection bytes (unused
                // for lossless mode beyond the predictor selector, which
                // SOF3's component precision already captures for our
                // purposes).
                let length = read_u16_be(strip, pos)? as usize;
                pos += length;
                break;
            }
            0xD8 =>
            {
                return Err(DecodeErrors::MalformedContainer("unexpected repeated SOI".to_string()));
            }
            0xD9 =>
            {
                return Err(DecodeErrors::MalformedContainer(
                    "EOI encountered before SOS while scanning headers".to_string(),
                ));
            }
            0x01 | 0xD0..=0xD7 =>
            {
                // TEM / RST markers carry no length field.
            }
            _ =>
            {
                let length = read_u16_be(strip, pos)? as usize;
                warn!("skipping unrecognised marker 0xFF{:02X} ({} bytes)", marker, length);
                pos += length;
            }
        }
    }

    let huffman = huffman
        .ok_or_else(|| DecodeErrors::MalformedContainer("embedded JPEG blob had no DHT segment".to_string()))?;
    let predictor_bits = predictor_bits
        .ok_or_else(|| DecodeErrors::MalformedContainer("embedded JPEG blob had no SOF3 segment".to_string()))?;
    let image_width =
        image_width.ok_or_else(|| DecodeErrors::MalformedContainer("SOF3 missing samples_per_line".to_string()))?;
    let image_height =
        image_height.ok_or_else(|| DecodeErrors::MalformedContainer("SOF3 missing num_lines".to_string()))?;

    let scan_bytes = strip[pos..].to_vec();

    Ok((predictor_bits, image_width, image_height, huffman, scan_bytes))
}
