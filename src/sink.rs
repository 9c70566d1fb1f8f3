//! Writes a `DecodedImage` out as a minimal length-prefixed binary dump.
//!
//! Quantisation (if any) is entirely a sink concern; the core decoder deals
//! only in signed integers. See [`DumpFormat`].
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::DecodeErrors;
use crate::reconstructor::DecodedImage;

/// Output sample encoding for [`write_dump`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpFormat
{
    /// One byte per sample, linearly mapped from `[0, 2^predictor_bits)` to
    /// `[0, 255]`. A visualisation convenience only; not part of the decode
    /// contract.
    Gray8
    {
        predictor_bits: u8,
    },
    /// Two bytes per sample, little-endian, the raw reconstructed value
    /// truncated to `u16` (CR2 samples never exceed 16 bits).
    Raw16,
}

/// Write `image` to `path`: two little-endian `u32`s (`width`, `height`),
/// then `width * height` samples encoded per `format`.
pub fn write_dump(image: &DecodedImage, path: &Path, format: DumpFormat) -> Result<(), DecodeErrors>
{
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    out.write_all(&image.width.to_le_bytes())?;
    out.write_all(&image.height.to_le_bytes())?;

    match format
    {
        DumpFormat::Gray8 { predictor_bits } =>
        {
            let max_value = f64::from((1u32 << predictor_bits) - 1);

            for &sample in image.samples()
            {
                let clamped = sample.clamp(0, (1i32 << predictor_bits) - 1);
                let byte = ((f64::from(clamped) / max_value) * 255.0).round() as u8;
                out.write_all(&[byte])?;
            }
        }
        DumpFormat::Raw16 =>
        {
            for &sample in image.samples()
            {
                out.write_all(&(sample as u16).to_le_bytes())?;
            }
        }
    }

    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::io::Read as _;

    fn tiny_image() -> DecodedImage
    {
        // 2x1 image built through the only public constructor path
        // available outside this crate: a reconstructor run. Exercised
        // indirectly in reconstructor.rs; here we only need a buffer to
        // dump, so we build one the same way the reconstructor does.
        let counts = {
            let mut c = [0u16; 16];
            c[0] = 2;
            c
        };
        let huff = crate::huffman::HuffmanDecoder::build(&counts, &[0, 1]).unwrap();
        let params = crate::scan_params::ScanParams {
            image_width: 2,
            image_height: 1,
            slices: crate::scan_params::SliceLayout { n: 1, w_common: 2, w_last: 0 },
            huffman: crate::scan_params::HuffmanTableDef { counts, values: vec![0, 1] },
            predictor_bits: 8,
            scan_bytes: vec![0b0000_0000, 0xFF, 0xD9],
            sensor_border: None,
        };
        crate::reconstructor::RawReconstructor::new(&params, &huff).decode_sequential().unwrap()
    }

    #[test]
    fn raw16_dump_round_trips_header_and_samples()
    {
        let image = tiny_image();
        let dir = std::env::temp_dir();
        let path = dir.join("cr2_raw_sink_test_raw16.dat");

        write_dump(&image, &path, DumpFormat::Raw16).unwrap();

        let mut buf = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut buf).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(u32::from_le_bytes(buf[0..4].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 1);
        assert_eq!(buf.len(), 8 + 2 * 2);
    }

    #[test]
    fn gray8_dump_has_one_byte_per_sample()
    {
        let image = tiny_image();
        let dir = std::env::temp_dir();
        let path = dir.join("cr2_raw_sink_test_gray8.dat");

        write_dump(&image, &path, DumpFormat::Gray8 { predictor_bits: 8 }).unwrap();

        let mut buf = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut buf).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(buf.len(), 8 + 2);
    }
}
