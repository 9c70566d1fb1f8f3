//! The parameter bundle Ingest hands to the core decoder.
//!
//! Everything here is immutable after construction: `ScanParams` is built
//! once by [`crate::ingest::parse_container`], consumed once by
//! [`crate::decoder::decode_scan`], then dropped.
use crate::errors::DecodeErrors;

/// The CR2 `(n, w_common, w_last)` horizontal slice layout, expanded to the
/// per-slice widths the reconstructor walks over.
#[derive(Clone, Debug)]
pub struct SliceLayout
{
    /// Number of common-width slices.
    pub n:         u16,
    /// Width, in samples, of each of the first `n` slices.
    pub w_common:  u16,
    /// Width, in samples, of the final slice. Legally zero, meaning the
    /// image is exactly `n` slices of `w_common` and nothing else.
    pub w_last:    u16,
}

impl SliceLayout
{
    /// Total number of slices: `n` common-width ones, plus one final slice
    /// when `w_last > 0`.
    #[must_use]
    pub fn slice_count(&self) -> usize
    {
        if self.w_last == 0
        {
            self.n as usize
        }
        else
        {
            self.n as usize + 1
        }
    }

    /// Width of slice `s` (0-based).
    #[must_use]
    pub fn width_of(&self, s: usize) -> u16
    {
        if s < self.n as usize
        {
            self.w_common
        }
        else
        {
            self.w_last
        }
    }

    /// Validate `w_common * n + w_last == image_width`.
    pub fn validate(&self, image_width: u32) -> Result<(), DecodeErrors>
    {
        let total = u32::from(self.w_common) * u32::from(self.n) + u32::from(self.w_last);

        if total != image_width
        {
            return Err(DecodeErrors::MalformedContainer(format!(
                "slice layout ({}, {}, {}) sums to {} samples wide, expected {}",
                self.n, self.w_common, self.w_last, total, image_width
            )));
        }

        Ok(())
    }
}

/// Canon MakerNote `SensorInfo` (tag `224`) border fields. Not consumed by
/// the decode algorithm; carried through for a downstream demosaicing /
/// further-processing consumer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SensorBorder
{
    pub top_border:    u16,
    pub left_border:   u16,
    pub bottom_border: u16,
    pub right_border:  u16,
}

/// A DHT payload: per-length code counts plus the symbol value list, in the
/// order codes are assigned.
#[derive(Clone, Debug)]
pub struct HuffmanTableDef
{
    /// `counts[i]` = number of codes of length `i + 1`, for `i` in `0..16`.
    pub counts: [u16; 16],
    pub values: Vec<u8>,
}

/// The full parameter bundle driving one decode.
pub struct ScanParams
{
    pub image_width:  u32,
    pub image_height: u32,
    pub slices:       SliceLayout,
    pub huffman:      HuffmanTableDef,
    /// Sample precision; CR2 is 14 in practice. Differences fit in a signed
    /// integer of `predictor_bits + 1` bits.
    pub predictor_bits: u8,
    /// The entropy-coded segment: everything after SOS, up to (but not
    /// including handling of) the terminal EOI.
    pub scan_bytes:   Vec<u8>,
    /// Present when the ingest found a MakerNote `SensorInfo` sub-IFD.
    pub sensor_border: Option<SensorBorder>,
}

impl ScanParams
{
    /// The initial predictor seed used at the start of every slice's first
    /// row: `1 << (predictor_bits - 1)`.
    #[must_use]
    pub fn initial_predictor(&self) -> i32
    {
        1 << (self.predictor_bits - 1)
    }

    /// Total number of samples a conforming decode must produce.
    #[must_use]
    pub fn total_samples(&self) -> usize
    {
        self.image_width as usize * self.image_height as usize
    }
}
