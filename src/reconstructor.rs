//! Drives the per-sample decode loop and reassembles the CR2 slice layout
//! into a coherent image plane.
use crate::bitstream::BitStream;
use crate::errors::DecodeErrors;
use crate::huffman::HuffmanDecoder;
use crate::scan_params::{ScanParams, SliceLayout};

/// The image x-coordinate of slice `s`'s leftmost column.
fn slice_x_offset(slices: &SliceLayout, s: usize) -> u32
{
    if s < slices.n as usize
    {
        s as u32 * u32::from(slices.w_common)
    }
    else
    {
        u32::from(slices.n) * u32::from(slices.w_common)
    }
}

/// The reconstructed sample grid: `image_width * image_height` accumulated
/// values, row-major.
///
/// A flat buffer rather than `Vec<Vec<i32>>` for the same reason the
/// teacher keeps MCU output as a single flat buffer: one allocation,
/// predictable layout, cheap to hand to a sink.
pub struct DecodedImage
{
    pub width:   u32,
    pub height:  u32,
    samples: Vec<i32>,
}

impl DecodedImage
{
    fn new(width: u32, height: u32) -> DecodedImage
    {
        DecodedImage { width, height, samples: vec![0; width as usize * height as usize] }
    }

    /// The sample at `(x, y)`. Panics if out of bounds; every write site in
    /// this module computes coordinates that are in-bounds by construction.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> i32
    {
        self.samples[y as usize * self.width as usize + x as usize]
    }

    fn set(&mut self, x: u32, y: u32, value: i32)
    {
        self.samples[y as usize * self.width as usize + x as usize] = value;
    }

    /// Raw sample buffer, row-major, for a sink to consume directly.
    #[must_use]
    pub fn samples(&self) -> &[i32]
    {
        &self.samples
    }
}

/// JPEG sign-magnitude extension: a raw `n`-bit magnitude maps to a signed
/// integer in `[-(2^n - 1), 2^n - 1]`, excluding the interior gap.
///
/// If the high bit of `raw` (within `n` bits) is set, the value is `raw`
/// itself; otherwise it's `raw - (2^n - 1)`.
#[inline]
#[must_use]
pub fn extend(raw: u16, n: u8) -> i32
{
    if n == 0
    {
        return 0;
    }

    let raw = i32::from(raw);

    if raw >= (1 << (n - 1))
    {
        raw
    }
    else
    {
        raw - ((1 << n) - 1)
    }
}

/// Drives category -> magnitude -> sign-extend -> predictor-accumulate over
/// an entire scan, honouring the CR2 slice layout.
pub struct RawReconstructor<'a>
{
    params: &'a ScanParams,
    huff:   &'a HuffmanDecoder,
}

impl<'a> RawReconstructor<'a>
{
    #[must_use]
    pub fn new(params: &'a ScanParams, huff: &'a HuffmanDecoder) -> RawReconstructor<'a>
    {
        RawReconstructor { params, huff }
    }

    /// Decode one sample: a Huffman category symbol, an optional raw
    /// magnitude, sign-extended into a difference.
    fn decode_diff(&self, bs: &mut BitStream, sample_index: usize) -> Result<i32, DecodeErrors>
    {
        let category = self.huff.decode(bs).map_err(|e| attach_sample_index(e, sample_index))?;

        if category == 0
        {
            return Ok(0);
        }

        let raw = bs.read_bits(category).map_err(|e| attach_sample_index(e, sample_index))?;

        Ok(extend(raw, category))
    }

    /// Decode the entire scan sequentially: one shared `BitStream` walked
    /// slice-major, then row-major within each slice, with the predictor
    /// reset at every slice-row boundary.
    pub fn decode_sequential(&self) -> Result<DecodedImage, DecodeErrors>
    {
        let p = self.params;
        let mut bs = BitStream::new(&p.scan_bytes);
        let mut image = DecodedImage::new(p.image_width, p.image_height);

        let slice_count = p.slices.slice_count();
        let mut sample_index = 0usize;

        for s in 0..slice_count
        {
            let ws = p.slices.width_of(s);
            let x_offset = slice_x_offset(&p.slices, s);

            for r in 0..p.image_height
            {
                let mut predictor = p.initial_predictor();

                for c in 0..u32::from(ws)
                {
                    let diff = self.decode_diff(&mut bs, sample_index)?;
                    let sample = predictor + diff;

                    image.set(x_offset + c, r, sample);

                    predictor = sample;
                    sample_index += 1;
                }
            }
        }

        let expected = p.total_samples();

        if sample_index != expected
        {
            return Err(DecodeErrors::UnexpectedEndOfScan {
                byte_offset:      bs.byte_offset(),
                sample_index,
                samples_expected: expected,
            });
        }

        bs.expect_eoi()?;

        Ok(image)
    }

    /// Decode each slice's entropy sub-stream independently across a bounded
    /// thread pool.
    ///
    /// This is an internal optimization, opt-in only: it requires the
    /// caller to have already located each slice's byte offset within
    /// `scan_bytes` (true for CR2, where slices are directly
    /// byte-concatenated with no shared entropy-coder state carried across
    /// a slice boundary), and it produces bit-identical output to
    /// [`Self::decode_sequential`]. The CLI and the default `decode_scan`
    /// path never call this; it exists for embedders that have already
    /// paid the cost of locating slice boundaries.
    pub fn decode_parallel(&self, slice_byte_offsets: &[usize]) -> Result<DecodedImage, DecodeErrors>
    {
        let p = self.params;
        let slice_count = p.slices.slice_count();

        if slice_byte_offsets.len() != slice_count
        {
            return Err(DecodeErrors::MalformedContainer(format!(
                "expected {} slice byte offsets, got {}",
                slice_count,
                slice_byte_offsets.len()
            )));
        }

        let mut image = DecodedImage::new(p.image_width, p.image_height);
        let thread_count = num_cpus::get().min(slice_count).max(1) as u32;
        let mut pool = scoped_threadpool::Pool::new(thread_count);

        let mut results: Vec<Option<Result<Vec<i32>, DecodeErrors>>> = (0..slice_count).map(|_| None).collect();

        pool.scoped(|scope| {
            for (s, slot) in results.iter_mut().enumerate()
            {
                let start = slice_byte_offsets[s];
                let end = slice_byte_offsets.get(s + 1).copied().unwrap_or(p.scan_bytes.len());
                let slice_bytes = &p.scan_bytes[start..end];
                let huff = self.huff;
                let ws = p.slices.width_of(s);
                let height = p.image_height;
                let initial_predictor = p.initial_predictor();

                scope.execute(move || {
                    *slot = Some(decode_one_slice(slice_bytes, huff, ws, height, initial_predictor));
                });
            }
        });

        for (s, result) in results.into_iter().enumerate()
        {
            let column = result.expect("every slice slot is filled by the scoped pool before join")?;

            let ws = p.slices.width_of(s);
            let x_offset = slice_x_offset(&p.slices, s);

            for r in 0..p.image_height
            {
                for c in 0..u32::from(ws)
                {
                    let value = column[(r * u32::from(ws) + c) as usize];
                    image.set(x_offset + c, r, value);
                }
            }
        }

        Ok(image)
    }
}

/// Rewrite a `BitStream`/`HuffmanDecoder` error's placeholder sample index
/// (`usize::MAX`) with the reconstructor's real sample count, since neither
/// component knows about the reconstruction loop's sample counting.
fn attach_sample_index(err: DecodeErrors, sample_index: usize) -> DecodeErrors
{
    match err
    {
        DecodeErrors::NoMatchingCode { byte_offset, .. } => DecodeErrors::NoMatchingCode { byte_offset, sample_index },
        DecodeErrors::UnexpectedEndOfScan { byte_offset, samples_expected, .. } =>
        {
            DecodeErrors::UnexpectedEndOfScan { byte_offset, sample_index, samples_expected }
        }
        other => other,
    }
}

/// Decode one slice's worth of samples from an independent, byte-aligned
/// entropy sub-stream. Used only by [`RawReconstructor::decode_parallel`].
fn decode_one_slice(
    bytes: &[u8], huff: &HuffmanDecoder, width: u16, height: u32, initial_predictor: i32,
) -> Result<Vec<i32>, DecodeErrors>
{
    let mut bs = BitStream::new(bytes);
    let mut out = vec![0i32; width as usize * height as usize];
    let mut sample_index = 0usize;

    for r in 0..height
    {
        let mut predictor = initial_predictor;

        for c in 0..u32::from(width)
        {
            let category = huff.decode(&mut bs).map_err(|e| attach_sample_index(e, sample_index))?;

            let diff = if category == 0
            {
                0
            }
            else
            {
                let raw = bs.read_bits(category).map_err(|e| attach_sample_index(e, sample_index))?;
                extend(raw, category)
            };

            let sample = predictor + diff;

            out[(r * u32::from(width) + c) as usize] = sample;
            predictor = sample;
            sample_index += 1;
        }
    }

    Ok(out)
}
