//! Top-level orchestration: ties `BitStream`, `HuffmanDecoder`, and
//! `RawReconstructor` together behind a single entry point.
use std::fs;
use std::path::Path;

use crate::errors::DecodeErrors;
use crate::huffman::HuffmanDecoder;
use crate::ingest::parse_container;
use crate::reconstructor::{DecodedImage, RawReconstructor};
use crate::scan_params::ScanParams;

/// Decode an entire scan given an already-parsed [`ScanParams`].
///
/// Builds the canonical Huffman table once, then drives a single sequential
/// pass over the entropy stream. This is the only path the CLI exercises;
/// the reconstructor's parallel slice path is available to embedders that
/// have already located slice byte boundaries, but is never reached here.
pub fn decode_scan(params: &ScanParams) -> Result<DecodedImage, DecodeErrors>
{
    let huff = HuffmanDecoder::build(&params.huffman.counts, &params.huffman.values)?;
    let reconstructor = RawReconstructor::new(params, &huff);

    reconstructor.decode_sequential()
}

/// Read `path` from disk, parse its CR2 container, and decode the scan.
///
/// A thin convenience wrapper: `ingest::parse_container` + `decode_scan`,
/// for callers that just want "give me a `DecodedImage` from this file".
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<DecodedImage, DecodeErrors>
{
    let bytes = fs::read(path)?;
    let params = parse_container(&bytes)?;

    decode_scan(&params)
}
