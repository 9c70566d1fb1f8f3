//! Contains the error types that can be returned by any stage of the
//! ingest -> decode -> sink pipeline.
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io;

/// Errors produced while parsing the CR2 container, decoding the entropy
/// stream, or writing the sink output.
///
/// The core (`BitStream`, `HuffmanDecoder`, `RawReconstructor`) performs no
/// retries and no partial-output emission: every variant here is fatal to
/// whichever call produced it.
#[allow(clippy::module_name_repetitions)]
pub enum DecodeErrors
{
    /// TIFF/CR2/JPEG marker parsing failed, or a required tag was missing.
    MalformedContainer(String),
    /// `sum(L[1..16])` exceeds the provided value list, or zero codes were
    /// defined.
    InvalidHuffmanTable(String),
    /// Huffman decode found no code of any length <= `max_len` matching the
    /// peeked bits.
    NoMatchingCode { byte_offset: usize, sample_index: usize },
    /// The entropy stream was exhausted before all samples were decoded.
    UnexpectedEndOfScan {
        byte_offset:      usize,
        sample_index:     usize,
        samples_expected: usize,
    },
    /// A mid-scan marker other than `0xFF00` (byte stuffing) or the terminal
    /// `0xFFD9` (EOI) was encountered.
    InvalidMarker { marker: u8, byte_offset: usize },
    /// Bytes follow the terminal EOI marker.
    TrailingGarbage { byte_offset: usize, extra_bytes: usize },
    /// Underlying read/write failure.
    IoError(io::Error),
}

impl Debug for DecodeErrors
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            Self::MalformedContainer(reason) =>
            {
                write!(f, "Malformed CR2/TIFF/JPEG container. Reason:{}", reason)
            }
            Self::InvalidHuffmanTable(reason) =>
            {
                write!(f, "Invalid Huffman table. Reason:{}", reason)
            }
            Self::NoMatchingCode { byte_offset, sample_index } => write!(
                f,
                "No Huffman code matched the bits at byte offset {}, decoding sample {}",
                byte_offset, sample_index
            ),
            Self::UnexpectedEndOfScan { byte_offset, sample_index, samples_expected } => write!(
                f,
                "Entropy stream exhausted at byte offset {} after {} of {} expected samples",
                byte_offset, sample_index, samples_expected
            ),
            Self::InvalidMarker { marker, byte_offset } => write!(
                f,
                "Encountered marker 0xFF{:02X} mid-scan at byte offset {}",
                marker, byte_offset
            ),
            Self::TrailingGarbage { byte_offset, extra_bytes } => write!(
                f,
                "{} bytes of trailing garbage after EOI at byte offset {}",
                extra_bytes, byte_offset
            ),
            Self::IoError(err) => write!(f, "I/O error:{}", err),
        }
    }
}

impl Display for DecodeErrors
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        Debug::fmt(self, f)
    }
}

impl Error for DecodeErrors {}

impl From<io::Error> for DecodeErrors
{
    fn from(err: io::Error) -> Self
    {
        DecodeErrors::IoError(err)
    }
}
