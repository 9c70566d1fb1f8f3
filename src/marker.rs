//! JPEG marker bytes used inside the CR2 embedded lossless-JPEG blob.
//!
//! Only the subset of ITU-T T.81 markers that a CR2 raw strip actually
//! contains is modelled; everything else is read as `Marker::Other` and
//! skipped by length at the ingest layer.

/// A single JPEG marker, the byte that follows a `0xFF` marker prefix.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Marker
{
    /// Start of Image, `0xD8`.
    SOI,
    /// Define Huffman Table, `0xC4`.
    DHT,
    /// Start of Frame, lossless sequential Huffman coding, `0xC3`.
    SOF3,
    /// Start of Scan, `0xDA`.
    SOS,
    /// End of Image, `0xD9`.
    EOI,
    /// Define Restart Interval, `0xDD`.
    DRI,
    /// Restart marker `0xD0..=0xD7`.
    RST(u8),
    /// Application segment `0xE0..=0xEF`.
    APP(u8),
    /// Any other marker byte, carried verbatim so the ingest layer can skip
    /// its segment by length without understanding it.
    Other(u8),
}

impl Marker
{
    /// Map the byte following a `0xFF` prefix to a `Marker`.
    #[must_use]
    pub fn from_u8(byte: u8) -> Marker
    {
        match byte
        {
            0xD8 => Marker::SOI,
            0xC4 => Marker::DHT,
            0xC3 => Marker::SOF3,
            0xDA => Marker::SOS,
            0xD9 => Marker::EOI,
            0xDD => Marker::DRI,
            0xD0..=0xD7 => Marker::RST(byte - 0xD0),
            0xE0..=0xEF => Marker::APP(byte - 0xE0),
            other => Marker::Other(other),
        }
    }
}
