#![allow(clippy::needless_return, clippy::similar_names, clippy::inline_always)]
#![warn(clippy::correctness, clippy::perf, clippy::pedantic, clippy::inline_always)]
#[macro_use]
extern crate log;

pub use crate::decoder::{decode_file, decode_scan};
pub use crate::errors::DecodeErrors;
pub use crate::ingest::parse_container;
pub use crate::reconstructor::DecodedImage;
pub use crate::scan_params::{HuffmanTableDef, ScanParams, SensorBorder, SliceLayout};
pub use crate::sink::{write_dump, DumpFormat};

pub mod bitstream;
pub mod decoder;
pub mod errors;
pub mod huffman;
pub mod ingest;
pub mod marker;
pub mod reconstructor;
pub mod scan_params;
pub mod sink;
