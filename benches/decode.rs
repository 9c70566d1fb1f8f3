use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cr2_raw::scan_params::{HuffmanTableDef, ScanParams, SliceLayout};
use cr2_raw::decode_scan;

/// Build a synthetic 512x512 single-slice scan whose entropy stream is all
/// category-0 symbols, so the benchmark measures decode-loop and bitstream
/// overhead rather than any particular data distribution.
fn synthetic_scan(width: u32, height: u32) -> ScanParams
{
    let mut counts = [0u16; 16];
    counts[0] = 1;

    let total_samples = width as usize * height as usize;
    // One bit per sample (the single code, length 1), byte-aligned, plus
    // a trailing EOI.
    let mut scan_bytes = vec![0u8; (total_samples + 7) / 8];
    scan_bytes.push(0xFF);
    scan_bytes.push(0xD9);

    ScanParams {
        image_width: width,
        image_height: height,
        slices: SliceLayout { n: 1, w_common: width as u16, w_last: 0 },
        huffman: HuffmanTableDef { counts, values: vec![0] },
        predictor_bits: 14,
        scan_bytes,
        sensor_border: None,
    }
}

fn criterion_benchmark(c: &mut Criterion)
{
    let params = synthetic_scan(512, 512);

    c.bench_function("decode_scan 512x512 all-zero-category", |b| {
        b.iter(|| black_box(decode_scan(black_box(&params))))
    });
}

criterion_group!(name = benches; config = {
    let c = Criterion::default();
    c.measurement_time(Duration::from_secs(10))
}; targets = criterion_benchmark);
criterion_main!(benches);
