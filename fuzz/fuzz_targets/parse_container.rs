#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(params) = cr2_raw::parse_container(data)
    {
        let _ = cr2_raw::decode_scan(&params);
    }
});
