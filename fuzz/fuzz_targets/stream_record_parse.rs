#![no_main]

use courier_assistant::parse_stream_record;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    if let Some(fragment) = parse_stream_record(&line) {
        assert!(!fragment.is_empty());
    }
});
