#![no_main]

use courier_render::split_into_segments;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&limit, rest)) = data.split_first() else {
        return;
    };
    let max_chars = usize::from(limit.max(1));
    let text = String::from_utf8_lossy(rest);

    let segments = split_into_segments(&text, max_chars);
    assert_eq!(segments.concat(), text);
    for (index, segment) in segments.iter().enumerate() {
        let chars = segment.chars().count();
        assert!(chars <= max_chars);
        if index + 1 < segments.len() {
            assert!(chars * 2 >= max_chars);
        }
    }
});
