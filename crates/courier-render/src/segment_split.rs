//! Splits oversized text into message-sized segments.

/// Per-message character ceiling used when none is configured.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 3_800;

/// Splits `text` into segments of at most `max_chars` characters.
///
/// Each cut prefers the last newline inside the window (the newline opens the
/// next segment) provided it sits at or after half the window, otherwise the
/// cut lands exactly at `max_chars`. Concatenating the segments yields `text`.
pub fn split_into_segments(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut segments = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut hard_cut = None;
        let mut newline_cut = None;
        for (char_index, (byte_index, ch)) in remaining.char_indices().enumerate() {
            if char_index > max_chars {
                break;
            }
            if char_index == max_chars {
                hard_cut = Some(byte_index);
            }
            if ch == '\n' && char_index.saturating_mul(2) >= max_chars {
                newline_cut = Some(byte_index);
            }
        }
        let Some(hard_cut) = hard_cut else {
            segments.push(remaining.to_string());
            break;
        };
        let cut = newline_cut.unwrap_or(hard_cut);
        segments.push(remaining[..cut].to_string());
        remaining = &remaining[cut..];
    }
    segments
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::split_into_segments;

    #[test]
    fn unit_short_text_is_a_single_segment() {
        assert_eq!(split_into_segments("hello", 10), vec!["hello".to_string()]);
        assert_eq!(split_into_segments("0123456789", 10), vec!["0123456789".to_string()]);
        assert!(split_into_segments("", 10).is_empty());
    }

    #[test]
    fn unit_prefers_late_newline_and_keeps_it_with_next_segment() {
        let segments = split_into_segments("aaaaaaa\nbbbbbbbbb", 10);
        assert_eq!(segments, vec!["aaaaaaa".to_string(), "\nbbbbbbbbb".to_string()]);
    }

    #[test]
    fn regression_ignores_newline_before_half_window() {
        let segments = split_into_segments("ab\ncdefghijklmnop", 10);
        assert_eq!(
            segments,
            vec!["ab\ncdefghi".to_string(), "jklmnop".to_string()]
        );
    }

    #[test]
    fn unit_newline_exactly_at_half_window_is_used() {
        let segments = split_into_segments("abcde\nfghijklmn", 10);
        assert_eq!(segments[0], "abcde");
    }

    #[test]
    fn unit_newline_just_past_window_end_counts() {
        let segments = split_into_segments("0123456789\nabc", 10);
        assert_eq!(segments, vec!["0123456789".to_string(), "\nabc".to_string()]);
    }

    #[test]
    fn functional_eight_thousand_chars_without_newlines_split_at_limit() {
        let text = "x".repeat(8_000);
        let segments = split_into_segments(&text, 3_800);
        assert_eq!(segments.len(), 8_000_usize.div_ceil(3_800));
        assert_eq!(segments[0].len(), 3_800);
        assert_eq!(segments[1].len(), 3_800);
        assert_eq!(segments[2].len(), 400);
    }

    #[test]
    fn regression_counts_characters_not_bytes() {
        let text = "思考".repeat(6);
        let segments = split_into_segments(&text, 5);
        assert_eq!(segments.concat(), text);
        assert!(segments
            .iter()
            .all(|segment| segment.chars().count() <= 5));
        assert_eq!(segments[0].chars().count(), 5);
    }

    proptest! {
        #[test]
        fn property_segments_concatenate_to_input(input in "[a-c\\n思]{0,400}", max in 1usize..64) {
            let segments = split_into_segments(&input, max);
            prop_assert_eq!(segments.concat(), input);
        }

        #[test]
        fn property_segments_respect_limit_and_half_floor(input in "[a-c\\n]{0,400}", max in 1usize..64) {
            let segments = split_into_segments(&input, max);
            let last = segments.len().saturating_sub(1);
            for (index, segment) in segments.iter().enumerate() {
                let len = segment.chars().count();
                prop_assert!(len <= max);
                prop_assert!(len > 0);
                if index < last {
                    prop_assert!(len * 2 >= max);
                }
            }
        }
    }
}
