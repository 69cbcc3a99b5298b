pub fn char_count(value: &str) -> usize {
    value.chars().count()
}

/// Truncates to `max_chars` characters and appends `...` when anything was cut.
pub fn truncate_for_error(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Returns the last `max_chars` characters of `value`.
pub fn tail_chars(value: &str, max_chars: usize) -> &str {
    let total = value.chars().count();
    if total <= max_chars {
        return value;
    }
    let skip = total - max_chars;
    match value.char_indices().nth(skip) {
        Some((offset, _)) => &value[offset..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::{char_count, tail_chars, truncate_for_error};

    #[test]
    fn regression_truncate_for_error_preserves_unicode_boundaries() {
        let value = "build→ok";
        assert_eq!(truncate_for_error(value, 20), value);
        assert_eq!(truncate_for_error(value, 6), "build→...");
        assert_eq!(truncate_for_error(value, 0), "...");
    }

    #[test]
    fn unit_tail_chars_keeps_trailing_characters() {
        assert_eq!(tail_chars("abcdef", 3), "def");
        assert_eq!(tail_chars("abc", 10), "abc");
        assert_eq!(tail_chars("日本語テキスト", 3), "キスト");
        assert_eq!(tail_chars("abc", 0), "");
    }

    #[test]
    fn unit_char_count_counts_scalar_values() {
        assert_eq!(char_count(""), 0);
        assert_eq!(char_count("思考中..."), 6);
    }
}
