use serde_json::Value;

/// Extracts the text fragment carried by one stream-json output line.
///
/// `content_block_delta` records contribute `delta.text`, `result` records
/// contribute `result`. Other shapes and non-JSON lines yield `None`.
pub fn parse_stream_record(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = serde_json::from_str::<Value>(trimmed).ok()?;
    let text = match value.get("type").and_then(Value::as_str)? {
        "content_block_delta" => value
            .get("delta")
            .and_then(|delta| delta.get("text"))
            .and_then(Value::as_str),
        "result" => value.get("result").and_then(Value::as_str),
        _ => None,
    }?;
    if text.is_empty() {
        return None;
    }
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_stream_record;

    #[test]
    fn unit_parse_stream_record_extracts_delta_text() {
        let line = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hel"}}"#;
        assert_eq!(parse_stream_record(line), Some("Hel".to_string()));
    }

    #[test]
    fn unit_parse_stream_record_extracts_result_text() {
        let line = r#"{"type":"result","subtype":"success","is_error":false,"result":"done"}"#;
        assert_eq!(parse_stream_record(line), Some("done".to_string()));
    }

    #[test]
    fn regression_parse_stream_record_ignores_other_shapes_and_garbage() {
        assert_eq!(parse_stream_record(""), None);
        assert_eq!(parse_stream_record("   "), None);
        assert_eq!(parse_stream_record("not json"), None);
        assert_eq!(parse_stream_record("[1,2,3]"), None);
        assert_eq!(
            parse_stream_record(r#"{"type":"assistant","content":[{"type":"text","text":"x"}]}"#),
            None
        );
        assert_eq!(
            parse_stream_record(r#"{"type":"content_block_delta","delta":{"partial_json":"{"}}"#),
            None
        );
        assert_eq!(parse_stream_record(r#"{"type":"result","result":""}"#), None);
        assert_eq!(parse_stream_record(r#"{"type":"result","result":7}"#), None);
    }
}
