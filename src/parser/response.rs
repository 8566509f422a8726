//! JSON extraction from free-form model output

use serde_json::Value;

/// Find the JSON object in a model reply
///
/// A fenced ```json block wins; otherwise the first balanced `{...}` span that
/// parses as an object is returned. Returns `None` when nothing parses.
pub fn extract_json_object(text: &str) -> Option<Value> {
    if let Some(value) = fenced_blocks(text)
        .into_iter()
        .filter_map(|block| serde_json::from_str::<Value>(block.trim()).ok())
        .find(Value::is_object)
    {
        return Some(value);
    }

    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = balanced_end(bytes, open) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[open..=close]) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
        start = open + 1;
    }
    None
}

/// Bodies of ```json fences, plus bare ``` fences as a second choice
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut tagged = Vec::new();
    let mut bare = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let Some(line_end) = after.find('\n') else { break };
        let lang = after[..line_end].trim().to_lowercase();
        let body = &after[line_end + 1..];
        let Some(close) = body.find("```") else { break };
        if lang == "json" {
            tagged.push(&body[..close]);
        } else if lang.is_empty() {
            bare.push(&body[..close]);
        }
        rest = &body[close + 3..];
    }
    tagged.extend(bare);
    tagged
}

/// Index of the brace closing the one at `open`, honoring JSON strings
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
