//! Cleanup of raw model text before it is decoded.

const FENCE: &str = "```";

/// Strip the Markdown code fence markers models like to wrap JSON in.
///
/// Handles fully fenced, unfenced and partially fenced text (only an opening
/// or only a closing fence). Prose before an opening fence is dropped along
/// with it, and the body ends at the last fence so fences inside the payload
/// survive. Text with no fences is returned trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();

    let body = match opening_fence_end(text) {
        Some(body_start) => {
            let body = &text[body_start..];
            match body.rfind(FENCE) {
                Some(end) => &body[..end],
                None => body,
            }
        }
        None => text.strip_suffix(FENCE).unwrap_or(text),
    };

    body.trim()
}

/// Byte offset just past an opening fence and its info string ("json",
/// "JSON", ...). A fence that follows a bracket is part of the payload,
/// not an opening fence.
fn opening_fence_end(text: &str) -> Option<usize> {
    let start = text.find(FENCE)?;
    if text[..start].contains(['[', '{']) {
        return None;
    }

    let after = start + FENCE.len();
    let rest = &text[after..];
    Some(match rest.find('\n') {
        Some(newline) if is_info_string(&rest[..newline]) => after + newline + 1,
        None if is_info_string(rest) => text.len(),
        _ => after,
    })
}

fn is_info_string(s: &str) -> bool {
    s.trim().chars().all(|c| c.is_ascii_alphanumeric())
}
