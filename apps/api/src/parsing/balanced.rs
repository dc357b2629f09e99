/// Returns the first balanced `open ... close` span of `s`.
///
/// Linear scan tracking nesting depth and string-literal state; delimiters
/// inside `"..."` (escapes honored) are ignored and unmatched closers before
/// the first opener are skipped. Returns `None` when no span closes.
pub fn extract_balanced(s: &str, open: u8, close: u8) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    // Delimiters are ASCII, so byte offsets at matches are char boundaries.
    for (i, &b) in s.as_bytes().iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            if depth == 0 {
                start = Some(i);
            }
            depth += 1;
        } else if b == close && depth > 0 {
            depth -= 1;
            if depth == 0 {
                return start.map(|st| &s[st..=i]);
            }
        }
    }

    None
}

pub fn extract_balanced_object(s: &str) -> Option<&str> {
    extract_balanced(s, b'{', b'}')
}

pub fn extract_balanced_array(s: &str) -> Option<&str> {
    extract_balanced(s, b'[', b']')
}
