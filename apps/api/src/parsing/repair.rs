//! Syntactic repairs for almost-JSON produced by language models.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing comma regex"));

static UNQUOTED_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:").expect("valid unquoted key regex")
});

static NON_JSON_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[+-]?\bInfinity\b|\bNaN\b|\bundefined\b").expect("valid literal regex")
});

/// Applies every repair in sequence. The output is not guaranteed to be JSON.
pub fn repair(input: &str) -> String {
    let text = input.trim_start_matches('\u{feff}');
    let text = strip_comments(text);
    let text = strip_trailing_commas(&text);
    let text = UNQUOTED_KEY.replace_all(&text, r#"${1}"${2}":"#);
    let text = convert_single_quotes(&text);
    NON_JSON_LITERAL.replace_all(&text, "null").into_owned()
}

/// Removes commas directly followed by `}` or `]`.
pub fn strip_trailing_commas(input: &str) -> String {
    TRAILING_COMMA.replace_all(input, "$1").into_owned()
}

/// Drops `// line` and `/* block */` comments that sit outside string literals.
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                // Keep the newline so line structure survives.
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Rewrites single-quoted strings as double-quoted ones.
///
/// Quote state is tracked, so apostrophes inside existing double-quoted
/// strings are left alone. Inside a converted string, `\'` becomes `'` and
/// bare `"` is escaped.
pub fn convert_single_quotes(input: &str) -> String {
    enum State {
        Code,
        Double { escaped: bool },
        Single { escaped: bool },
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Code;

    for c in input.chars() {
        state = match state {
            State::Code => match c {
                '"' => {
                    out.push('"');
                    State::Double { escaped: false }
                }
                '\'' => {
                    out.push('"');
                    State::Single { escaped: false }
                }
                _ => {
                    out.push(c);
                    State::Code
                }
            },
            State::Double { escaped } => {
                out.push(c);
                match c {
                    _ if escaped => State::Double { escaped: false },
                    '\\' => State::Double { escaped: true },
                    '"' => State::Code,
                    _ => State::Double { escaped: false },
                }
            }
            State::Single { escaped: true } => {
                if c != '\'' {
                    out.push('\\');
                }
                out.push(c);
                State::Single { escaped: false }
            }
            State::Single { escaped: false } => match c {
                '\\' => State::Single { escaped: true },
                '\'' => {
                    out.push('"');
                    State::Code
                }
                '"' => {
                    out.push_str("\\\"");
                    State::Single { escaped: false }
                }
                _ => {
                    out.push(c);
                    State::Single { escaped: false }
                }
            },
        };
    }

    out
}
