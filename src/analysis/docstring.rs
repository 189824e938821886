//! Docstring literal decoding and cleanup.

/// Decode a Python string literal (prefix and quotes included) to its value.
///
/// Returns `None` for byte strings, f-strings and anything that is not a
/// well-formed literal. Such literals never count as documentation.
pub fn decode_literal(literal: &str) -> Option<String> {
    let quote_at = literal.find(['"', '\''])?;
    let (prefix, rest) = literal.split_at(quote_at);
    let prefix = prefix.to_ascii_lowercase();
    if prefix.chars().any(|c| !matches!(c, 'r' | 'u' | 'b' | 'f' | 't')) {
        return None;
    }
    if prefix.contains(['b', 'f', 't']) {
        return None;
    }

    let quote = &rest[..1];
    let triple = quote.repeat(3);
    let width = if rest.starts_with(&triple) && rest.len() >= 6 {
        3
    } else {
        1
    };
    let delimiter = &rest[..width];
    if rest.len() < 2 * width || !rest.ends_with(delimiter) {
        return None;
    }
    // physical line breaks read as `\n`, like Python's universal newlines
    let body = universal_newlines(&rest[width..rest.len() - width]);

    if prefix.contains('r') {
        Some(body)
    } else {
        Some(unescape(&body))
    }
}

fn universal_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Decode the backslash escapes of a non-raw literal body.
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut value = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
            }
            'x' | 'u' | 'U' => {
                let digits = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let hex: String = chars.clone().take(digits).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == digits => {
                        out.push(decoded);
                        for _ in 0..digits {
                            chars.next();
                        }
                    }
                    _ => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            // \N{NAME} and unknown escapes are kept verbatim
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

/// Clean a docstring the way `inspect.cleandoc` does.
///
/// Tabs are expanded, the first line is left-stripped, the common margin of
/// the remaining lines is removed and leading/trailing blank lines dropped.
/// The margin counts characters, so Unicode whitespace such as a no-break
/// space is one column.
pub fn cleandoc(doc: &str) -> String {
    let expanded = expand_tabs(&doc.replace("\r\n", "\n"));
    let mut lines: Vec<&str> = expanded.split('\n').collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim_start().is_empty())
        .map(|line| line.chars().count() - line.trim_start().chars().count())
        .min();

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    if let Some(first) = lines.first_mut() {
        cleaned.push(first.trim_start().to_string());
    }
    for line in lines.iter().skip(1) {
        let stripped = match margin {
            Some(margin) => line.chars().skip(margin).collect(),
            None => line.to_string(),
        };
        cleaned.push(stripped);
    }

    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    let leading = cleaned.iter().take_while(|l| l.is_empty()).count();
    cleaned.drain(..leading);

    cleaned.join("\n")
}

/// Expand tabs to the next multiple of 8 columns, per line.
fn expand_tabs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut column = 0;
    for c in text.chars() {
        match c {
            '\t' => {
                let pad = 8 - column % 8;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\n' | '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}
