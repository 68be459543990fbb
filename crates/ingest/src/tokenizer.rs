/// Split one line into trimmed fields.
///
/// A `"` toggles quoting unless the character before it is a backslash; while
/// quoted, `delimiter` is ordinary text. Toggling quotes are dropped from the
/// value, but an escaped `\"` is kept verbatim (backslash included).
///
/// The last field is only emitted when its raw text is non-empty, so a line
/// ending in a bare delimiter (`a,b,`) yields two fields, not three.
pub fn tokenize_row(line: &str, delimiter: char) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev: Option<char> = None;

    for ch in line.chars() {
        if ch == '"' && prev != Some('\\') {
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            values.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
        prev = Some(ch);
    }

    if !current.is_empty() {
        values.push(current.trim().to_string());
    }

    values
}
