/// Canonicalizes program output before comparison
///
/// All line-ending sequences (`\r\n` and lone `\r`) become `\n`, then leading
/// and trailing whitespace is removed. Interior whitespace is left untouched.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}

/// Same as [`normalize`], with a missing text treated as empty
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
