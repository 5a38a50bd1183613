//! Header name normalization
//!
//! Server variables spell header names as `UPPER_SNAKE` fragments; headers
//! use `Title-Kebab` casing.

/// Convert a variable-name fragment to canonical header casing
///
/// `CACHE_CONTROL` becomes `Cache-Control`, `X_FORWARDED_PROTO` becomes
/// `X-Forwarded-Proto`.
pub fn normalize_header_name(fragment: &str) -> String {
    let mut name = String::with_capacity(fragment.len());
    let mut word_start = true;
    for c in fragment.chars() {
        match c {
            '_' | ' ' => {
                name.push('-');
                word_start = true;
            }
            c if c.is_ascii_whitespace() => {
                name.push(c);
                word_start = true;
            }
            c if word_start => {
                name.push(c.to_ascii_uppercase());
                word_start = false;
            }
            c => name.push(c.to_ascii_lowercase()),
        }
    }
    name
}
