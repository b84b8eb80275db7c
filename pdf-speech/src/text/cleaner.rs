//! Character whitelist filtering for TTS input.

/// Punctuation the speech models handle well.
const ALLOWED_PUNCTUATION: &[char] = &[' ', '.', ',', '!', '?', '-'];

/// Clean text for TTS processing.
///
/// Every character outside the whitelist (ASCII letters, digits, space and
/// `.,!?-`) becomes a single space. The output has the same number of
/// characters as the input, in the same order.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .map(|c| if is_allowed_char(c) { c } else { ' ' })
        .collect()
}

/// Check if a character survives cleaning unchanged.
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c)
}
