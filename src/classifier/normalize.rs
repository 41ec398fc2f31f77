//! Text normalization for keyword matching
//!
//! Produces the canonical comparison form shared by trigger phrases and
//! message text:
//! - Lowercase conversion
//! - Unicode NFKD decomposition with combining marks dropped ("ã" -> "a")
//! - Anything outside `[a-z0-9]` and whitespace replaced with a space
//! - Leading and trailing whitespace trimmed; inner spacing is kept, so a
//!   multi-word trigger never matches across punctuation

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize free text into the form triggers are authored in.
///
/// Total over any input; empty input yields an empty string.
///
/// ```
/// use inbox_triage::classifier::normalize;
///
/// assert_eq!(normalize("Pesquisa é URGENTE!!"), "pesquisa e urgente");
/// assert_eq!(normalize("Vice-Coordenador"), "vice coordenador");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let replaced: String = lowered
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    replaced.trim().to_string()
}
