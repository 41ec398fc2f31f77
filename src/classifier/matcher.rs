//! Whole-word trigger matching over normalized text

/// Check whether `trigger` occurs in `normalized_text` as whole word(s).
///
/// Both arguments must already be normalized. An occurrence only counts when
/// it is bounded on each side by a non-alphanumeric character or by the edge
/// of the text, so `"ic"` never matches inside `"tecnico"`. Multi-word
/// triggers are matched as one contiguous phrase under the same rule.
pub fn contains_trigger(normalized_text: &str, trigger: &str) -> bool {
    if trigger.is_empty() {
        return false;
    }

    let bytes = normalized_text.as_bytes();
    normalized_text.match_indices(trigger).any(|(start, matched)| {
        let end = start + matched.len();
        let left_ok = start == 0 || !is_word_byte(bytes[start - 1]);
        let right_ok = end == bytes.len() || !is_word_byte(bytes[end]);
        left_ok && right_ok
    })
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}
