//! RFC 822 message decoding into [`InboundMessage`]

use super::models::InboundMessage;
use mailparse::{MailHeaderMap, ParsedMail};
use tracing::warn;

/// Body text considered before trimming, in characters
pub const BODY_PREVIEW_CHARS: usize = 500;

/// Snippet length in characters
pub const SNIPPET_CHARS: usize = 200;

/// Decode a raw message into an inbound record
///
/// Headers are RFC 2047 decoded. The body is taken from the first
/// `text/plain` part of a multipart message, or from the only part of a
/// simple message, and kept only as a snippet: the first
/// [`BODY_PREVIEW_CHARS`] characters are trimmed, then cut to
/// [`SNIPPET_CHARS`]. Anything that cannot be decoded is left empty.
pub fn parse_raw_message(id: &str, raw: &[u8]) -> Result<InboundMessage, mailparse::MailParseError> {
    let parsed = mailparse::parse_mail(raw)?;

    let header = |name: &str| parsed.headers.get_first_value(name).unwrap_or_default();

    let labels = header("X-GM-LABELS")
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let body = extract_text_body(&parsed);
    let preview = truncate_chars(&body, BODY_PREVIEW_CHARS).trim();
    let snippet = truncate_chars(preview, SNIPPET_CHARS).to_string();

    Ok(InboundMessage {
        id: id.to_string(),
        subject: header("Subject"),
        sender: header("From"),
        date: header("Date"),
        labels,
        snippet,
    })
}

fn extract_text_body(parsed: &ParsedMail<'_>) -> String {
    if parsed.subparts.is_empty() {
        return decode_body(parsed);
    }

    parsed
        .parts()
        .find(|part| part.ctype.mimetype.eq_ignore_ascii_case("text/plain"))
        .map(decode_body)
        .unwrap_or_default()
}

fn decode_body(part: &ParsedMail<'_>) -> String {
    match part.get_body() {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to decode message body: {}", e);
            String::new()
        }
    }
}

/// Longest prefix holding at most `max` characters
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
