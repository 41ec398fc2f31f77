//! Mailbox side of the pipeline
//!
//! Message records, raw RFC 822 decoding and the [`MailSource`] seam with
//! its IMAP implementation.

pub mod imap;
pub mod models;
pub mod parser;
pub mod source;

pub use imap::ImapMailSource;
pub use models::{AssignedCategory, ClassifiedMessage, InboundMessage};
pub use parser::parse_raw_message;
pub use source::MailSource;
