//! Mailbox access and payment-notification parsing.
//!
//! - [`mailbox::Mailbox`] is the seam the orchestrator talks to;
//!   [`imap_mailbox::ImapMailbox`] implements it over IMAP.
//! - [`mime`] decodes raw messages into subject + HTML.
//! - [`parser`] classifies a notification and extracts its fields.

pub mod imap_mailbox;
pub mod mailbox;
pub mod mime;
pub mod parser;

pub use imap_mailbox::{ImapMailbox, SessionOpener};
pub use mailbox::Mailbox;
pub use mime::decode_message;
pub use parser::{classify, parse_payment};
