//! Messages handed from the mailbox client to the parser.

use serde::Serialize;

/// One fetched mailbox entry.
///
/// Read-only after fetch. The only state that changes on the server side is
/// the `\Seen` flag, which the mailbox client sets after fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    /// IMAP UID within the selected folder.
    pub uid: u32,
    /// Decoded subject line (empty when the header is missing).
    pub subject: String,
    /// First `text/html` part, if the message has one.
    pub html: Option<String>,
}

impl MailMessage {
    pub fn new(uid: u32, subject: impl Into<String>, html: Option<String>) -> Self {
        Self {
            uid,
            subject: subject.into(),
            html,
        }
    }
}
