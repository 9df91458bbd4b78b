//! Mailbox client seam.

use async_trait::async_trait;
use paybot_types::MailboxError;
use paybot_types::mail::MailMessage;

/// A remote mailbox holding payment notifications.
///
/// Implementations hold at most one session. `fetch_new` marks what it
/// returns as seen (except in dev fallback mode), so a message is normally
/// delivered once; a crash between fetch and flag redelivers it.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Open the session. Not retried.
    async fn connect(&self) -> Result<(), MailboxError>;

    /// Messages from `sender` not processed yet, oldest first.
    async fn fetch_new(&self, sender: &str) -> Result<Vec<MailMessage>, MailboxError>;

    /// Close the session. Idempotent; failures are logged, not returned.
    async fn logout(&self);
}
