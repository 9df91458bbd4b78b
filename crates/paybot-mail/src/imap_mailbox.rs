//! IMAP implementation of [`Mailbox`].
//!
//! The `imap` crate is blocking, so every protocol exchange runs on tokio's
//! blocking pool. The session lives behind a mutex that the blocking task
//! locks for the duration of one operation.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use native_tls::{TlsConnector, TlsStream};
use paybot_types::MailboxError;
use paybot_types::config::{FetchMode, MailboxConfig};
use paybot_types::mail::MailMessage;
use tracing::{debug, info, warn};

use crate::mailbox::Mailbox;
use crate::mime::decode_message;

/// Fetch query: full raw message without setting `\Seen`.
const FETCH_QUERY: &str = "(UID BODY.PEEK[])";
/// Store query applied after a successful fetch.
const MARK_SEEN: &str = "+FLAGS (\\Seen)";

/// Opens an authenticated session with the configured folder selected.
pub type SessionOpener<S> =
    Arc<dyn Fn(&MailboxConfig) -> Result<imap::Session<S>, MailboxError> + Send + Sync>;

/// Mailbox client over IMAP, by default with implicit TLS.
pub struct ImapMailbox<S: Read + Write = TlsStream<TcpStream>> {
    config: MailboxConfig,
    opener: SessionOpener<S>,
    session: Arc<Mutex<Option<imap::Session<S>>>>,
}

impl ImapMailbox {
    pub fn new(config: MailboxConfig) -> Self {
        Self::with_opener(config, Arc::new(open_tls_session))
    }
}

impl<S: Read + Write + Send + 'static> ImapMailbox<S> {
    /// Client whose sessions come from `opener` instead of a TLS dial.
    pub fn with_opener(config: MailboxConfig, opener: SessionOpener<S>) -> Self {
        Self {
            config,
            opener,
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `op` against the live session on the blocking pool.
    async fn with_session<F, R>(&self, op: F) -> Result<R, MailboxError>
    where
        F: FnOnce(&mut imap::Session<S>) -> Result<R, MailboxError> + Send + 'static,
        R: Send + 'static,
    {
        let slot = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            let session = guard.as_mut().ok_or(MailboxError::NotConnected)?;
            op(session)
        })
        .await
        .map_err(|e| MailboxError::FetchFailed(format!("mailbox task failed: {e}")))?
    }
}

#[async_trait]
impl<S: Read + Write + Send + 'static> Mailbox for ImapMailbox<S> {
    async fn connect(&self) -> Result<(), MailboxError> {
        let slot = Arc::clone(&self.session);
        let opener = Arc::clone(&self.opener);
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let session = opener(&config)?;
            let previous = slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(session);
            // A reconnect must not leave the old session open on the server.
            if let Some(mut previous) = previous {
                match previous.logout() {
                    Ok(()) => debug!("previous mailbox session logged out"),
                    Err(e) => warn!(error = %e, "logout of previous mailbox session failed"),
                }
            }
            Ok::<(), MailboxError>(())
        })
        .await
        .map_err(|e| MailboxError::ConnectionFailed(format!("mailbox task failed: {e}")))??;

        info!(
            host = %self.config.host,
            port = self.config.port,
            folder = %self.config.folder,
            "mailbox connected"
        );
        Ok(())
    }

    async fn fetch_new(&self, sender: &str) -> Result<Vec<MailMessage>, MailboxError> {
        let sender = sender.to_string();
        let mode = self.config.fetch_mode;
        self.with_session(move |session| fetch_from(session, &sender, mode))
            .await
    }

    async fn logout(&self) {
        let slot = Arc::clone(&self.session);
        let outcome = tokio::task::spawn_blocking(move || {
            let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            match taken {
                Some(mut session) => session.logout().map(|()| true),
                None => Ok(false),
            }
        })
        .await;

        match outcome {
            Ok(Ok(true)) => info!("mailbox logged out"),
            Ok(Ok(false)) => debug!("logout without an open session"),
            Ok(Err(e)) => warn!(error = %e, "mailbox logout failed"),
            Err(e) => warn!(error = %e, "mailbox logout task failed"),
        }
    }
}

fn open_tls_session(
    config: &MailboxConfig,
) -> Result<imap::Session<TlsStream<TcpStream>>, MailboxError> {
    let (host, port, folder) = (config.host.as_str(), config.port, config.folder.as_str());
    let tls = TlsConnector::builder()
        .build()
        .map_err(|e| MailboxError::ConnectionFailed(e.to_string()))?;
    let client = imap::connect((host, port), host, &tls)
        .map_err(|e| MailboxError::ConnectionFailed(format!("{host}:{port}: {e}")))?;
    let mut session = client
        .login(&config.username, config.password.expose())
        .map_err(|(e, _client)| MailboxError::AuthFailed(e.to_string()))?;
    session
        .select(folder)
        .map_err(|e| MailboxError::ConnectionFailed(format!("select {folder}: {e}")))?;
    Ok(session)
}

fn fetch_from<S: Read + Write>(
    session: &mut imap::Session<S>,
    sender: &str,
    mode: FetchMode,
) -> Result<Vec<MailMessage>, MailboxError> {
    let unseen = session
        .uid_search(build_search_query(sender, true))
        .map_err(|e| MailboxError::FetchFailed(e.to_string()))?;
    let unseen = latest_uids(unseen, usize::MAX);

    if !unseen.is_empty() {
        let messages = fetch_bodies(session, &unseen)?;
        session
            .uid_store(uid_set(&unseen), MARK_SEEN)
            .map_err(|e| MailboxError::FlagFailed(e.to_string()))?;
        debug!(count = unseen.len(), "marked fetched messages seen");
        return Ok(messages);
    }

    let FetchMode::RecentFallback { limit } = mode else {
        return Ok(Vec::new());
    };

    let all = session
        .uid_search(build_search_query(sender, false))
        .map_err(|e| MailboxError::FetchFailed(e.to_string()))?;
    let recent = latest_uids(all, limit);
    if recent.is_empty() {
        return Ok(Vec::new());
    }
    debug!(count = recent.len(), limit, "dev mode: nothing unseen, returning recent messages");
    fetch_bodies(session, &recent)
}

fn fetch_bodies<S: Read + Write>(
    session: &mut imap::Session<S>,
    uids: &[u32],
) -> Result<Vec<MailMessage>, MailboxError> {
    let fetches = session
        .uid_fetch(uid_set(uids), FETCH_QUERY)
        .map_err(|e| MailboxError::FetchFailed(e.to_string()))?;

    let mut messages = Vec::with_capacity(fetches.len());
    for fetch in fetches.iter() {
        let Some(uid) = fetch.uid else {
            warn!("fetch response without UID, skipping");
            continue;
        };
        let Some(raw) = fetch.body() else {
            warn!(uid, "fetch response without body, skipping");
            continue;
        };
        match decode_message(uid, raw) {
            Ok(message) => messages.push(message),
            Err(e) => warn!(uid, error = %e, "skipping undecodable message"),
        }
    }
    messages.sort_by_key(|m| m.uid);
    Ok(messages)
}

/// `FROM "<sender>"` search, optionally restricted to unseen messages.
pub fn build_search_query(sender: &str, unseen_only: bool) -> String {
    let escaped = sender.replace('\\', "\\\\").replace('"', "\\\"");
    if unseen_only {
        format!("FROM \"{escaped}\" UNSEEN")
    } else {
        format!("FROM \"{escaped}\"")
    }
}

/// Comma-separated UID set.
pub fn uid_set(uids: &[u32]) -> String {
    uids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// The `limit` highest UIDs, ascending.
pub fn latest_uids(uids: impl IntoIterator<Item = u32>, limit: usize) -> Vec<u32> {
    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable();
    uids.dedup();
    let skip = uids.len().saturating_sub(limit);
    uids.split_off(skip)
}
