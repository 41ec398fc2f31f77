//! IMAP mailbox source over TLS

use super::models::InboundMessage;
use super::parser::parse_raw_message;
use super::source::MailSource;
use crate::config::MailboxConfig;
use crate::error::{Result, TriageError};
use async_imap::types::Fetch;
use async_imap::Session;
use async_native_tls::TlsStream;
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::ExposeSecret;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

type ImapSession = Session<TlsStream<Compat<TcpStream>>>;

/// Reads messages from one sender out of an IMAP folder
///
/// Each call opens its own session and logs out when done. Messages are
/// fetched with `BODY.PEEK[]` so they stay unread until [`mark_read`] runs.
///
/// [`mark_read`]: MailSource::mark_read
pub struct ImapMailSource {
    config: MailboxConfig,
}

impl ImapMailSource {
    pub fn new(config: MailboxConfig) -> Result<Self> {
        if config.username.is_empty() || config.password.is_none() {
            return Err(TriageError::Config(
                "mailbox username and password must be set (GMAIL_RECIPIENT / GMAIL_PASSWORD)"
                    .to_string(),
            ));
        }

        info!(
            "Mailbox configured: {} on {}:{}, filtering sender {}",
            config.username, config.host, config.port, config.sender_filter
        );

        Ok(Self { config })
    }

    async fn connect(&self) -> Result<ImapSession> {
        let host = self.config.host.as_str();
        debug!(host = %host, port = self.config.port, "Connecting to IMAP server");

        let tcp = TcpStream::connect((host, self.config.port))
            .await
            .map_err(|e| TriageError::Mailbox(format!("TCP connection failed: {}", e)))?;

        let tls_stream = async_native_tls::TlsConnector::new()
            .connect(host, tcp.compat())
            .await
            .map_err(|e| TriageError::Mailbox(format!("TLS handshake failed: {}", e)))?;

        let password = self
            .config
            .password
            .as_ref()
            .map(|p| p.expose_secret().clone())
            .unwrap_or_default();

        let mut session = async_imap::Client::new(tls_stream)
            .login(&self.config.username, &password)
            .await
            .map_err(|(e, _)| TriageError::Mailbox(format!("Login failed: {}", e)))?;

        session
            .select(&self.config.folder)
            .await
            .map_err(|e| TriageError::Mailbox(format!("SELECT {} failed: {}", self.config.folder, e)))?;

        Ok(session)
    }

    fn search_criteria(&self) -> String {
        if self.config.unread_only {
            format!("FROM \"{}\" UNSEEN", self.config.sender_filter)
        } else {
            format!("FROM \"{}\"", self.config.sender_filter)
        }
    }

    async fn fetch_with(&self, session: &mut ImapSession) -> Result<Vec<InboundMessage>> {
        let criteria = self.search_criteria();
        debug!("Searching: {}", criteria);

        let found = session
            .uid_search(&criteria)
            .await
            .map_err(|e| TriageError::Mailbox(format!("SEARCH failed: {}", e)))?;

        let uids = newest_uids(found, self.config.max_results);
        if uids.is_empty() {
            debug!("No messages found");
            return Ok(Vec::new());
        }

        let uid_list = join_uids(&uids);
        let fetches = collect_tolerant(
            session
                .uid_fetch(&uid_list, "(UID BODY.PEEK[])")
                .await
                .map_err(|e| TriageError::Mailbox(format!("FETCH failed: {}", e)))?,
        )
        .await;

        let mut messages: Vec<(u32, InboundMessage)> = fetches
            .iter()
            .filter_map(|fetch| {
                let uid = fetch.uid?;
                let raw = fetch.body()?;
                match parse_raw_message(&uid.to_string(), raw) {
                    Ok(message) => Some((uid, message)),
                    Err(e) => {
                        warn!("Skipping message {}: {}", uid, e);
                        None
                    }
                }
            })
            .collect();

        // Servers may answer out of order
        messages.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(messages.into_iter().map(|(_, m)| m).collect())
    }

    async fn store_seen(&self, session: &mut ImapSession, uid_list: &str) -> Result<()> {
        let updates = session
            .uid_store(uid_list, "+FLAGS (\\Seen)")
            .await
            .map_err(|e| TriageError::Mailbox(format!("STORE failed: {}", e)))?;
        collect_tolerant(updates).await;
        Ok(())
    }
}

#[async_trait]
impl MailSource for ImapMailSource {
    async fn fetch_messages(&self) -> Result<Vec<InboundMessage>> {
        let mut session = self.connect().await?;
        let result = self.fetch_with(&mut session).await;

        if let Err(e) = session.logout().await {
            warn!("IMAP logout failed: {}", e);
        }

        let messages = result?;
        info!("Fetched {} messages from {}", messages.len(), self.config.folder);
        Ok(messages)
    }

    async fn mark_read(&self, ids: &[String]) -> Result<()> {
        let uids: Vec<u32> = ids.iter().filter_map(|id| id.parse().ok()).collect();
        if uids.is_empty() {
            return Ok(());
        }

        let mut session = self.connect().await?;
        let result = self.store_seen(&mut session, &join_uids(&uids)).await;

        if let Err(e) = session.logout().await {
            warn!("IMAP logout failed: {}", e);
        }

        result?;
        debug!("Marked {} messages as read", uids.len());
        Ok(())
    }

    fn name(&self) -> &str {
        "imap"
    }
}

/// Collect a FETCH/STORE response stream, skipping unparseable items
async fn collect_tolerant<E: std::fmt::Display>(
    stream: impl futures::Stream<Item = std::result::Result<Fetch, E>>,
) -> Vec<Fetch> {
    futures::pin_mut!(stream);
    let mut items = Vec::new();
    while let Some(result) = stream.next().await {
        match result {
            Ok(fetch) => items.push(fetch),
            Err(e) => warn!("Skipping unparseable IMAP response: {}", e),
        }
    }
    items
}

/// The `max` highest UIDs, highest first
fn newest_uids(found: impl IntoIterator<Item = u32>, max: usize) -> Vec<u32> {
    let mut uids: Vec<u32> = found.into_iter().collect();
    uids.sort_unstable_by(|a, b| b.cmp(a));
    uids.truncate(max);
    uids
}

fn join_uids(uids: &[u32]) -> String {
    uids.iter()
        .map(|u| u.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
