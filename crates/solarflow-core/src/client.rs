//! Home Assistant websocket client.
//!
//! [`HassConnection`] owns one authenticated websocket and keeps the local
//! entity map that compressed `subscribe_entities` events are applied to.
//! Every event yields a full [`RawReading`] snapshot of the subscribed
//! entities.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use solarflow_types::RawReading;

use crate::error::{Error, Result};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::traits::{SourceConnector, TelemetrySource};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default bound on connecting and authenticating.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const WEBSOCKET_PATH: &str = "/api/websocket";

/// Map a configured Home Assistant URL to its websocket endpoint.
///
/// `http` becomes `ws` and `https` becomes `wss`; websocket URLs are used
/// as given, with the API path appended when missing.
///
/// ```
/// use solarflow_core::client::websocket_url;
///
/// assert_eq!(
///     websocket_url("http://homeassistant.local:8123").unwrap(),
///     "ws://homeassistant.local:8123/api/websocket"
/// );
/// ```
pub fn websocket_url(base: &str) -> Result<String> {
    let base = base.trim();
    if base.is_empty() {
        return Err(Error::invalid_config("Home Assistant URL is not set"));
    }

    let (scheme, rest) = base
        .split_once("://")
        .ok_or_else(|| Error::invalid_config(format!("URL '{base}' has no scheme")))?;
    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::invalid_config(format!(
                "unsupported URL scheme '{other}'"
            )));
        }
    };

    let rest = rest.trim_end_matches('/');
    if rest.is_empty() || rest.starts_with('/') {
        return Err(Error::invalid_config(format!("URL '{base}' has no host")));
    }

    if rest.ends_with(WEBSOCKET_PATH) {
        Ok(format!("{ws_scheme}://{rest}"))
    } else {
        Ok(format!("{ws_scheme}://{rest}{WEBSOCKET_PATH}"))
    }
}

/// Where and how to connect.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Base URL of the Home Assistant instance.
    pub url: String,
    /// Long-lived access token.
    pub token: String,
    /// Bound on connecting, authenticating and subscribing.
    pub timeout: Duration,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConnectionConfig {
    /// Create a config with the default timeout.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the handshake timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that the URL and token are usable.
    pub fn validate(&self) -> Result<()> {
        websocket_url(&self.url)?;
        if self.token.trim().is_empty() {
            return Err(Error::invalid_config("Home Assistant access token is not set"));
        }
        if self.timeout.is_zero() {
            return Err(Error::invalid_config("timeout must be > 0"));
        }
        Ok(())
    }

    /// The websocket endpoint for this config.
    pub fn websocket_url(&self) -> Result<String> {
        websocket_url(&self.url)
    }
}

/// An authenticated connection to Home Assistant.
pub struct HassConnection {
    socket: Socket,
    url: String,
    timeout: Duration,
    next_id: u64,
    subscription: Option<u64>,
    entities: RawReading,
    ha_version: Option<String>,
    /// Set once the server has closed the session.
    closed: bool,
}

impl fmt::Debug for HassConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HassConnection")
            .field("url", &self.url)
            .field("subscription", &self.subscription)
            .field("entities", &self.entities.len())
            .field("ha_version", &self.ha_version)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl HassConnection {
    /// Open the websocket and authenticate.
    ///
    /// The whole handshake is bounded by `config.timeout`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let url = config.websocket_url()?;
        info!(url = %url, "Connecting to Home Assistant");

        let handshake = Self::handshake(url, &config.token, config.timeout);
        tokio::time::timeout(config.timeout, handshake)
            .await
            .map_err(|_| Error::timeout("connect", config.timeout))?
    }

    async fn handshake(url: String, token: &str, timeout: Duration) -> Result<Self> {
        let (mut socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::connection_failed(&url, e.to_string()))?;

        let ha_version = match read_message(&mut socket).await? {
            Some(ServerMessage::AuthRequired { ha_version }) => ha_version,
            Some(other) => {
                return Err(Error::Protocol(format!(
                    "expected auth_required, got {other:?}"
                )));
            }
            None => return Err(Error::connection_failed(&url, "closed before authentication")),
        };

        let auth = ClientMessage::Auth {
            access_token: token.to_string(),
        };
        socket.send(Message::Text(auth.to_json()?)).await?;

        let ha_version = match read_message(&mut socket).await? {
            Some(ServerMessage::AuthOk { ha_version: ok }) => ok.or(ha_version),
            Some(ServerMessage::AuthInvalid { message }) => {
                let _ = socket.close(None).await;
                return Err(Error::Auth(
                    message.unwrap_or_else(|| "invalid access token".to_string()),
                ));
            }
            Some(other) => {
                return Err(Error::Protocol(format!(
                    "expected auth_ok, got {other:?}"
                )));
            }
            None => return Err(Error::connection_failed(&url, "closed during authentication")),
        };

        info!(
            url = %url,
            version = ha_version.as_deref().unwrap_or("unknown"),
            "Authenticated with Home Assistant"
        );

        Ok(Self {
            socket,
            url,
            timeout,
            next_id: 1,
            subscription: None,
            entities: RawReading::new(),
            ha_version,
            closed: false,
        })
    }

    /// Subscribe to state updates of the given entities.
    ///
    /// Waits for the server to confirm the subscription.
    pub async fn subscribe_entities(&mut self, entity_ids: &[String]) -> Result<()> {
        let id = self.allocate_id();
        let request = ClientMessage::SubscribeEntities {
            id,
            entity_ids: entity_ids.to_vec(),
        };
        debug!(id, count = entity_ids.len(), "Subscribing to entities");
        self.socket.send(Message::Text(request.to_json()?)).await?;

        let timeout = self.timeout;
        tokio::time::timeout(timeout, self.await_result(id, "subscribe_entities"))
            .await
            .map_err(|_| Error::timeout("subscribe_entities", timeout))??;

        self.subscription = Some(id);
        Ok(())
    }

    async fn await_result(&mut self, id: u64, command: &str) -> Result<()> {
        loop {
            match read_message(&mut self.socket).await? {
                Some(ServerMessage::Result {
                    id: result_id,
                    success,
                    error,
                }) if result_id == id => {
                    if success {
                        return Ok(());
                    }
                    return Err(Error::CommandFailed {
                        command: command.to_string(),
                        message: error.map(|e| e.message).unwrap_or_default(),
                    });
                }
                Some(ServerMessage::Event { id: event_id, event }) if event_id == id => {
                    // Initial state can race ahead of the confirmation.
                    event.apply(&mut self.entities);
                }
                Some(other) => trace!(?other, "Ignoring message while awaiting result"),
                None => return Err(Error::connection_failed(&self.url, "closed while subscribing")),
            }
        }
    }

    /// Wait for the next subscription event and return the full entity map.
    ///
    /// Returns `Ok(None)` once the server closes the connection.
    pub async fn next_snapshot(&mut self) -> Result<Option<RawReading>> {
        let Some(subscription) = self.subscription else {
            return Err(Error::NotConnected);
        };

        loop {
            match read_message(&mut self.socket).await? {
                Some(ServerMessage::Event { id, event }) if id == subscription => {
                    event.apply(&mut self.entities);
                    trace!(
                        added = event.added.len(),
                        changed = event.changed.len(),
                        removed = event.removed.len(),
                        "Applied entity diff"
                    );
                    return Ok(Some(self.entities.clone()));
                }
                Some(ServerMessage::Result {
                    success: false,
                    error,
                    ..
                }) => {
                    let message = error.map(|e| e.message).unwrap_or_default();
                    warn!(%message, "Home Assistant reported an error");
                }
                Some(other) => trace!(?other, "Ignoring message"),
                None => {
                    info!(url = %self.url, "Home Assistant closed the connection");
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Close the websocket.
    ///
    /// A no-op once the server has closed the session; the close reply is
    /// already queued by then.
    pub async fn close(&mut self) -> Result<()> {
        self.subscription = None;
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.socket.close(None).await {
            Ok(())
            | Err(
                tungstenite::Error::ConnectionClosed
                | tungstenite::Error::AlreadyClosed
                | tungstenite::Error::Protocol(ProtocolError::SendAfterClosing),
            ) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the session has ended, from either side.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Entities as of the last applied event.
    pub fn entities(&self) -> &RawReading {
        &self.entities
    }

    /// Home Assistant version reported during authentication.
    pub fn ha_version(&self) -> Option<&str> {
        self.ha_version.as_deref()
    }

    /// Websocket endpoint in use.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

async fn read_message(socket: &mut Socket) -> Result<Option<ServerMessage>> {
    while let Some(frame) = socket.next().await {
        match frame? {
            Message::Text(text) => return Ok(Some(ServerMessage::from_json(&text)?)),
            Message::Binary(bytes) => return Ok(Some(serde_json::from_slice(&bytes)?)),
            Message::Close(frame) => {
                debug!(?frame, "Received close frame");
                return Ok(None);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        }
    }
    Ok(None)
}

#[async_trait]
impl TelemetrySource for HassConnection {
    async fn next_snapshot(&mut self) -> Result<Option<RawReading>> {
        HassConnection::next_snapshot(self).await
    }

    async fn close(&mut self) -> Result<()> {
        HassConnection::close(self).await
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Connects and subscribes to a fixed set of entities.
#[derive(Debug, Clone)]
pub struct HassConnector {
    config: ConnectionConfig,
    entity_ids: Vec<String>,
}

impl HassConnector {
    /// Create a connector for the given entities.
    pub fn new(config: ConnectionConfig, entity_ids: Vec<String>) -> Self {
        Self { config, entity_ids }
    }

    /// Connection settings.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

#[async_trait]
impl SourceConnector for HassConnector {
    async fn connect(&self) -> Result<Box<dyn TelemetrySource>> {
        let mut connection = HassConnection::connect(&self.config).await?;
        connection.subscribe_entities(&self.entity_ids).await?;
        Ok(Box::new(connection))
    }
}
