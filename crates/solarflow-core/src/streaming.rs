//! Reconnecting stream of telemetry events.
//!
//! [`SnapshotStream`] owns a background task that connects through a
//! [`SourceConnector`], forwards every snapshot, and reconnects with
//! exponential backoff when the connection fails or is closed. Connection
//! changes are reported in-band as [`TelemetryEvent`]s.
//!
//! The stream supports graceful shutdown via [`SnapshotStream::close`],
//! which uses a cancellation token to stop the background task and close
//! the open source.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{DisconnectReason, TelemetryEvent};
use crate::reconnect::ReconnectOptions;
use crate::traits::{SourceConnector, TelemetrySource};

/// Options for snapshot streams.
///
/// ```
/// use std::time::Duration;
/// use solarflow_core::{ReconnectOptions, StreamOptions};
///
/// let options = StreamOptions::builder()
///     .buffer_size(32)
///     .reconnect(ReconnectOptions::default().max_delay(Duration::from_secs(30)))
///     .build();
/// assert_eq!(options.buffer_size, 32);
/// ```
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Buffer size for the event channel.
    /// Default: 16 events.
    pub buffer_size: usize,
    /// Reconnection policy.
    pub reconnect: ReconnectOptions,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            buffer_size: 16,
            reconnect: ReconnectOptions::default(),
        }
    }
}

impl StreamOptions {
    /// Create a new builder for StreamOptions.
    pub fn builder() -> StreamOptionsBuilder {
        StreamOptionsBuilder::default()
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "buffer_size must be > 0".to_string(),
            ));
        }
        self.reconnect.validate()
    }
}

/// Builder for StreamOptions.
#[derive(Debug, Clone, Default)]
pub struct StreamOptionsBuilder {
    options: StreamOptions,
}

impl StreamOptionsBuilder {
    /// Set the buffer size.
    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.options.buffer_size = size;
        self
    }

    /// Set the reconnection policy.
    #[must_use]
    pub fn reconnect(mut self, reconnect: ReconnectOptions) -> Self {
        self.options.reconnect = reconnect;
        self
    }

    /// Build the StreamOptions.
    #[must_use]
    pub fn build(self) -> StreamOptions {
        self.options
    }
}

/// A stream of telemetry events backed by a reconnecting background task.
pub struct SnapshotStream {
    receiver: mpsc::Receiver<TelemetryEvent>,
    handle: tokio::task::JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl SnapshotStream {
    /// Start streaming from a connector.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C>(connector: C, options: StreamOptions) -> Self
    where
        C: SourceConnector + 'static,
    {
        Self::spawn_shared(Arc::new(connector), options)
    }

    /// Start streaming from a shared connector.
    pub fn spawn_shared(connector: Arc<dyn SourceConnector>, options: StreamOptions) -> Self {
        let (tx, rx) = mpsc::channel(options.buffer_size.max(1));
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            run(connector, options.reconnect, tx, task_token).await;
        });

        Self {
            receiver: rx,
            handle,
            cancel_token,
        }
    }

    /// Receive the next event. Returns `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<TelemetryEvent> {
        self.receiver.recv().await
    }

    /// Close the stream and stop the background task gracefully.
    ///
    /// The open source, if any, is closed before the task exits.
    pub fn close(self) {
        self.cancel_token.cancel();
    }

    /// Get a cancellation token that can be used to cancel the stream externally.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Check if the stream is still active (background task running).
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Check if the stream has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Stream for SnapshotStream {
    type Item = TelemetryEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Why a single connected session ended.
enum SessionEnd {
    Lost(DisconnectReason),
    Stopped,
}

async fn run(
    connector: Arc<dyn SourceConnector>,
    policy: ReconnectOptions,
    tx: mpsc::Sender<TelemetryEvent>,
    token: CancellationToken,
) {
    // Reconnect attempts since the last successful connection.
    let mut retries: u32 = 0;

    loop {
        let connected = tokio::select! {
            _ = token.cancelled() => break,
            result = connector.connect() => result,
        };

        let reason = match connected {
            Ok(mut source) => {
                retries = 0;
                let description = source.describe();
                info!(source = %description, "Telemetry connected");
                if tx
                    .send(TelemetryEvent::Connected {
                        source: description,
                    })
                    .await
                    .is_err()
                {
                    close_source(source.as_mut()).await;
                    break;
                }

                let end = pump(source.as_mut(), &tx, &token).await;
                close_source(source.as_mut()).await;
                match end {
                    SessionEnd::Lost(reason) => reason,
                    SessionEnd::Stopped => break,
                }
            }
            Err(e) => {
                warn!(error = %e, "Telemetry connection failed");
                if !e.is_retryable() {
                    let _ = tx
                        .send(TelemetryEvent::Disconnected {
                            reason: DisconnectReason::from(&e),
                        })
                        .await;
                    let _ = tx.send(TelemetryEvent::GaveUp { attempts: retries }).await;
                    break;
                }
                DisconnectReason::from(&e)
            }
        };

        if tx
            .send(TelemetryEvent::Disconnected { reason })
            .await
            .is_err()
        {
            break;
        }

        if !policy.allows_attempt(retries + 1) {
            warn!(attempts = retries, "Giving up on telemetry connection");
            let _ = tx.send(TelemetryEvent::GaveUp { attempts: retries }).await;
            break;
        }

        let delay = policy.delay_for_attempt(retries);
        retries += 1;
        info!(attempt = retries, ?delay, "Reconnecting");
        if tx
            .send(TelemetryEvent::ReconnectScheduled {
                attempt: retries,
                delay,
            })
            .await
            .is_err()
        {
            break;
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    debug!("Telemetry stream stopped");
}

async fn pump(
    source: &mut dyn TelemetrySource,
    tx: &mpsc::Sender<TelemetryEvent>,
    token: &CancellationToken,
) -> SessionEnd {
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => return SessionEnd::Stopped,
            next = source.next_snapshot() => next,
        };

        match next {
            Ok(Some(reading)) => {
                if tx.send(TelemetryEvent::Snapshot { reading }).await.is_err() {
                    debug!("Stream receiver dropped, stopping");
                    return SessionEnd::Stopped;
                }
            }
            Ok(None) => return SessionEnd::Lost(DisconnectReason::ServerClosed),
            Err(e) => {
                warn!(error = %e, "Telemetry stream error");
                return SessionEnd::Lost(DisconnectReason::from(&e));
            }
        }
    }
}

async fn close_source(source: &mut dyn TelemetrySource) {
    if let Err(e) = source.close().await {
        debug!(error = %e, "Error while closing telemetry source");
    }
}
