//! Background worker for telemetry.
//!
//! The [`TelemetryWorker`] owns the [`SnapshotStream`] so that connecting,
//! waiting for pushes and backing off never block rendering. It talks to the
//! UI through channels:
//!
//! - Receives [`Command`]s from the UI
//! - Forwards every [`TelemetryEvent`] of the stream to the UI
//!
//! After the stream gives up the worker stays alive and idles until the
//! user asks for a reconnect or quits.

use std::sync::Arc;

use solarflow_core::{DisconnectReason, SnapshotStream, SourceConnector, StreamOptions};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::messages::{Command, TelemetryEvent};

/// Background worker that drives the telemetry stream.
pub struct TelemetryWorker {
    /// Receiver for commands from the UI.
    command_rx: mpsc::Receiver<Command>,
    /// Sender for events back to the UI.
    event_tx: mpsc::Sender<TelemetryEvent>,
    /// Source to (re)connect to.
    connector: Arc<dyn SourceConnector>,
    /// Stream settings, reused for every restart.
    options: StreamOptions,
}

impl TelemetryWorker {
    /// Create a new worker.
    pub fn new(
        command_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::Sender<TelemetryEvent>,
        connector: Arc<dyn SourceConnector>,
        options: StreamOptions,
    ) -> Self {
        Self {
            command_rx,
            event_tx,
            connector,
            options,
        }
    }

    fn start_stream(&self) -> SnapshotStream {
        SnapshotStream::spawn_shared(Arc::clone(&self.connector), self.options.clone())
    }

    /// Run until [`Command::Shutdown`] arrives or either channel closes.
    pub async fn run(mut self) {
        info!("TelemetryWorker started");
        let mut stream = Some(self.start_stream());

        loop {
            let event = match stream.as_mut() {
                Some(active) => tokio::select! {
                    cmd = self.command_rx.recv() => Err(cmd),
                    event = active.recv() => Ok(event),
                },
                None => Err(self.command_rx.recv().await),
            };

            match event {
                Ok(Some(event)) => {
                    if self.event_tx.send(event).await.is_err() {
                        debug!("Event channel closed, shutting down worker");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Telemetry stream ended");
                    stream = None;
                }
                Err(Some(Command::Reconnect)) => {
                    info!("Manual reconnect requested");
                    if let Some(old) = stream.take() {
                        old.close();
                        let _ = self
                            .event_tx
                            .send(TelemetryEvent::Disconnected {
                                reason: DisconnectReason::UserRequested,
                            })
                            .await;
                    }
                    stream = Some(self.start_stream());
                }
                Err(Some(Command::Shutdown)) => {
                    info!("TelemetryWorker received shutdown command");
                    break;
                }
                Err(None) => {
                    info!("Command channel closed, shutting down worker");
                    break;
                }
            }
        }

        if let Some(stream) = stream {
            stream.close();
        }
        info!("TelemetryWorker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarflow_core::{MockConnector, MockSession, RawReading, ReconnectOptions};
    use std::time::Duration;

    fn options() -> StreamOptions {
        StreamOptions::builder()
            .reconnect(ReconnectOptions::fixed_delay(Duration::from_millis(10)).max_attempts(1))
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_forwards_events_and_shuts_down() {
        let connector = MockConnector::streaming(vec![
            RawReading::new().with("sensor.solar_power", "1200"),
        ]);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let worker = TelemetryWorker::new(cmd_rx, event_tx, Arc::new(connector), options());
        let handle = tokio::spawn(worker.run());

        assert!(matches!(
            event_rx.recv().await,
            Some(TelemetryEvent::Connected { .. })
        ));
        assert!(matches!(
            event_rx.recv().await,
            Some(TelemetryEvent::Snapshot { .. })
        ));

        cmd_tx.send(Command::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_reconnect_restarts_stream() {
        let connector =
            MockConnector::new(vec![MockSession::Play(vec![]), MockSession::Play(vec![])])
                .hold_open(true);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        let worker = TelemetryWorker::new(cmd_rx, event_tx, Arc::new(connector), options());
        let handle = tokio::spawn(worker.run());

        assert!(matches!(
            event_rx.recv().await,
            Some(TelemetryEvent::Connected { .. })
        ));

        cmd_tx.send(Command::Reconnect).await.unwrap();
        assert!(matches!(
            event_rx.recv().await,
            Some(TelemetryEvent::Disconnected {
                reason: DisconnectReason::UserRequested
            })
        ));
        assert!(matches!(
            event_rx.recv().await,
            Some(TelemetryEvent::Connected { .. })
        ));

        drop(cmd_tx);
        handle.await.unwrap();
    }
}
