//! Scripted telemetry sources for testing.
//!
//! [`MockConnector`] hands out one [`MockSource`] per connection attempt,
//! following a script of sessions. Each session is either a connection
//! failure or a list of steps the source plays back.
//!
//! # Features
//!
//! - **Failure injection**: script failed connection attempts and mid-stream errors
//! - **Latency simulation**: delay every snapshot by a fixed amount
//! - **Inspection**: count connection attempts and closed sources

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use solarflow_types::RawReading;

use crate::error::{Error, Result};
use crate::traits::{SourceConnector, TelemetrySource};

/// One thing a [`MockSource`] does when asked for the next snapshot.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Yield a snapshot.
    Snapshot(RawReading),
    /// Fail with a protocol error.
    Fail(String),
    /// End cleanly, as if the server closed the socket.
    Close,
}

/// A scripted session: a failed connection attempt or a source to play.
#[derive(Debug, Clone)]
pub enum MockSession {
    /// `connect()` fails with this message.
    Refuse(String),
    /// `connect()` succeeds and the source plays these steps.
    Play(Vec<MockStep>),
}

/// A source that plays back a fixed list of steps.
///
/// When the steps run out the source either ends (`Ok(None)`) or stays
/// open without producing anything, depending on `hold_open`.
///
/// # Example
///
/// ```
/// use solarflow_core::{MockSource, TelemetrySource};
/// use solarflow_types::RawReading;
///
/// #[tokio::main]
/// async fn main() {
///     let mut source = MockSource::new(vec![RawReading::new().with("sensor.a", "1")]);
///     let first = source.next_snapshot().await.unwrap();
///     assert_eq!(first.unwrap().state("sensor.a"), Some("1"));
///     assert!(source.next_snapshot().await.unwrap().is_none());
/// }
/// ```
#[derive(Debug)]
pub struct MockSource {
    name: String,
    steps: VecDeque<MockStep>,
    hold_open: bool,
    latency: Duration,
    closed: Arc<AtomicU32>,
}

impl MockSource {
    /// A source that yields the given snapshots and then ends.
    pub fn new(readings: Vec<RawReading>) -> Self {
        Self::from_steps(readings.into_iter().map(MockStep::Snapshot).collect())
    }

    /// A source that plays arbitrary steps.
    pub fn from_steps(steps: Vec<MockStep>) -> Self {
        Self {
            name: "mock".to_string(),
            steps: steps.into(),
            hold_open: false,
            latency: Duration::ZERO,
            closed: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Keep the source open after the last step instead of ending.
    #[must_use]
    pub fn hold_open(mut self, hold: bool) -> Self {
        self.hold_open = hold;
        self
    }

    /// Delay every step by `latency`.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Steps not yet played.
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

#[async_trait]
impl TelemetrySource for MockSource {
    async fn next_snapshot(&mut self) -> Result<Option<RawReading>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.steps.pop_front() {
            Some(MockStep::Snapshot(reading)) => Ok(Some(reading)),
            Some(MockStep::Fail(message)) => Err(Error::Protocol(message)),
            Some(MockStep::Close) => Ok(None),
            None if self.hold_open => {
                futures::future::pending::<()>().await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.steps.clear();
        self.closed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// A connector that follows a script of sessions.
///
/// Once the script is exhausted every further attempt is refused.
#[derive(Debug)]
pub struct MockConnector {
    sessions: Mutex<VecDeque<MockSession>>,
    hold_open: bool,
    latency: Duration,
    connects: AtomicU32,
    closed: Arc<AtomicU32>,
}

impl MockConnector {
    /// Create a connector from a script.
    pub fn new(sessions: Vec<MockSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            hold_open: false,
            latency: Duration::ZERO,
            connects: AtomicU32::new(0),
            closed: Arc::new(AtomicU32::new(0)),
        }
    }

    /// A connector whose single session yields `readings` and stays open.
    pub fn streaming(readings: Vec<RawReading>) -> Self {
        Self::new(vec![MockSession::Play(
            readings.into_iter().map(MockStep::Snapshot).collect(),
        )])
        .hold_open(true)
    }

    /// Keep every source open after its last step.
    #[must_use]
    pub fn hold_open(mut self, hold: bool) -> Self {
        self.hold_open = hold;
        self
    }

    /// Delay every step of every source.
    #[must_use]
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of `connect()` calls so far.
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::Relaxed)
    }

    /// Number of sources that have been closed.
    pub fn closed_count(&self) -> u32 {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SourceConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn TelemetrySource>> {
        let attempt = self.connects.fetch_add(1, Ordering::Relaxed) + 1;
        let session = self.sessions.lock().await.pop_front();

        match session {
            Some(MockSession::Play(steps)) => {
                let mut source = MockSource::from_steps(steps)
                    .hold_open(self.hold_open)
                    .latency(self.latency);
                source.name = format!("mock#{attempt}");
                source.closed = Arc::clone(&self.closed);
                Ok(Box::new(source))
            }
            Some(MockSession::Refuse(reason)) => {
                Err(Error::connection_failed(format!("mock#{attempt}"), reason))
            }
            None => Err(Error::connection_failed(
                format!("mock#{attempt}"),
                "no more scripted sessions",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(watts: &str) -> RawReading {
        RawReading::new().with("sensor.solar_power", watts)
    }

    #[tokio::test]
    async fn test_source_plays_steps_in_order() {
        let mut source = MockSource::from_steps(vec![
            MockStep::Snapshot(reading("1")),
            MockStep::Fail("boom".into()),
            MockStep::Snapshot(reading("2")),
            MockStep::Close,
        ]);

        let first = source.next_snapshot().await.unwrap().unwrap();
        assert_eq!(first.state("sensor.solar_power"), Some("1"));
        assert!(matches!(
            source.next_snapshot().await,
            Err(Error::Protocol(msg)) if msg == "boom"
        ));
        assert!(source.next_snapshot().await.unwrap().is_some());
        assert!(source.next_snapshot().await.unwrap().is_none());
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_open_never_ends() {
        let mut source = MockSource::new(vec![]).hold_open(true);
        let result =
            tokio::time::timeout(Duration::from_secs(3600), source.next_snapshot()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_connector_follows_script() {
        let connector = MockConnector::new(vec![
            MockSession::Refuse("refused".into()),
            MockSession::Play(vec![MockStep::Snapshot(reading("5"))]),
        ]);

        assert!(connector.connect().await.is_err());
        let mut source = connector.connect().await.unwrap();
        assert_eq!(source.describe(), "mock#2");
        assert!(source.next_snapshot().await.unwrap().is_some());
        source.close().await.unwrap();

        assert!(matches!(
            connector.connect().await,
            Err(Error::ConnectionFailed { .. })
        ));
        assert_eq!(connector.connect_count(), 3);
        assert_eq!(connector.closed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_steps() {
        let mut source = MockSource::new(vec![reading("1")]).latency(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        source.next_snapshot().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
