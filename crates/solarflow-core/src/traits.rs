//! Trait abstractions over telemetry sources.
//!
//! [`TelemetrySource`] abstracts over the live Home Assistant connection
//! and the scripted or synthetic sources used for tests and demos.
//! [`SourceConnector`] produces fresh sources, which is what the reconnect
//! loop needs.

use async_trait::async_trait;

use solarflow_types::RawReading;

use crate::error::Result;

/// An open subscription that yields full sensor snapshots.
///
/// # Example
///
/// ```ignore
/// use solarflow_core::{TelemetrySource, Result};
///
/// async fn first_snapshot<S: TelemetrySource>(source: &mut S) -> Result<()> {
///     if let Some(reading) = source.next_snapshot().await? {
///         println!("{} sensors", reading.len());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait TelemetrySource: Send {
    /// Wait for the next snapshot.
    ///
    /// Returns `Ok(None)` when the source ended cleanly.
    async fn next_snapshot(&mut self) -> Result<Option<RawReading>>;

    /// Close the subscription.
    async fn close(&mut self) -> Result<()>;

    /// Short description of where the data comes from, for logs and status lines.
    fn describe(&self) -> String;
}

/// Opens new [`TelemetrySource`]s.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Establish a new subscription.
    async fn connect(&self) -> Result<Box<dyn TelemetrySource>>;
}

#[async_trait]
impl TelemetrySource for Box<dyn TelemetrySource> {
    async fn next_snapshot(&mut self) -> Result<Option<RawReading>> {
        (**self).next_snapshot().await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
