//! Trait for producing device records.

use crate::error::Result;
use crate::metrics::data::DeviceRecord;
use async_trait::async_trait;

/// A source of flat device records, one per physical device.
///
/// The extraction engine treats the source as a black box: each poll asks
/// for a fresh record set and derives samples from it, retaining nothing
/// between polls. Calling [`fetch_records`](Self::fetch_records) twice
/// yields independent results.
///
/// The production implementation talks to a Hue bridge over HTTP; tests
/// substitute an in-memory source.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the current record set for all devices.
    ///
    /// Errors here mean the source is unavailable and abort the poll.
    async fn fetch_records(&self) -> Result<Vec<DeviceRecord>>;
}
