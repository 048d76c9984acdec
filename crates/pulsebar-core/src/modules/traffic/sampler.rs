use std::time::Instant;

use pulsebar_proto::ports::traffic::CounterTotals;

/// Immutable counter snapshot taken at sample time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleReading {
    /// Cumulative bytes received.
    pub rx_bytes: u64,
    /// Cumulative bytes transmitted.
    pub tx_bytes: u64,
    /// Milliseconds on the sampler's monotonic clock.
    pub timestamp_ms: u64,
}

/// Captures counter snapshots and remembers the previous one for delta math.
///
/// Timestamps are measured against a process-local [`Instant`] epoch, so they
/// can never regress even if the wall clock jumps.
#[derive(Debug)]
pub struct TrafficSampler {
    epoch: Instant,
    prev: Option<SampleReading>,
}

impl TrafficSampler {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            prev: None,
        }
    }

    /// Snapshot the given totals at the current monotonic time.
    pub fn capture(&self, totals: CounterTotals) -> SampleReading {
        SampleReading {
            rx_bytes: totals.rx_bytes,
            tx_bytes: totals.tx_bytes,
            timestamp_ms: self.epoch.elapsed().as_millis() as u64,
        }
    }

    /// The reading persisted by the last [`store`](Self::store), if any.
    pub fn previous(&self) -> Option<SampleReading> {
        self.prev
    }

    /// Persist `reading` as the baseline for the next delta.
    pub fn store(&mut self, reading: SampleReading) {
        self.prev = Some(reading);
    }

    /// Drop the baseline; the next tick observes "no data yet".
    pub fn reset(&mut self) {
        self.prev = None;
    }
}

impl Default for TrafficSampler {
    fn default() -> Self {
        Self::new()
    }
}
