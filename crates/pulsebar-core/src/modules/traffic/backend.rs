use pulsebar_proto::ports::traffic::{CounterTotals, TrafficStatsError, TrafficStatsPort};
use sysinfo::Networks;

/// Statistics backend reading cumulative counters from the host's network
/// interfaces.
///
/// Totals are summed across every interface, so traffic moving over any link
/// is attributed to the tracked connection.
#[derive(Debug)]
pub struct SysinfoTrafficStats {
    networks: Networks,
}

impl SysinfoTrafficStats {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoTrafficStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficStatsPort for SysinfoTrafficStats {
    fn totals(&mut self) -> Result<CounterTotals, TrafficStatsError> {
        self.networks.refresh(true);

        let mut totals = CounterTotals::default();
        for (_, data) in &self.networks {
            totals.rx_bytes = totals.rx_bytes.saturating_add(data.total_received());
            totals.tx_bytes = totals.tx_bytes.saturating_add(data.total_transmitted());
        }

        Ok(totals)
    }
}
