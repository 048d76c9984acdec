use log::warn;
use pulsebar_proto::config::{SpeedUnit, TrafficModuleConfig};

use super::sampler::SampleReading;

/// Distinguishes the periodic timer from ad-hoc refreshes triggered by
/// settings, connectivity, or screen events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    Periodic,
    Refresh,
}

/// Transfer direction a rate was derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Magnitude bucket selected for display scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Base,
    Kilo,
    Mega,
    Giga,
}

impl Tier {
    /// Prefix inserted between the number and the unit symbol.
    pub fn prefix(self) -> &'static str {
        match self {
            Tier::Base => "",
            Tier::Kilo => "k",
            Tier::Mega => "M",
            Tier::Giga => "G",
        }
    }

    fn exponent(self) -> i32 {
        match self {
            Tier::Base => 0,
            Tier::Kilo => 1,
            Tier::Mega => 2,
            Tier::Giga => 3,
        }
    }

    fn select(speed: f64, base: u64) -> Self {
        let base = base as f64;
        if speed < base {
            Tier::Base
        } else if speed < base * base {
            Tier::Kilo
        } else if speed < base * base * base {
            Tier::Mega
        } else {
            Tier::Giga
        }
    }
}

/// Speed derived for one direction, scaled into its display tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateResult {
    /// Value scaled into the tier, e.g. 2.0 for 2 MB/s.
    pub magnitude: f64,
    pub tier: Tier,
    pub direction: Direction,
}

/// Rates for the directions enabled in the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficRates {
    pub up: Option<RateResult>,
    pub down: Option<RateResult>,
}

/// Result of one delta computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateOutcome {
    /// Too-soon periodic resample; the last result stays valid and the
    /// baseline must not advance.
    Skip,
    Computed(TrafficRates),
}

/// Derive per-direction rates from two consecutive readings.
///
/// A periodic tick arriving well before the configured interval has elapsed
/// is skipped; ad-hoc refresh ticks always recompute, clamping a ~zero
/// elapsed interval so the rate rounds to zero instead of faulting.
pub fn compute(
    prev: &SampleReading,
    curr: &SampleReading,
    kind: TickKind,
    config: &TrafficModuleConfig,
) -> RateOutcome {
    let elapsed_ms = curr.timestamp_ms.saturating_sub(prev.timestamp_ms);

    if elapsed_ms < config.interval_ms.saturating_mul(95) / 100 && kind == TickKind::Periodic {
        return RateOutcome::Skip;
    }

    let divisor_ms = if elapsed_ms < 1 { u64::MAX } else { elapsed_ms };

    let up = config.directions.up.then(|| {
        rate_for(
            prev.tx_bytes,
            curr.tx_bytes,
            divisor_ms,
            config.unit,
            Direction::Up,
        )
    });
    let down = config.directions.down.then(|| {
        rate_for(
            prev.rx_bytes,
            curr.rx_bytes,
            divisor_ms,
            config.unit,
            Direction::Down,
        )
    });

    RateOutcome::Computed(TrafficRates { up, down })
}

fn rate_for(
    prev: u64,
    curr: u64,
    divisor_ms: u64,
    unit: SpeedUnit,
    direction: Direction,
) -> RateResult {
    let delta = if curr < prev {
        // counter wrapped or the interface reset
        warn!("counter regression ({direction:?}): {curr} < {prev}, treating delta as zero");
        0
    } else {
        curr - prev
    };

    let delta = match unit {
        SpeedUnit::Bits => delta.saturating_mul(8),
        SpeedUnit::Bytes => delta,
    };

    let speed = delta as f64 / (divisor_ms as f64 / 1000.0);
    let base = unit.base();
    let tier = Tier::select(speed, base);
    let magnitude = speed / (base as f64).powi(tier.exponent());

    RateResult {
        magnitude,
        tier,
        direction,
    }
}

/// Format a computed rate for display, e.g. `2.0MB/s`.
///
/// One fractional digit, rounded half-up.
pub fn format_rate(rate: &RateResult, unit: SpeedUnit) -> String {
    let rounded = (rate.magnitude * 10.0).round() / 10.0;
    format!("{rounded:.1}{}{}", rate.tier.prefix(), unit.symbol())
}

#[cfg(test)]
mod tests {
    use pulsebar_proto::config::Directions;

    use super::*;

    fn reading(rx: u64, tx: u64, timestamp_ms: u64) -> SampleReading {
        SampleReading {
            rx_bytes: rx,
            tx_bytes: tx,
            timestamp_ms,
        }
    }

    fn config(unit: SpeedUnit, up: bool, down: bool) -> TrafficModuleConfig {
        TrafficModuleConfig {
            unit,
            directions: Directions { up, down },
            ..TrafficModuleConfig::default()
        }
    }

    fn expect_computed(outcome: RateOutcome) -> TrafficRates {
        match outcome {
            RateOutcome::Computed(rates) => rates,
            RateOutcome::Skip => panic!("expected a computed rate"),
        }
    }

    #[test]
    fn two_mebibytes_over_one_second_is_two_mega_bytes_per_second() {
        let prev = reading(0, 0, 0);
        let curr = reading(2_097_152, 0, 1000);
        let config = config(SpeedUnit::Bytes, false, true);

        let rates = expect_computed(compute(&prev, &curr, TickKind::Periodic, &config));
        let down = rates.down.expect("down rate");

        assert_eq!(down.tier, Tier::Mega);
        assert!((down.magnitude - 2.0).abs() < f64::EPSILON);
        assert_eq!(format_rate(&down, config.unit), "2.0MB/s");
    }

    #[test]
    fn five_hundred_bytes_over_half_a_second_in_bit_mode_is_eight_kilobits() {
        let prev = reading(0, 0, 0);
        let curr = reading(0, 500, 500);
        let config = config(SpeedUnit::Bits, true, false);

        // half the interval has elapsed, so only a refresh tick recomputes
        let rates = expect_computed(compute(&prev, &curr, TickKind::Refresh, &config));
        let up = rates.up.expect("up rate");

        assert_eq!(up.tier, Tier::Kilo);
        assert!((up.magnitude - 8.0).abs() < f64::EPSILON);
        assert_eq!(format_rate(&up, config.unit), "8.0kb/s");
    }

    #[test]
    fn early_periodic_tick_is_skipped() {
        let prev = reading(0, 0, 0);
        let curr = reading(1000, 1000, 400);
        let config = config(SpeedUnit::Bytes, true, true);

        assert_eq!(
            compute(&prev, &curr, TickKind::Periodic, &config),
            RateOutcome::Skip
        );
    }

    #[test]
    fn on_time_periodic_tick_is_computed() {
        let prev = reading(0, 0, 0);
        let curr = reading(1024, 0, 950);
        let config = config(SpeedUnit::Bytes, false, true);

        let rates = expect_computed(compute(&prev, &curr, TickKind::Periodic, &config));
        assert!(rates.down.is_some());
        assert!(rates.up.is_none());
    }

    #[test]
    fn zero_elapsed_refresh_clamps_to_zero_rate() {
        let prev = reading(0, 0, 100);
        let curr = reading(1_000_000, 1_000_000, 100);
        let config = config(SpeedUnit::Bytes, true, true);

        let rates = expect_computed(compute(&prev, &curr, TickKind::Refresh, &config));
        let down = rates.down.expect("down rate");

        assert_eq!(down.tier, Tier::Base);
        assert_eq!(format_rate(&down, config.unit), "0.0B/s");
    }

    #[test]
    fn counter_regression_yields_zero_not_negative() {
        let prev = reading(1000, 1000, 0);
        let curr = reading(900, 900, 1000);
        let config = config(SpeedUnit::Bytes, true, true);

        let rates = expect_computed(compute(&prev, &curr, TickKind::Periodic, &config));
        assert_eq!(rates.down.expect("down").magnitude, 0.0);
        assert_eq!(rates.up.expect("up").magnitude, 0.0);
    }

    #[test]
    fn tier_selection_respects_base_thresholds() {
        for (delta, expected) in [
            (0_u64, Tier::Base),
            (1023, Tier::Base),
            (1024, Tier::Kilo),
            (1024 * 1024 - 1, Tier::Kilo),
            (1024 * 1024, Tier::Mega),
            (1024 * 1024 * 1024, Tier::Giga),
        ] {
            let prev = reading(0, 0, 0);
            let curr = reading(delta, 0, 1000);
            let config = config(SpeedUnit::Bytes, false, true);

            let rates = expect_computed(compute(&prev, &curr, TickKind::Periodic, &config));
            let down = rates.down.expect("down rate");
            assert_eq!(down.tier, expected, "delta {delta}");

            // the scaled magnitude always fits below the next threshold
            if expected != Tier::Giga {
                assert!(down.magnitude < 1024.0);
            }
            assert!(down.magnitude >= 0.0);
        }
    }

    #[test]
    fn huge_interval_does_not_overflow_the_guard() {
        let prev = reading(0, 0, 0);
        let curr = reading(1024, 0, 1000);
        let config = TrafficModuleConfig {
            interval_ms: i64::MAX as u64,
            ..config(SpeedUnit::Bytes, false, true)
        };

        // a periodic tick can never satisfy such an interval
        assert_eq!(
            compute(&prev, &curr, TickKind::Periodic, &config),
            RateOutcome::Skip
        );

        // refresh ticks still compute
        let rates = expect_computed(compute(&prev, &curr, TickKind::Refresh, &config));
        assert!(rates.down.is_some());
    }

    #[test]
    fn magnitude_rounds_half_up() {
        let rate = RateResult {
            magnitude: 1.25,
            tier: Tier::Kilo,
            direction: Direction::Down,
        };
        assert_eq!(format_rate(&rate, SpeedUnit::Bytes), "1.3kB/s");
    }

    #[test]
    fn disabled_directions_are_absent() {
        let prev = reading(0, 0, 0);
        let curr = reading(1000, 1000, 1000);
        let config = config(SpeedUnit::Bytes, false, false);

        let rates = expect_computed(compute(&prev, &curr, TickKind::Periodic, &config));
        assert!(rates.up.is_none());
        assert!(rates.down.is_none());
    }
}
