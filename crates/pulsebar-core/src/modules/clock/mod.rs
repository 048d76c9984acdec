use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use log::{error, warn};
use pulsebar_proto::config::ClockModuleConfig;
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::{
    ModuleContext, ModuleEventSender,
    event_bus::ModuleEvent,
    modules::{Module, ModuleError},
    render::{RenderInstruction, TextSize},
};

mod format;

/// Period of the wall-clock refresh ticker.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A wall-clock instant paired with the zone it is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSnapshot {
    epoch_millis: i64,
    zone: Tz,
}

impl TimeSnapshot {
    /// Snapshot the current wall-clock time in `zone`.
    pub fn now(zone: Tz) -> Self {
        Self {
            epoch_millis: Utc::now().timestamp_millis(),
            zone,
        }
    }

    /// The zoned datetime this snapshot represents.
    pub fn datetime(&self) -> DateTime<Tz> {
        DateTime::from_timestamp_millis(self.epoch_millis)
            .unwrap_or_default()
            .with_timezone(&self.zone)
    }
}

/// Lifecycle of the clock rendering pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockState {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// A refresh is recomputing the snapshot and its rendering.
    Formatting,
    /// Showing injected demo time; real-clock ticks are suppressed.
    Demo,
}

/// Host demo-protocol commands understood by the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoCommand {
    /// Enter demo mode, freezing the real clock.
    Enter,
    /// Leave demo mode and recompute the real time.
    Exit,
    /// Override the displayed time while in demo mode.
    Clock {
        /// Absolute override in milliseconds since the epoch.
        millis: Option<i64>,
        /// Wall-time override as a `HHMM` literal, applied after `millis`.
        hhmm: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum ClockError {
    /// The override does not name a single representable instant.
    #[error("time literal `{literal}` does not resolve to a valid instant")]
    AmbiguousTime { literal: String },
    /// The command is not valid in the current state.
    #[error("demo command not valid in the {state:?} state")]
    InvalidState { state: ClockState },
}

/// Events consumed by the clock module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Periodic wall-clock refresh.
    Tick,
    /// The host delivered a new settings snapshot.
    ConfigChanged(ClockModuleConfig),
    /// The device time zone changed to the given IANA id.
    TimezoneChanged(String),
    /// The display locale changed to the given tag.
    LocaleChanged(String),
    Demo(DemoCommand),
}

/// Wall-clock indicator with optional day-of-week and AM/PM segments.
pub struct Clock {
    config: ClockModuleConfig,
    snapshot: TimeSnapshot,
    state: ClockState,
    rendered: Option<RenderInstruction>,
    ctx: Option<ModuleContext>,
    task: Option<JoinHandle<()>>,
}

impl Clock {
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Apply a bus message to the module state.
    pub fn update(&mut self, message: Message) {
        match message {
            Message::Tick => {
                if self.state != ClockState::Demo {
                    self.refresh();
                }
            }
            Message::ConfigChanged(config) => {
                if let Some(id) = config.time_zone.clone() {
                    self.apply_zone(&id);
                }
                self.config = config;
                self.rendered = None;
                if self.state == ClockState::Demo {
                    self.render_current();
                } else {
                    self.refresh();
                }
            }
            Message::TimezoneChanged(id) => {
                self.apply_zone(&id);
                self.rendered = None;
                if self.state == ClockState::Demo {
                    // injected instant stays put, only its zone mapping moves
                    self.render_current();
                } else {
                    self.refresh();
                }
            }
            Message::LocaleChanged(tag) => {
                self.config.locale = Some(tag);
                // stale until the next tick recomputes it
                self.rendered = None;
            }
            Message::Demo(command) => {
                if let Err(err) = self.demo_command(command) {
                    warn!("rejected clock demo command: {err}");
                }
            }
        }
    }

    /// Execute a demo-protocol command, enforcing the state machine.
    pub fn demo_command(&mut self, command: DemoCommand) -> Result<(), ClockError> {
        match command {
            DemoCommand::Enter => {
                if self.state != ClockState::Idle {
                    return Err(ClockError::InvalidState { state: self.state });
                }
                self.state = ClockState::Demo;
                Ok(())
            }
            DemoCommand::Exit => {
                if self.state != ClockState::Demo {
                    return Err(ClockError::InvalidState { state: self.state });
                }
                self.state = ClockState::Idle;
                self.refresh();
                Ok(())
            }
            DemoCommand::Clock { millis, hhmm } => {
                if self.state != ClockState::Demo {
                    return Err(ClockError::InvalidState { state: self.state });
                }

                let mut snapshot = self.snapshot;

                if let Some(millis) = millis {
                    if DateTime::from_timestamp_millis(millis).is_none() {
                        return Err(ClockError::AmbiguousTime {
                            literal: millis.to_string(),
                        });
                    }
                    snapshot.epoch_millis = millis;
                }

                if let Some(literal) = &hhmm {
                    let (hour, minute) = parse_hhmm(literal)?;
                    let adjusted = snapshot
                        .datetime()
                        .with_hour(hour)
                        .and_then(|dt| dt.with_minute(minute))
                        .ok_or_else(|| ClockError::AmbiguousTime {
                            literal: literal.clone(),
                        })?;
                    snapshot.epoch_millis = adjusted.timestamp_millis();
                }

                self.snapshot = snapshot;
                self.render_current();
                Ok(())
            }
        }
    }

    /// Recompute the snapshot from the real clock and render it.
    fn refresh(&mut self) {
        self.state = ClockState::Formatting;
        self.snapshot = TimeSnapshot::now(self.snapshot.zone);
        self.render_current();
        self.state = ClockState::Idle;
    }

    fn render_current(&mut self) {
        let (text, spans) = format::compose(&self.snapshot.datetime(), &self.config);

        self.rendered = Some(RenderInstruction {
            text,
            spans,
            color: self.config.color,
            text_size: TextSize::Single,
            icon: None,
            icon_tint: self.config.color,
            visible: true,
        });

        if let Some(ctx) = &self.ctx {
            if let Err(err) = ctx.request_redraw() {
                warn!("failed to request clock redraw: {err}");
            }
        }
    }

    fn apply_zone(&mut self, id: &str) {
        match Tz::from_str(id) {
            Ok(zone) => self.snapshot.zone = zone,
            Err(_) => warn!("unknown time zone `{id}`, keeping {}", self.snapshot.zone),
        }
    }

    fn spawn_ticker(&mut self, ctx: &ModuleContext, sender: ModuleEventSender<Message>) {
        self.abort_ticker();

        let handle = ctx.runtime_handle().spawn(async move {
            let mut ticker = interval(TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let _ = ticker.tick().await;

            loop {
                ticker.tick().await;

                if let Err(err) = sender.try_send(Message::Tick) {
                    error!("failed to publish clock tick: {err}");
                }
            }
        });

        self.task = Some(handle);
    }

    fn abort_ticker(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            config: ClockModuleConfig::default(),
            snapshot: TimeSnapshot::now(Tz::UTC),
            state: ClockState::default(),
            rendered: None,
            ctx: None,
            task: None,
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.abort_ticker();
    }
}

impl Module for Clock {
    type ViewData<'a> = ();
    type RegistrationData<'a> = &'a ClockModuleConfig;

    fn register(
        &mut self,
        ctx: &ModuleContext,
        config: Self::RegistrationData<'_>,
    ) -> Result<(), ModuleError> {
        self.config = config.clone();
        if let Some(id) = self.config.time_zone.clone() {
            self.apply_zone(&id);
        }
        self.ctx = Some(ctx.clone());

        let sender = ctx.module_sender(ModuleEvent::Clock);
        self.spawn_ticker(ctx, sender);
        self.refresh();

        Ok(())
    }

    fn view(&self, (): Self::ViewData<'_>) -> Option<RenderInstruction> {
        self.rendered.clone()
    }
}

fn parse_hhmm(literal: &str) -> Result<(u32, u32), ClockError> {
    let invalid = || ClockError::AmbiguousTime {
        literal: literal.to_owned(),
    };

    if literal.len() != 4 || !literal.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hour: u32 = literal[..2].parse().map_err(|_| invalid())?;
    let minute: u32 = literal[2..].parse().map_err(|_| invalid())?;

    if hour >= 24 || minute >= 60 {
        return Err(invalid());
    }

    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use tokio::{task::yield_now, time::advance};

    use crate::event_bus::{BusEvent, EventBus};

    use super::*;

    fn demo_clock() -> Clock {
        let mut clock = Clock::default();
        clock.config.is_24_hour = true;
        clock.demo_command(DemoCommand::Enter).expect("enter demo");
        clock
    }

    fn rendered_text(clock: &Clock) -> String {
        clock.view(()).expect("rendered").text
    }

    #[test]
    fn demo_clock_command_renders_injected_time() {
        let mut clock = demo_clock();

        clock
            .demo_command(DemoCommand::Clock {
                millis: Some(0),
                hhmm: Some("1430".into()),
            })
            .expect("inject time");

        assert_eq!(rendered_text(&clock), "14:30");
    }

    #[test]
    fn millis_override_alone_is_applied() {
        let mut clock = demo_clock();

        // 1970-01-01T01:01:00Z
        clock
            .demo_command(DemoCommand::Clock {
                millis: Some(3_660_000),
                hhmm: None,
            })
            .expect("inject time");

        assert_eq!(rendered_text(&clock), "01:01");
    }

    #[test]
    fn malformed_literals_are_rejected_without_side_effects() {
        let mut clock = demo_clock();
        let before = clock.snapshot;

        for literal in ["143", "14305", "24xx", "2460", "9900"] {
            let err = clock
                .demo_command(DemoCommand::Clock {
                    millis: None,
                    hhmm: Some(literal.into()),
                })
                .expect_err("malformed literal");
            assert!(matches!(err, ClockError::AmbiguousTime { .. }), "{literal}");
        }

        assert_eq!(clock.snapshot, before);
        assert!(clock.view(()).is_none());
    }

    #[test]
    fn enter_is_only_valid_from_idle() {
        let mut clock = demo_clock();
        let err = clock
            .demo_command(DemoCommand::Enter)
            .expect_err("already in demo");
        assert!(matches!(
            err,
            ClockError::InvalidState {
                state: ClockState::Demo
            }
        ));
    }

    #[test]
    fn clock_override_requires_demo_mode() {
        let mut clock = Clock::default();
        let err = clock
            .demo_command(DemoCommand::Clock {
                millis: Some(0),
                hhmm: None,
            })
            .expect_err("not in demo");
        assert!(matches!(
            err,
            ClockError::InvalidState {
                state: ClockState::Idle
            }
        ));
    }

    #[test]
    fn exit_recomputes_the_real_clock() {
        let mut clock = demo_clock();
        clock
            .demo_command(DemoCommand::Clock {
                millis: Some(0),
                hhmm: None,
            })
            .expect("inject time");
        assert_eq!(clock.snapshot.epoch_millis, 0);

        clock.demo_command(DemoCommand::Exit).expect("exit demo");

        assert_eq!(clock.state(), ClockState::Idle);
        // back on the real clock, nowhere near the injected epoch
        assert!(clock.snapshot.epoch_millis > 0);
    }

    #[test]
    fn ticks_are_suppressed_in_demo_mode() {
        let mut clock = demo_clock();
        clock
            .demo_command(DemoCommand::Clock {
                millis: Some(0),
                hhmm: Some("0930".into()),
            })
            .expect("inject time");

        clock.update(Message::Tick);

        assert_eq!(rendered_text(&clock), "09:30");
        assert_eq!(clock.snapshot.epoch_millis, 34_200_000);
    }

    #[test]
    fn locale_change_invalidates_until_the_next_tick() {
        let mut clock = Clock::default();
        clock.update(Message::Tick);
        assert!(clock.view(()).is_some());

        clock.update(Message::LocaleChanged("it-IT".into()));
        assert!(clock.view(()).is_none());

        clock.update(Message::Tick);
        assert!(clock.view(()).is_some());
    }

    #[test]
    fn unknown_zone_is_ignored() {
        let mut clock = Clock::default();
        clock.update(Message::TimezoneChanged("Atlantis/Lemuria".into()));
        assert_eq!(clock.snapshot.zone, Tz::UTC);
    }

    #[test]
    fn zone_change_in_demo_keeps_the_injected_instant() {
        let mut clock = demo_clock();
        clock
            .demo_command(DemoCommand::Clock {
                millis: Some(0),
                hhmm: None,
            })
            .expect("inject time");

        clock.update(Message::TimezoneChanged("Europe/Rome".into()));

        assert_eq!(clock.snapshot.epoch_millis, 0);
        // UTC midnight is 01:00 in Rome
        assert_eq!(rendered_text(&clock), "01:00");
    }

    #[tokio::test(start_paused = true)]
    async fn register_renders_and_schedules_ticks() {
        let bus = EventBus::new(NonZeroUsize::new(16).expect("capacity"));
        let ctx = ModuleContext::new(bus.sender(), tokio::runtime::Handle::current());
        let mut receiver = bus.receiver();
        let mut clock = Clock::default();

        clock
            .register(&ctx, &ClockModuleConfig::default())
            .expect("register");
        yield_now().await;

        assert!(clock.view(()).is_some());

        // drain the redraw queued by the initial refresh
        while receiver.try_recv().expect("drain").is_some() {}

        advance(TICK_INTERVAL).await;
        yield_now().await;

        let mut saw_tick = false;
        while let Some(event) = receiver.try_recv().expect("drain") {
            if matches!(
                event,
                BusEvent::Module(ModuleEvent::Clock(Message::Tick))
            ) {
                saw_tick = true;
            }
        }
        assert!(saw_tick);
    }
}
