use std::time::Duration;

use log::{error, warn};
use pulsebar_proto::{
    config::TrafficModuleConfig,
    ports::traffic::TrafficStatsPort,
};

use crate::{
    ModuleContext, ModuleEventSender,
    event_bus::ModuleEvent,
    modules::{Module, ModuleError},
    render::RenderInstruction,
};

mod backend;
mod presenter;
mod rate;
mod runtime;
mod sampler;

pub use backend::SysinfoTrafficStats;
pub use presenter::present;
pub use rate::{Direction, RateOutcome, RateResult, TickKind, Tier, TrafficRates, compute, format_rate};
pub use runtime::SampleTask;
pub use sampler::{SampleReading, TrafficSampler};

/// Events consumed by the traffic module.
#[derive(Debug, Clone)]
pub enum Message {
    /// A sample tick, either from the periodic timer or an ad-hoc refresh.
    Tick(TickKind),
    /// The host delivered a new settings snapshot.
    ConfigChanged(TrafficModuleConfig),
    /// The tracked link came up or went down.
    ConnectivityChanged(bool),
    /// The screen turned on or off.
    ScreenState(bool),
}

/// Network throughput indicator.
///
/// Samples cumulative counters on a timer, derives per-direction rates, and
/// exposes a [`RenderInstruction`] for the shell. Sampling only runs while
/// the screen is on, the link is active, and at least one direction is
/// tracked.
pub struct Traffic {
    config: TrafficModuleConfig,
    source: Box<dyn TrafficStatsPort + Send>,
    sampler: TrafficSampler,
    last_text: Option<String>,
    rendered: Option<RenderInstruction>,
    screen_on: bool,
    link_active: bool,
    sender: Option<ModuleEventSender<Message>>,
    ctx: Option<ModuleContext>,
    task: SampleTask,
}

impl Traffic {
    pub fn new(source: Box<dyn TrafficStatsPort + Send>) -> Self {
        Self {
            config: TrafficModuleConfig::default(),
            source,
            sampler: TrafficSampler::new(),
            last_text: None,
            rendered: None,
            screen_on: true,
            link_active: true,
            sender: None,
            ctx: None,
            task: SampleTask::new(),
        }
    }

    /// Apply a bus message to the module state.
    pub fn update(&mut self, message: Message) {
        match message {
            Message::Tick(kind) => self.tick(kind),
            Message::ConfigChanged(config) => {
                let interval_changed = config.interval_ms != self.config.interval_ms;
                let was_running = self.task.is_running();
                self.config = config;
                self.apply_run_state(interval_changed);
                // the restart path queues its own refresh while priming; a
                // settings change that keeps the ticker alive still needs one
                // so the new colors/unit/labels apply without waiting a period
                if was_running && self.task.is_running() && !interval_changed {
                    self.queue_refresh();
                }
            }
            Message::ConnectivityChanged(active) => {
                if self.link_active != active {
                    self.link_active = active;
                    self.apply_run_state(false);
                }
            }
            Message::ScreenState(on) => {
                if self.screen_on != on {
                    self.screen_on = on;
                    self.apply_run_state(false);
                }
            }
        }
    }

    fn should_run(&self) -> bool {
        self.config.should_run(self.screen_on, self.link_active)
    }

    fn tick(&mut self, kind: TickKind) {
        if !self.should_run() {
            return;
        }

        let totals = match self.source.totals() {
            Ok(totals) => totals,
            Err(err) => {
                error!("traffic counters unavailable: {err}");
                return;
            }
        };

        let curr = self.sampler.capture(totals);
        self.process(curr, kind);
    }

    /// Run the delta pipeline against a captured reading.
    fn process(&mut self, curr: SampleReading, kind: TickKind) {
        let Some(prev) = self.sampler.previous() else {
            // first reading only establishes the baseline
            self.sampler.store(curr);
            return;
        };

        match compute(&prev, &curr, kind, &self.config) {
            RateOutcome::Skip => {}
            RateOutcome::Computed(rates) => {
                self.sampler.store(curr);

                let instruction = present(&rates, &self.config, self.last_text.as_deref());
                self.last_text = Some(instruction.text.clone());
                self.rendered = Some(instruction);

                if let Some(ctx) = &self.ctx {
                    if let Err(err) = ctx.request_redraw() {
                        warn!("failed to request traffic redraw: {err}");
                    }
                }
            }
        }
    }

    /// Take an immediate baseline reading and queue a refresh tick so the
    /// first rate appears without waiting a full period.
    fn prime(&mut self) {
        match self.source.totals() {
            Ok(totals) => {
                let reading = self.sampler.capture(totals);
                self.sampler.store(reading);
            }
            Err(err) => error!("failed to prime traffic baseline: {err}"),
        }

        self.queue_refresh();
    }

    fn queue_refresh(&self) {
        if let Some(sender) = &self.sender {
            if let Err(err) = sender.try_send(Message::Tick(TickKind::Refresh)) {
                warn!("failed to queue traffic refresh: {err}");
            }
        }
    }

    /// Reconcile the ticker and visibility with the current run conditions.
    ///
    /// Idempotent: re-applying an unchanged state neither restarts the timer
    /// nor loses the sample baseline.
    fn apply_run_state(&mut self, restart_timer: bool) {
        if self.should_run() {
            if restart_timer {
                self.task.abort();
            }

            if !self.task.is_running() {
                if let (Some(ctx), Some(sender)) = (self.ctx.clone(), self.sender.clone()) {
                    let period = Duration::from_millis(self.config.interval_ms);
                    self.task.spawn(&ctx, period, sender);
                }
                self.prime();
            }

            if let Some(ctx) = &self.ctx {
                if let Err(err) = ctx.set_visible(true) {
                    warn!("failed to show traffic indicator: {err}");
                }
            }
        } else {
            self.task.abort();
            self.sampler.reset();
            self.last_text = None;
            self.rendered = None;

            if let Some(ctx) = &self.ctx {
                if let Err(err) = ctx.set_visible(false) {
                    warn!("failed to hide traffic indicator: {err}");
                }
            }
        }
    }
}

impl Default for Traffic {
    fn default() -> Self {
        Self::new(Box::new(SysinfoTrafficStats::new()))
    }
}

impl Module for Traffic {
    type ViewData<'a> = ();
    type RegistrationData<'a> = &'a TrafficModuleConfig;

    fn register(
        &mut self,
        ctx: &ModuleContext,
        config: Self::RegistrationData<'_>,
    ) -> Result<(), ModuleError> {
        self.config = config.clone();
        self.ctx = Some(ctx.clone());
        self.sender = Some(ctx.module_sender(ModuleEvent::Traffic));
        self.apply_run_state(false);

        Ok(())
    }

    fn view(&self, (): Self::ViewData<'_>) -> Option<RenderInstruction> {
        self.rendered.clone()
    }
}
