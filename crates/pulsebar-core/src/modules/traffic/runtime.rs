use std::time::Duration;

use log::error;
use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use super::Message;
use super::rate::TickKind;
use crate::{ModuleContext, ModuleEventSender};

/// Manages the background task that emits periodic sample ticks.
#[derive(Debug, Default)]
pub struct SampleTask {
    handle: Option<JoinHandle<()>>,
}

impl SampleTask {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Whether a ticker is currently live.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the periodic sample loop, replacing any previous one.
    pub fn spawn(&mut self, ctx: &ModuleContext, period: Duration, sender: ModuleEventSender<Message>) {
        self.abort();

        let handle = ctx.runtime_handle().spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let _ = ticker.tick().await;

            loop {
                ticker.tick().await;

                if let Err(err) = sender.try_send(Message::Tick(TickKind::Periodic)) {
                    error!("failed to publish traffic sample tick: {err}");
                }
            }
        });

        self.handle = Some(handle);
    }

    /// Abort any in-flight ticker. Safe to call repeatedly.
    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for SampleTask {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use tokio::{task::yield_now, time::advance};

    use super::*;
    use crate::{
        ModuleContext,
        event_bus::{BusEvent, EventBus, ModuleEvent},
    };

    const PERIOD: Duration = Duration::from_secs(1);

    fn module_context() -> (ModuleContext, EventBus) {
        let capacity = NonZeroUsize::new(16).expect("non-zero capacity");
        let bus = EventBus::new(capacity);
        let ctx = ModuleContext::new(bus.sender(), tokio::runtime::Handle::current());

        (ctx, bus)
    }

    fn expect_periodic_tick(event: Option<BusEvent>) {
        match event {
            Some(BusEvent::Module(ModuleEvent::Traffic(Message::Tick(TickKind::Periodic)))) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn schedules_periodic_ticks() {
        let (ctx, bus) = module_context();
        let mut task = SampleTask::default();
        let mut receiver = bus.receiver();

        let sender = ctx.module_sender(ModuleEvent::Traffic);
        task.spawn(&ctx, PERIOD, sender);
        yield_now().await;

        assert!(receiver.try_recv().expect("initial queue state").is_none());
        assert!(task.is_running());

        advance(PERIOD).await;
        yield_now().await;

        let event = receiver.try_recv().expect("queued tick after period");
        expect_periodic_tick(event);
    }

    #[tokio::test(start_paused = true)]
    async fn respawn_replaces_previous_ticker() {
        let (ctx, bus) = module_context();
        let mut task = SampleTask::default();
        let mut receiver = bus.receiver();

        let sender = ctx.module_sender(ModuleEvent::Traffic);
        task.spawn(&ctx, PERIOD, sender.clone());
        yield_now().await;

        task.spawn(&ctx, PERIOD, sender);
        yield_now().await;

        advance(PERIOD).await;
        yield_now().await;

        let event = receiver.try_recv().expect("tick after respawn");
        expect_periodic_tick(event);
        assert!(receiver.try_recv().expect("no duplicate tick").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_is_idempotent_and_stops_ticks() {
        let (ctx, bus) = module_context();
        let mut task = SampleTask::default();
        let mut receiver = bus.receiver();

        let sender = ctx.module_sender(ModuleEvent::Traffic);
        task.spawn(&ctx, PERIOD, sender);
        yield_now().await;

        task.abort();
        task.abort();
        yield_now().await;
        assert!(!task.is_running());

        advance(PERIOD).await;
        yield_now().await;

        assert!(receiver.try_recv().expect("no tick after abort").is_none());
    }
}
