use std::borrow::Cow;

use thiserror::Error;

use crate::{
    event_bus::EventBusError, module_context::ModuleContext, render::RenderInstruction,
};

pub mod clock;
pub mod traffic;

/// Errors that can occur while registering a module.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Propagates failures originating from the event bus.
    #[error("module event bus interaction failed: {0}")]
    EventBus(#[from] EventBusError),
    /// Domain-specific registration failures surfaced by the module.
    #[error("module registration failed: {reason}")]
    Registration { reason: Cow<'static, str> },
}

impl ModuleError {
    /// Construct a registration error with the provided reason.
    pub fn registration(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Registration {
            reason: reason.into(),
        }
    }
}

/// Behaviour shared by the indicator modules.
///
/// Modules receive configuration snapshots as
/// [`RegistrationData`](Module::RegistrationData) when initialising and
/// produce [`RenderInstruction`] values from [`view`](Module::view). The
/// [`register`](Module::register) hook exposes the shared [`ModuleContext`],
/// allowing modules to cache typed event senders and spawn their periodic
/// timers.
pub trait Module {
    type ViewData<'a>;
    type RegistrationData<'a>;

    /// Register the module with the shared runtime context.
    ///
    /// The default implementation performs no work.
    fn register(
        &mut self,
        ctx: &ModuleContext,
        data: Self::RegistrationData<'_>,
    ) -> Result<(), ModuleError> {
        let _ = (ctx, data);
        Ok(())
    }

    /// Produce the current render instruction, or `None` when the module has
    /// nothing to show.
    fn view(&self, data: Self::ViewData<'_>) -> Option<RenderInstruction>;
}
