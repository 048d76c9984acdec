use std::sync::Arc;

use tokio::runtime::Handle;

use crate::event_bus::{BusEvent, EventBusError, EventSender, ModuleEvent};

/// Shared utilities exposed to individual modules when they need to interact
/// with the host event loop.
///
/// The context owns an [`EventSender`] used to push [`BusEvent`] values into
/// the host queue and a [`Handle`] tied to the runtime powering background
/// tasks. Modules use the handle to spawn their periodic timers; those tasks
/// cooperate with cancellation by completing promptly when aborted.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    event_sender: EventSender,
    runtime_handle: Handle,
}

impl ModuleContext {
    /// Create a new context bound to the provided event sender and runtime
    /// handle.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pulsebar_core::{event_bus::EventBus, module_context::ModuleContext};
    /// # use std::num::NonZeroUsize;
    /// # let runtime = tokio::runtime::Runtime::new().expect("runtime");
    /// let bus = EventBus::new(NonZeroUsize::new(4).expect("capacity"));
    /// let context = ModuleContext::new(bus.sender(), runtime.handle().clone());
    /// # drop(context);
    /// ```
    pub fn new(event_sender: EventSender, runtime_handle: Handle) -> Self {
        Self {
            event_sender,
            runtime_handle,
        }
    }

    /// Access the runtime handle used for spawning background tasks.
    pub fn runtime_handle(&self) -> &Handle {
        &self.runtime_handle
    }

    /// Request a redraw of the indicator surface.
    ///
    /// Enqueues a [`BusEvent::Redraw`] if the bus has remaining capacity,
    /// otherwise returns [`EventBusError::QueueFull`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use pulsebar_core::{event_bus::EventBus, module_context::ModuleContext};
    /// # use std::num::NonZeroUsize;
    /// # let runtime = tokio::runtime::Runtime::new().expect("runtime");
    /// let bus = EventBus::new(NonZeroUsize::new(1).expect("capacity"));
    /// let context = ModuleContext::new(bus.sender(), runtime.handle().clone());
    /// context.request_redraw().expect("queued");
    /// ```
    pub fn request_redraw(&self) -> Result<(), EventBusError> {
        self.event_sender.try_send(BusEvent::Redraw)
    }

    /// Tell the shell to show or hide the indicator surface.
    ///
    /// Enqueues a [`BusEvent::Visibility`] if the bus has capacity, otherwise
    /// returns [`EventBusError::QueueFull`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use pulsebar_core::{event_bus::EventBus, module_context::ModuleContext};
    /// # use std::num::NonZeroUsize;
    /// # let runtime = tokio::runtime::Runtime::new().expect("runtime");
    /// let bus = EventBus::new(NonZeroUsize::new(1).expect("capacity"));
    /// let context = ModuleContext::new(bus.sender(), runtime.handle().clone());
    /// context.set_visible(false).expect("queued");
    /// ```
    pub fn set_visible(&self, visible: bool) -> Result<(), EventBusError> {
        self.event_sender.try_send(BusEvent::Visibility(visible))
    }

    fn publish_module_event(&self, event: ModuleEvent) -> Result<(), EventBusError> {
        self.event_sender.try_send(BusEvent::Module(event))
    }

    /// Build a type-safe module event sender from the provided conversion
    /// function.
    ///
    /// # Examples
    ///
    /// ```
    /// # use pulsebar_core::{event_bus::EventBus, module_context::ModuleContext};
    /// # use pulsebar_core::event_bus::ModuleEvent;
    /// # use pulsebar_core::modules;
    /// # use std::num::NonZeroUsize;
    /// # let runtime = tokio::runtime::Runtime::new().expect("runtime");
    /// let bus = EventBus::new(NonZeroUsize::new(2).expect("capacity"));
    /// let context = ModuleContext::new(bus.sender(), runtime.handle().clone());
    /// let sender = context.module_sender(ModuleEvent::Clock);
    /// sender
    ///     .try_send(modules::clock::Message::Tick)
    ///     .expect("queued");
    /// ```
    pub fn module_sender<T, F>(&self, convert: F) -> ModuleEventSender<T>
    where
        T: Send + 'static,
        F: Fn(T) -> ModuleEvent + Send + Sync + 'static,
    {
        ModuleEventSender {
            context: self.clone(),
            convert: Arc::new(convert),
        }
    }
}

/// Strongly-typed wrapper around the module event publishing path.
#[derive(Clone)]
pub struct ModuleEventSender<T> {
    context: ModuleContext,
    convert: Arc<dyn Fn(T) -> ModuleEvent + Send + Sync>,
}

impl<T> ModuleEventSender<T>
where
    T: Send + 'static,
{
    /// Convert the payload into a [`ModuleEvent`] and enqueue it on the bus.
    pub fn try_send(&self, payload: T) -> Result<(), EventBusError> {
        let event = (self.convert)(payload);
        self.context.publish_module_event(event)
    }
}
