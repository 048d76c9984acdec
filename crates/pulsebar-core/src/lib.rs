//! Core sampling and formatting logic for the pulsebar status indicators.
//!
//! The host shell feeds events in (ticks, settings changes, connectivity and
//! screen state, demo commands) and receives declarative
//! [`render::RenderInstruction`] values back; all actual drawing stays on the
//! shell's side.

pub mod config;
pub mod event_bus;
pub mod module_context;
pub mod modules;
pub mod render;

pub use module_context::{ModuleContext, ModuleEventSender};
