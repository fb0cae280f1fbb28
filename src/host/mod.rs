//! Host-facing event layer
//!
//! The engine never reaches into the hosting environment directly; every
//! outward effect is a [`HostEvent`] pushed through a [`HostSink`].

mod events;
mod sink;

pub use events::{DragResult, HostEvent, OutputValue, Severity};
pub use sink::{ChannelSink, HostSink, SinkError};
