//! Domain events and the change-notification bus.
//!
//! Every committed mutation is announced as a typed domain event wrapped in an
//! [`EventEnvelope`]. The engine only publishes; fan-out to UIs and other
//! observers is the bus implementation's concern.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
