//! The built-in command handlers.

pub mod batch;
pub mod marks;
pub mod scripting;

use std::rc::Rc;

pub use batch::CommandBatch;
pub use marks::WriteMark;
pub use scripting::{Delay, Looper};

use crate::dispatch::Dispatcher;

/// A dispatcher with every built-in handler registered.
#[must_use]
pub fn default_preset() -> Dispatcher {
    let mut bus = Dispatcher::new();
    bus.register(Rc::new(Looper));
    bus.register(Rc::new(Delay));
    bus.register(Rc::new(WriteMark));
    bus.register(Rc::new(CommandBatch::new()));
    bus
}
