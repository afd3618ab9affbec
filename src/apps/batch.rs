//! Named, reusable command batches.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::chart::Chart;
use crate::command::{CommandQueue, ParsedCommand};
use crate::dispatch::{Application, Dispatcher};
use crate::timeline::Tick;

/// `batch define <name> {body}` / `batch call <name>`.
///
/// `define` parses the body and stores it under the name; `call` executes
/// the stored body at the calling command's tick. The body is stored
/// unexpanded, so macros inside it see the tick of each call site. State
/// lives in a `RefCell` because a called batch may itself call batches
/// through the same handler.
#[derive(Default)]
pub struct CommandBatch {
    batches: RefCell<HashMap<String, CommandQueue>>,
}

impl CommandBatch {
    /// Creates a handler with no stored batches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Application for CommandBatch {
    fn accepted_names(&self) -> Vec<String> {
        vec!["batch".to_string()]
    }

    fn check_args(&self, cmd: &ParsedCommand) -> bool {
        match cmd.arg(0) {
            _ if cmd.arg_len() < 2 => false,
            Some("define") => cmd.arg_len() == 3,
            Some("call") => cmd.arg_len() == 2,
            _ => true,
        }
    }

    fn run(
        &self,
        cmd: &ParsedCommand,
        _queue: &mut CommandQueue,
        chart: &mut Chart,
        bus: &Dispatcher,
    ) -> bool {
        match cmd.arg(0) {
            Some("define") => {
                let (Some(name), Some(body)) = (cmd.arg(1), cmd.arg(2)) else {
                    return false;
                };
                let mut queue = CommandQueue::new();
                queue.push_line(body, Tick::ZERO);
                self.batches
                    .borrow_mut()
                    .insert(name.to_string(), queue);
                true
            }
            Some("call") => {
                let Some(name) = cmd.arg(1) else {
                    return false;
                };
                // Clone out of the store before executing so a batch that
                // calls another batch does not hold the borrow.
                let batch = self.batches.borrow().get(name).cloned();
                match batch {
                    Some(batch) if !batch.is_empty() => {
                        bus.push_call(cmd.source().into_owned());
                        bus.execute_batch(batch, chart, cmd.time());
                        bus.pop_call();
                        true
                    }
                    _ => {
                        bus.log_error_text(format!("calling undefined batch: {name}"));
                        false
                    }
                }
            }
            _ => false,
        }
    }
}
