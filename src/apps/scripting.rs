//! The scripting macros: `loop` and `delay`.
//!
//! Both compile their braced body through the dispatcher first, so macros
//! nest freely, and then enqueue copies of the fully expanded body. The
//! copies are queued where the macro itself sits but carry their own
//! execution tick, so a loop's later iterations act on later ticks while
//! still running in the current pass.

use crate::chart::Chart;
use crate::command::{CommandQueue, ParsedCommand};
use crate::dispatch::{Application, Dispatcher};
use crate::timeline::Tick;

#[allow(clippy::cast_precision_loss)]
const TICKS_PER_BEAT: f64 = Tick::PER_BEAT as f64;

#[allow(clippy::cast_possible_truncation)]
fn beats_to_ticks(value: f64) -> i64 {
    value.round() as i64
}

/// `loop <count> <step> {body}`: repeats the body `count` times, each copy
/// `step` beats (float or ratio) after the previous one.
pub struct Looper;

impl Application for Looper {
    fn accepted_names(&self) -> Vec<String> {
        vec!["loop".to_string()]
    }

    fn check_args(&self, cmd: &ParsedCommand) -> bool {
        cmd.arg_len() >= 3 && cmd.arg_int(0).is_some() && cmd.arg_scaled(1, 1.0).is_some()
    }

    fn run(
        &self,
        cmd: &ParsedCommand,
        _queue: &mut CommandQueue,
        chart: &mut Chart,
        bus: &Dispatcher,
    ) -> bool {
        bus.run_compiled(self, cmd, chart)
    }

    fn compile(
        &self,
        cmd: &ParsedCommand,
        out: &mut CommandQueue,
        errors: &mut Vec<String>,
        bus: &Dispatcher,
    ) -> bool {
        let (Some(count), Some(step)) = (cmd.arg_int(0), cmd.arg_scaled(1, TICKS_PER_BEAT))
        else {
            return false;
        };
        let step = beats_to_ticks(step);
        if count <= 1 {
            bus.log_error_text("loop count is not greater than 1");
            return false;
        }
        if step <= 0 {
            bus.log_error_text("loop step is not positive");
            return false;
        }

        let mut body = CommandQueue::new();
        body.push_line(&cmd.substring(2, -1), Tick::ZERO);
        let body = bus.compile(body, errors);
        if body.is_empty() {
            return false;
        }

        let mut base = cmd.time();
        for _ in 0..count {
            for sub in body.iter() {
                let local = sub.time();
                let mut copy = sub.clone();
                copy.set_time(base + local);
                out.insert_at(cmd.time() + local, copy);
            }
            base += Tick(step);
        }
        true
    }

    fn is_scripting(&self) -> bool {
        true
    }
}

/// `delay <step> {body}`: runs the body `step` beats (float or ratio) after
/// the command's own tick.
pub struct Delay;

impl Application for Delay {
    fn accepted_names(&self) -> Vec<String> {
        vec!["delay".to_string()]
    }

    fn check_args(&self, cmd: &ParsedCommand) -> bool {
        cmd.arg_len() >= 2 && cmd.arg_scaled(0, 1.0).is_some()
    }

    fn run(
        &self,
        cmd: &ParsedCommand,
        _queue: &mut CommandQueue,
        chart: &mut Chart,
        bus: &Dispatcher,
    ) -> bool {
        bus.run_compiled(self, cmd, chart)
    }

    fn compile(
        &self,
        cmd: &ParsedCommand,
        out: &mut CommandQueue,
        errors: &mut Vec<String>,
        bus: &Dispatcher,
    ) -> bool {
        let Some(step) = cmd.arg_scaled(0, TICKS_PER_BEAT) else {
            return false;
        };
        let step = beats_to_ticks(step);
        if step <= 0 {
            bus.log_error_text("delay step is not positive");
            return false;
        }

        let mut body = CommandQueue::new();
        body.push_line(&cmd.substring(1, -1), Tick::ZERO);
        let body = bus.compile(body, errors);
        if body.is_empty() {
            return false;
        }

        for sub in body.iter() {
            let local = sub.time();
            let mut copy = sub.clone();
            copy.set_time(cmd.time() + Tick(step) + local);
            out.insert_at(cmd.time() + local, copy);
        }
        true
    }

    fn is_scripting(&self) -> bool {
        true
    }
}
