//! Command routing: the plugin trait, macro compilation and the delay-tier
//! scheduler.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::chart::Chart;
use crate::command::{CommandQueue, ParsedCommand};
use crate::diagnostics::{CommandError, Diagnostic, ErrorCollector};
use crate::timeline::Tick;

/// Upper bound on commands processed by one [`Dispatcher::compile`] call.
/// Macro expansion is a fixed-point loop, so a self-replicating macro would
/// otherwise never terminate.
const COMPILE_BUDGET: usize = 1 << 16;

/// A command handler plugin.
///
/// Handlers are routed by command word via [`Application::accepted_names`];
/// an empty name list makes the handler a fallback for unknown words. All
/// methods take `&self` because handlers may re-enter the dispatcher (a
/// stored batch can run another batch), so stateful handlers use interior
/// mutability.
pub trait Application {
    /// Command words this handler accepts. Empty means it is consulted for
    /// any word no named handler claims.
    fn accepted_names(&self) -> Vec<String>;

    /// Whether `cmd`'s arguments are acceptable. A handler only gets to
    /// [`Application::run`] commands it accepts.
    fn check_args(&self, cmd: &ParsedCommand) -> bool;

    /// Executes `cmd`. `queue` is the live queue the command came from, so
    /// a handler may schedule further commands. Returns whether the command
    /// succeeded; failed commands are preserved by the caller.
    fn run(
        &self,
        cmd: &ParsedCommand,
        queue: &mut CommandQueue,
        chart: &mut Chart,
        bus: &Dispatcher,
    ) -> bool;

    /// Expands a scripting command, inserting replacement commands into
    /// `out`. Returns whether the command was handled; syntax problems go to
    /// `errors` as normalized command text.
    fn compile(
        &self,
        cmd: &ParsedCommand,
        out: &mut CommandQueue,
        errors: &mut Vec<String>,
        bus: &Dispatcher,
    ) -> bool {
        let _ = (cmd, out, errors, bus);
        false
    }

    /// Whether the handler participates in macro compilation.
    fn is_scripting(&self) -> bool {
        false
    }
}

/// Error and warning totals of one [`Dispatcher::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Number of errors collected.
    pub errors: usize,
    /// Number of warnings collected.
    pub warnings: usize,
}

/// The command bus: routes commands to registered [`Application`]s,
/// compiles scripting macros and runs the delay-tier schedule.
#[derive(Default)]
pub struct Dispatcher {
    apps: Vec<Rc<dyn Application>>,
    by_name: HashMap<String, Vec<usize>>,
    default_bucket: Vec<usize>,
    compilers: HashMap<String, Vec<usize>>,
    collector: RefCell<ErrorCollector>,
}

impl Dispatcher {
    /// Creates a dispatcher with no registered handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Handlers registered earlier win ties for the
    /// same command word.
    pub fn register(&mut self, app: Rc<dyn Application>) {
        let index = self.apps.len();
        let names = app.accepted_names();
        if names.is_empty() {
            self.default_bucket.push(index);
        } else {
            for name in &names {
                self.by_name.entry(name.clone()).or_default().push(index);
            }
            if app.is_scripting() {
                for name in names {
                    self.compilers.entry(name).or_default().push(index);
                }
            }
        }
        self.apps.push(app);
    }

    /// Records `error` with the current command context.
    pub fn log_error(&self, error: &CommandError) {
        self.collector.borrow_mut().error(error);
    }

    /// Records a free-form error with the current command context.
    pub fn log_error_text(&self, message: impl Into<String>) {
        self.collector.borrow_mut().error_text(message);
    }

    /// Records a warning with the current command context.
    pub fn log_warning(&self, message: impl Into<String>) {
        self.collector.borrow_mut().warning(message);
    }

    /// Enters a macro frame for diagnostics.
    pub fn push_call(&self, frame: impl Into<String>) {
        self.collector.borrow_mut().push_call(frame);
    }

    /// Leaves the innermost macro frame.
    pub fn pop_call(&self) {
        self.collector.borrow_mut().pop_call();
    }

    /// Takes the diagnostics collected so far.
    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.collector.borrow_mut().take_diagnostics()
    }

    /// Clears collected diagnostics and context.
    pub fn reset(&self) {
        self.collector.borrow_mut().reset();
    }

    /// Whether some named handler accepts `cmd`.
    #[must_use]
    pub fn check_command(&self, cmd: &ParsedCommand) -> bool {
        self.by_name
            .get(cmd.word())
            .is_some_and(|apps| apps.iter().any(|&i| self.apps[i].check_args(cmd)))
    }

    /// Compiles `input` to a fixed point: scripting commands expand back
    /// into the working queue until only plain commands remain, which are
    /// validated and moved to the output. Empty commands are dropped;
    /// invalid ones are appended to `errors` as normalized text.
    #[must_use]
    pub fn compile(&self, input: CommandQueue, errors: &mut Vec<String>) -> CommandQueue {
        let mut work = input;
        let mut out = CommandQueue::new();
        let mut budget = COMPILE_BUDGET;
        while let Some(cmd) = work.pop_front() {
            if cmd.is_empty() {
                continue;
            }
            if budget == 0 {
                self.log_error(&CommandError::MacroSyntax(
                    "expansion did not terminate".to_string(),
                ));
                errors.push(cmd.to_string());
                errors.extend(work.iter().map(ToString::to_string));
                break;
            }
            budget -= 1;

            if let Some(compilers) = self.compilers.get(cmd.word()) {
                let handled = compilers
                    .iter()
                    .any(|&i| self.apps[i].compile(&cmd, &mut work, errors, self));
                if !handled {
                    errors.push(cmd.to_string());
                }
            } else if self.check_command(&cmd) {
                out.insert(cmd);
            } else {
                errors.push(cmd.to_string());
            }
        }
        out
    }

    /// Runs the chart's command comments through the full schedule.
    ///
    /// The comment channel is imported, then executed tier by tier: every
    /// command whose delay tier is at most the current tier runs (including
    /// commands scheduled during this tier), then the tier advances to the
    /// smallest delay still queued. Failed commands are re-exported into the
    /// comment channel alongside comments that never were commands, so
    /// nothing a user wrote is lost.
    pub fn run(&self, chart: &mut Chart) -> RunReport {
        let mut queue = CommandQueue::import_comments(chart.comments());
        let mut failed = CommandQueue::new();

        let mut tier = 0;
        loop {
            let (ready, next_tier) = queue.drain_ready(tier);
            if ready.is_empty() {
                match next_tier {
                    Some(next) => tier = next,
                    None => break,
                }
                continue;
            }
            for cmd in ready {
                if !self.dispatch_one(&cmd, &mut queue, chart) {
                    failed.insert(cmd);
                }
            }
        }

        let mut comments = failed.export_comments();
        for (&at, entry) in chart.comments() {
            if !entry.after().starts_with("//") && !comments.contains_key(at) {
                comments.insert(at, entry.clone());
            }
        }
        chart.set_comments(comments);

        let collector = self.collector.borrow();
        RunReport {
            errors: collector.error_count(),
            warnings: collector.warning_count(),
        }
    }

    /// Executes a prepared batch at `at`: the batch is shifted there and
    /// drained to completion, ignoring delay tiers. Failures are logged but
    /// the failed commands themselves are discarded, since the batch text
    /// still exists at its definition site.
    pub fn execute_batch(&self, batch: CommandQueue, chart: &mut Chart, at: Tick) {
        let mut queue = batch.offset(at);
        while let Some(cmd) = queue.pop_front() {
            let _ = self.dispatch_one(&cmd, &mut queue, chart);
        }
    }

    /// Runs a scripting command by compiling it into a scratch batch and
    /// executing that batch. This is the `run` implementation every
    /// scripting handler shares.
    pub fn run_compiled(&self, app: &dyn Application, cmd: &ParsedCommand, chart: &mut Chart) -> bool {
        let mut batch = CommandQueue::new();
        let mut errors = Vec::new();
        let handled = app.compile(cmd, &mut batch, &mut errors, self);
        if !errors.is_empty() {
            let listing: String = errors.iter().map(|text| format!("\n\t{text}")).collect();
            self.log_error(&CommandError::MacroSyntax(format!(
                "batch contains invalid commands:{listing}"
            )));
            return false;
        }
        if !handled {
            return false;
        }
        self.push_call(cmd.source().into_owned());
        self.execute_batch(batch, chart, Tick::ZERO);
        self.pop_call();
        true
    }

    /// Routes one command. The first handler registered under the word that
    /// accepts the arguments runs it and its result decides; unknown words
    /// fall through to the default bucket; no acceptor at all is an
    /// invalid-arguments error. Returns whether the command succeeded.
    fn dispatch_one(&self, cmd: &ParsedCommand, queue: &mut CommandQueue, chart: &mut Chart) -> bool {
        self.collector
            .borrow_mut()
            .set_context(cmd.time(), cmd.source().into_owned());

        let candidates = match self.by_name.get(cmd.word()) {
            Some(named) => named.as_slice(),
            None => self.default_bucket.as_slice(),
        };

        for &index in candidates {
            let app = &self.apps[index];
            if app.check_args(cmd) {
                return app.run(cmd, queue, chart, self);
            }
        }
        self.log_error(&CommandError::InvalidArguments);
        false
    }
}
