//! Convenient re-exports of the types most code touches.

pub use crate::apps::{CommandBatch, Delay, Looper, WriteMark, default_preset};
pub use crate::chart::{BtLane, Chart, KNOB_RELEASED, Mark, Side};
pub use crate::command::{CommandQueue, ParsedCommand};
pub use crate::diagnostics::{CommandError, Diagnostic, ErrorCollector, Severity};
pub use crate::dispatch::{Application, Dispatcher, RunReport};
pub use crate::timeline::{ChannelValue, Entry, IntervalTimeline, Tick};
