#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! The core of a command-style chart editing toolpack for the KSH
//! (K-Shoot Mania) rhythm game format.
//!
//! Charts are modeled as a set of [`timeline::IntervalTimeline`]s, ordered
//! maps from a [`timeline::Tick`] to a dual-valued [`timeline::Entry`]. Every
//! lane, knob and mark channel of a [`chart::Chart`] is such a timeline, so
//! span-level edits (replace, slice, offset, merge) are uniform across
//! channels.
//!
//! Edits themselves are expressed as text commands embedded in the chart's
//! comment channel. A [`command::ParsedCommand`] is a lowercased,
//! brace-aware word list with a tick and a delay tier; a
//! [`command::CommandQueue`] keeps them in deterministic tick-then-insertion
//! order. The [`dispatch::Dispatcher`] compiles scripting macros (`loop`,
//! `delay`, `batch`) to fixed point and executes the queue tier by tier,
//! routing each command to the first registered [`dispatch::Application`]
//! that accepts it. Commands that fail are preserved: they are exported back
//! into the comment channel so a user's edit is never silently dropped.
//!
//! ```
//! use kshram::prelude::*;
//!
//! let mut chart = Chart::default();
//! chart
//!     .comments_mut()
//!     .insert(Tick(0), "//mark bpm 148;loop 4 1 {mark stop 192}".to_string());
//!
//! let bus = kshram::default_preset();
//! let report = bus.run(&mut chart);
//! assert_eq!(report.errors, 0);
//! assert_eq!(chart.mark(Mark::Stop).len(), 4);
//! ```

pub mod apps;
pub mod chart;
pub mod command;
pub mod diagnostics;
pub mod dispatch;
pub mod prelude;
pub mod timeline;

pub use apps::default_preset;
