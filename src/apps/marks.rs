//! The basic mark writer.

use crate::chart::{Chart, Mark, Side};
use crate::command::{CommandQueue, ParsedCommand};
use crate::diagnostics::CommandError;
use crate::dispatch::{Application, Dispatcher};

/// `mark <kind> <value> [end_value]`: writes one entry into a mark channel.
///
/// Two values write a jump entry. Values are written as given, without
/// validation against what the channel means. Laser-2x marks ignore the
/// value and always write `2x`, since that is the only value the channel
/// takes.
pub struct WriteMark;

fn mark_kind(name: &str) -> Option<Mark> {
    Some(match name {
        "bpm" => Mark::Bpm,
        "sig" | "signature" => Mark::TimeSignature,
        "filter" => Mark::Filter,
        "slamsound" => Mark::SlamSound,
        "knobvol" => Mark::KnobVolume,
        "slamvol" => Mark::SlamVolume,
        "zt" | "zoomtop" => Mark::ZoomTop,
        "zb" | "zoombottom" => Mark::ZoomBottom,
        "zs" | "zoomside" => Mark::ZoomSide,
        "tilt" => Mark::Tilt,
        "stop" => Mark::Stop,
        "split" => Mark::LaneSplit,
        "fxlong_l" => Mark::FxLong(Side::Left),
        "fxlong_r" => Mark::FxLong(Side::Right),
        "fxchip_l" => Mark::FxChip(Side::Left),
        "fxchip_r" => Mark::FxChip(Side::Right),
        "laser2x_l" => Mark::Laser2x(Side::Left),
        "laser2x_r" => Mark::Laser2x(Side::Right),
        _ => return None,
    })
}

impl Application for WriteMark {
    fn accepted_names(&self) -> Vec<String> {
        vec!["mark".to_string()]
    }

    fn check_args(&self, cmd: &ParsedCommand) -> bool {
        cmd.arg_len() == 2 || cmd.arg_len() == 3
    }

    fn run(
        &self,
        cmd: &ParsedCommand,
        _queue: &mut CommandQueue,
        chart: &mut Chart,
        bus: &Dispatcher,
    ) -> bool {
        let Some(kind) = cmd.arg(0).and_then(mark_kind) else {
            bus.log_error(&CommandError::InvalidArguments);
            return false;
        };
        let channel = chart.mark_mut(kind);
        if let Mark::Laser2x(_) = kind {
            channel.insert(cmd.time(), "2x".to_string());
        } else if let (Some(start), Some(end)) = (cmd.arg(1), cmd.arg(2)) {
            channel.insert_jump(cmd.time(), start.to_string(), end.to_string());
        } else if let Some(value) = cmd.arg(1) {
            channel.insert(cmd.time(), value.to_string());
        } else {
            return false;
        }
        true
    }
}
