use std::cell::RefCell;
use std::rc::Rc;

use kshram::prelude::*;
use pretty_assertions::assert_eq;

/// Records the order commands reach it, and can schedule follow-up work.
struct Probe {
    log: Rc<RefCell<Vec<String>>>,
}

impl Application for Probe {
    fn accepted_names(&self) -> Vec<String> {
        vec!["note".to_string(), "spawn".to_string()]
    }

    fn check_args(&self, _cmd: &ParsedCommand) -> bool {
        true
    }

    fn run(
        &self,
        cmd: &ParsedCommand,
        queue: &mut CommandQueue,
        _chart: &mut Chart,
        _bus: &Dispatcher,
    ) -> bool {
        self.log.borrow_mut().push(cmd.to_string());
        if cmd.matches("spawn") {
            // Schedule the named follow-up at the given tick and tier.
            let line = format!(
                "#{} note {}",
                cmd.arg(2).unwrap_or("0"),
                cmd.arg(0).unwrap_or("")
            );
            let at = Tick(cmd.arg_int(1).unwrap_or(0));
            queue.push_line(&line, at);
        }
        true
    }
}

fn probe_bus() -> (Dispatcher, Rc<RefCell<Vec<String>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut bus = default_preset();
    bus.register(Rc::new(Probe {
        log: Rc::clone(&log),
    }));
    (bus, log)
}

#[test]
fn ticks_order_within_a_tier() {
    let (bus, log) = probe_bus();
    let mut chart = Chart::default();
    chart.comments_mut().insert(Tick(96), "//note b".to_string());
    chart
        .comments_mut()
        .insert(Tick(0), "//note a;note a2".to_string());

    let report = bus.run(&mut chart);
    assert_eq!(report.errors, 0);
    assert_eq!(*log.borrow(), vec!["note a", "note a2", "note b"]);
}

#[test]
fn delay_tiers_run_low_to_high() {
    let (bus, log) = probe_bus();
    let mut chart = Chart::default();
    chart
        .comments_mut()
        .insert(Tick(0), "//#2 note second;#7 note third;note first".to_string());

    bus.run(&mut chart);
    assert_eq!(
        *log.borrow(),
        vec!["note first", "note second", "note third"]
    );
}

#[test]
fn work_spawned_at_the_current_tier_runs_before_the_tier_advances() {
    let (bus, log) = probe_bus();
    let mut chart = Chart::default();
    // `spawn <name> <tick> <tier>` queues `#<tier> note <name>` at <tick>.
    // The spawned tier-0 command sits past everything else on the timeline
    // yet still runs before the tier-1 command at the earlier tick.
    chart
        .comments_mut()
        .insert(Tick(10), "//spawn c 20 0".to_string());
    chart.comments_mut().insert(Tick(5), "//#1 note b".to_string());

    bus.run(&mut chart);
    assert_eq!(*log.borrow(), vec!["spawn c 20 0", "note c", "note b"]);
}

#[test]
fn spawned_work_above_the_current_tier_waits() {
    let (bus, log) = probe_bus();
    let mut chart = Chart::default();
    chart
        .comments_mut()
        .insert(Tick(0), "//spawn later 0 2;#1 note mid".to_string());

    bus.run(&mut chart);
    assert_eq!(
        *log.borrow(),
        vec!["spawn later 0 2", "note mid", "note later"]
    );
}

#[test]
fn loop_copies_run_in_the_pass_of_their_source() {
    let (bus, log) = probe_bus();
    let mut chart = Chart::default();
    chart
        .comments_mut()
        .insert(Tick(0), "//loop 2 1 {note looped};note plain".to_string());
    chart
        .comments_mut()
        .insert(Tick(48), "//note at48".to_string());

    bus.run(&mut chart);
    // Both loop iterations run where the loop sits, before tick 48 is
    // reached, even though the second copy acts on tick 48.
    assert_eq!(
        *log.borrow(),
        vec!["note looped", "note looped", "note plain", "note at48"]
    );
}

#[test]
fn failed_commands_survive_with_their_delay_tier() {
    let (bus, _log) = probe_bus();
    let mut chart = Chart::default();
    chart
        .comments_mut()
        .insert(Tick(0), "//#3 Unknown Word".to_string());

    let report = bus.run(&mut chart);
    assert_eq!(report.errors, 1);
    assert_eq!(
        chart.comments().after_at(Tick(0)),
        Some(&"//#3 Unknown Word".to_string())
    );
}
