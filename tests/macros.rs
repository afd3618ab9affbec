use kshram::prelude::*;
use pretty_assertions::assert_eq;

fn run_comments(lines: &[(i64, &str)]) -> (Chart, RunReport) {
    let mut chart = Chart::default();
    for &(at, line) in lines {
        chart.comments_mut().insert(Tick(at), line.to_string());
    }
    let bus = default_preset();
    let report = bus.run(&mut chart);
    (chart, report)
}

fn keys(channel: &IntervalTimeline<String>) -> Vec<i64> {
    channel.iter().map(|(&at, _)| at.0).collect()
}

#[test]
fn loop_steps_in_beats() {
    let (chart, report) = run_comments(&[(0, "//loop 4 1 {mark stop 192}")]);
    assert_eq!(report.errors, 0);
    assert_eq!(keys(chart.mark(Mark::Stop)), vec![0, 48, 96, 144]);
    assert!(chart.comments().is_empty());
}

#[test]
fn loops_nest() {
    let (chart, report) = run_comments(&[(0, "//loop 2 2 {loop 2 1 {mark stop 12}}")]);
    assert_eq!(report.errors, 0);
    assert_eq!(keys(chart.mark(Mark::Stop)), vec![0, 48, 96, 144]);
}

#[test]
fn loop_accepts_ratio_steps() {
    let (chart, report) = run_comments(&[(96, "//loop 3 1/2 {mark zt 300}")]);
    assert_eq!(report.errors, 0);
    assert_eq!(keys(chart.mark(Mark::ZoomTop)), vec![96, 120, 144]);
}

#[test]
fn delay_shifts_the_body() {
    let (chart, report) = run_comments(&[(96, "//delay 1/2 {mark zt 300;mark zb -60}")]);
    assert_eq!(report.errors, 0);
    assert_eq!(keys(chart.mark(Mark::ZoomTop)), vec![120]);
    assert_eq!(keys(chart.mark(Mark::ZoomBottom)), vec![120]);
}

#[test]
fn rejected_loops_stay_as_comments() {
    let (chart, report) = run_comments(&[(0, "//loop 1 1 {mark stop 192}")]);
    assert_eq!(report.errors, 1);
    assert!(chart.mark(Mark::Stop).is_empty());
    assert_eq!(
        chart.comments().after_at(Tick(0)),
        Some(&"//loop 1 1 {mark stop 192}".to_string())
    );
}

#[test]
fn loop_with_an_invalid_body_reports_the_culprit() {
    let (chart, report) = run_comments(&[(0, "//loop 2 1 {mystery 42}")]);
    assert_eq!(report.errors, 1);
    assert_eq!(
        chart.comments().after_at(Tick(0)),
        Some(&"//loop 2 1 {mystery 42}".to_string())
    );
}

#[test]
fn batches_run_at_the_call_site() {
    let (chart, report) = run_comments(&[
        (0, "//batch define intro {mark bpm 148;mark sig 4/4}"),
        (192, "//batch call intro"),
        (384, "//batch call intro"),
    ]);
    assert_eq!(report.errors, 0);
    assert_eq!(keys(chart.mark(Mark::Bpm)), vec![192, 384]);
    assert_eq!(
        chart.mark(Mark::TimeSignature).after_at(Tick(192)),
        Some(&"4/4".to_string())
    );
}

#[test]
fn batches_may_contain_macros() {
    let (chart, report) = run_comments(&[
        (0, "//batch define fill {loop 2 1 {mark stop 24}}"),
        (96, "//batch call fill"),
    ]);
    assert_eq!(report.errors, 0);
    assert_eq!(keys(chart.mark(Mark::Stop)), vec![96, 144]);
}

#[test]
fn calling_an_undefined_batch_fails() {
    let (chart, report) = run_comments(&[(0, "//batch call nothing")]);
    assert_eq!(report.errors, 1);
    assert_eq!(
        chart.comments().after_at(Tick(0)),
        Some(&"//batch call nothing".to_string())
    );
}

#[test]
fn mark_jump_entries_and_laser2x() {
    let (chart, report) = run_comments(&[
        (0, "//mark zs -30 30;mark laser2x_l whatever"),
        (48, "//mark nope 1"),
    ]);
    assert_eq!(report.errors, 1);
    assert_eq!(
        chart.mark(Mark::ZoomSide).get(Tick(0)),
        Some(&Entry::Jump {
            before: "-30".to_string(),
            after: "30".to_string(),
        })
    );
    assert_eq!(
        chart.mark(Mark::Laser2x(Side::Left)).after_at(Tick(0)),
        Some(&"2x".to_string())
    );
    assert_eq!(
        chart.comments().after_at(Tick(48)),
        Some(&"//mark nope 1".to_string())
    );
}
