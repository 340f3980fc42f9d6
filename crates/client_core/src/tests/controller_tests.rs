use super::*;
use std::time::Duration;

fn name(raw: &str) -> DisplayName {
    DisplayName::sanitize(raw).expect("display name")
}

fn controller() -> RestorationController {
    RestorationController::new(RestorationSettings::default())
}

fn fill_bar(controller: &mut RestorationController) -> u32 {
    let mut ticks = 0;
    while !controller.on_tick() {
        ticks += 1;
    }
    ticks + 1
}

#[test]
fn decision_table_matches_phase_flow() {
    use RestorationPhase as Phase;

    assert_eq!(transition(Phase::Loading, 100, false), Step::Enter(Phase::Finishing));
    assert_eq!(transition(Phase::Finishing, 100, true), Step::Enter(Phase::Finished));
    assert_eq!(transition(Phase::Finished, 100, true), Step::Enter(Phase::Complete));
    assert_eq!(transition(Phase::Finished, 100, false), Step::Enter(Phase::DisplayName));
    assert_eq!(transition(Phase::Complete, 100, true), Step::OpenMainView);
}

#[test]
fn partial_bars_and_input_phases_stay_put() {
    use RestorationPhase as Phase;

    assert_eq!(transition(Phase::Loading, 99, true), Step::Stay);
    assert_eq!(transition(Phase::Finishing, 0, true), Step::Stay);
    assert_eq!(transition(Phase::Complete, 100, false), Step::Stay);
    assert_eq!(transition(Phase::RecoveryPassword, 100, true), Step::Stay);
    assert_eq!(transition(Phase::DisplayName, 100, true), Step::Stay);
}

#[test]
fn loading_ticks_once_per_percent_budget() {
    let mut controller = controller();
    let schedule = controller.enter_phase(RestorationPhase::Loading);
    assert_eq!(schedule, Schedule::Ticker(Duration::from_millis(150)));

    for expected in 1..=100u8 {
        let full = controller.on_tick();
        assert_eq!(controller.state().percent(), expected);
        assert_eq!(full, expected == 100);
    }

    assert!(controller.on_tick());
    assert_eq!(controller.state().percent(), 100);
}

#[test]
fn entering_loading_always_resets_the_bar() {
    let mut controller = controller();
    controller.enter_phase(RestorationPhase::Loading);
    for _ in 0..42 {
        controller.on_tick();
    }
    controller.enter_phase(RestorationPhase::RecoveryPassword);
    assert_eq!(controller.state().percent(), 42);

    controller.enter_phase(RestorationPhase::Loading);
    assert_eq!(controller.state().percent(), 0);
}

#[test]
fn finishing_restarts_a_full_bar_but_continues_a_partial_one() {
    let mut full = controller();
    full.enter_phase(RestorationPhase::Loading);
    assert_eq!(fill_bar(&mut full), 100);
    assert_eq!(
        full.on_phase_complete(),
        Step::Enter(RestorationPhase::Finishing)
    );
    full.enter_phase(RestorationPhase::Finishing);
    assert_eq!(full.state().percent(), 0);

    let mut partial = controller();
    partial.enter_phase(RestorationPhase::Loading);
    for _ in 0..30 {
        partial.on_tick();
    }
    let schedule = partial.enter_phase(RestorationPhase::Finishing);
    assert_eq!(schedule, Schedule::Ticker(Duration::from_millis(3)));
    assert_eq!(partial.state().percent(), 30);
    assert_eq!(fill_bar(&mut partial), 70);
}

#[test]
fn ticks_outside_timed_phases_are_ignored() {
    let mut controller = controller();
    assert!(!controller.on_tick());
    controller.enter_phase(RestorationPhase::DisplayName);
    assert!(!controller.on_tick());
    assert_eq!(controller.state().percent(), 0);
}

#[test]
fn finished_waits_on_configured_delay() {
    let mut controller = controller();
    assert_eq!(
        controller.enter_phase(RestorationPhase::Finished),
        Schedule::Delay(Duration::from_millis(200))
    );

    let mut immediate = RestorationController::new(RestorationSettings {
        finished_delay_ms: 0,
        ..RestorationSettings::default()
    });
    assert_eq!(
        immediate.enter_phase(RestorationPhase::Finished),
        Schedule::Immediate
    );
}

#[test]
fn finished_with_name_completes_and_opens_main_view_once() {
    let mut controller = controller();
    controller.enter_phase(RestorationPhase::Loading);
    assert_eq!(controller.apply_lookup(Ok(name("Alice"))), None);

    controller.enter_phase(RestorationPhase::Finished);
    assert_eq!(
        controller.on_phase_complete(),
        Step::Enter(RestorationPhase::Complete)
    );
    assert_eq!(
        controller.enter_phase(RestorationPhase::Complete),
        Schedule::Immediate
    );
    assert_eq!(controller.on_phase_complete(), Step::OpenMainView);
    assert!(controller.main_view_opened());
    assert_eq!(controller.on_phase_complete(), Step::Stay);
}

#[test]
fn finished_without_name_falls_back_to_manual_entry() {
    let mut controller = controller();
    controller.enter_phase(RestorationPhase::Finished);
    assert_eq!(
        controller.on_phase_complete(),
        Step::Enter(RestorationPhase::DisplayName)
    );
    assert!(!controller.main_view_opened());
}

#[test]
fn lookup_failures_route_by_kind() {
    let mut controller = controller();
    controller.enter_phase(RestorationPhase::Loading);
    assert_eq!(
        controller.apply_lookup(Err(RecoveryError::NotFound)),
        Some(RestorationPhase::DisplayName)
    );

    controller.enter_phase(RestorationPhase::Finishing);
    assert_eq!(
        controller.apply_lookup(Err(RecoveryError::network("connection reset"))),
        Some(RestorationPhase::RecoveryPassword)
    );
}

#[test]
fn lookup_outcome_after_leaving_progress_is_ignored() {
    let mut controller = controller();
    controller.enter_phase(RestorationPhase::DisplayName);
    assert_eq!(controller.apply_lookup(Ok(name("Late"))), None);
    assert_eq!(controller.apply_lookup(Err(RecoveryError::NotFound)), None);
    assert!(!controller.state().has_display_name());
}

#[test]
fn advance_on_lookup_jumps_to_finishing() {
    let mut controller = RestorationController::new(RestorationSettings {
        advance_on_lookup: true,
        ..RestorationSettings::default()
    });
    controller.enter_phase(RestorationPhase::Loading);
    assert_eq!(
        controller.apply_lookup(Ok(name("Alice"))),
        Some(RestorationPhase::Finishing)
    );
    assert_eq!(
        controller
            .state()
            .recovered_display_name()
            .map(DisplayName::as_str),
        Some("Alice")
    );
}
