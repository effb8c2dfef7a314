use std::collections::VecDeque;

use crate::{
    config::{SETTLE_DELAY, SLOTS},
    host::Control,
    module::Module,
    script::{Script, Step},
    solution::RequiredAction,
};

/// Drives a module to completion from its known solution.
///
/// Plans one panel at a time: wait for the panel to settle, satisfy every button that still
/// needs something, then advance. Repeats until the module is solved.
#[derive(Debug, Default)]
pub struct AutoSolver {
    queue: VecDeque<Step>,
    started: bool,
}

impl AutoSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deal with a button that was already down when the solver took over.
    fn take_over(&mut self, module: &Module) -> bool {
        let Some(slot) = module.held_button() else {
            return false;
        };
        if module.required(module.current_panel(), slot) == RequiredAction::Hold {
            self.queue.extend([
                Step::UntilHoldDigit,
                Step::Release(Control::Button(slot)),
                Step::Sleep(SETTLE_DELAY),
            ]);
        } else {
            // releasing it could only strike
            self.queue.push_back(Step::ForceSolve);
        }
        true
    }

    fn plan_panel(&mut self, module: &Module) {
        let panel = module.current_panel();
        self.queue.push_back(Step::UntilSettled);
        for slot in 0..SLOTS {
            if module.is_satisfied(panel, slot) {
                continue;
            }
            let button = Control::Button(slot);
            match module.required(panel, slot) {
                RequiredAction::Tap => self.queue.push_back(Step::Tap(button)),
                RequiredAction::Hold => self.queue.extend([
                    Step::Press(button),
                    Step::UntilHoldDigit,
                    Step::Release(button),
                ]),
                RequiredAction::None => continue,
            }
            self.queue.push_back(Step::Sleep(SETTLE_DELAY));
        }
        self.queue.extend([Step::Tap(Control::Next), Step::Sleep(SETTLE_DELAY)]);
    }
}

impl Script for AutoSolver {
    fn next_step(&mut self, module: &Module) -> Option<Step> {
        if let Some(step) = self.queue.pop_front() {
            return Some(step);
        }
        if module.is_solved() {
            return None;
        }
        if !std::mem::replace(&mut self.started, true) && self.take_over(module) {
            return self.queue.pop_front();
        }
        self.plan_panel(module);
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        button::{ButtonSpec, Color, Label, Shape},
        config::GenerationConfig,
        module::{ModuleId, Performed},
        oracle::{FeedbackColor, HoldFeedback},
        panel::{Panel, Panels},
        script::Scheduler,
        sim::SimHost,
    };
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(50);

    fn solve(module: &mut Module, host: &mut SimHost, scheduler: &mut Scheduler) {
        scheduler.solve();
        for _ in 0..20_000 {
            scheduler.tick(module, host);
            if scheduler.is_idle() {
                return;
            }
            host.advance(TICK);
        }
        panic!("solver did not finish");
    }

    #[test]
    fn solves_generated_puzzles_without_strikes() {
        let config = GenerationConfig::default().with_panels(3..=5).with_absent_chance(0.2);
        for seed in 0..8 {
            let mut module = Module::generate(ModuleId(seed as u32), &config, seed).unwrap();
            let mut host = SimHost::new();
            host.start_countdown(Duration::from_secs(600));
            module.activate(&mut host);
            let mut scheduler = Scheduler::new();

            solve(&mut module, &mut host, &mut scheduler);

            assert!(module.is_solved(), "seed {seed}");
            assert!(host.is_solved());
            assert_eq!(host.strikes(), 0, "seed {seed}");
        }
    }

    #[test]
    fn waits_out_a_correct_hold_in_progress() {
        // blue's first rule is HOLD CIRCLE
        let blue_hold = ButtonSpec::new(Color::Blue, Label::Hold, Shape::Circle);
        let mut module = Module::new(
            ModuleId(1),
            Panels::new(vec![Panel::new([Some(blue_hold), None, None])]).unwrap(),
            Box::new(HoldFeedback::new(FeedbackColor::Magenta, 4)),
        );
        let mut host = SimHost::new();
        host.start_countdown(Duration::from_secs(300));
        module.activate(&mut host);
        module.press(0, &mut host);

        let mut scheduler = Scheduler::new();
        solve(&mut module, &mut host, &mut scheduler);

        assert!(module.is_solved());
        assert_eq!(host.strikes(), 0);
        assert_eq!(module.performed(0, 0), Performed::Held);
    }

    #[test]
    fn wrong_hold_in_progress_solves_outright() {
        // red's first rule is ABORT SQUARE
        let red_tap = ButtonSpec::new(Color::Red, Label::Abort, Shape::Circle);
        let mut module = Module::new(
            ModuleId(1),
            Panels::new(vec![Panel::full([red_tap; 3]), Panel::full([red_tap; 3])]).unwrap(),
            Box::new(HoldFeedback::new(FeedbackColor::Blue, 2)),
        );
        let mut host = SimHost::new();
        module.activate(&mut host);
        module.press(0, &mut host);

        let mut scheduler = Scheduler::new();
        solve(&mut module, &mut host, &mut scheduler);

        assert!(module.is_solved());
        assert_eq!(module.current_panel(), 0);
        assert_eq!(host.strikes(), 0);
    }
}
