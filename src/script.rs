//! Cooperative scripts and the scheduler that runs them.
//!
//! A script is a sequence of [`Step`]s. Actions run immediately; waits suspend the script
//! until their condition holds on some later (or the same) tick. Only one script runs at a
//! time and queued jobs start strictly in submission order, so a suspended script can never
//! be interleaved with another one's events.

use std::{collections::VecDeque, fmt, time::Duration};

use tracing::debug;

use crate::{
    command::{CommandError, Interpreter},
    host::{Animator, Control, Host, Phase},
    module::Module,
    oracle::digit_matches,
    solver::AutoSolver,
};

/// A response line for the controller. Neither kind affects control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A user-facing rejection.
    ChatError(String),
    /// An advisory sent just before an action that may strike.
    StrikeWarning(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::ChatError(message) => write!(f, "sendtochaterror {message}"),
            Response::StrikeWarning(message) => write!(f, "strikemessage {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Leading edge of a control.
    Press(Control),
    /// Trailing edge of a control.
    Release(Control),
    /// Press and release in the same instant.
    Tap(Control),
    Say(Response),
    ForceSolve,
    /// Suspend until the next tick.
    Yield,
    Sleep(Duration),
    /// Suspend until the countdown shows this digit.
    UntilDigit(u8),
    /// Suspend until the countdown shows the digit assigned to the current hold.
    UntilHoldDigit,
    /// Suspend until the door shows this phase.
    UntilDoor(Phase),
    /// Suspend until the module has finished its last transition.
    UntilSettled,
}

/// A source of steps. `None` means the script is finished.
pub trait Script: fmt::Debug {
    fn next_step(&mut self, module: &Module) -> Option<Step>;
}

/// A script whose steps are all known up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Steps(VecDeque<Step>);

impl Steps {
    pub fn push(&mut self, step: Step) {
        self.0.push_back(step);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.0.iter()
    }
}

impl FromIterator<Step> for Steps {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Step> for Steps {
    fn extend<I: IntoIterator<Item = Step>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl Script for Steps {
    fn next_step(&mut self, _module: &Module) -> Option<Step> {
        self.0.pop_front()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    NextTick(u64),
    Until(Duration),
    Digit(u8),
    HoldDigit,
    Door(Phase),
    Settled,
}

impl Wait {
    fn is_over(self, tick: u64, module: &Module, host: &impl Host) -> bool {
        match self {
            Wait::NextTick(after) => tick > after,
            Wait::Until(deadline) => host.now() >= deadline,
            Wait::Digit(digit) => digit_matches(&host.countdown(), digit),
            // a hold that ended some other way has nothing left to wait for
            Wait::HoldDigit => match module.held_button() {
                None => true,
                Some(_) => module
                    .hold_feedback()
                    .is_some_and(|feedback| feedback.is_satisfied_by(&host.countdown())),
            },
            Wait::Door(phase) => host.is_animation_active(Animator::Door, phase),
            Wait::Settled => !module.is_active() || !module.is_animating(host.now()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Job {
    Command(String),
    Solve,
}

/// Runs one script at a time, one tick at a time.
#[derive(Debug, Default)]
pub struct Scheduler {
    interpreter: Interpreter,
    queue: VecDeque<Job>,
    active: Option<Box<dyn Script>>,
    waiting: Option<Wait>,
    tick: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a textual command. It is parsed and checked when it starts, not now.
    pub fn submit(&mut self, command: impl Into<String>) {
        self.queue.push_back(Job::Command(command.into()));
    }

    /// Queue the automatic solver.
    pub fn solve(&mut self) {
        self.queue.push_back(Job::Solve);
    }

    /// `true` when nothing is running or queued.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Advance the module and the running script by one tick.
    ///
    /// Returns the responses produced during this tick.
    pub fn tick(&mut self, module: &mut Module, host: &mut impl Host) -> Vec<Response> {
        self.tick += 1;
        module.tick(host);

        let mut responses = Vec::new();
        loop {
            if let Some(wait) = self.waiting {
                if !wait.is_over(self.tick, module, &*host) {
                    break;
                }
                self.waiting = None;
            }

            if self.active.is_none() {
                match self.queue.pop_front() {
                    Some(job) => {
                        self.start(job, module, &mut responses);
                        continue;
                    }
                    None => break,
                }
            }

            let step = match self.active.as_mut() {
                Some(script) => script.next_step(module),
                None => None,
            };
            match step {
                Some(step) => self.run(step, module, host, &mut responses),
                None => self.active = None,
            }
        }
        responses
    }

    fn start(&mut self, job: Job, module: &Module, responses: &mut Vec<Response>) {
        match job {
            Job::Command(line) => match self.interpreter.compile(&line, module) {
                Ok(steps) => {
                    debug!(
                        module = %module.id(),
                        command = %line,
                        steps = steps.len(),
                        "command started"
                    );
                    self.active = Some(Box::new(steps));
                }
                Err(CommandError::Parse(err)) => {
                    debug!(module = %module.id(), command = %line, "command dropped: {err}");
                }
                Err(CommandError::Rejected(rejection)) => {
                    debug!(module = %module.id(), command = %line, "command rejected: {rejection}");
                    responses.push(Response::ChatError(rejection.to_string()));
                }
            },
            Job::Solve => {
                debug!(module = %module.id(), "forced solve started");
                self.active = Some(Box::new(AutoSolver::new()));
            }
        }
    }

    fn run(
        &mut self,
        step: Step,
        module: &mut Module,
        host: &mut impl Host,
        responses: &mut Vec<Response>,
    ) {
        match step {
            Step::Press(control) => {
                module.on_press(control, host);
            }
            Step::Release(control) => {
                module.on_release(control, host);
            }
            Step::Tap(control) => {
                module.on_press(control, host);
                module.on_release(control, host);
            }
            Step::Say(response) => responses.push(response),
            Step::ForceSolve => {
                module.force_solve(host);
            }
            Step::Yield => self.waiting = Some(Wait::NextTick(self.tick)),
            Step::Sleep(duration) => self.waiting = Some(Wait::Until(host.now() + duration)),
            Step::UntilDigit(digit) => self.waiting = Some(Wait::Digit(digit)),
            Step::UntilHoldDigit => self.waiting = Some(Wait::HoldDigit),
            Step::UntilDoor(phase) => self.waiting = Some(Wait::Door(phase)),
            Step::UntilSettled => self.waiting = Some(Wait::Settled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        button::{ButtonSpec, Color, Label, Shape},
        module::ModuleId,
        oracle::{FeedbackColor, HoldFeedback},
        panel::{Panel, Panels},
        sim::{Signal, SimHost},
    };

    const TICK: Duration = Duration::from_millis(50);

    fn module() -> Module {
        let tap = ButtonSpec::new(Color::Red, Label::Abort, Shape::Circle);
        Module::new(
            ModuleId(1),
            Panels::new(vec![Panel::new([Some(tap), None, None])]).unwrap(),
            Box::new(HoldFeedback::new(FeedbackColor::Blue, 2)),
        )
    }

    #[test]
    fn response_prefixes() {
        assert_eq!(
            Response::ChatError("no".into()).to_string(),
            "sendtochaterror no"
        );
        assert_eq!(
            Response::StrikeWarning("careful".into()).to_string(),
            "strikemessage careful"
        );
    }

    #[test]
    fn sleep_suspends_until_deadline() {
        let mut module = module();
        let mut host = SimHost::new();
        module.activate(&mut host);
        let mut scheduler = Scheduler::new();
        scheduler.submit("tap 1");

        scheduler.tick(&mut module, &mut host);
        assert!(!scheduler.is_idle());
        // the settle delay is two ticks long
        host.advance(TICK);
        scheduler.tick(&mut module, &mut host);
        assert!(!scheduler.is_idle());
        host.advance(TICK);
        scheduler.tick(&mut module, &mut host);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn jobs_run_in_order() {
        let mut module = module();
        let mut host = SimHost::new();
        module.activate(&mut host);
        let mut scheduler = Scheduler::new();
        scheduler.submit("tap 1");
        scheduler.submit("tap 1");

        scheduler.tick(&mut module, &mut host);
        // only the first tap has happened
        assert_eq!(host.strikes(), 0);
        for _ in 0..4 {
            host.advance(TICK);
            scheduler.tick(&mut module, &mut host);
        }
        // the second tap re-pressed a resolved button
        assert_eq!(host.strikes(), 1);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn yield_waits_one_tick() {
        let mut module = module();
        let mut host = SimHost::new();
        let mut scheduler = Scheduler::new();
        scheduler.active = Some(Box::new(Steps::from_iter([
            Step::Yield,
            Step::Say(Response::StrikeWarning("after".into())),
        ])));
        assert!(scheduler.tick(&mut module, &mut host).is_empty());
        assert_eq!(
            scheduler.tick(&mut module, &mut host),
            vec![Response::StrikeWarning("after".into())]
        );
        assert!(!host.signals().contains(&Signal::Strike));
    }
}
