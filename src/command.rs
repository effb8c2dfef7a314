use std::str::FromStr;

use tracing::debug;

use crate::{
    config::{CYCLE_ADVANCE_DELAY, CYCLE_FINISH_DELAY, SETTLE_DELAY, SLOTS},
    host::{Control, Phase},
    module::Module,
    script::{Response, Step, Steps},
};

/// How to drive the module by text.
pub const HELP: &str = "Tap buttons with \"tap 1 3\". Move to the next panel with \"down\" and \
to the previous one with \"up\". Revisit the panels done so far with \"cycle\". Hold a button \
with \"hold 2\" and release it with \"release 7\". Buttons are 1, 2 and 3. If a panel only \
needs taps, \"tap 1 2 down\" taps and moves on in one go.";

/// One entry of a `tap` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapTarget {
    Up,
    Down,
    /// Zero-based slot.
    Button(usize),
}

impl FromStr for TapTarget {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "u" => Ok(TapTarget::Up),
            "down" | "d" => Ok(TapTarget::Down),
            "1" => Ok(TapTarget::Button(0)),
            "2" => Ok(TapTarget::Button(1)),
            "3" => Ok(TapTarget::Button(2)),
            _ => Err(ParseError::TapTarget(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Cycle,
    Up,
    Down,
    /// Zero-based slot.
    Hold(usize),
    Release(u8),
    Tap(Vec<TapTarget>),
}

fn parse_button(s: &str) -> Result<usize, ParseError> {
    match s.parse::<usize>() {
        Ok(n) if (1..=SLOTS).contains(&n) => Ok(n - 1),
        _ => Err(ParseError::Button(s.to_owned())),
    }
}

fn parse_digit(s: &str) -> Result<u8, ParseError> {
    match s.parse::<u8>() {
        Ok(d) if d <= 9 => Ok(d),
        _ => Err(ParseError::Digit(s.to_owned())),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    /// Parse a command line. Case-insensitive; tokens are separated by whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let mut tokens = lowered.split_whitespace();
        let verb = tokens.next().ok_or(ParseError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        let expect_args = |verb: &'static str, expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(ParseError::Arity {
                    verb,
                    expected,
                    found: args.len(),
                })
            }
        };

        match verb {
            "cycle" => expect_args("cycle", 0).map(|_| Command::Cycle),
            "up" | "u" => expect_args("up", 0).map(|_| Command::Up),
            "down" | "d" => expect_args("down", 0).map(|_| Command::Down),
            "hold" => {
                expect_args("hold", 1)?;
                parse_button(args[0]).map(Command::Hold)
            }
            "release" => {
                expect_args("release", 1)?;
                parse_digit(args[0]).map(Command::Release)
            }
            "tap" => {
                let targets = args
                    .iter()
                    .map(|arg| arg.parse())
                    .collect::<Result<Vec<TapTarget>, _>>()?;
                if targets.is_empty() {
                    return Err(ParseError::NoTapTargets);
                }
                Ok(Command::Tap(targets))
            }
            _ => Err(ParseError::UnknownVerb(verb.to_owned())),
        }
    }
}

/// Translates commands into scripts, tracking the button it is holding.
#[derive(Debug, Default)]
pub struct Interpreter {
    held: Option<usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot held by a previous `hold` command, if any.
    pub fn held(&self) -> Option<usize> {
        self.held
    }

    /// Parse `line` and check it against the current state of `module`.
    ///
    /// On success the returned steps are ready to be scheduled. Nothing is sent to the
    /// module here.
    pub fn compile(&mut self, line: &str, module: &Module) -> Result<Steps, CommandError> {
        let command: Command = line.parse()?;
        // the hold may have ended without us, e.g. through a forced solve
        if self.held.is_some() && self.held != module.held_button() {
            debug!(module = %module.id(), "interpreter hold ended externally");
            self.held = None;
        }
        self.plan(command, module).map_err(CommandError::from)
    }

    fn busy(&self, module: &Module) -> Option<usize> {
        self.held.or_else(|| module.held_button())
    }

    fn plan(&mut self, command: Command, module: &Module) -> Result<Steps, Rejection> {
        let mut steps = Steps::default();
        match command {
            Command::Cycle => {
                if let Some(held) = self.busy(module) {
                    return Err(Rejection::Cycle { held });
                }
                let origin = module.current_panel();
                for _ in 0..origin {
                    steps.extend([
                        Step::Tap(Control::Prev),
                        Step::Yield,
                        Step::UntilDoor(Phase::OpenIdle),
                    ]);
                }
                for _ in 0..origin {
                    steps.extend([
                        Step::Sleep(CYCLE_ADVANCE_DELAY),
                        Step::Tap(Control::Next),
                        Step::Yield,
                        Step::UntilDoor(Phase::OpenIdle),
                    ]);
                }
                steps.push(Step::Sleep(CYCLE_FINISH_DELAY));
            }
            Command::Up => {
                if let Some(held) = self.busy(module) {
                    return Err(Rejection::Up { held });
                }
                push_up(&mut steps);
            }
            Command::Down => {
                if let Some(held) = self.busy(module) {
                    return Err(Rejection::Down { held });
                }
                push_down(&mut steps);
            }
            Command::Hold(slot) => {
                if let Some(held) = self.busy(module) {
                    return Err(Rejection::Hold {
                        requested: slot,
                        held,
                    });
                }
                self.held = Some(slot);
                steps.extend([Step::Press(Control::Button(slot)), Step::Sleep(SETTLE_DELAY)]);
            }
            Command::Release(digit) => {
                let slot = self.held.take().ok_or(Rejection::NothingHeld)?;
                steps.extend([
                    Step::UntilDigit(digit),
                    Step::Release(Control::Button(slot)),
                    Step::Sleep(SETTLE_DELAY),
                ]);
            }
            Command::Tap(targets) => {
                if let Some(held) = self.busy(module) {
                    return Err(Rejection::Tap { held });
                }
                for target in targets {
                    match target {
                        TapTarget::Up => {
                            push_up(&mut steps);
                            break;
                        }
                        TapTarget::Down => {
                            push_down(&mut steps);
                            break;
                        }
                        TapTarget::Button(slot) => steps.extend([
                            Step::Say(Response::StrikeWarning(format!(
                                "tapping button {}",
                                slot + 1
                            ))),
                            Step::Tap(Control::Button(slot)),
                            Step::Sleep(SETTLE_DELAY),
                        ]),
                    }
                }
            }
        }
        Ok(steps)
    }
}

fn push_up(steps: &mut Steps) {
    steps.extend([Step::Tap(Control::Prev), Step::Sleep(SETTLE_DELAY)]);
}

fn push_down(steps: &mut Steps) {
    steps.extend([
        Step::Say(Response::StrikeWarning("attempting to move to the next panel".into())),
        Step::Tap(Control::Next),
        Step::Sleep(SETTLE_DELAY),
    ]);
}

/// A malformed command. These are dropped without a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command \"{0}\"")]
    UnknownVerb(String),
    #[error("\"{verb}\" takes {expected} argument(s), got {found}")]
    Arity {
        verb: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("\"{0}\" is not a button number")]
    Button(String),
    #[error("\"{0}\" is not a single digit")]
    Digit(String),
    #[error("\"{0}\" is not a tap target")]
    TapTarget(String),
    #[error("nothing to tap")]
    NoTapTargets,
}

/// A well-formed command that can't run right now. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("you can not cycle the panels until button {} is released", .held + 1)]
    Cycle { held: usize },
    #[error("you can not move to the previous panel until button {} is released", .held + 1)]
    Up { held: usize },
    #[error("you can not move to the next panel until button {} is released", .held + 1)]
    Down { held: usize },
    #[error("you can not hold button {} until button {} is released", .requested + 1, .held + 1)]
    Hold { requested: usize, held: usize },
    #[error("you are not currently holding any buttons.")]
    NothingHeld,
    #[error("you can not tap any buttons or change panels until button {} is released", .held + 1)]
    Tap { held: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Rejected(#[from] Rejection),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        button::{ButtonSpec, Color, Label, Shape},
        host::{Animator, Host},
        module::{ModuleId, Outcome, Performed},
        oracle::{FeedbackColor, HoldFeedback},
        panel::{Panel, Panels},
        script::Scheduler,
        sim::{Signal, SimHost},
        solution::RequiredAction,
    };
    use rstest::rstest;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(50);

    // first-occurrence rules: red ABORT SQUARE, blue HOLD CIRCLE, yellow DETONATE CIRCLE
    const RED_TAP: ButtonSpec = ButtonSpec::new(Color::Red, Label::Abort, Shape::Circle);
    const BLUE_TAP: ButtonSpec = ButtonSpec::new(Color::Blue, Label::Hold, Shape::Square);
    const BLUE_HOLD: ButtonSpec = ButtonSpec::new(Color::Blue, Label::Hold, Shape::Circle);
    const YELLOW_NONE: ButtonSpec = ButtonSpec::new(Color::Yellow, Label::Press, Shape::Square);

    fn setup(panels: Vec<Panel>) -> (Module, SimHost, Scheduler) {
        let mut module = Module::new(
            ModuleId(7),
            Panels::new(panels).unwrap(),
            Box::new(HoldFeedback::new(FeedbackColor::Yellow, 3)),
        );
        let mut host = SimHost::new();
        module.activate(&mut host);
        (module, host, Scheduler::new())
    }

    /// Tick until the scheduler has nothing left, collecting responses.
    fn run(module: &mut Module, host: &mut SimHost, scheduler: &mut Scheduler) -> Vec<String> {
        let mut responses = Vec::new();
        for _ in 0..2_000 {
            responses.extend(scheduler.tick(module, host).iter().map(ToString::to_string));
            if scheduler.is_idle() {
                break;
            }
            host.advance(TICK);
        }
        responses
    }

    #[rstest]
    #[case("cycle", Command::Cycle)]
    #[case("  UP ", Command::Up)]
    #[case("d", Command::Down)]
    #[case("hold 3", Command::Hold(2))]
    #[case("Release 0", Command::Release(0))]
    #[case(
        "tap 1 u 3",
        Command::Tap(vec![TapTarget::Button(0), TapTarget::Up, TapTarget::Button(2)])
    )]
    fn parses(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>(), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("press 1")]
    #[case("cycle now")]
    #[case("hold")]
    #[case("hold 4")]
    #[case("hold 1 2")]
    #[case("release 10")]
    #[case("release x")]
    #[case("tap")]
    #[case("tap 1 left")]
    #[case("tap 0")]
    #[case("tap +1")]
    #[case("tap 01")]
    #[case("tap 2 +3")]
    fn rejects_malformed(#[case] line: &str) {
        assert!(line.parse::<Command>().is_err());
    }

    #[test]
    fn malformed_commands_are_silent() {
        let (mut module, mut host, mut scheduler) = setup(vec![Panel::full([RED_TAP; 3])]);
        host.take_signals();
        scheduler.submit("tap 1 4");
        scheduler.submit("dance");
        let responses = run(&mut module, &mut host, &mut scheduler);
        assert!(responses.is_empty());
        assert!(host.signals().is_empty());
    }

    #[test]
    fn second_hold_is_rejected_naming_the_first() {
        let (mut module, mut host, mut scheduler) = setup(vec![Panel::full([RED_TAP; 3])]);
        scheduler.submit("hold 2");
        scheduler.submit("hold 1");
        let responses = run(&mut module, &mut host, &mut scheduler);
        assert_eq!(
            responses,
            vec!["sendtochaterror you can not hold button 1 until button 2 is released"]
        );
        assert_eq!(module.held_button(), Some(1));
        assert_eq!(scheduler.interpreter().held(), Some(1));
    }

    #[rstest]
    #[case("cycle", "you can not cycle the panels until button 3 is released")]
    #[case("up", "you can not move to the previous panel until button 3 is released")]
    #[case("down", "you can not move to the next panel until button 3 is released")]
    #[case("tap 1", "you can not tap any buttons or change panels until button 3 is released")]
    fn busy_rejections(#[case] line: &str, #[case] message: &str) {
        let (mut module, mut host, mut scheduler) = setup(vec![Panel::full([RED_TAP; 3])]);
        scheduler.submit("hold 3");
        scheduler.submit(line);
        let responses = run(&mut module, &mut host, &mut scheduler);
        assert_eq!(responses, vec![format!("sendtochaterror {message}")]);
    }

    #[test]
    fn release_without_hold_is_rejected() {
        let (mut module, mut host, mut scheduler) = setup(vec![Panel::full([RED_TAP; 3])]);
        scheduler.submit("release 4");
        let responses = run(&mut module, &mut host, &mut scheduler);
        assert_eq!(
            responses,
            vec!["sendtochaterror you are not currently holding any buttons."]
        );
    }

    #[test]
    fn release_waits_for_the_digit() {
        let (mut module, mut host, mut scheduler) =
            setup(vec![Panel::new([Some(BLUE_HOLD), None, None])]);
        host.set_countdown("01:12");
        scheduler.submit("hold 1");
        scheduler.submit("release 5");

        let readings = ["01:12", "01:11", "01:10", "01:09", "01:08", "01:07", "01:06", "01:05"];
        for reading in readings {
            host.set_countdown(reading);
            scheduler.tick(&mut module, &mut host);
            if reading.contains('5') {
                assert_eq!(module.held_button(), None, "release fires as soon as a 5 shows");
            } else {
                assert_eq!(module.held_button(), Some(0), "released early at {reading}");
            }
            host.advance(Duration::from_millis(100));
        }
        // yellow feedback wants a 3, which "01:05" lacks
        assert_eq!(host.strikes(), 1);
    }

    #[test]
    fn hold_and_release_on_the_feedback_digit_succeeds() {
        let (mut module, mut host, mut scheduler) =
            setup(vec![Panel::new([Some(BLUE_HOLD), None, None])]);
        host.set_countdown("02:00");
        scheduler.submit("hold 1");
        run(&mut module, &mut host, &mut scheduler);
        // let the hold pass its threshold
        for _ in 0..10 {
            host.advance(TICK);
            scheduler.tick(&mut module, &mut host);
        }
        assert_eq!(module.hold_feedback().map(|f| f.digit), Some(3));
        scheduler.submit("release 3");
        scheduler.tick(&mut module, &mut host);
        host.set_countdown("01:53");
        run(&mut module, &mut host, &mut scheduler);
        assert_eq!(host.strikes(), 0);
        assert!(module.is_satisfied(0, 0));
    }

    #[test]
    fn tap_then_down_advances() {
        let (mut module, mut host, mut scheduler) = setup(vec![
            Panel::new([Some(RED_TAP), Some(BLUE_TAP), Some(YELLOW_NONE)]),
            Panel::full([RED_TAP; 3]),
        ]);
        assert_eq!(module.required(0, 0), RequiredAction::Tap);
        assert_eq!(module.required(0, 1), RequiredAction::Tap);
        assert_eq!(module.required(0, 2), RequiredAction::None);

        scheduler.submit("tap 1 2 down");
        let responses = run(&mut module, &mut host, &mut scheduler);
        assert_eq!(
            responses,
            vec![
                "strikemessage tapping button 1",
                "strikemessage tapping button 2",
                "strikemessage attempting to move to the next panel",
            ]
        );
        assert_eq!(host.strikes(), 0);
        assert_eq!(module.current_panel(), 1);
    }

    #[test]
    fn navigation_ends_a_tap_list() {
        let (mut module, mut host, mut scheduler) = setup(vec![Panel::full([RED_TAP; 3])]);
        scheduler.submit("tap up 1 2");
        let responses = run(&mut module, &mut host, &mut scheduler);
        assert!(responses.is_empty());
        assert!(!host.signals().contains(&Signal::Strike));
        assert_eq!(module.performed(0, 0), Performed::None);
    }

    #[test]
    fn down_on_incomplete_panel_strikes() {
        let (mut module, mut host, mut scheduler) = setup(vec![
            Panel::full([RED_TAP; 3]),
            Panel::full([RED_TAP; 3]),
        ]);
        scheduler.submit("down");
        run(&mut module, &mut host, &mut scheduler);
        assert_eq!(host.strikes(), 1);
        assert_eq!(module.current_panel(), 0);
    }

    #[test]
    fn cycle_returns_to_the_starting_panel() {
        let empty = Panel::new([None; 3]);
        let (mut module, mut host, mut scheduler) = setup(vec![empty, empty, empty, empty]);
        module.advance_panel(&mut host);
        module.advance_panel(&mut host);
        assert_eq!(module.current_panel(), 2);
        host.take_signals();

        scheduler.submit("cycle");
        run(&mut module, &mut host, &mut scheduler);

        assert_eq!(module.current_panel(), 2);
        assert_eq!(host.strikes(), 0);
        let doors = host
            .signals()
            .iter()
            .filter(|s| matches!(s, Signal::Animation(Animator::Door, Phase::DoorClose)))
            .count();
        assert_eq!(doors, 4);
    }

    #[test]
    fn cycle_paces_its_advances() {
        let empty = Panel::new([None; 3]);
        let (mut module, mut host, mut scheduler) = setup(vec![empty, empty]);
        module.advance_panel(&mut host);
        let started = host.now();
        scheduler.submit("cycle");
        run(&mut module, &mut host, &mut scheduler);
        // back, wait for the door, three seconds, forward, wait for the door, one second
        assert!(host.now() - started >= CYCLE_ADVANCE_DELAY + CYCLE_FINISH_DELAY);
    }

    #[test]
    fn up_is_free() {
        let (mut module, mut host, mut scheduler) =
            setup(vec![Panel::new([None; 3]), Panel::full([RED_TAP; 3])]);
        assert!(matches!(module.advance_panel(&mut host), Outcome::Advanced { .. }));
        scheduler.submit("u");
        run(&mut module, &mut host, &mut scheduler);
        assert_eq!(module.current_panel(), 0);
        assert_eq!(host.strikes(), 0);
    }
}
