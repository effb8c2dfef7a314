mod button;
mod command;
mod config;
mod grid;
mod host;
mod module;
mod oracle;
mod panel;
mod rules;
mod script;
pub mod sim;
mod solution;
mod solver;

pub use button::{ButtonSpec, Color, Label, Shape};
pub use command::{Command, CommandError, Interpreter, ParseError, Rejection, TapTarget, HELP};
pub use config::{
    GenerationConfig, CYCLE_ADVANCE_DELAY, CYCLE_FINISH_DELAY, HOLD_THRESHOLD, RULE_ROWS,
    SETTLE_DELAY, SLOTS, TRANSITION_SETTLE,
};
pub use grid::Grid;
pub use host::{Animator, Control, Host, Indicator, Phase, Sound};
pub use module::{Module, ModuleId, Outcome, Performed, Strike};
pub use oracle::{
    countdown_digits, digit_matches, FeedbackColor, FeedbackSource, HoldFeedback,
    RandomFeedback, FEEDBACK_OUTCOMES,
};
pub use panel::{Error as PanelError, Panel, Panels};
pub use rules::{rule_for, Rule};
pub use script::{Response, Scheduler, Script, Step, Steps};
pub use solution::{Derivation, OccurrenceCounter, RequiredAction, Solution};
pub use solver::AutoSolver;
