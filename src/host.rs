//! The narrow surface between the puzzle logic and whatever renders it.
//!
//! The module never draws, animates or plays audio itself. It emits signals through
//! [`Host`] and asks it two questions: what time is it, and what does the countdown read.

use std::time::Duration;

use crate::{oracle::FeedbackColor, panel::Panel};

/// An interactive control on the module face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// One of the panel buttons, zero-based.
    Button(usize),
    /// Advance to the next panel.
    Next,
    /// Go back to the previous panel.
    Prev,
}

/// Something that can play animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animator {
    Door,
    Button(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Begin,
    DoorClose,
    DoorOpen,
    /// The door is open and at rest.
    OpenIdle,
    HideButtons,
    ButtonDown,
    ButtonUp,
    Solve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    ButtonPress,
    ButtonRelease,
    BigButtonPress,
    BigButtonRelease,
    WireSequenceMechanism,
}

/// The light above a button slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// The slot is empty.
    Off,
    #[default]
    Unresolved,
    Incorrect,
    Correct,
    /// A hold is in progress and showing its feedback color.
    Feedback(FeedbackColor),
}

/// Outbound signals and the queries the module needs answered.
pub trait Host {
    /// Monotonic time since some fixed origin.
    fn now(&self) -> Duration;

    /// The bomb countdown as formatted for display, e.g. `"04:32"`.
    fn countdown(&self) -> String;

    fn strike(&mut self);

    fn solved(&mut self);

    fn play_animation(&mut self, animator: Animator, phase: Phase);

    fn is_animation_active(&self, animator: Animator, phase: Phase) -> bool;

    fn play_sound(&mut self, sound: Sound);

    fn set_indicator(&mut self, panel: usize, slot: usize, indicator: Indicator);

    fn set_stage_progress(&mut self, panel: usize, lit: bool);

    /// Display the buttons of `panel` (index `index`) on the module face.
    fn show_buttons(&mut self, index: usize, panel: &Panel);
}
