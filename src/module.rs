use std::{fmt, time::Duration};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::{
    config::{GenerationConfig, HOLD_THRESHOLD, SLOTS, TRANSITION_SETTLE},
    grid::Grid,
    host::{Animator, Control, Host, Indicator, Phase, Sound},
    oracle::{FeedbackSource, HoldFeedback, RandomFeedback},
    panel::{self, Panels},
    solution::{RequiredAction, Solution},
};

/// Identifies one module instance in logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the player has successfully done to a button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Performed {
    #[default]
    None,
    Tapped,
    Held,
}

impl Performed {
    /// `true` when this satisfies `required`.
    pub fn satisfies(self, required: RequiredAction) -> bool {
        matches!(
            (self, required),
            (Performed::None, RequiredAction::None)
                | (Performed::Tapped, RequiredAction::Tap)
                | (Performed::Held, RequiredAction::Hold)
        )
    }
}

/// A rule violation. Reported to the host; play continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Strike {
    #[error("panel {} button {} pressed/held when not needed", .panel + 1, .slot + 1)]
    NotNeeded { panel: usize, slot: usize },
    #[error("panel {} button {} pressed when already dealt with", .panel + 1, .slot + 1)]
    AlreadyResolved { panel: usize, slot: usize },
    #[error("panel {} button {} held when it shouldn't have been", .panel + 1, .slot + 1)]
    HeldInsteadOfTapped { panel: usize, slot: usize },
    #[error("panel {} button {} pressed when it should have been held", .panel + 1, .slot + 1)]
    TappedInsteadOfHeld { panel: usize, slot: usize },
    #[error(
        "panel {} button {} released at improper time. current time: {countdown}",
        .panel + 1,
        .slot + 1
    )]
    ReleasedAtWrongTime {
        panel: usize,
        slot: usize,
        countdown: String,
    },
    #[error("tried to move past panel {} without completing it", .panel + 1)]
    IncompletePanel { panel: usize },
}

impl Strike {
    pub fn panel(&self) -> usize {
        match *self {
            Strike::NotNeeded { panel, .. }
            | Strike::AlreadyResolved { panel, .. }
            | Strike::HeldInsteadOfTapped { panel, .. }
            | Strike::TappedInsteadOfHeld { panel, .. }
            | Strike::ReleasedAtWrongTime { panel, .. }
            | Strike::IncompletePanel { panel } => panel,
        }
    }

    /// The offending button, if the strike was about one.
    pub fn slot(&self) -> Option<usize> {
        match *self {
            Strike::NotNeeded { slot, .. }
            | Strike::AlreadyResolved { slot, .. }
            | Strike::HeldInsteadOfTapped { slot, .. }
            | Strike::TappedInsteadOfHeld { slot, .. }
            | Strike::ReleasedAtWrongTime { slot, .. } => Some(slot),
            Strike::IncompletePanel { .. } => None,
        }
    }
}

/// The result of feeding one event to the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event had no effect.
    Ignored,
    Pressed { slot: usize },
    Resolved { slot: usize, performed: Performed },
    Struck(Strike),
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    Solved,
}

#[derive(Debug, Clone, Copy)]
struct HoldSession {
    slot: usize,
    started: Duration,
    feedback: Option<HoldFeedback>,
    /// The indicator to restore if the hold is abandoned while showing feedback.
    prior: Indicator,
}

/// One button-sequence module: the puzzle, its solution, and the live interaction state.
#[derive(Debug)]
pub struct Module {
    id: ModuleId,
    panels: Panels,
    solution: Solution,
    performed: Grid<Performed, SLOTS>,
    indicators: Grid<Indicator, SLOTS>,
    feedback: Box<dyn FeedbackSource>,
    current: usize,
    hold: Option<HoldSession>,
    activated: bool,
    solved: bool,
    needs_refresh: bool,
    settles_at: Duration,
}

impl Module {
    /// Build a module over fixed panels. The solution is derived here, once.
    pub fn new(id: ModuleId, panels: Panels, feedback: Box<dyn FeedbackSource>) -> Self {
        let solution = Solution::derive(&panels);

        info!(module = %id, panels = panels.len(), "panel count: {}", panels.len());
        for d in solution.derivations() {
            info!(
                module = %id,
                panel = d.panel + 1,
                slot = d.slot + 1,
                "panel {} button {} ({}): occurrence #{} {}",
                d.panel + 1,
                d.slot + 1,
                d.button,
                d.occurrence,
                d.action,
            );
        }

        let indicators = Grid::from_rows(panels.iter().map(|panel| {
            panel.0.map(|slot| match slot {
                Some(_) => Indicator::Unresolved,
                None => Indicator::Off,
            })
        }));

        Self {
            id,
            performed: Grid::new(panels.len()),
            indicators,
            panels,
            solution,
            feedback,
            current: 0,
            hold: None,
            activated: false,
            solved: false,
            needs_refresh: false,
            settles_at: Duration::ZERO,
        }
    }

    /// Generate a random module. The seed determines both the panels and every hold feedback.
    pub fn generate(
        id: ModuleId,
        config: &GenerationConfig,
        seed: u64,
    ) -> Result<Self, panel::Error> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let panels = Panels::generate(&mut rng, config)?;
        let feedback = RandomFeedback(ChaCha8Rng::seed_from_u64(rng.next_u64()));
        Ok(Self::new(id, panels, Box::new(feedback)))
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn current_panel(&self) -> usize {
        self.current
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// The slot currently held down, if any.
    pub fn held_button(&self) -> Option<usize> {
        self.hold.map(|h| h.slot)
    }

    /// The feedback of the current hold, once it has passed the hold threshold.
    pub fn hold_feedback(&self) -> Option<HoldFeedback> {
        self.hold.and_then(|h| h.feedback)
    }

    pub fn required(&self, panel: usize, slot: usize) -> RequiredAction {
        self.solution.required(panel, slot)
    }

    pub fn performed(&self, panel: usize, slot: usize) -> Performed {
        self.performed.get(panel, slot).copied().unwrap_or_default()
    }

    pub fn indicator(&self, panel: usize, slot: usize) -> Indicator {
        self.indicators.get(panel, slot).copied().unwrap_or(Indicator::Off)
    }

    /// `true` when the button at `(panel, slot)` already has what it needs.
    pub fn is_satisfied(&self, panel: usize, slot: usize) -> bool {
        self.performed(panel, slot).satisfies(self.required(panel, slot))
    }

    pub fn is_panel_complete(&self, panel: usize) -> bool {
        (0..SLOTS).all(|slot| self.is_satisfied(panel, slot))
    }

    /// `true` between activation and solve.
    pub fn is_active(&self) -> bool {
        self.activated && !self.solved
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// `true` until the last activation or forward transition has settled.
    pub fn is_animating(&self, now: Duration) -> bool {
        !self.activated || now < self.settles_at
    }

    /// Bring the module to life. Inputs before this are ignored.
    pub fn activate(&mut self, host: &mut impl Host) {
        if self.activated {
            return;
        }
        self.activated = true;
        self.show_current(host);
        host.play_animation(Animator::Door, Phase::Begin);
        for slot in 0..SLOTS {
            host.play_animation(Animator::Button(slot), Phase::Begin);
        }
        self.settles_at = host.now() + TRANSITION_SETTLE;
        host.play_sound(Sound::WireSequenceMechanism);
    }

    /// The leading edge of a control.
    pub fn on_press(&mut self, control: Control, host: &mut impl Host) -> Outcome {
        match control {
            Control::Button(slot) => self.press(slot, host),
            Control::Next => {
                host.play_sound(Sound::ButtonPress);
                self.advance_panel(host)
            }
            Control::Prev => {
                host.play_sound(Sound::ButtonPress);
                self.retreat_panel(host)
            }
        }
    }

    /// The trailing edge of a control. Only buttons react; navigation release is cosmetic.
    pub fn on_release(&mut self, control: Control, host: &mut impl Host) -> Outcome {
        match control {
            Control::Button(slot) => self.release(slot, host),
            Control::Next | Control::Prev => {
                host.play_sound(Sound::ButtonRelease);
                Outcome::Ignored
            }
        }
    }

    pub fn press(&mut self, slot: usize, host: &mut impl Host) -> Outcome {
        if !self.is_active() {
            debug!(module = %self.id, slot = slot + 1, "press ignored: module inactive");
            return Outcome::Ignored;
        }
        if let Some(held) = self.held_button() {
            debug!(
                module = %self.id,
                panel = self.current + 1,
                slot = slot + 1,
                held = held + 1,
                "press ignored: another button is held"
            );
            return Outcome::Ignored;
        }
        if self.panels.button(self.current, slot).is_none() {
            debug!(
                module = %self.id,
                panel = self.current + 1,
                slot = slot + 1,
                "press ignored: empty slot"
            );
            return Outcome::Ignored;
        }

        host.play_sound(Sound::BigButtonPress);
        host.play_animation(Animator::Button(slot), Phase::ButtonDown);
        self.hold = Some(HoldSession {
            slot,
            started: host.now(),
            feedback: None,
            prior: self.indicator(self.current, slot),
        });
        Outcome::Pressed { slot }
    }

    pub fn release(&mut self, slot: usize, host: &mut impl Host) -> Outcome {
        if !self.is_active() {
            return Outcome::Ignored;
        }
        let session = match self.hold {
            Some(session) if session.slot == slot => session,
            _ => {
                debug!(
                    module = %self.id,
                    panel = self.current + 1,
                    slot = slot + 1,
                    "release ignored: button not held"
                );
                return Outcome::Ignored;
            }
        };
        // the session closes whatever the outcome
        self.hold = None;

        host.play_animation(Animator::Button(slot), Phase::ButtonUp);
        host.play_sound(Sound::BigButtonRelease);

        let panel = self.current;
        let held = host.now().saturating_sub(session.started) >= HOLD_THRESHOLD;
        let required = self.required(panel, slot);

        let result = if self.is_satisfied(panel, slot) {
            Err(match required {
                RequiredAction::None => Strike::NotNeeded { panel, slot },
                _ => Strike::AlreadyResolved { panel, slot },
            })
        } else {
            match (required, held) {
                (RequiredAction::None, _) => Err(Strike::NotNeeded { panel, slot }),
                (RequiredAction::Tap, true) => Err(Strike::HeldInsteadOfTapped { panel, slot }),
                (RequiredAction::Tap, false) => Ok(Performed::Tapped),
                (RequiredAction::Hold, false) => Err(Strike::TappedInsteadOfHeld { panel, slot }),
                (RequiredAction::Hold, true) => {
                    // past the threshold but not yet ticked: reveal now so the release is judged
                    let feedback = match session.feedback {
                        Some(feedback) => feedback,
                        None => self.reveal_feedback(slot, host),
                    };
                    let countdown = host.countdown();
                    if feedback.is_satisfied_by(&countdown) {
                        Ok(Performed::Held)
                    } else {
                        Err(Strike::ReleasedAtWrongTime {
                            panel,
                            slot,
                            countdown,
                        })
                    }
                }
            }
        };

        match result {
            Ok(performed) => {
                info!(
                    module = %self.id,
                    panel = panel + 1,
                    slot = slot + 1,
                    "panel {} button {} {} successfully",
                    panel + 1,
                    slot + 1,
                    if performed == Performed::Held { "held" } else { "pressed" },
                );
                self.performed[(panel, slot)] = performed;
                self.set_indicator(panel, slot, Indicator::Correct, host);
                Outcome::Resolved { slot, performed }
            }
            Err(strike) => {
                self.set_indicator(panel, slot, Indicator::Incorrect, host);
                self.strike(strike, host)
            }
        }
    }

    /// Move on from a completed panel, or solve the module from the last one.
    pub fn advance_panel(&mut self, host: &mut impl Host) -> Outcome {
        if !self.is_active() {
            return Outcome::Ignored;
        }
        let from = self.current;
        if !self.is_panel_complete(from) {
            return self.strike(Strike::IncompletePanel { panel: from }, host);
        }

        info!(module = %self.id, panel = from + 1, "panel {} completed successfully", from + 1);
        self.abandon_hold(host);
        self.mark_panel_correct(from, host);

        if from + 1 == self.panel_count() {
            self.solve(host);
            return Outcome::Solved;
        }

        self.close_door(host);
        self.settles_at = host.now() + TRANSITION_SETTLE;
        self.current += 1;
        for panel in 0..self.current {
            host.set_stage_progress(panel, true);
        }
        Outcome::Advanced {
            from,
            to: self.current,
        }
    }

    /// Step back one panel. Never strikes.
    pub fn retreat_panel(&mut self, host: &mut impl Host) -> Outcome {
        if !self.is_active() || self.current == 0 {
            return Outcome::Ignored;
        }
        let from = self.current;
        self.abandon_hold(host);
        self.close_door(host);
        self.current -= 1;
        Outcome::Retreated {
            from,
            to: self.current,
        }
    }

    /// Solve the module outright, whatever its state.
    pub fn force_solve(&mut self, host: &mut impl Host) -> Outcome {
        if self.solved {
            return Outcome::Ignored;
        }
        self.hold = None;
        self.solve(host);
        Outcome::Solved
    }

    /// Poll time-driven state: hold feedback and the deferred panel refresh.
    pub fn tick(&mut self, host: &mut impl Host) {
        let now = host.now();
        let due = self
            .hold
            .filter(|h| h.feedback.is_none() && now.saturating_sub(h.started) >= HOLD_THRESHOLD);
        if let Some(session) = due {
            let feedback = self.reveal_feedback(session.slot, host);
            if let Some(hold) = self.hold.as_mut() {
                hold.feedback = Some(feedback);
            }
        }

        if self.needs_refresh && host.is_animation_active(Animator::Door, Phase::DoorOpen) {
            self.show_current(host);
            self.needs_refresh = false;
        }
    }

    fn reveal_feedback(&mut self, slot: usize, host: &mut impl Host) -> HoldFeedback {
        let feedback = self.feedback.assign_feedback();
        let panel = self.current;
        if self.required(panel, slot) == RequiredAction::Hold {
            info!(
                module = %self.id,
                panel = panel + 1,
                slot = slot + 1,
                "panel {} button {} is being held. LED color: {}. release when timer contains a \"{}\"",
                panel + 1,
                slot + 1,
                feedback.color,
                feedback.digit,
            );
        } else {
            info!(
                module = %self.id,
                panel = panel + 1,
                slot = slot + 1,
                "panel {} button {} is being held. LED color: {}. however, holding was incorrect, so release will strike",
                panel + 1,
                slot + 1,
                feedback.color,
            );
        }
        self.set_indicator(panel, slot, Indicator::Feedback(feedback.color), host);
        feedback
    }

    fn abandon_hold(&mut self, host: &mut impl Host) {
        if let Some(session) = self.hold.take() {
            if session.feedback.is_some() {
                self.set_indicator(self.current, session.slot, session.prior, host);
            }
        }
    }

    fn strike(&mut self, strike: Strike, host: &mut impl Host) -> Outcome {
        warn!(
            module = %self.id,
            panel = strike.panel() + 1,
            slot = strike.slot().map(|slot| slot + 1),
            "strike: {strike}"
        );
        host.strike();
        Outcome::Struck(strike)
    }

    fn solve(&mut self, host: &mut impl Host) {
        info!(module = %self.id, "module solved");
        host.solved();
        self.mark_panel_correct(self.current, host);
        for slot in 0..SLOTS {
            host.play_animation(Animator::Button(slot), Phase::Solve);
        }
        host.play_sound(Sound::WireSequenceMechanism);
        host.play_animation(Animator::Door, Phase::Solve);
        for panel in 0..self.panel_count() {
            host.set_stage_progress(panel, true);
        }
        self.solved = true;
    }

    fn close_door(&mut self, host: &mut impl Host) {
        host.play_sound(Sound::WireSequenceMechanism);
        for slot in 0..SLOTS {
            host.play_animation(Animator::Button(slot), Phase::HideButtons);
        }
        host.play_animation(Animator::Door, Phase::DoorClose);
        self.needs_refresh = true;
    }

    fn mark_panel_correct(&mut self, panel: usize, host: &mut impl Host) {
        for slot in 0..SLOTS {
            if self.panels.button(panel, slot).is_some() {
                self.set_indicator(panel, slot, Indicator::Correct, host);
            }
        }
    }

    fn show_current(&mut self, host: &mut impl Host) {
        host.show_buttons(self.current, &self.panels[self.current]);
        for slot in 0..SLOTS {
            host.set_indicator(self.current, slot, self.indicator(self.current, slot));
        }
    }

    fn set_indicator(
        &mut self,
        panel: usize,
        slot: usize,
        indicator: Indicator,
        host: &mut impl Host,
    ) {
        if let Some(cell) = self.indicators.get_mut(panel, slot) {
            *cell = indicator;
            host.set_indicator(panel, slot, indicator);
        }
    }
}
