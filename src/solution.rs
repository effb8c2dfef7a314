use std::fmt;

use crate::{
    button::{ButtonSpec, Color},
    config::SLOTS,
    grid::Grid,
    panel::Panels,
    rules::rule_for,
};

/// The hidden correct handling of a button slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RequiredAction {
    /// Leave the button alone.
    #[default]
    None,
    /// Press and release before the hold threshold.
    Tap,
    /// Hold past the threshold, release while the countdown shows the assigned digit.
    Hold,
}

impl RequiredAction {
    /// Map a rule score (matching label + matching shape) to an action.
    fn from_score(score: u8) -> Self {
        match score {
            0 => RequiredAction::None,
            1 => RequiredAction::Tap,
            _ => RequiredAction::Hold,
        }
    }
}

impl fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequiredAction::None => "DO NOTHING",
            RequiredAction::Tap => "PRESS",
            RequiredAction::Hold => "HOLD",
        })
    }
}

/// Running per-color count of the buttons seen so far.
///
/// Owned by a single derivation pass; never shared between puzzles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccurrenceCounter([usize; 4]);

impl OccurrenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more button of `color`, returning its 1-based occurrence number.
    pub fn record(&mut self, color: Color) -> usize {
        let count = &mut self.0[color.index()];
        *count += 1;
        *count
    }

    pub fn count(&self, color: Color) -> usize {
        self.0[color.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

/// How the required action of one non-empty slot was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derivation {
    pub panel: usize,
    pub slot: usize,
    pub button: ButtonSpec,
    pub occurrence: usize,
    pub action: RequiredAction,
}

/// The required action for every slot of a puzzle, derived once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    actions: Grid<RequiredAction, SLOTS>,
    derivations: Vec<Derivation>,
    occurrences: OccurrenceCounter,
}

impl Solution {
    /// Derive the solution for `panels`.
    ///
    /// Buttons are visited panel by panel, left to right. Each non-empty slot bumps its
    /// color's occurrence count exactly once, and the rule for that occurrence decides the
    /// action: one point for a matching label, one for a matching shape. Empty slots
    /// require nothing and are not counted.
    pub fn derive(panels: &Panels) -> Self {
        let mut actions = Grid::new(panels.len());
        let mut derivations = Vec::new();
        let mut occurrences = OccurrenceCounter::new();

        for (panel_idx, panel) in panels.iter().enumerate() {
            for (slot, button) in panel.slots().enumerate() {
                let Some(&button) = button else {
                    continue;
                };
                let occurrence = occurrences.record(button.color);
                let rule = rule_for(button.color, occurrence);
                let score =
                    u8::from(button.label == rule.label) + u8::from(button.shape == rule.shape);
                let action = RequiredAction::from_score(score);

                actions[(panel_idx, slot)] = action;
                derivations.push(Derivation {
                    panel: panel_idx,
                    slot,
                    button,
                    occurrence,
                    action,
                });
            }
        }

        Self {
            actions,
            derivations,
            occurrences,
        }
    }

    pub fn panel_count(&self) -> usize {
        self.actions.rows()
    }

    /// The required action at `(panel, slot)`. Out-of-range slots require nothing.
    pub fn required(&self, panel: usize, slot: usize) -> RequiredAction {
        self.actions.get(panel, slot).copied().unwrap_or_default()
    }

    pub fn panel(&self, panel: usize) -> &[RequiredAction] {
        self.actions.row(panel)
    }

    /// One entry per non-empty slot, in derivation order.
    pub fn derivations(&self) -> &[Derivation] {
        &self.derivations
    }

    /// Final per-color occurrence counts.
    pub fn occurrences(&self) -> &OccurrenceCounter {
        &self.occurrences
    }
}
