use std::{ops::RangeInclusive, time::Duration};

/// Number of button slots on every panel.
pub const SLOTS: usize = 3;

/// Number of rows per color in the rule table.
pub const RULE_ROWS: usize = 5;

/// Continuous press time after which a press counts as a hold.
///
/// A press of exactly this length is a hold.
pub const HOLD_THRESHOLD: Duration = Duration::from_millis(500);

/// Pause after every scripted action.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Pause before each forward step of a `cycle` command.
pub const CYCLE_ADVANCE_DELAY: Duration = Duration::from_secs(3);

/// Pause once a `cycle` command has returned to its starting panel.
pub const CYCLE_FINISH_DELAY: Duration = Duration::from_secs(1);

/// How long the module reports itself as animating after activation or a forward transition.
pub const TRANSITION_SETTLE: Duration = Duration::from_secs(1);

/// Parameters for generating a fresh puzzle.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Inclusive range the panel count is drawn from.
    pub panels: RangeInclusive<usize>,
    /// Probability that any single slot is left empty.
    pub absent_chance: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            panels: 4..=4,
            absent_chance: 0.0,
        }
    }
}

impl GenerationConfig {
    /// Set the panel count range.
    pub fn with_panels(mut self, panels: RangeInclusive<usize>) -> Self {
        self.panels = panels;
        self
    }

    /// Set the chance of a slot being empty.
    pub fn with_absent_chance(mut self, absent_chance: f64) -> Self {
        self.absent_chance = absent_chance;
        self
    }

    pub fn validate(&self) -> Result<(), crate::panel::Error> {
        use crate::panel::Error;

        if self.panels.is_empty() || *self.panels.start() == 0 {
            return Err(Error::InvalidRange {
                min: *self.panels.start(),
                max: *self.panels.end(),
            });
        }
        if !(0.0..=1.0).contains(&self.absent_chance) {
            return Err(Error::InvalidAbsentChance(self.absent_chance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_is_four_full_panels() {
        let config = GenerationConfig::default();
        assert_eq!(config.panels, 4..=4);
        assert_eq!(config.absent_chance, 0.0);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(0..=4, 0.0)]
    #[case(5..=3, 0.0)]
    #[case(4..=4, -0.1)]
    #[case(4..=4, 1.5)]
    fn rejects_bad_config(#[case] panels: RangeInclusive<usize>, #[case] absent_chance: f64) {
        let config = GenerationConfig::default()
            .with_panels(panels)
            .with_absent_chance(absent_chance);
        assert!(config.validate().is_err());
    }
}
