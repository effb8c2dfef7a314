//! A deterministic in-memory [`Host`].
//!
//! Time only moves when told to. Every outbound signal is recorded so tests can assert on
//! exactly what the module asked the outside world to do.

use std::{collections::HashMap, time::Duration};

use crate::{
    host::{Animator, Host, Indicator, Phase, Sound},
    panel::Panel,
};

/// How long the door stays in `DoorClose` before reporting `DoorOpen`.
pub const DOOR_CLOSE_TIME: Duration = Duration::from_millis(500);

/// How long the door reports `DoorOpen` before coming to rest in `OpenIdle`.
pub const DOOR_OPEN_TIME: Duration = Duration::from_millis(500);

/// Length of the activation animation.
pub const BEGIN_TIME: Duration = Duration::from_secs(1);

/// Something the module asked the host to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Strike,
    Solved,
    Animation(Animator, Phase),
    Sound(Sound),
    Indicator {
        panel: usize,
        slot: usize,
        indicator: Indicator,
    },
    StageProgress {
        panel: usize,
        lit: bool,
    },
    ShowButtons {
        panel: usize,
    },
}

#[derive(Debug, Clone)]
enum Countdown {
    Fixed(String),
    /// Counts down from `from` as simulated time advances.
    Running { from: Duration },
}

#[derive(Debug, Clone)]
pub struct SimHost {
    now: Duration,
    countdown: Countdown,
    door: (Phase, Duration),
    animations: HashMap<Animator, Phase>,
    signals: Vec<Signal>,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    /// A host at time zero with the door at rest and the countdown frozen at `05:00`.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            countdown: Countdown::Fixed("05:00".into()),
            door: (Phase::OpenIdle, Duration::ZERO),
            animations: HashMap::new(),
            signals: Vec::new(),
        }
    }

    /// Freeze the countdown at this reading.
    pub fn set_countdown(&mut self, formatted: impl Into<String>) {
        self.countdown = Countdown::Fixed(formatted.into());
    }

    /// Let the countdown run down from `from`, starting now.
    pub fn start_countdown(&mut self, from: Duration) {
        self.countdown = Countdown::Running {
            from: from + self.now,
        };
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn take_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    pub fn strikes(&self) -> usize {
        self.signals.iter().filter(|s| **s == Signal::Strike).count()
    }

    pub fn is_solved(&self) -> bool {
        self.signals.contains(&Signal::Solved)
    }

    /// The phase the door is showing right now.
    pub fn door_phase(&self) -> Phase {
        let (phase, started) = self.door;
        let elapsed = self.now.saturating_sub(started);
        match phase {
            Phase::DoorClose if elapsed < DOOR_CLOSE_TIME => Phase::DoorClose,
            Phase::DoorClose if elapsed < DOOR_CLOSE_TIME + DOOR_OPEN_TIME => Phase::DoorOpen,
            Phase::DoorClose => Phase::OpenIdle,
            Phase::Begin if elapsed < BEGIN_TIME => Phase::Begin,
            Phase::Begin => Phase::OpenIdle,
            other => other,
        }
    }
}

impl Host for SimHost {
    fn now(&self) -> Duration {
        self.now
    }

    fn countdown(&self) -> String {
        match &self.countdown {
            Countdown::Fixed(formatted) => formatted.clone(),
            Countdown::Running { from } => {
                let remaining = from.saturating_sub(self.now).as_secs();
                format!("{:02}:{:02}", remaining / 60, remaining % 60)
            }
        }
    }

    fn strike(&mut self) {
        self.signals.push(Signal::Strike);
    }

    fn solved(&mut self) {
        self.signals.push(Signal::Solved);
    }

    fn play_animation(&mut self, animator: Animator, phase: Phase) {
        match animator {
            Animator::Door => self.door = (phase, self.now),
            Animator::Button(_) => {
                self.animations.insert(animator, phase);
            }
        }
        self.signals.push(Signal::Animation(animator, phase));
    }

    fn is_animation_active(&self, animator: Animator, phase: Phase) -> bool {
        match animator {
            Animator::Door => self.door_phase() == phase,
            Animator::Button(_) => self.animations.get(&animator) == Some(&phase),
        }
    }

    fn play_sound(&mut self, sound: Sound) {
        self.signals.push(Signal::Sound(sound));
    }

    fn set_indicator(&mut self, panel: usize, slot: usize, indicator: Indicator) {
        self.signals.push(Signal::Indicator {
            panel,
            slot,
            indicator,
        });
    }

    fn set_stage_progress(&mut self, panel: usize, lit: bool) {
        self.signals.push(Signal::StageProgress { panel, lit });
    }

    fn show_buttons(&mut self, index: usize, _panel: &Panel) {
        self.signals.push(Signal::ShowButtons { panel: index });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_walks_through_its_phases() {
        let mut host = SimHost::new();
        host.play_animation(Animator::Door, Phase::DoorClose);
        assert_eq!(host.door_phase(), Phase::DoorClose);
        host.advance(DOOR_CLOSE_TIME);
        assert!(host.is_animation_active(Animator::Door, Phase::DoorOpen));
        host.advance(DOOR_OPEN_TIME);
        assert!(host.is_animation_active(Animator::Door, Phase::OpenIdle));
    }

    #[test]
    fn running_countdown_formats_minutes_and_seconds() {
        let mut host = SimHost::new();
        host.start_countdown(Duration::from_secs(125));
        assert_eq!(host.countdown(), "02:05");
        host.advance(Duration::from_millis(5_500));
        assert_eq!(host.countdown(), "01:59");
    }
}
