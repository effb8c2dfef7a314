use std::ops::Index;

use rand::Rng;

use crate::{button::ButtonSpec, config::GenerationConfig, config::SLOTS};

/// One stage of the puzzle: up to [`SLOTS`] buttons, left to right.
///
/// An empty slot is permanently inert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Panel(pub [Option<ButtonSpec>; SLOTS]);

impl Panel {
    pub fn new(slots: [Option<ButtonSpec>; SLOTS]) -> Self {
        Self(slots)
    }

    /// A panel with every slot filled.
    pub fn full(buttons: [ButtonSpec; SLOTS]) -> Self {
        Self(buttons.map(Some))
    }

    pub fn get(&self, slot: usize) -> Option<&ButtonSpec> {
        self.0.get(slot).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> impl Iterator<Item = Option<&ButtonSpec>> {
        self.0.iter().map(Option::as_ref)
    }

    fn generate<R: Rng + ?Sized>(rng: &mut R, absent_chance: f64) -> Self {
        let mut slots = [None; SLOTS];
        for slot in slots.iter_mut() {
            // always sampled, so the stream is the same for every absent_chance
            let button: ButtonSpec = rng.gen();
            if !rng.gen_bool(absent_chance) {
                *slot = Some(button);
            }
        }
        Self(slots)
    }
}

/// The full generated panel sequence. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panels(Vec<Panel>);

impl Panels {
    pub fn new(panels: Vec<Panel>) -> Result<Self, Error> {
        if panels.is_empty() {
            return Err(Error::NoPanels);
        }
        Ok(Self(panels))
    }

    /// Generate a random panel sequence.
    pub fn generate<R>(rng: &mut R, config: &GenerationConfig) -> Result<Self, Error>
    where
        R: Rng + ?Sized,
    {
        config.validate()?;
        let count = rng.gen_range(config.panels.clone());
        let panels = (0..count)
            .map(|_| Panel::generate(rng, config.absent_chance))
            .collect();
        Self::new(panels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, panel: usize) -> Option<&Panel> {
        self.0.get(panel)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        self.0.iter()
    }

    /// The button at `(panel, slot)`, if that slot is filled.
    pub fn button(&self, panel: usize, slot: usize) -> Option<&ButtonSpec> {
        self.get(panel).and_then(|p| p.get(slot))
    }
}

impl Index<usize> for Panels {
    type Output = Panel;

    fn index(&self, panel: usize) -> &Self::Output {
        &self.0[panel]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a puzzle needs at least one panel")]
    NoPanels,
    #[error("panel count range `{min}..={max}` is empty or allows zero panels")]
    InvalidRange { min: usize, max: usize },
    #[error("absent chance must be between 0 and 1, got {0}")]
    InvalidAbsentChance(f64),
}
