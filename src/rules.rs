use crate::{
    button::{
        Color,
        Label::{self, *},
        Shape::{self, *},
    },
    config::RULE_ROWS,
};

/// The label and shape a button must carry to "count" for its occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub label: Label,
    pub shape: Shape,
}

const fn rule(label: Label, shape: Shape) -> Rule {
    Rule { label, shape }
}

/// Rows indexed by `Color::index`, columns by occurrence modulo [`RULE_ROWS`].
const TABLE: [[Rule; RULE_ROWS]; 4] = [
    // red
    [
        rule(Abort, Square),
        rule(Detonate, Hexagon),
        rule(Hold, Circle),
        rule(Abort, Circle),
        rule(Press, Square),
    ],
    // blue
    [
        rule(Hold, Circle),
        rule(Abort, Square),
        rule(Detonate, Hexagon),
        rule(Press, Square),
        rule(Press, Hexagon),
    ],
    // yellow
    [
        rule(Detonate, Circle),
        rule(Hold, Hexagon),
        rule(Abort, Square),
        rule(Press, Circle),
        rule(Hold, Hexagon),
    ],
    // white
    [
        rule(Hold, Hexagon),
        rule(Detonate, Square),
        rule(Press, Hexagon),
        rule(Abort, Circle),
        rule(Detonate, Square),
    ],
];

/// Look up the rule for the `occurrence`th button of `color` seen so far.
///
/// `occurrence` is 1-based: the first red button uses red's first row. Rows wrap every
/// [`RULE_ROWS`] occurrences.
pub fn rule_for(color: Color, occurrence: usize) -> Rule {
    debug_assert!(occurrence > 0, "occurrences are counted from 1");
    TABLE[color.index()][occurrence.saturating_sub(1) % RULE_ROWS]
}
