use std::fmt;

use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

/// The body color of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Blue,
    Yellow,
    White,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Yellow, Color::White];

    /// Position of this color in [`Color::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// The word printed on a button. Only its first letter is shown on the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Abort,
    Detonate,
    Hold,
    Press,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::Abort, Label::Detonate, Label::Hold, Label::Press];

    /// The letter printed on the button face.
    pub fn initial(self) -> char {
        match self {
            Label::Abort => 'A',
            Label::Detonate => 'D',
            Label::Hold => 'H',
            Label::Press => 'P',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Circle,
    Square,
    Hexagon,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Circle, Shape::Square, Shape::Hexagon];
}

/// The immutable attributes of one generated button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonSpec {
    pub color: Color,
    pub label: Label,
    pub shape: Shape,
}

impl ButtonSpec {
    pub const fn new(color: Color, label: Label, shape: Shape) -> Self {
        Self {
            color,
            label,
            shape,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::Red => "RED",
            Color::Blue => "BLUE",
            Color::Yellow => "YELLOW",
            Color::White => "WHITE",
        })
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Abort => "ABORT",
            Label::Detonate => "DETONATE",
            Label::Hold => "HOLD",
            Label::Press => "PRESS",
        })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Shape::Circle => "CIRCLE",
            Shape::Square => "SQUARE",
            Shape::Hexagon => "HEXAGON",
        })
    }
}

impl fmt::Display for ButtonSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.color, self.shape, self.label)
    }
}

impl Distribution<Color> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
        Color::ALL[rng.gen_range(0..Color::ALL.len())]
    }
}

impl Distribution<Label> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Label {
        Label::ALL[rng.gen_range(0..Label::ALL.len())]
    }
}

impl Distribution<Shape> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Shape {
        Shape::ALL[rng.gen_range(0..Shape::ALL.len())]
    }
}

impl Distribution<ButtonSpec> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ButtonSpec {
        ButtonSpec::new(rng.gen(), rng.gen(), rng.gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_index_matches_all() {
        for (idx, color) in Color::ALL.into_iter().enumerate() {
            assert_eq!(color.index(), idx);
        }
    }

    #[test]
    fn display_reads_like_the_manual() {
        let button = ButtonSpec::new(Color::Yellow, Label::Detonate, Shape::Hexagon);
        assert_eq!(button.to_string(), "YELLOW HEXAGON DETONATE");
        assert_eq!(button.label.initial(), 'D');
    }
}
