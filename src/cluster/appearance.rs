//! Deterministic color and shape for each output group
//!
//! Groups are colored by stepping around the hue wheel. Once every hue has
//! been used the shape changes, so the first `HUE_COUNT * SHAPES.len()`
//! groups of a partition all look different.

use serde::{Deserialize, Serialize};

/// Maximum number of distinct hues before shapes start cycling
pub const HUE_COUNT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Disk,
    SolidSquare,
    SolidDiamond,
    SolidTriangle,
    Circle,
    Square,
    Diamond,
    Triangle,
}

pub const SHAPES: [Shape; 8] = [
    Shape::Disk,
    Shape::SolidSquare,
    Shape::SolidDiamond,
    Shape::SolidTriangle,
    Shape::Circle,
    Shape::Square,
    Shape::Diamond,
    Shape::Triangle,
];

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Disk => "Disk",
            Shape::SolidSquare => "Solid Square",
            Shape::SolidDiamond => "Solid Diamond",
            Shape::SolidTriangle => "Solid Triangle",
            Shape::Circle => "Circle",
            Shape::Square => "Square",
            Shape::Diamond => "Diamond",
            Shape::Triangle => "Triangle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Fully saturated color at the given hue (degrees)
    pub fn from_hue(hue: f64) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let x = 1.0 - ((h % 2.0) - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        let channel = |v: f64| (v * 255.0).round() as u8;
        Self {
            r: channel(r),
            g: channel(g),
            b: channel(b),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Visual attributes of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Appearance {
    pub color: Color,
    pub shape: Shape,
}

/// Appearance of group `index` among `total` groups.
///
/// Small partitions spread their hues evenly over the wheel; larger ones use
/// `HUE_COUNT` hues and move on to the next shape after each full turn.
pub fn appearance(index: usize, total: usize) -> Appearance {
    let hues = total.clamp(1, HUE_COUNT);
    let hue = (index % hues) as f64 * 360.0 / hues as f64;
    let shape = SHAPES[(index / hues) % SHAPES.len()];
    Appearance {
        color: Color::from_hue(hue),
        shape,
    }
}
