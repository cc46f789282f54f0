//! Maps the backend's normalized emotion coordinate onto a label and a
//! display color.
//!
//! Quadrants are decided by sign, with zero on an axis counting as positive.
//! The exact origin and coordinates with a NaN component are neutral.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct EmotionCoordinate {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Joy,
    Calmness,
    Anger,
    Sadness,
    Neutral,
}

/// Every color the player can be themed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Palette {
    Yellow,
    Red,
    Blue,
    Green,
    Gray,
    /// Used before any emotion is known.
    #[default]
    Violet,
}

impl EmotionCoordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn emotion(&self) -> Emotion {
        let (x, y) = (self.x, self.y);
        if x.is_nan() || y.is_nan() || (x == 0.0 && y == 0.0) {
            return Emotion::Neutral;
        }
        match (x >= 0.0, y >= 0.0) {
            (true, true) => Emotion::Joy,
            (false, true) => Emotion::Anger,
            (false, false) => Emotion::Sadness,
            (true, false) => Emotion::Calmness,
        }
    }

    pub fn palette(&self) -> Palette {
        self.emotion().palette()
    }
}

impl Emotion {
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Joy => "Joy",
            Emotion::Calmness => "Calmness",
            Emotion::Anger => "Anger",
            Emotion::Sadness => "Sadness",
            Emotion::Neutral => "Neutral",
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Emotion::Joy => Palette::Yellow,
            Emotion::Calmness => Palette::Green,
            Emotion::Anger => Palette::Red,
            Emotion::Sadness => Palette::Blue,
            Emotion::Neutral => Palette::Gray,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Palette {
    pub const ALL: [Palette; 6] = [
        Palette::Yellow,
        Palette::Red,
        Palette::Blue,
        Palette::Green,
        Palette::Gray,
        Palette::Violet,
    ];

    /// Color name as used in stylesheet class names.
    pub fn name(&self) -> &'static str {
        match self {
            Palette::Yellow => "yellow",
            Palette::Red => "red",
            Palette::Blue => "blue",
            Palette::Green => "green",
            Palette::Gray => "gray",
            Palette::Violet => "violet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quadrants() {
        assert_eq!(EmotionCoordinate::new(0.4, 0.7).emotion(), Emotion::Joy);
        assert_eq!(EmotionCoordinate::new(-0.4, 0.7).emotion(), Emotion::Anger);
        assert_eq!(EmotionCoordinate::new(-0.4, -0.7).emotion(), Emotion::Sadness);
        assert_eq!(EmotionCoordinate::new(0.4, -0.7).emotion(), Emotion::Calmness);
    }

    #[test]
    fn zero_on_an_axis_counts_as_positive() {
        assert_eq!(EmotionCoordinate::new(0.0, 5.0).emotion(), Emotion::Joy);
        assert_eq!(EmotionCoordinate::new(5.0, 0.0).emotion(), Emotion::Joy);
        assert_eq!(EmotionCoordinate::new(-5.0, 0.0).emotion(), Emotion::Anger);
        assert_eq!(EmotionCoordinate::new(0.0, -5.0).emotion(), Emotion::Calmness);
        assert_eq!(EmotionCoordinate::new(-0.0, -5.0).emotion(), Emotion::Calmness);
    }

    #[test]
    fn origin_and_nan_are_neutral() {
        assert_eq!(EmotionCoordinate::new(0.0, 0.0).emotion(), Emotion::Neutral);
        assert_eq!(EmotionCoordinate::new(-0.0, 0.0).emotion(), Emotion::Neutral);
        assert_eq!(EmotionCoordinate::new(f64::NAN, 1.0).emotion(), Emotion::Neutral);
        assert_eq!(EmotionCoordinate::new(0.0, 0.0).palette(), Palette::Gray);
    }

    #[test]
    fn label_and_color_agree() {
        let c = EmotionCoordinate::new(-0.2, -0.9);
        assert_eq!(c.emotion().label(), "Sadness");
        assert_eq!(c.palette().name(), "blue");
        assert_eq!(Palette::default(), Palette::Violet);
    }

    proptest! {
        #[test]
        fn mapping_is_total_and_deterministic(x in any::<f64>(), y in any::<f64>()) {
            let c = EmotionCoordinate::new(x, y);
            let first = c.emotion();
            prop_assert_eq!(first, c.emotion());
            prop_assert!(Palette::ALL.contains(&c.palette()));
            prop_assert_eq!(c.palette(), first.palette());
        }

        #[test]
        fn label_follows_signs(x in -1.0f64..1.0, y in -1.0f64..1.0) {
            prop_assume!(!(x == 0.0 && y == 0.0));
            let expected = match (x >= 0.0, y >= 0.0) {
                (true, true) => Emotion::Joy,
                (false, true) => Emotion::Anger,
                (false, false) => Emotion::Sadness,
                (true, false) => Emotion::Calmness,
            };
            prop_assert_eq!(EmotionCoordinate::new(x, y).emotion(), expected);
        }
    }
}
