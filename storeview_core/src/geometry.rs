//! Store-space primitives: plate positions and absolute coordinates.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;
use storeview_env::{PlateId, Translation};

/// A plate address: 1-based gondola, shelf and plate indices.
///
/// Equal only when all three fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub gondola: u32,
    pub shelf: u32,
    pub plate: u32,
}

impl Position {
    pub const fn new(gondola: u32, shelf: u32, plate: u32) -> Self {
        Self { gondola, shelf, plate }
    }
}

impl From<&PlateId> for Position {
    fn from(id: &PlateId) -> Self {
        Self::new(id.gondola(), id.shelf(), id.plate())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position(gondola={}, shelf={}, plate={})",
            self.gondola, self.shelf, self.plate
        )
    }
}

/// An absolute point in store space, in meters.
///
/// Wraps [`nalgebra::Vector3<f64>`]; nested transforms accumulate through
/// [`Coordinates::translate_by`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates(pub Vector3<f64>);

impl Coordinates {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The store origin (0, 0, 0).
    pub fn origin() -> Self {
        Self(Vector3::zeros())
    }

    /// Adds the delta to each component in place.
    pub fn translate_by(&mut self, delta_x: f64, delta_y: f64, delta_z: f64) {
        self.0 += Vector3::new(delta_x, delta_y, delta_z);
    }

    /// [`Coordinates::translate_by`] with a raw record translation.
    pub fn translate(&mut self, translation: &Translation) {
        self.translate_by(translation.x, translation.y, translation.z);
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.0.z
    }
}

impl From<Translation> for Coordinates {
    fn from(t: Translation) -> Self {
        Self::new(t.x, t.y, t.z)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coordinates({:.3}, {:.3}, {:.3})", self.x(), self.y(), self.z())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_equality_needs_all_fields() {
        assert_eq!(Position::new(1, 2, 3), Position::new(1, 2, 3));
        assert_ne!(Position::new(1, 2, 3), Position::new(1, 2, 4));
        assert_ne!(Position::new(1, 2, 3), Position::new(2, 2, 3));
    }

    #[test]
    fn test_position_from_plate_id() {
        let id = PlateId::new(4, 5, 6);
        assert_eq!(Position::from(&id), Position::new(4, 5, 6));
    }

    #[test]
    fn test_translate_accumulates() {
        let mut point = Coordinates::origin();
        point.translate_by(1.0, 2.0, 3.0);
        point.translate_by(-0.5, 0.25, 0.0);

        assert_relative_eq!(point.x(), 0.5);
        assert_relative_eq!(point.y(), 2.25);
        assert_relative_eq!(point.z(), 3.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Position::new(1, 2, 3).to_string(),
            "Position(gondola=1, shelf=2, plate=3)"
        );
        assert_eq!(
            Coordinates::new(1.0, 2.5, -3.0).to_string(),
            "Coordinates(1.000, 2.500, -3.000)"
        );
    }
}
