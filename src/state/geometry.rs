//! Circle geometry.
//!
//! Hit testing and overlap checks for the numbered targets.

use serde::{Deserialize, Serialize};

/// Minimum gap kept between two placed circles, on top of their radii.
pub const PADDING: f64 = 10.0;

/// A numbered circular target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub x: f64,
    pub y: f64,
    pub number: u32,
    pub radius: f64,
    pub clicked: bool,
}

impl Target {
    pub fn new(x: f64, y: f64, number: u32, radius: f64) -> Self {
        Self {
            x,
            y,
            number,
            radius,
            clicked: false,
        }
    }

    /// Distance from the center to a point.
    pub fn distance_to(&self, px: f64, py: f64) -> f64 {
        (px - self.x).hypot(py - self.y)
    }

    /// Check if a point lies inside the circle (boundary included).
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        self.distance_to(px, py) <= self.radius
    }

    /// Check if two circles are closer than their radii plus [`PADDING`].
    pub fn overlaps(&self, other: &Target) -> bool {
        self.distance_to(other.x, other.y) < self.radius + other.radius + PADDING
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "x": self.x,
            "y": self.y,
            "number": self.number,
            "radius": self.radius,
            "clicked": self.clicked
        })
    }
}
