//! Target placement.
//!
//! Scatters numbered circles over a rectangular safe area, retrying random
//! draws until a circle clears every previously placed one. When the retry
//! budget runs out the last draw is kept anyway and tagged as a forced
//! overlap so callers can see the degradation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use super::error::GameError;
use super::geometry::Target;

/// Rectangle that target centers are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeArea {
    #[serde(rename = "minX")]
    pub min_x: f64,
    #[serde(rename = "maxX")]
    pub max_x: f64,
    #[serde(rename = "minY")]
    pub min_y: f64,
    #[serde(rename = "maxY")]
    pub max_y: f64,
}

impl SafeArea {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Derive the playable area of a canvas, keeping clear of the header and
    /// footer bands.
    pub fn from_canvas(width: f64, height: f64, config: &EngineConfig) -> Self {
        Self {
            min_x: config.side_padding,
            max_x: width - config.side_padding,
            min_y: config.header_margin,
            max_y: height - config.footer_margin,
        }
    }

    /// Area used when the requested one cannot hold anything.
    pub fn fallback(config: &EngineConfig) -> Self {
        Self::from_canvas(
            config.default_canvas_width,
            config.default_canvas_height,
            config,
        )
    }

    /// Check if the area has positive, finite extent on both axes.
    ///
    /// Finite bounds can still be too far apart to sample between, so the
    /// extents are checked too.
    pub fn is_valid(&self) -> bool {
        let finite = [self.min_x, self.max_x, self.min_y, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.width().is_finite()
            && self.height().is_finite()
            && self.max_x > self.min_x
            && self.max_y > self.min_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        (
            rng.gen_range(self.min_x..=self.max_x),
            rng.gen_range(self.min_y..=self.max_y),
        )
    }
}

/// A generated target, tagged by whether it kept its clearance.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Clear of every earlier target
    Placed(Target),
    /// Retry budget exhausted; may overlap an earlier target
    ForcedOverlap(Target),
}

impl Placement {
    pub fn target(&self) -> &Target {
        match self {
            Self::Placed(t) | Self::ForcedOverlap(t) => t,
        }
    }

    pub fn into_target(self) -> Target {
        match self {
            Self::Placed(t) | Self::ForcedOverlap(t) => t,
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, Self::ForcedOverlap(_))
    }
}

/// Placement generator bound to a configuration.
#[derive(Debug, Clone)]
pub struct PlacementGenerator<'a> {
    config: &'a EngineConfig,
}

impl<'a> PlacementGenerator<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Resolve the area to draw from, swapping in the fallback for a
    /// degenerate request.
    pub fn effective_area(&self, requested: SafeArea) -> Result<SafeArea, GameError> {
        if requested.is_valid() {
            return Ok(requested);
        }

        let fallback = SafeArea::fallback(self.config);
        if !fallback.is_valid() {
            return Err(GameError::invalid(format!(
                "safe area {:?} is degenerate and so is the fallback {:?}",
                requested, fallback
            )));
        }

        log::debug!(
            "Safe area {:?} is degenerate, using fallback {:?}",
            requested,
            fallback
        );
        Ok(fallback)
    }

    /// Generate `count` targets numbered `1..=count` in placement order.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: u32,
        area: SafeArea,
        radius: f64,
    ) -> Result<Vec<Placement>, GameError> {
        if count == 0 {
            return Err(GameError::invalid("target count must be at least 1"));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GameError::invalid(format!("radius {} is not positive", radius)));
        }

        let area = self.effective_area(area)?;
        let attempts = self.config.max_placement_attempts.max(1);

        let mut placements: Vec<Placement> = Vec::with_capacity(count as usize);
        for number in 1..=count {
            let draw = |rng: &mut R| {
                let (x, y) = area.sample(rng);
                Target::new(x, y, number, radius)
            };
            let is_clear =
                |target: &Target| placements.iter().all(|p| !p.target().overlaps(target));

            let mut target = draw(rng);
            let mut clear = is_clear(&target);
            for _ in 1..attempts {
                if clear {
                    break;
                }
                target = draw(rng);
                clear = is_clear(&target);
            }

            if clear {
                placements.push(Placement::Placed(target));
            } else {
                log::warn!(
                    "Target {} forced into an overlapping position after {} attempts",
                    number,
                    attempts
                );
                placements.push(Placement::ForcedOverlap(target));
            }
        }

        Ok(placements)
    }
}

/// Number of forced placements in a batch.
pub fn forced_count(placements: &[Placement]) -> usize {
    placements.iter().filter(|p| p.is_forced()).count()
}
