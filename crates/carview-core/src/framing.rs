//! Bounding volumes, model placement and camera framing
//!
//! Y is up. A placed model sits centered on the X/Z origin with its lowest point
//! on the ground plane (y = 0).

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Smallest box containing all points, `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Eight corners, used to transform a box into another space
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds after a uniform scale about the origin
    pub fn scaled(&self, scale: f32) -> Bounds {
        Bounds::new(self.min * scale, self.max * scale)
    }

    /// Translation that centers the box on X/Z and rests it on y = 0
    pub fn grounding_offset(&self) -> Vec3 {
        let center = self.center();
        Vec3::new(-center.x, -self.min.y, -center.z)
    }
}

/// How the camera is placed once the model bounds are known
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FramingMode {
    /// Fit the whole model into the field of view
    Fit {
        #[serde(default = "default_fit_padding")]
        padding: f32,
    },
    /// Fixed camera at `max_dim * factor` up and back, with absolute orbit limits
    Fixed {
        #[serde(default = "default_fixed_factor")]
        factor: f32,
        #[serde(default = "default_fixed_min_distance")]
        min_distance: f32,
        #[serde(default = "default_fixed_max_distance")]
        max_distance: f32,
    },
}

fn default_fit_padding() -> f32 {
    1.4
}

fn default_fixed_factor() -> f32 {
    15.0
}

fn default_fixed_min_distance() -> f32 {
    5.0
}

fn default_fixed_max_distance() -> f32 {
    1500.0
}

impl Default for FramingMode {
    fn default() -> Self {
        FramingMode::Fit {
            padding: default_fit_padding(),
        }
    }
}

/// Camera placement and orbit limits derived from the model bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFraming {
    pub position: Vec3,
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits measured from +Y, in radians
    pub min_polar: f32,
    pub max_polar: f32,
    pub allow_pan: bool,
    /// Fraction of the remaining motion applied per 60 Hz frame
    pub damping: f32,
}

impl CameraFraming {
    /// Frame a placed model (grounded, centered) for a vertical field of view
    pub fn fit(bounds: &Bounds, fov_y: f32, padding: f32) -> Self {
        let size = bounds.size();
        let max_dim = size.max_element();
        let camera_z = (max_dim / 2.0 / (fov_y / 2.0).tan()).abs() * padding;

        Self {
            position: Vec3::new(0.0, (size.y * 0.6).max(max_dim * 0.4), camera_z),
            target: Vec3::new(0.0, size.y / 2.0, 0.0),
            min_distance: (max_dim * 0.08).max(0.2),
            max_distance: (max_dim * 12.0).max(camera_z * 4.0),
            min_polar: 0.0,
            max_polar: PI,
            allow_pan: true,
            damping: 0.07,
        }
    }

    /// Fixed framing with absolute orbit limits and restricted polar angle
    pub fn fixed(bounds: &Bounds, factor: f32, min_distance: f32, max_distance: f32) -> Self {
        let size = bounds.size();
        let max_dim = size.max_element();

        Self {
            position: Vec3::new(0.0, max_dim * factor, max_dim * factor),
            target: Vec3::new(0.0, size.y / 2.0, 0.0),
            min_distance,
            max_distance,
            min_polar: PI / 20.0,
            max_polar: PI / 1.05,
            allow_pan: false,
            damping: 0.05,
        }
    }

    pub fn for_mode(mode: FramingMode, bounds: &Bounds, fov_y: f32) -> Self {
        match mode {
            FramingMode::Fit { padding } => Self::fit(bounds, fov_y, padding),
            FramingMode::Fixed {
                factor,
                min_distance,
                max_distance,
            } => Self::fixed(bounds, factor, min_distance, max_distance),
        }
    }

    /// Distance from the camera to its orbit target, clamped to the orbit limits
    pub fn initial_distance(&self) -> f32 {
        (self.position - self.target)
            .length()
            .clamp(self.min_distance, self.max_distance)
    }
}

/// Where a loaded model goes and how the camera frames it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Translation applied to the scaled model root
    pub translation: Vec3,
    /// Bounds of the scaled model after translation
    pub placed: Bounds,
    pub framing: CameraFraming,
}

impl Placement {
    /// Ground a model scaled uniformly about its origin and frame it.
    ///
    /// Fixed framing measures the unscaled asset, so its camera distance and
    /// target height do not grow with the model scale.
    pub fn new(bounds: &Bounds, scale: f32, mode: FramingMode, fov_y: f32) -> Self {
        let scaled = bounds.scaled(scale);
        let translation = scaled.grounding_offset();
        let placed = Bounds::new(scaled.min + translation, scaled.max + translation);
        let framing = match mode {
            FramingMode::Fit { .. } => CameraFraming::for_mode(mode, &placed, fov_y),
            FramingMode::Fixed { .. } => CameraFraming::for_mode(mode, bounds, fov_y),
        };
        Self {
            translation,
            placed,
            framing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car_bounds() -> Bounds {
        Bounds::new(Vec3::new(-1.0, 0.25, -2.0), Vec3::new(1.0, 1.75, 2.5))
    }

    #[test]
    fn test_bounds_basics() {
        let b = car_bounds();
        assert_eq!(b.size(), Vec3::new(2.0, 1.5, 4.5));
        assert_eq!(b.center(), Vec3::new(0.0, 1.0, 0.25));
        assert_eq!(b.max_dimension(), 4.5);

        let swapped = Bounds::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(swapped.min, Vec3::ZERO);
        assert_eq!(swapped.max, Vec3::ONE);

        assert!(Bounds::from_points(std::iter::empty()).is_none());
        let from_corners = Bounds::from_points(b.corners()).unwrap();
        assert_eq!(from_corners, b);
    }

    #[test]
    fn test_grounding_offset() {
        let b = car_bounds();
        let offset = b.grounding_offset();
        assert_eq!(offset, Vec3::new(0.0, -0.25, -0.25));

        let placed = Bounds::new(b.min + offset, b.max + offset);
        assert_eq!(placed.min.y, 0.0);
        assert_eq!(placed.center().x, 0.0);
        assert_eq!(placed.center().z, 0.0);
    }

    #[test]
    fn test_fit_framing() {
        let b = car_bounds();
        let fov = 50f32.to_radians();
        let framing = CameraFraming::fit(&b, fov, 1.4);

        let expected_z = 4.5 / 2.0 / (fov / 2.0).tan() * 1.4;
        assert!((framing.position.z - expected_z).abs() < 1e-4);
        // max(1.5 * 0.6, 4.5 * 0.4)
        assert!((framing.position.y - 1.8).abs() < 1e-6);
        assert!((framing.target.y - 0.75).abs() < 1e-6);
        assert!((framing.min_distance - 0.36).abs() < 1e-6);
        assert!((framing.max_distance - 54.0f32.max(expected_z * 4.0)).abs() < 1e-4);
        assert!(framing.allow_pan);
    }

    #[test]
    fn test_fit_framing_small_model_min_distance() {
        let tiny = Bounds::new(Vec3::ZERO, Vec3::splat(0.5));
        let framing = CameraFraming::fit(&tiny, 1.0, 1.4);
        assert_eq!(framing.min_distance, 0.2);
    }

    #[test]
    fn test_fixed_framing() {
        let b = car_bounds();
        let framing = CameraFraming::fixed(&b, 15.0, 5.0, 1500.0);
        assert_eq!(framing.position, Vec3::new(0.0, 67.5, 67.5));
        assert!(!framing.allow_pan);
        assert!((framing.min_polar - PI / 20.0).abs() < 1e-6);
        let d = framing.initial_distance();
        assert!(d >= 5.0 && d <= 1500.0);
    }

    #[test]
    fn test_placement_grounds_scaled_model() {
        let b = car_bounds();
        let placement = Placement::new(&b, 2.0, FramingMode::default(), 50f32.to_radians());
        assert_eq!(placement.placed.min.y, 0.0);
        assert_eq!(placement.placed.size(), Vec3::new(4.0, 3.0, 9.0));
        assert_eq!(placement.translation, Vec3::new(0.0, -0.5, -0.5));
        // Fit framing follows the scaled size
        assert!((placement.framing.target.y - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_placement_frames_unscaled_size() {
        let b = car_bounds();
        let mode = FramingMode::Fixed {
            factor: 15.0,
            min_distance: 5.0,
            max_distance: 1500.0,
        };
        let placement = Placement::new(&b, 2.0, mode, 50f32.to_radians());
        assert_eq!(placement.placed.size(), Vec3::new(4.0, 3.0, 9.0));
        assert_eq!(placement.framing.position, Vec3::new(0.0, 67.5, 67.5));
        assert!((placement.framing.target.y - 0.75).abs() < 1e-6);
    }
}
