//! Per-camera rotation correction.
//!
//! The body cameras are mounted at different roll angles; these corrections
//! bring each one upright for display. Angles follow the usual convention:
//! positive is counter-clockwise.

use image::DynamicImage;
use tracing::warn;

pub const BACK_FISHEYE: &str = "back_fisheye_image";
pub const FRONTLEFT_FISHEYE: &str = "frontleft_fisheye_image";
pub const FRONTRIGHT_FISHEYE: &str = "frontright_fisheye_image";
pub const LEFT_FISHEYE: &str = "left_fisheye_image";
pub const RIGHT_FISHEYE: &str = "right_fisheye_image";

/// Source name -> correction angle in degrees.
const SOURCE_ROTATIONS: &[(&str, i32)] = &[
    (BACK_FISHEYE, 0),
    (FRONTLEFT_FISHEYE, -90),
    (FRONTRIGHT_FISHEYE, -90),
    (LEFT_FISHEYE, 0),
    (RIGHT_FISHEYE, 180),
];

/// Right-angle rotation, applied losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    /// +90°
    CounterClockwise,
    /// 180°
    Half,
    /// -90°
    Clockwise,
}

impl Rotation {
    /// Only multiples of 90° are representable.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::CounterClockwise),
            180 => Some(Rotation::Half),
            270 => Some(Rotation::Clockwise),
            _ => None,
        }
    }

    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Rotation::None => image,
            Rotation::CounterClockwise => image.rotate270(),
            Rotation::Half => image.rotate180(),
            Rotation::Clockwise => image.rotate90(),
        }
    }
}

/// Correction for a known camera source.
pub fn rotation_for(source: &str) -> Option<Rotation> {
    SOURCE_ROTATIONS
        .iter()
        .find(|(name, _)| *name == source)
        .and_then(|&(_, degrees)| Rotation::from_degrees(degrees))
}

/// Correction for any source; unknown sources are left as-is with a warning.
pub fn rotation_or_warn(source: &str) -> Rotation {
    rotation_for(source).unwrap_or_else(|| {
        warn!("No rotation defined for source {}", source);
        Rotation::None
    })
}
