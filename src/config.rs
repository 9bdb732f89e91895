use crate::Scalar;

/// Miter limit used for the antialiasing fringe of fills
pub const FILL_MITER_LIMIT: Scalar = 2.4;

/// Tolerances controlling tessellation quality
///
/// All values are in device units (pixels), see [`TessellationConfig::from_pixel_ratio`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TessellationConfig {
    /// Maximum distance between a curve and its flattened polyline
    pub tess_tol: Scalar,
    /// Points closer than this distance are merged
    pub dist_tol: Scalar,
    /// Width of the antialiasing fringe, zero disables antialiasing
    pub fringe_width: Scalar,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            tess_tol: 0.25,
            dist_tol: 0.01,
            fringe_width: 1.0,
        }
    }
}

impl TessellationConfig {
    /// Configuration for a surface with `ratio` device pixels per logical unit
    pub fn from_pixel_ratio(ratio: Scalar) -> Self {
        let ratio = if ratio > 0.0 && ratio.is_finite() {
            ratio
        } else {
            1.0
        };
        Self {
            tess_tol: 0.25 / ratio,
            dist_tol: 0.01 / ratio,
            fringe_width: 1.0 / ratio,
        }
    }

    /// Same configuration with antialiasing disabled
    pub fn without_antialiasing(self) -> Self {
        Self {
            fringe_width: 0.0,
            ..self
        }
    }
}
