use crate::error::{OperationError, Result};
use crate::snap::SnapSettings;

/// Starting brush radius in pixels.
pub const DEFAULT_RADIUS: f64 = 25.0;
/// Smallest radius the wheel can reach.
pub const MIN_RADIUS: f64 = 5.0;
/// Radius change per wheel notch.
pub const RADIUS_STEP: f64 = 5.0;

pub const DEFAULT_PATTERN_RESOLUTION: usize = 256;
pub const MIN_PATTERN_RESOLUTION: usize = 32;
pub const MAX_PATTERN_RESOLUTION: usize = 512;

/// Where the brush footprint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternSource {
    #[default]
    Circle,
    Box,
    /// Mask rendered from another object, supplied by the host.
    Object,
    /// Mask sampled from an image, supplied by the host.
    Image,
}

impl PatternSource {
    /// Returns `true` if strokes should ask the host for a mask.
    #[must_use]
    pub fn uses_mask(self) -> bool {
        matches!(self, Self::Object | Self::Image)
    }
}

/// Parameters controlling brush selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectSettings {
    /// Initial brush radius in pixels.
    pub radius: f64,
    pub min_radius: f64,
    pub radius_step: f64,
    /// Side length of the pattern mask grid.
    pub pattern_resolution: usize,
    pub pattern_source: PatternSource,
    /// Report the snapped feature's normal and anchor with each pick.
    pub align_to_normal: bool,
    /// Forget earlier picks of the stroke on every pick.
    pub preselect: bool,
    pub snap: SnapSettings,
}

impl Default for SelectSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            min_radius: MIN_RADIUS,
            radius_step: RADIUS_STEP,
            pattern_resolution: DEFAULT_PATTERN_RESOLUTION,
            pattern_source: PatternSource::default(),
            align_to_normal: false,
            preselect: false,
            snap: SnapSettings::default(),
        }
    }
}

impl SelectSettings {
    /// Checks the settings for values a stroke cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.min_radius.is_finite() || self.min_radius <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "min_radius must be positive, got {}",
                self.min_radius
            ))
            .into());
        }
        if self.radius.is_nan() || self.radius < self.min_radius {
            return Err(OperationError::InvalidInput(format!(
                "radius must be at least {}, got {}",
                self.min_radius, self.radius
            ))
            .into());
        }
        if self.radius_step.is_nan() || self.radius_step < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "radius_step must not be negative, got {}",
                self.radius_step
            ))
            .into());
        }
        if !(MIN_PATTERN_RESOLUTION..=MAX_PATTERN_RESOLUTION).contains(&self.pattern_resolution) {
            return Err(OperationError::InvalidInput(format!(
                "pattern_resolution must be within {MIN_PATTERN_RESOLUTION}..={MAX_PATTERN_RESOLUTION}, got {}",
                self.pattern_resolution
            ))
            .into());
        }
        Ok(())
    }
}
