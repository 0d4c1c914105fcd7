use crate::error::{OperationError, Result};
use crate::math::Point2;

use super::settings::{MAX_PATTERN_RESOLUTION, MIN_PATTERN_RESOLUTION};

/// Square boolean grid stretched over the brush's bounding box.
///
/// Cell `(w, h)` covers the `w`-th column from the left and the `h`-th row
/// from the bottom. Selected vertices landing on a `false` cell are dropped
/// from the pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMask {
    resolution: usize,
    cells: Vec<bool>,
}

impl PatternMask {
    /// Wraps `cells`, laid out column by column (`w * resolution + h`).
    ///
    /// # Errors
    ///
    /// Returns an error if the resolution is out of range or the cell count
    /// does not match it.
    pub fn new(resolution: usize, cells: Vec<bool>) -> Result<Self> {
        check_resolution(resolution)?;
        if cells.len() != resolution * resolution {
            return Err(OperationError::InvalidInput(format!(
                "pattern of resolution {resolution} needs {} cells, got {}",
                resolution * resolution,
                cells.len()
            ))
            .into());
        }
        Ok(Self { resolution, cells })
    }

    /// Builds a mask by evaluating `f(w, h)` for every cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolution is out of range.
    pub fn from_fn(resolution: usize, mut f: impl FnMut(usize, usize) -> bool) -> Result<Self> {
        check_resolution(resolution)?;
        let mut cells = Vec::with_capacity(resolution * resolution);
        for w in 0..resolution {
            for h in 0..resolution {
                cells.push(f(w, h));
            }
        }
        Ok(Self { resolution, cells })
    }

    /// Resamples a row-major alpha image (bottom row first) to the given
    /// resolution by nearest neighbour.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolution is out of range, the image is empty,
    /// or `alpha` does not hold `width * height` samples.
    pub fn from_alpha(resolution: usize, width: usize, height: usize, alpha: &[bool]) -> Result<Self> {
        if width == 0 || height == 0 || alpha.len() != width * height {
            return Err(OperationError::InvalidInput(format!(
                "alpha image of {width}x{height} has {} samples",
                alpha.len()
            ))
            .into());
        }
        Self::from_fn(resolution, |w, h| {
            let x = w * width / resolution;
            let y = h * height / resolution;
            alpha[y * width + x]
        })
    }

    /// Checkerboard with `squares` squares per side, aligned so a square
    /// corner sits at the brush centre.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolution is out of range.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn checker(resolution: usize, squares: usize) -> Result<Self> {
        let n = squares as f64;
        let res = resolution as f64;
        Self::from_fn(resolution, |w, h| {
            let u = (w as f64 + 0.5) / res;
            let v = (h as f64 + 0.5) / res;
            let parity = (n * (u - 0.5)).floor() as i64 + (n * (v - 0.5)).floor() as i64;
            parity.rem_euclid(2) == 0
        })
    }

    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Value of cell `(w, h)`; cells outside the grid read as `false`.
    #[must_use]
    pub fn get(&self, w: usize, h: usize) -> bool {
        if w >= self.resolution || h >= self.resolution {
            return false;
        }
        self.cells[w * self.resolution + h]
    }

    /// Cell under `point` for a brush at `center` with `radius`. Points
    /// outside the brush box clamp to the border cells.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn cell_for(&self, point: &Point2, center: &Point2, radius: f64) -> (usize, usize) {
        let span = (self.resolution - 1) as f64;
        let axis = |p: f64, c: f64| {
            let t = if radius > 0.0 {
                ((p - (c - radius)) / (2.0 * radius)).clamp(0.0, 1.0)
            } else {
                0.5
            };
            (span * t) as usize
        };
        (axis(point.x, center.x), axis(point.y, center.y))
    }

    /// Returns `true` if the mask keeps a vertex projected at `point`.
    #[must_use]
    pub fn allows(&self, point: &Point2, center: &Point2, radius: f64) -> bool {
        let (w, h) = self.cell_for(point, center, radius);
        self.get(w, h)
    }
}

fn check_resolution(resolution: usize) -> Result<()> {
    if (MIN_PATTERN_RESOLUTION..=MAX_PATTERN_RESOLUTION).contains(&resolution) {
        Ok(())
    } else {
        Err(OperationError::InvalidInput(format!(
            "pattern resolution must be within {MIN_PATTERN_RESOLUTION}..={MAX_PATTERN_RESOLUTION}, got {resolution}"
        ))
        .into())
    }
}
