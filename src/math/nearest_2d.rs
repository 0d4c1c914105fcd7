use std::collections::HashMap;

use spade::handles::FixedVertexHandle;
use spade::{DelaunayTriangulation, Point2 as SpadePoint2, Triangulation};
use tracing::debug;

use super::Point2;

/// Result of a nearest-neighbour query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    /// Position of the matched candidate.
    pub point: Point2,
    /// Index of the matched candidate in the input slice.
    pub index: usize,
    /// Euclidean distance from the query point.
    pub distance: f64,
}

/// Nearest-neighbour index over a set of 2D points.
///
/// Backed by a Delaunay triangulation; a greedy walk over the triangulation
/// finds the exact nearest vertex. Candidates sharing a position collapse onto
/// the first index that occupied it. Candidates that cannot be inserted (NaN or
/// out-of-range coordinates) are skipped.
pub struct NearestIndex2 {
    triangulation: DelaunayTriangulation<SpadePoint2<f64>>,
    indices: HashMap<FixedVertexHandle, usize>,
}

impl NearestIndex2 {
    /// Builds the index from candidate points.
    #[must_use]
    pub fn new(candidates: &[Point2]) -> Self {
        let mut triangulation = DelaunayTriangulation::<SpadePoint2<f64>>::new();
        let mut indices = HashMap::with_capacity(candidates.len());

        for (index, point) in candidates.iter().enumerate() {
            match triangulation.insert(SpadePoint2::new(point.x, point.y)) {
                Ok(handle) => {
                    indices.entry(handle).or_insert(index);
                }
                Err(e) => {
                    debug!(index, error = ?e, "skipping candidate point");
                }
            }
        }

        Self {
            triangulation,
            indices,
        }
    }

    /// Number of distinct positions in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if no candidate could be indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Finds the candidate nearest to `query`, or `None` if the index is empty.
    #[must_use]
    pub fn nearest(&self, query: &Point2) -> Option<NearestMatch> {
        let handle = self
            .triangulation
            .nearest_neighbor(SpadePoint2::new(query.x, query.y))?;
        let index = *self.indices.get(&handle.fix())?;
        let position = handle.position();
        let point = Point2::new(position.x, position.y);
        Some(NearestMatch {
            point,
            index,
            distance: (point - query).norm(),
        })
    }
}

/// One-shot nearest-neighbour query over `candidates`.
///
/// Returns `None` ("no match") when `candidates` is empty.
#[must_use]
pub fn nearest_feature(query: &Point2, candidates: &[Point2]) -> Option<NearestMatch> {
    if candidates.is_empty() {
        return None;
    }
    NearestIndex2::new(candidates).nearest(query)
}
