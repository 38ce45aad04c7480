//! Landmark sets and their payload encoding.
//!
//! A payload is a plain run of points, each `x`, `y`, `z` as a little-endian
//! IEEE-754 `f64`. There is no count header: the point count is the payload
//! length divided by [`POINT_SIZE`]. An empty set is a zero-length payload.

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

/// Largest number of landmarks a set may carry (one full body pose).
pub const MAX_LANDMARKS: usize = 33;

/// Encoded size of one point: three `f64` coordinates.
pub const POINT_SIZE: usize = 3 * std::mem::size_of::<f64>();

/// One detected keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LandmarkPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Bitwise equality, so NaN coordinates compare equal to themselves.
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }
}

impl From<(f64, f64, f64)> for LandmarkPoint {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

/// The ordered landmarks detected in one frame.
///
/// Holds at most [`MAX_LANDMARKS`] points. Empty means no pose was detected.
/// Order follows the estimator's joint index convention.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<LandmarkPoint>", into = "Vec<LandmarkPoint>")]
pub struct LandmarkSet {
    points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    /// The empty set ("no pose detected").
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set, rejecting more than [`MAX_LANDMARKS`] points.
    pub fn new(points: Vec<LandmarkPoint>) -> Result<Self> {
        if points.len() > MAX_LANDMARKS {
            return Err(FrameError::TooManyLandmarks {
                count: points.len(),
                max: MAX_LANDMARKS,
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LandmarkPoint> {
        self.points.iter()
    }

    /// Size of this set once encoded.
    pub fn encoded_len(&self) -> usize {
        self.points.len() * POINT_SIZE
    }

    pub fn into_points(self) -> Vec<LandmarkPoint> {
        self.points
    }
}

impl TryFrom<Vec<LandmarkPoint>> for LandmarkSet {
    type Error = FrameError;

    fn try_from(points: Vec<LandmarkPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<LandmarkSet> for Vec<LandmarkPoint> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}

impl<'a> IntoIterator for &'a LandmarkSet {
    type Item = &'a LandmarkPoint;
    type IntoIter = std::slice::Iter<'a, LandmarkPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Encode a landmark set into its payload bytes.
pub fn encode_landmarks(set: &LandmarkSet) -> Vec<u8> {
    let mut out = Vec::with_capacity(set.encoded_len());
    for point in set {
        out.extend_from_slice(&point.x.to_le_bytes());
        out.extend_from_slice(&point.y.to_le_bytes());
        out.extend_from_slice(&point.z.to_le_bytes());
    }
    out
}

/// Decode a payload produced by [`encode_landmarks`].
///
/// A length that is not a whole number of points, or that holds more than
/// [`MAX_LANDMARKS`] points, is `FrameError::MalformedPayload`.
pub fn decode_landmarks(payload: &[u8]) -> Result<LandmarkSet> {
    if payload.len() % POINT_SIZE != 0 {
        return Err(FrameError::MalformedPayload {
            len: payload.len(),
            reason: format!(
                "length is not a multiple of {POINT_SIZE} ({} trailing bytes)",
                payload.len() % POINT_SIZE
            ),
        });
    }

    let count = payload.len() / POINT_SIZE;
    if count > MAX_LANDMARKS {
        return Err(FrameError::MalformedPayload {
            len: payload.len(),
            reason: format!("{count} points exceeds the maximum of {MAX_LANDMARKS}"),
        });
    }

    let points = payload
        .chunks_exact(POINT_SIZE)
        .map(|chunk| LandmarkPoint {
            x: read_f64(&chunk[0..8]),
            y: read_f64(&chunk[8..16]),
            z: read_f64(&chunk[16..24]),
        })
        .collect();

    Ok(LandmarkSet { points })
}

fn read_f64(bytes: &[u8]) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    f64::from_le_bytes(raw)
}
