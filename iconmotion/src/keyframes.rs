//! Keyframe tracks for the catalog animations that are easier to describe as a table of stops
//! than as a formula (tada, heartbeat, swing).

use crate::ease::{clamp, remap};

/// A value at a position within progress [0, 1]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub at: f64,
    pub value: f64,
}

/// Keyframes sorted by position. Positions must be unique and there is always at least one.
///
/// Progress between two keyframes linearly interpolates; before the first or after the last
/// the nearest keyframe holds.
#[derive(Clone, Debug)]
pub struct Track(Vec<Keyframe>);

impl Track {
    /// Build from a static table of (position, value) pairs.
    ///
    /// Tables are authored in this crate so malformed ones are a programming error.
    pub(crate) fn from_table(table: &[(f64, f64)]) -> Self {
        assert!(!table.is_empty(), "A track needs at least one keyframe");
        let mut keyframes: Vec<_> = table
            .iter()
            .map(|(at, value)| Keyframe {
                at: *at,
                value: *value,
            })
            .collect();
        keyframes.sort_by(|a, b| a.at.total_cmp(&b.at));
        for window in keyframes.windows(2) {
            assert!(
                window[0].at != window[1].at,
                "Multiple values for position {}",
                window[0].at
            );
        }
        Self(keyframes)
    }

    pub fn sample(&self, progress: f64) -> f64 {
        let first = self.0[0];
        if progress <= first.at {
            return first.value;
        }
        for window in self.0.windows(2) {
            let (k0, k1) = (window[0], window[1]);
            if progress <= k1.at {
                let t = clamp(remap(progress, k0.at, k1.at, 0.0, 1.0), 0.0, 1.0);
                return k0.value + (k1.value - k0.value) * t;
            }
        }
        self.0[self.0.len() - 1].value
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyframe> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_animated(&self) -> bool {
        self.len() > 1
    }
}
