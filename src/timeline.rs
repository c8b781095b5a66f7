// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Ordered per-frame landmark records.

use crate::error::{ReplayError, Result};
use crate::record::FrameRecord;

/// Append-only sequence of [`FrameRecord`]s in temporal order.
///
/// Built once during extraction and only read during replay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    records: Vec<FrameRecord>,
}

impl Timeline {
    /// Create an empty timeline.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Create an empty timeline with room for `capacity` frames.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    /// Append a record as the newest frame.
    pub fn push(&mut self, record: FrameRecord) {
        self.records.push(record);
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no frames were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a frame record by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FrameRecord> {
        self.records.get(index)
    }

    /// Get a frame record by index, failing if it was never recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::FrameOutOfRange`] if `index >= len()`.
    pub fn frame(&self, index: usize) -> Result<&FrameRecord> {
        self.records.get(index).ok_or(ReplayError::FrameOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// The most recent record.
    #[must_use]
    pub fn last(&self) -> Option<&FrameRecord> {
        self.records.last()
    }

    /// Iterate over records in temporal order.
    pub fn iter(&self) -> std::slice::Iter<'_, FrameRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a FrameRecord;
    type IntoIter = std::slice::Iter<'a, FrameRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, POSE_LANDMARK_COUNT, Skeleton};

    fn record(x: f32) -> FrameRecord {
        FrameRecord::from_skeleton(&Skeleton::new(
            [Landmark::new(x, 0.5, 0.0); POSE_LANDMARK_COUNT],
        ))
    }

    #[test]
    fn test_push_preserves_order() {
        let mut timeline = Timeline::new();
        assert!(timeline.is_empty());

        timeline.push(record(0.1));
        timeline.push(record(0.2));

        assert_eq!(timeline.len(), 2);
        assert!((timeline.frame(0).unwrap().raw[0].x + 0.1).abs() < 1e-6);
        assert!((timeline.last().unwrap().raw[0].x + 0.2).abs() < 1e-6);
        assert_eq!(timeline.iter().count(), 2);
    }

    #[test]
    fn test_frame_out_of_range() {
        let mut timeline = Timeline::with_capacity(1);
        timeline.push(record(0.1));

        assert!(timeline.get(1).is_none());
        assert!(matches!(
            timeline.frame(1),
            Err(ReplayError::FrameOutOfRange { index: 1, len: 1 })
        ));
    }
}
