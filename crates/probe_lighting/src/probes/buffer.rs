//! Reusable output buffers for probe queries
//!
//! Queries run once per shaded point per frame, so they never allocate a
//! fresh collection. Callers keep a [`QueryBuffer`] alive across queries;
//! it tracks a logical length separate from the slots it has grown to, and
//! slots are overwritten in place rather than freed.

use std::rc::Rc;

use super::probe::Probe;

/// Growable buffer with a logical length distinct from its allocated slots
#[derive(Debug, Clone)]
pub struct QueryBuffer<E> {
    slots: Vec<E>,
    len: usize,
}

impl<E> Default for QueryBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> QueryBuffer<E> {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }

    /// Create an empty buffer that can grow to `capacity` slots without reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    /// Number of entries written by the last query
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the last query wrote nothing
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots that have ever been written
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Reset the logical length, keeping every slot
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Store `entry` at `index`, reusing the slot when it already exists
    ///
    /// Writes must be sequential: `index` may not skip past the slot count.
    /// The logical length becomes `index + 1`, so entries past the last
    /// write from an earlier, longer query are no longer visible.
    pub fn write(&mut self, index: usize, entry: E) {
        debug_assert!(index <= self.slots.len(), "non-sequential buffer write");
        if index < self.slots.len() {
            self.slots[index] = entry;
        } else {
            self.slots.push(entry);
        }
        self.len = index + 1;
    }

    /// Set the logical length; never releases slots
    pub fn truncate(&mut self, len: usize) {
        self.len = len.min(self.slots.len());
    }

    /// Entries written by the last query
    pub fn as_slice(&self) -> &[E] {
        &self.slots[..self.len]
    }

    /// Mutable view of the written entries
    pub fn as_mut_slice(&mut self) -> &mut [E] {
        &mut self.slots[..self.len]
    }

    /// Iterate the written entries
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.as_slice().iter()
    }
}

impl<'a, E> IntoIterator for &'a QueryBuffer<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One weighted probe in a query result
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSample {
    /// Probe to sample
    pub probe: Rc<Probe>,
    /// Blend weight
    pub weight: f32,
    /// Mip level to sample; always 0 for irradiance probes
    pub mip_level: f32,
}

impl ProbeSample {
    /// Create a sample at mip level 0
    pub fn new(probe: Rc<Probe>, weight: f32) -> Self {
        Self {
            probe,
            weight,
            mip_level: 0.0,
        }
    }
}

/// Normalized influence of one group member at a query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeWeight {
    /// Index of the volume inside its group
    pub volume: usize,
    /// Blend ratio
    pub ratio: f32,
}

/// Output and scratch buffers for one query stream
#[derive(Debug, Clone, Default)]
pub struct ProbeQueryBuffers {
    /// Weighted probes written by the last query
    pub probes: QueryBuffer<ProbeSample>,
    /// Per-volume ratios used while composing the probe list
    pub volumes: QueryBuffer<VolumeWeight>,
}

impl ProbeQueryBuffers {
    /// Create buffers sized for the expected number of probes and volumes per query
    pub fn with_capacity(probe_capacity: usize, volume_capacity: usize) -> Self {
        Self {
            probes: QueryBuffer::with_capacity(probe_capacity),
            volumes: QueryBuffer::with_capacity(volume_capacity),
        }
    }
}

/// Sum of the weights in a probe list
pub fn total_weight(samples: &[ProbeSample]) -> f32 {
    samples.iter().map(|s| s.weight).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_reuses_slots_and_truncate_keeps_them() {
        let mut buffer = QueryBuffer::with_capacity(4);
        for i in 0..3 {
            buffer.write(i, i * 10);
        }
        assert_eq!(buffer.as_slice(), &[0, 10, 20]);

        buffer.truncate(1);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.slot_count(), 3);

        buffer.write(1, 99);
        assert_eq!(buffer.as_slice(), &[0, 99]);
        assert_eq!(buffer.slot_count(), 3);
    }

    #[test]
    fn test_shorter_write_sequence_hides_stale_entries() {
        let mut buffer = QueryBuffer::new();
        for i in 0..4 {
            buffer.write(i, i);
        }
        buffer.write(0, 7);

        assert_eq!(buffer.as_slice(), &[7]);
        assert_eq!(buffer.slot_count(), 4);
    }

    #[test]
    fn test_clear_resets_logical_length_only() {
        let mut buffer = QueryBuffer::new();
        buffer.write(0, 'a');
        buffer.write(1, 'b');
        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.slot_count(), 2);
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn test_truncate_cannot_expose_unwritten_slots() {
        let mut buffer = QueryBuffer::new();
        buffer.write(0, 1.0_f32);
        buffer.truncate(5);
        assert_eq!(buffer.len(), 1);
    }
}
