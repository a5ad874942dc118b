//! Fixed-capacity sliding window of recent observations.

use std::collections::VecDeque;

use posewatch_pose_model::observation::KeypointObservation;

/// FIFO holding the most recent `capacity` observations, oldest first.
#[derive(Debug, Clone)]
pub struct SlidingWindowBuffer {
    buffer: VecDeque<KeypointObservation>,
    capacity: usize,
}

impl SlidingWindowBuffer {
    /// Create an empty window. A zero capacity is raised to 1; callers
    /// validate the configured size before getting here.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append an observation, evicting the oldest one once at capacity.
    pub fn push(&mut self, observation: KeypointObservation) {
        self.buffer.push_back(observation);
        if self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    /// True once the window holds exactly `capacity` observations.
    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Read-only view of the window, oldest first.
    pub fn snapshot(&self) -> &VecDeque<KeypointObservation> {
        &self.buffer
    }

    /// Most recently pushed observation.
    pub fn latest(&self) -> Option<&KeypointObservation> {
        self.buffer.back()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every held observation.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obs(t: u64) -> KeypointObservation {
        KeypointObservation::new(t)
    }

    #[test]
    fn test_not_full_until_capacity() {
        let mut window = SlidingWindowBuffer::new(3);
        assert!(!window.is_full());
        window.push(obs(0));
        window.push(obs(1));
        assert!(!window.is_full());
        window.push(obs(2));
        assert!(window.is_full());
    }

    #[test]
    fn test_evicts_oldest() {
        let mut window = SlidingWindowBuffer::new(3);
        for t in 0..5 {
            window.push(obs(t));
        }
        let stamps: Vec<u64> = window.snapshot().iter().map(|o| o.timestamp_ns).collect();
        assert_eq!(stamps, vec![2, 3, 4]);
        assert_eq!(window.latest().map(|o| o.timestamp_ns), Some(4));
        assert!(window.is_full());
    }

    #[test]
    fn test_clear() {
        let mut window = SlidingWindowBuffer::new(2);
        window.push(obs(0));
        window.push(obs(1));
        window.clear();
        assert!(window.is_empty());
        assert!(!window.is_full());
    }

    proptest! {
        #[test]
        fn prop_window_keeps_most_recent_in_order(capacity in 1usize..80, pushes in 0usize..200) {
            let mut window = SlidingWindowBuffer::new(capacity);
            for t in 0..pushes {
                window.push(obs(t as u64));
            }

            prop_assert_eq!(window.len(), pushes.min(capacity));
            prop_assert_eq!(window.is_full(), pushes >= capacity);

            let expected: Vec<u64> = (pushes.saturating_sub(capacity)..pushes)
                .map(|t| t as u64)
                .collect();
            let actual: Vec<u64> = window.snapshot().iter().map(|o| o.timestamp_ns).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
