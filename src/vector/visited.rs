//! Reusable visited set for layer searches.
//!
//! Marks are generation stamps, so clearing between searches is a counter
//! bump instead of a fresh allocation.

/// Generation-stamped set of node positions.
#[derive(Debug)]
pub(crate) struct VisitedSet {
    marks: Vec<u16>,
    generation: u16,
}

impl VisitedSet {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            marks: vec![0; capacity],
            generation: 1,
        }
    }

    /// Forgets every mark. Zeroes the buffer only when the generation wraps.
    pub(crate) fn clear(&mut self) {
        if self.generation == u16::MAX {
            self.marks.fill(0);
            self.generation = 1;
        } else {
            self.generation += 1;
        }
    }

    /// Grows the buffer to hold positions below `capacity`.
    pub(crate) fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.marks.len() {
            self.marks.resize(capacity, 0);
        }
    }

    /// Marks `id`; returns true if it was not marked yet.
    #[inline]
    pub(crate) fn insert(&mut self, id: usize) -> bool {
        if self.marks[id] == self.generation {
            false
        } else {
            self.marks[id] = self.generation;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_clear() {
        let mut visited = VisitedSet::new(8);
        assert!(visited.insert(3));
        assert!(!visited.insert(3));

        visited.clear();
        assert!(visited.insert(3));
    }

    #[test]
    fn test_ensure_capacity_keeps_marks() {
        let mut visited = VisitedSet::new(2);
        assert!(visited.insert(1));

        visited.ensure_capacity(16);
        assert!(!visited.insert(1));
        assert!(visited.insert(15));
    }

    #[test]
    fn test_generation_wrap_resets_marks() {
        let mut visited = VisitedSet::new(4);
        for _ in 1..u16::MAX {
            visited.clear();
        }
        assert_eq!(visited.generation, u16::MAX);
        visited.insert(2);

        visited.clear();
        assert_eq!(visited.generation, 1);
        assert!(visited.insert(2));
    }
}
