// Bucketed float histogram
//
// Buckets are keyed by the first value that opened them; a value falls into
// the first bucket within `delta` of it. Used for voting on line edges.

/// Histogram over floats with fixed-radius buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatHistogram {
    delta: f32,
    items: Vec<(f32, usize)>,
}

impl FloatHistogram {
    #[inline]
    #[must_use]
    pub fn new(delta: f32) -> Self {
        Self {
            delta,
            items: Vec::new(),
        }
    }

    fn bucket_of(&self, value: f32) -> Option<usize> {
        self.items
            .iter()
            .position(|(key, _)| (value - key).abs() < self.delta)
    }

    /// Count `value` in its bucket, opening a new bucket when none matches.
    pub fn insert(&mut self, value: f32) {
        match self.bucket_of(value) {
            Some(idx) => self.items[idx].1 += 1,
            None => self.items.push((value, 1)),
        }
    }

    /// Count `value` only if a matching bucket already exists.
    pub fn reinforce(&mut self, value: f32) {
        if let Some(idx) = self.bucket_of(value) {
            self.items[idx].1 += 1;
        }
    }

    /// Key of the bucket matching `value`, or `None` when no bucket matches.
    #[must_use]
    pub fn approximate(&self, value: f32) -> Option<f32> {
        self.bucket_of(value).map(|idx| self.items[idx].0)
    }

    /// Number of buckets.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Buckets as `(key, count)` in insertion order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[(f32, usize)] {
        &self.items
    }

    /// Total number of counted values.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.iter().map(|(_, count)| count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_groups_nearby_values() {
        let mut hist = FloatHistogram::new(1.0);
        hist.insert(10.0);
        hist.insert(10.6);
        hist.insert(12.0);
        assert_eq!(hist.len(), 2);
        assert_eq!(hist.items()[0], (10.0, 2));
        assert_eq!(hist.total(), 3);
    }

    #[test]
    fn test_reinforce_never_opens_bucket() {
        let mut hist = FloatHistogram::new(2.0);
        hist.reinforce(5.0);
        assert!(hist.is_empty());
        hist.insert(5.0);
        hist.reinforce(6.5);
        assert_eq!(hist.items()[0].1, 2);
    }

    #[test]
    fn test_approximate() {
        let mut hist = FloatHistogram::new(2.0);
        hist.insert(30.0);
        assert_eq!(hist.approximate(31.5), Some(30.0));
        assert_eq!(hist.approximate(40.0), None);
    }
}
