//! Splitting a track's span into dynamics intervals.

use rand::Rng;
use serde::Serialize;

/// A half-open span `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Position of `t` within the interval, clamped to [0, 1].
    pub fn fraction(&self, t: f64) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0.0;
        }
        ((t - self.start) / duration).clamp(0.0, 1.0)
    }
}

/// Partitions `[0, duration]` into contiguous intervals with lengths drawn
/// uniformly from `[min_len, max_len]`.
///
/// The last interval is clipped to end exactly at `duration`. A duration
/// shorter than `min_len` yields one interval; a non-positive duration
/// yields none. Unusable bounds (non-positive or inverted) also yield a
/// single interval.
pub fn partition<R: Rng>(duration: f64, min_len: f64, max_len: f64, rng: &mut R) -> Vec<Interval> {
    if !(duration > 0.0) || !duration.is_finite() {
        return Vec::new();
    }
    if duration < min_len || !(min_len > 0.0) || !(min_len <= max_len) || !max_len.is_finite() {
        return vec![Interval::new(0.0, duration)];
    }

    let mut intervals = Vec::new();
    let mut start = 0.0;
    loop {
        let length = rng.gen_range(min_len..=max_len);
        let end = start + length;
        if end >= duration {
            intervals.push(Interval::new(start, duration));
            return intervals;
        }
        intervals.push(Interval::new(start, end));
        start = end;
    }
}

/// Index of the interval holding `t`: `start <= t < end`, with the last
/// interval closed at its end. Times outside the span clamp to the first or
/// last interval. `None` only for an empty partition.
pub fn locate(intervals: &[Interval], t: f64) -> Option<usize> {
    if intervals.is_empty() {
        return None;
    }
    let index = intervals.partition_point(|interval| interval.end <= t);
    Some(index.min(intervals.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    fn assert_contiguous(intervals: &[Interval], duration: f64) {
        assert_eq!(intervals[0].start, 0.0);
        assert_eq!(intervals.last().unwrap().end, duration);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for interval in intervals {
            assert!(interval.end > interval.start, "{:?}", interval);
        }
    }

    #[test]
    fn test_partition_covers_duration() {
        for seed in 0..50 {
            let mut rng = create_rng(seed);
            let intervals = partition(95.3, 5.0, 20.0, &mut rng);
            assert_contiguous(&intervals, 95.3);
            // All but the clipped last interval respect the bounds.
            for interval in &intervals[..intervals.len() - 1] {
                assert!((5.0..=20.0).contains(&interval.duration()));
            }
            assert!(intervals.last().unwrap().duration() <= 20.0);
        }
    }

    #[test]
    fn test_partition_is_reproducible() {
        let first = partition(10.0, 2.0, 4.0, &mut create_rng(42));
        let second = partition(10.0, 2.0, 4.0, &mut create_rng(42));
        assert_eq!(first, second);
        assert_contiguous(&first, 10.0);
        let total: f64 = first.iter().map(Interval::duration).sum();
        assert!((total - 10.0).abs() < 1e-9);
        assert!((3..=5).contains(&first.len()));
    }

    #[test]
    fn test_short_duration_is_single_interval() {
        let intervals = partition(3.0, 5.0, 20.0, &mut create_rng(1));
        assert_eq!(intervals, vec![Interval::new(0.0, 3.0)]);
    }

    #[test]
    fn test_empty_duration_has_no_intervals() {
        assert!(partition(0.0, 5.0, 20.0, &mut create_rng(1)).is_empty());
        assert!(partition(-2.0, 5.0, 20.0, &mut create_rng(1)).is_empty());
    }

    #[test]
    fn test_equal_bounds_give_fixed_lengths() {
        let intervals = partition(10.0, 2.5, 2.5, &mut create_rng(9));
        assert_eq!(intervals.len(), 4);
        assert_contiguous(&intervals, 10.0);
    }

    #[test]
    fn test_locate() {
        let intervals = vec![
            Interval::new(0.0, 2.0),
            Interval::new(2.0, 5.0),
            Interval::new(5.0, 6.0),
        ];
        assert_eq!(locate(&intervals, 0.0), Some(0));
        assert_eq!(locate(&intervals, 1.999), Some(0));
        assert_eq!(locate(&intervals, 2.0), Some(1));
        assert_eq!(locate(&intervals, 6.0), Some(2));
        assert_eq!(locate(&intervals, 7.0), Some(2));
        assert_eq!(locate(&[], 1.0), None);
    }

    #[test]
    fn test_fraction() {
        let interval = Interval::new(2.0, 6.0);
        assert_eq!(interval.fraction(2.0), 0.0);
        assert_eq!(interval.fraction(4.0), 0.5);
        assert_eq!(interval.fraction(10.0), 1.0);
    }
}
