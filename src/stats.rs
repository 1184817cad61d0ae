use itertools::Itertools;

use crate::history::Solve;
use crate::util::mean;

/// Derived from a solve history; safe to throw away and recompute
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statistics {
    pub count: usize,
    pub best: Option<u64>,
    pub worst: Option<u64>,
    pub average: Option<f64>,
    pub ao5: Option<f64>,
    pub ao12: Option<f64>,
}

/// Compute statistics for a newest-first history
pub fn compute(history: &[Solve]) -> Statistics {
    let times: Vec<u64> = history.iter().map(|s| s.time_ms).collect();
    compute_times(&times)
}

pub fn compute_times(times: &[u64]) -> Statistics {
    if times.is_empty() {
        return Statistics::default();
    }

    let as_f64: Vec<f64> = times.iter().map(|&t| t as f64).collect();

    Statistics {
        count: times.len(),
        best: times.iter().copied().min(),
        worst: times.iter().copied().max(),
        average: mean(&as_f64),
        ao5: average_of(times, 5),
        ao12: average_of(times, 12),
    }
}

/// Trimmed mean of the `k` most recent times.
///
/// Exactly one best and one worst value are dropped, even when several
/// solves share the extreme time. `None` when fewer than `k` times exist or
/// `k < 3`.
pub fn average_of(times: &[u64], k: usize) -> Option<f64> {
    if k < 3 || times.len() < k {
        return None;
    }

    let trimmed: Vec<f64> = times[..k]
        .iter()
        .sorted()
        .skip(1)
        .take(k - 2)
        .map(|&t| t as f64)
        .collect();

    mean(&trimmed)
}
