//! Per-tick counters and population statistics consumed by reporting.

use serde::{Deserialize, Serialize};

/// Summary of the points held by live organisms
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub variance: f64,
}

impl PointStats {
    /// Compute statistics over a set of point values. Empty input yields all zeros.
    pub fn from_points<I: IntoIterator<Item = f64>>(points: I) -> Self {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;

        for p in points {
            count += 1;
            min = min.min(p);
            max = max.max(p);
            sum += p;
            sum_sq += p * p;
        }

        if count == 0 {
            return Self::default();
        }

        let n = count as f64;
        let mean = sum / n;
        Self {
            count,
            min,
            max,
            mean,
            variance: (sum_sq / n - mean * mean).max(0.0),
        }
    }
}

/// Solve counts per task, indexed by registration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveCounters {
    counts: Vec<u64>,
}

impl SolveCounters {
    pub fn new(num_tasks: usize) -> Self {
        Self {
            counts: vec![0; num_tasks],
        }
    }

    pub fn record(&mut self, task_index: usize) {
        if let Some(count) = self.counts.get_mut(task_index) {
            *count += 1;
        }
    }

    pub fn get(&self, task_index: usize) -> u64 {
        self.counts.get(task_index).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}

/// Message send/receive counts keyed by the cell whose identity was carried.
///
/// Payloads that match no cell identity land in the `other` buckets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeCounters {
    sent: Vec<u64>,
    received: Vec<u64>,
    sent_other: u64,
    received_other: u64,
}

impl ExchangeCounters {
    pub fn new(num_cells: usize) -> Self {
        Self {
            sent: vec![0; num_cells],
            received: vec![0; num_cells],
            sent_other: 0,
            received_other: 0,
        }
    }

    /// Record a delivered message; `cell` is the cell whose identity matched the payload
    pub fn record_send(&mut self, cell: Option<usize>) {
        match cell.and_then(|c| self.sent.get_mut(c)) {
            Some(count) => *count += 1,
            None => self.sent_other += 1,
        }
    }

    /// Record a retrieved message; `cell` is the cell whose identity matched the payload
    pub fn record_receive(&mut self, cell: Option<usize>) {
        match cell.and_then(|c| self.received.get_mut(c)) {
            Some(count) => *count += 1,
            None => self.received_other += 1,
        }
    }

    pub fn sent(&self, cell: usize) -> u64 {
        self.sent.get(cell).copied().unwrap_or(0)
    }

    pub fn received(&self, cell: usize) -> u64 {
        self.received.get(cell).copied().unwrap_or(0)
    }

    pub fn sent_other(&self) -> u64 {
        self.sent_other
    }

    pub fn received_other(&self) -> u64 {
        self.received_other
    }

    pub fn total_sent(&self) -> u64 {
        self.sent.iter().sum::<u64>() + self.sent_other
    }

    pub fn total_received(&self) -> u64 {
        self.received.iter().sum::<u64>() + self.received_other
    }

    pub fn reset(&mut self) {
        self.sent.iter_mut().for_each(|c| *c = 0);
        self.received.iter_mut().for_each(|c| *c = 0);
        self.sent_other = 0;
        self.received_other = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_stats() {
        let stats = PointStats::from_points([2.0, 4.0, 6.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
        assert!((stats.mean - 4.0).abs() < 1e-9);
        assert!((stats.variance - 8.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_stats_empty() {
        let stats = PointStats::from_points(std::iter::empty());
        assert_eq!(stats, PointStats::default());
    }

    #[test]
    fn test_solve_counters() {
        let mut counters = SolveCounters::new(3);
        counters.record(0);
        counters.record(2);
        counters.record(2);
        counters.record(7); // ignored

        assert_eq!(counters.as_slice(), &[1, 0, 2]);
        assert_eq!(counters.total(), 3);

        counters.reset();
        assert_eq!(counters.total(), 0);
    }

    #[test]
    fn test_exchange_counters() {
        let mut counters = ExchangeCounters::new(2);
        counters.record_send(Some(1));
        counters.record_send(None);
        counters.record_receive(Some(0));
        counters.record_receive(Some(9));

        assert_eq!(counters.sent(1), 1);
        assert_eq!(counters.sent_other(), 1);
        assert_eq!(counters.received(0), 1);
        assert_eq!(counters.received_other(), 1);
        assert_eq!(counters.total_sent(), 2);
        assert_eq!(counters.total_received(), 2);

        counters.reset();
        assert_eq!(counters.total_sent(), 0);
        assert_eq!(counters.total_received(), 0);
    }
}
