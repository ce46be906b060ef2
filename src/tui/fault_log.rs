//! Fault log — circular buffer of recent compile faults.
//!
//! Only messages and timestamps are kept; origin and native detail go to
//! the `tracing` log instead.

use std::collections::VecDeque;
use std::time::SystemTime;

use crate::state::RequestId;

#[derive(Debug, Clone)]
pub struct FaultEntry {
    pub timestamp: SystemTime,
    pub request: Option<RequestId>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FaultLog {
    entries: VecDeque<FaultEntry>,
    capacity: usize,
}

impl FaultLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a fault, evicting the oldest entry when full.
    pub fn push(&mut self, request: Option<RequestId>, message: String) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(FaultEntry {
            timestamp: SystemTime::now(),
            request,
            message,
        });
    }

    /// The N most recent entries, newest last.
    pub fn recent(&self, n: usize) -> Vec<&FaultEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &FaultEntry> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for FaultLog {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_overflow_evicts_oldest() {
        let mut log = FaultLog::new(3);
        for (i, m) in ["a", "b", "c", "d"].into_iter().enumerate() {
            log.push(Some(RequestId::new(i as u64)), m.to_string());
        }
        let messages: Vec<&str> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c", "d"]);
        assert_eq!(log.entries().next().unwrap().request, Some(RequestId::new(1)));
    }

    #[test]
    fn recent_returns_newest() {
        let mut log = FaultLog::default();
        log.push(None, "a".into());
        log.push(None, "b".into());
        log.push(None, "c".into());
        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].message, "c");
        assert_eq!(log.recent(10).len(), 3);
    }

    #[test]
    fn zero_capacity_stays_empty() {
        let mut log = FaultLog::new(0);
        log.push(None, "x".into());
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn entries_are_timestamped() {
        let mut log = FaultLog::default();
        log.push(None, "late".into());
        let elapsed = log.entries().next().unwrap().timestamp.elapsed().unwrap();
        assert!(elapsed.as_secs() < 5);
    }
}
