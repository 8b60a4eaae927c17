//! Pending line queue
//!
//! Lines wait here between `enqueue` and the next dump. The queue is taken
//! whole by a dump; if the write fails the lines are put back in front so
//! a retry keeps the original order.

use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct PendingQueue {
    lines: Mutex<Vec<String>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line; empty lines are ignored. Returns whether it was queued.
    pub fn push(&self, line: String) -> bool {
        if line.is_empty() {
            return false;
        }
        self.lines.lock().push(line);
        true
    }

    /// Remove and return every queued line
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }

    /// Put lines back in front of anything queued since they were taken
    pub fn restore(&self, mut lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        let mut queued = self.lines.lock();
        lines.append(&mut queued);
        *queued = lines;
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_lines_are_ignored() {
        let queue = PendingQueue::new();
        assert!(!queue.push(String::new()));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_take_clears_queue() {
        let queue = PendingQueue::new();
        queue.push("a".into());
        queue.push("b".into());

        assert_eq!(queue.take(), vec!["a".to_string(), "b".to_string()]);
        assert!(queue.is_empty());
        assert!(queue.take().is_empty());
    }

    #[test]
    fn test_restore_keeps_order_ahead_of_new_lines() {
        let queue = PendingQueue::new();
        queue.push("1".into());
        queue.push("2".into());
        let taken = queue.take();
        queue.push("3".into());

        queue.restore(taken);

        assert_eq!(queue.take(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_concurrent_pushes_lose_nothing() {
        let queue = Arc::new(PendingQueue::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        queue.push(format!("{}-{}", t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut lines = queue.take();
        assert_eq!(lines.len(), 2000);
        lines.sort();
        lines.dedup();
        assert_eq!(lines.len(), 2000);
    }
}
