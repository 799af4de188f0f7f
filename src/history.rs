use std::collections::VecDeque;

/// Upper bound on retained chat messages; oldest entries are dropped first.
pub const MAX_MESSAGES_COUNT: usize = 100;

/// Sender marker for messages authored by the platform itself.
pub const SYSTEM_SENDER: &str = "📢";

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub seq: u64,
    pub sender: String,
    pub body: String,
}

/// Append-only, capacity-bounded message log shared by every session.
///
/// `seq` counts every message ever appended. Truncation drops entries from
/// the front but never renumbers, so a reader's cursor stays meaningful
/// across truncation; `read_since` clamps stale cursors into the retained
/// window.
#[derive(Debug)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
    capacity: usize,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        MessageLog {
            entries: VecDeque::new(),
            next_seq: 0,
            capacity,
        }
    }

    pub fn append(&mut self, sender: &str, body: String) -> LogEntry {
        let entry = LogEntry {
            seq: self.next_seq,
            sender: sender.to_string(),
            body,
        };
        self.next_seq += 1;
        self.entries.push_back(entry.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        entry
    }

    /// All retained entries with `seq` at or after `index`, plus the cursor
    /// to read from next time.
    pub fn read_since(&self, index: u64) -> (Vec<LogEntry>, u64) {
        let oldest = self.entries.front().map_or(self.next_seq, |e| e.seq);
        let from = index.clamp(oldest, self.next_seq);
        let skip = usize::try_from(from - oldest).unwrap_or(usize::MAX);
        let entries = self.entries.iter().skip(skip).cloned().collect();
        (entries, self.next_seq)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, count: usize) -> MessageLog {
        let mut log = MessageLog::new(capacity);
        for i in 0..count {
            log.append("alice", format!("message {i}"));
        }
        log
    }

    #[test]
    fn append_assigns_sequential_seqs() {
        let mut log = MessageLog::new(10);
        let first = log.append("alice", "one".to_string());
        let second = log.append(SYSTEM_SENDER, "two".to_string());
        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let log = filled(3, 10);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn oldest_entries_drop_first() {
        let log = filled(3, 5);
        let (entries, _) = log.read_since(0);
        let bodies: Vec<&str> = entries.iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, ["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn read_since_returns_exact_range() {
        let log = filled(10, 5);
        let (entries, cursor) = log.read_since(2);
        assert_eq!(cursor, 5);
        let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, [2, 3, 4]);
    }

    #[test]
    fn stale_cursor_is_clamped_after_truncation() {
        let log = filled(3, 8);
        // A reader that last saw seq 1 finds it truncated away.
        let (entries, cursor) = log.read_since(1);
        assert_eq!(cursor, 8);
        let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, [5, 6, 7]);
    }

    #[test]
    fn cursor_at_head_reads_nothing() {
        let log = filled(10, 4);
        let (entries, cursor) = log.read_since(4);
        assert!(entries.is_empty());
        assert_eq!(cursor, 4);
    }

    #[test]
    fn empty_log_reads_empty() {
        let log = MessageLog::new(10);
        assert!(log.is_empty());
        let (entries, cursor) = log.read_since(0);
        assert!(entries.is_empty());
        assert_eq!(cursor, 0);
    }
}
