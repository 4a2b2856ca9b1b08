use std::collections::VecDeque;

/// Bounded FIFO of formatted log lines.
///
/// Storage is allocated once for `capacity` lines; once full, every append
/// evicts the oldest line so the buffer always holds the newest `capacity`.
#[derive(Debug)]
pub(crate) struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    #[cfg(test)]
    pub(crate) fn latest(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Newline-joined copy of every buffered line, oldest first.
    pub(crate) fn snapshot(&self) -> String {
        let mut joined = String::new();
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                joined.push('\n');
            }
            joined.push_str(line);
        }
        joined
    }
}
