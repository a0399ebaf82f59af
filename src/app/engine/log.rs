use std::collections::VecDeque;

use chrono::Local;

pub(crate) const LOG_CAPACITY: usize = 30;

/// Rolling diagnostics lines for on-screen display; oldest evicted first.
#[derive(Debug, Clone)]
pub(crate) struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines
            .push_back(format!("{} {line}", Local::now().format("%H:%M:%S")));
    }

    pub(crate) fn lines(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }
}
