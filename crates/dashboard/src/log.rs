use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One line of the user-facing log panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub message: String,
}

/// Append-only status log shown under the active view.
///
/// Sequence numbers start at 0 and never repeat, so a UI can render
/// incrementally with [`LogBook::since`].
#[derive(Debug, Default)]
pub struct LogBook {
    entries: Vec<LogEntry>,
}

impl LogBook {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) -> u64 {
        let seq = self.entries.len() as u64;
        self.entries.push(LogEntry {
            seq,
            level,
            message: message.into(),
        });
        seq
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Info, message)
    }

    pub fn warn(&mut self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Warn, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(LogLevel::Error, message)
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries with `seq >= first`.
    pub fn since(&self, first: u64) -> &[LogEntry] {
        let start = usize::try_from(first)
            .unwrap_or(usize::MAX)
            .min(self.entries.len());
        &self.entries[start..]
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.message.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
