use ccwave_decode::{FrameKind, OutputFrame};

#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Milliseconds since the first frame of the capture.
    pub offset_ms: f64,
    pub frame: OutputFrame,
}

/// Decoded frames in arrival order, with keyword filtering for display.
pub struct FrameLog {
    entries: Vec<LogEntry>,
    max_entries: usize,
    origin_s: Option<f64>,
    include: Vec<String>,
    exclude: Vec<String>,
    show_errors: bool,
}

impl FrameLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
            origin_s: None,
            include: Vec::new(),
            exclude: Vec::new(),
            show_errors: true,
        }
    }

    /// A frame is shown when it contains any `include` keyword (or the list
    /// is empty) and none of the `exclude` keywords.
    pub fn set_filter(&mut self, include: Vec<String>, exclude: Vec<String>) {
        self.include = include.into_iter().filter(|k| !k.is_empty()).collect();
        self.exclude = exclude.into_iter().filter(|k| !k.is_empty()).collect();
    }

    pub fn set_show_errors(&mut self, show: bool) {
        self.show_errors = show;
    }

    pub fn push(&mut self, frame: OutputFrame) {
        let origin = *self.origin_s.get_or_insert(frame.span.start_s);
        self.entries.push(LogEntry {
            offset_ms: (frame.span.start_s - origin) * 1000.0,
            frame,
        });

        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.origin_s = None;
    }

    pub fn is_visible(&self, entry: &LogEntry) -> bool {
        let text = &entry.frame.text;
        if entry.frame.kind == FrameKind::Error {
            return self.show_errors;
        }
        let included = self.include.is_empty() || self.include.iter().any(|k| text.contains(k.as_str()));
        included && !self.exclude.iter().any(|k| text.contains(k.as_str()))
    }

    pub fn visible(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(|entry| self.is_visible(entry))
    }

    pub fn to_text(&self, show_timestamp: bool) -> String {
        let mut result = String::new();
        for entry in self.visible() {
            if show_timestamp {
                result.push_str(&format!("{:.2}ms ", entry.offset_ms));
            }
            result.push_str(&entry.frame.text);
            result.push('\n');
        }
        result
    }
}
