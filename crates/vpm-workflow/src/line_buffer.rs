use std::collections::VecDeque;

pub const LINE_BUFFER_CAPACITY: usize = 200;

// Bounded log of streamed output lines. Line numbers grow forever so the
// rendering layer has stable keys even after old lines are evicted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: VecDeque<(u64, String)>,
    next_line: u64,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: String) {
        self.next_line += 1;
        if self.lines.len() == LINE_BUFFER_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back((self.next_line, line));
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.lines.iter().map(|(number, line)| (*number, line.as_str()))
    }
}
