// Source position tracking across preprocessed template streams

use std::fmt;

/// A byte range in the preprocessed source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a dummy span for positions that have no source text
    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A resolved source location: original file and 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One line of the preprocessed stream, mapped back to its origin.
#[derive(Debug, Clone, Copy)]
struct LineEntry {
    /// Byte offset of the line start in the preprocessed stream
    start: u32,
    /// Byte offset one past the line's newline
    end: u32,
    /// Index into the file-name list
    file: u32,
    /// 1-based line number in the original file
    line: u32,
}

/// Maps byte positions of the preprocessed stream back to `(file, line)`.
///
/// Built once by the preprocessor: every emitted line gets an entry, kept
/// sorted by stream position so lookups are a binary search.
#[derive(Debug, Default)]
pub struct LineTable {
    files: Vec<String>,
    lines: Vec<LineEntry>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file name, reusing the index if it was seen before.
    pub fn add_file(&mut self, name: &str) -> u32 {
        if let Some(idx) = self.files.iter().position(|f| f == name) {
            return idx as u32;
        }
        self.files.push(name.to_string());
        (self.files.len() - 1) as u32
    }

    pub fn file_name(&self, idx: u32) -> &str {
        &self.files[idx as usize]
    }

    /// Append an entry for an emitted line. Entries must be pushed in
    /// stream order.
    pub fn push_line(&mut self, start: u32, end: u32, file: u32, line: u32) {
        debug_assert!(self
            .lines
            .last()
            .map(|prev| prev.start <= start)
            .unwrap_or(true));
        self.lines.push(LineEntry {
            start,
            end,
            file,
            line,
        });
    }

    /// Resolve a stream position to its original `(file, line)`.
    pub fn locate(&self, pos: u32) -> Option<Location> {
        if self.lines.is_empty() {
            return None;
        }
        let idx = match self.lines.binary_search_by_key(&pos, |e| e.start) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let entry = self.lines[idx];
        Some(Location {
            file: self.files[entry.file as usize].clone(),
            line: entry.line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 20);
        let merged = a.merge(b);
        assert_eq!(merged.start, 5);
        assert_eq!(merged.end, 20);
    }

    #[test]
    fn test_line_table_single_file() {
        let mut table = LineTable::new();
        let f = table.add_file("a.bt");
        // "int x;\nint y;\n"
        table.push_line(0, 7, f, 1);
        table.push_line(7, 14, f, 2);
        assert_eq!(
            table.locate(0),
            Some(Location {
                file: "a.bt".into(),
                line: 1
            })
        );
        assert_eq!(table.locate(8).unwrap().line, 2);
        // Past the last entry resolves to the last line
        assert_eq!(table.locate(100).unwrap().line, 2);
    }

    #[test]
    fn test_line_table_multiple_files() {
        let mut table = LineTable::new();
        let a = table.add_file("root.bt");
        let b = table.add_file("inc.bt");
        table.push_line(0, 10, a, 1);
        table.push_line(10, 20, b, 1);
        table.push_line(20, 30, b, 2);
        table.push_line(30, 40, a, 2);
        assert_eq!(table.locate(5).unwrap().file, "root.bt");
        assert_eq!(table.locate(15).unwrap().file, "inc.bt");
        assert_eq!(table.locate(25).unwrap().line, 2);
        let back = table.locate(35).unwrap();
        assert_eq!(back.file, "root.bt");
        assert_eq!(back.line, 2);
    }

    #[test]
    fn test_add_file_dedup() {
        let mut table = LineTable::new();
        let a = table.add_file("x.bt");
        let b = table.add_file("x.bt");
        assert_eq!(a, b);
    }

    #[test]
    fn test_locate_empty() {
        let table = LineTable::new();
        assert_eq!(table.locate(0), None);
    }
}
