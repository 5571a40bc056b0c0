//! Document buffer — the single mutable text owned by the editor widget.

/// In-memory text plus a caret, tracked as a byte offset that is always on a
/// char boundary.
#[derive(Debug, Clone)]
pub struct Buffer {
    text: String,
    caret: usize,
}

impl Buffer {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = text.len();
        Self { text, caret }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn caret(&self) -> usize {
        self.caret
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.caret, c);
        self.caret += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.caret, s);
        self.caret += s.len();
    }

    /// Delete the char before the caret. Returns false at the buffer start.
    pub fn backspace(&mut self) -> bool {
        let Some(prev) = self.prev_boundary() else {
            return false;
        };
        self.text.replace_range(prev..self.caret, "");
        self.caret = prev;
        true
    }

    /// Delete the char after the caret. Returns false at the buffer end.
    pub fn delete_forward(&mut self) -> bool {
        let Some(next) = self.next_boundary() else {
            return false;
        };
        self.text.replace_range(self.caret..next, "");
        true
    }

    /// Replace `[start, end)` with `replacement` and park the caret after it.
    ///
    /// Used by completion commit: the replaced range is the completion
    /// segment from the popup anchor to the caret.
    pub fn replace_range(&mut self, start: usize, end: usize, replacement: &str) {
        debug_assert!(start <= end && end <= self.text.len());
        self.text.replace_range(start..end, replacement);
        self.caret = start + replacement.len();
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.caret = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.caret = next;
        }
    }

    pub fn move_line_start(&mut self) {
        let (line, _) = self.caret_line_col();
        self.caret = self.line_start_offset(line);
    }

    pub fn move_line_end(&mut self) {
        let (line, _) = self.caret_line_col();
        let start = self.line_start_offset(line);
        let line_text = self.line_text(line);
        self.caret = start + line_text.len();
    }

    pub fn move_up(&mut self) {
        let (line, col) = self.caret_line_col();
        if line > 0 {
            self.caret_to_line_col(line - 1, col);
        }
    }

    pub fn move_down(&mut self) {
        let (line, col) = self.caret_line_col();
        if line + 1 < self.line_count() {
            self.caret_to_line_col(line + 1, col);
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Lines without their trailing newline.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    #[must_use]
    pub fn line_text(&self, line: usize) -> &str {
        self.text.split('\n').nth(line).unwrap_or("")
    }

    /// Caret position as (0-indexed line, char column within the line).
    #[must_use]
    pub fn caret_line_col(&self) -> (usize, usize) {
        let before = &self.text[..self.caret];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let col = before[line_start..].chars().count();
        (line, col)
    }

    fn line_start_offset(&self, line: usize) -> usize {
        let mut offset = 0;
        for (i, text) in self.text.split('\n').enumerate() {
            if i == line {
                return offset;
            }
            offset += text.len() + 1;
        }
        self.text.len()
    }

    fn caret_to_line_col(&mut self, line: usize, col: usize) {
        let start = self.line_start_offset(line);
        let line_text = self.line_text(line);
        let byte_col: usize = line_text
            .chars()
            .take(col)
            .map(char::len_utf8)
            .sum();
        self.caret = start + byte_col.min(line_text.len());
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.caret].chars().next_back().map(|c| self.caret - c.len_utf8())
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.caret..].chars().next().map(|c| self.caret + c.len_utf8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_places_caret_at_end() {
        let buf = Buffer::new("abc");
        assert_eq!(buf.caret(), 3);
    }

    #[test]
    fn test_insert_and_backspace() {
        let mut buf = Buffer::new("");
        buf.insert_char('a');
        buf.insert_char('b');
        assert_eq!(buf.text(), "ab");
        assert!(buf.backspace());
        assert_eq!(buf.text(), "a");
        assert!(buf.backspace());
        assert!(!buf.backspace());
        assert_eq!(buf.caret(), 0);
    }

    #[test]
    fn test_multibyte_chars_keep_boundaries() {
        let mut buf = Buffer::new("");
        buf.insert_char('é');
        buf.insert_char('x');
        buf.move_left();
        buf.move_left();
        assert_eq!(buf.caret(), 0);
        buf.move_right();
        assert_eq!(buf.caret(), 'é'.len_utf8());
        assert!(buf.backspace());
        assert_eq!(buf.text(), "x");
    }

    #[test]
    fn test_replace_range_parks_caret_after_replacement() {
        let mut buf = Buffer::new("$x.Le");
        buf.replace_range(3, 5, "Length");
        assert_eq!(buf.text(), "$x.Length");
        assert_eq!(buf.caret(), 9);
    }

    #[test]
    fn test_line_col_math() {
        let mut buf = Buffer::new("ab\ncdef\n");
        assert_eq!(buf.caret_line_col(), (2, 0));
        buf.move_up();
        assert_eq!(buf.caret_line_col(), (1, 0));
        buf.move_line_end();
        assert_eq!(buf.caret_line_col(), (1, 4));
        buf.move_up();
        // Column clamps to the shorter line.
        assert_eq!(buf.caret_line_col(), (0, 2));
        buf.move_down();
        buf.move_down();
        assert_eq!(buf.caret_line_col(), (2, 0));
    }

    #[test]
    fn test_delete_forward() {
        let mut buf = Buffer::new("ab");
        buf.move_left();
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "a");
        assert!(!buf.delete_forward());
    }
}
