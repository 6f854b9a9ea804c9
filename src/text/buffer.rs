/// Editable text with a character-indexed cursor, backing the text-edit overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBuffer {
    content: String,
    cursor_chars: usize,
}

impl TextBuffer {
    /// Buffer pre-filled with `text`, cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let content = text.into();
        let cursor_chars = content.chars().count();
        Self {
            content,
            cursor_chars,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Replaces the whole content, as when the input's value is set directly.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = text.into();
        self.move_cursor_to_end();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor_chars = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_index = self.byte_index_for_cursor(self.cursor_chars);
        self.content.insert(byte_index, c);
        self.cursor_chars = self.cursor_chars.saturating_add(1);
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(c);
        }
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn delete_backward(&mut self) -> bool {
        if self.cursor_chars() == 0 {
            return false;
        }
        let cursor = self.cursor_chars() - 1;
        let start = self.byte_index_for_cursor(cursor);
        let end = self.byte_index_for_cursor(cursor + 1);
        if start >= end {
            return false;
        }
        self.content.drain(start..end);
        self.cursor_chars = cursor;
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        let start = self.byte_index_for_cursor(self.cursor_chars);
        let end = self.byte_index_for_cursor(self.cursor_chars().saturating_add(1));
        if start >= end {
            return false;
        }
        self.content.drain(start..end);
        true
    }

    pub fn cursor_chars(&self) -> usize {
        self.cursor_chars.min(self.content.chars().count())
    }

    pub fn move_cursor_left(&mut self) -> bool {
        if self.cursor_chars() == 0 {
            return false;
        }
        self.cursor_chars = self.cursor_chars().saturating_sub(1);
        true
    }

    pub fn move_cursor_right(&mut self) -> bool {
        if self.cursor_chars() >= self.content.chars().count() {
            return false;
        }
        self.cursor_chars = self.cursor_chars().saturating_add(1);
        true
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_chars = self.content.chars().count();
    }

    fn byte_index_for_cursor(&self, cursor_chars: usize) -> usize {
        self.content
            .char_indices()
            .nth(cursor_chars)
            .map(|(index, _)| index)
            .unwrap_or(self.content.len())
    }
}
