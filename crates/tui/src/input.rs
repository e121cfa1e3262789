use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::text::Span;

/// Character limit for ordinary form fields.
pub const DEFAULT_MAX_LEN: usize = 128;

/// Single-line text input with a char-indexed cursor.
#[derive(Debug, Clone)]
pub struct TextField {
    value: String,
    cursor: usize,
    masked: bool,
    max_len: usize,
}

impl Default for TextField {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_LEN)
    }
}

impl TextField {
    /// Empty field accepting at most `max_len` characters.
    pub fn with_limit(max_len: usize) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            masked: false,
            max_len,
        }
    }

    pub fn masked() -> Self {
        Self {
            masked: true,
            ..Self::default()
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Apply an editing key. Returns true when the value changed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => {
                self.move_cursor(-1);
                false
            }
            KeyCode::Right => {
                self.move_cursor(1);
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = self.len();
                false
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.insert(ch)
            }
            _ => false,
        }
    }

    /// Text to draw; masked fields show bullets.
    pub fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.len())
        } else {
            self.value.clone()
        }
    }

    /// Terminal columns between the start of the field and the cursor.
    pub fn cursor_offset(&self) -> u16 {
        let before: String = self.display().chars().take(self.cursor).collect();
        Span::raw(before).width() as u16
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, self.len() as isize) as usize;
    }

    fn insert(&mut self, ch: char) -> bool {
        if self.len() >= self.max_len || ch.is_control() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
        true
    }

    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
        true
    }

    fn delete(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.value.remove(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(field: &mut TextField, text: &str) {
        for ch in text.chars() {
            field.handle_key(&key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn edits_multibyte_text_by_character() {
        let mut field = TextField::default();
        type_text(&mut field, "ม.6/1");
        assert_eq!(field.value(), "ม.6/1");

        field.handle_key(&key(KeyCode::Home));
        field.handle_key(&key(KeyCode::Delete));
        assert_eq!(field.value(), ".6/1");

        field.handle_key(&key(KeyCode::End));
        field.handle_key(&key(KeyCode::Left));
        field.handle_key(&key(KeyCode::Backspace));
        assert_eq!(field.value(), ".61");
    }

    #[test]
    fn control_modified_keys_are_not_inserted() {
        let mut field = TextField::default();
        let changed = field.handle_key(&KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL));
        assert!(!changed);
        assert_eq!(field.value(), "");
    }

    #[test]
    fn limit_is_per_field() {
        let mut short = TextField::default();
        type_text(&mut short, &"x".repeat(DEFAULT_MAX_LEN + 10));
        assert_eq!(short.value().chars().count(), DEFAULT_MAX_LEN);

        let mut long = TextField::with_limit(4096);
        type_text(&mut long, &"x".repeat(1200));
        assert_eq!(long.value().len(), 1200);
    }

    #[test]
    fn masked_fields_hide_input() {
        let mut field = TextField::masked();
        type_text(&mut field, "pass");
        assert_eq!(field.display(), "••••");
        assert_eq!(field.value(), "pass");
        assert_eq!(field.cursor_offset(), 4);
    }
}
