/// Editable text input. Single-line fields ignore newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub lines: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub multiline: bool,
}

impl Default for TextField {
    fn default() -> Self {
        TextField::single_line()
    }
}

impl TextField {
    pub fn single_line() -> Self {
        TextField {
            lines: vec![String::new()],
            cursor_row: 0,
            cursor_col: 0,
            multiline: false,
        }
    }

    pub fn multi_line() -> Self {
        TextField {
            multiline: true,
            ..TextField::single_line()
        }
    }

    /// Replaces the content and puts the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.lines = if self.multiline {
            text.split('\n').map(|s| s.trim_end_matches('\r').to_string()).collect()
        } else {
            vec![text.replace(['\r', '\n'], " ")]
        };
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.cursor_row = self.lines.len() - 1;
        self.cursor_col = char_len(&self.lines[self.cursor_row]);
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let line = &mut self.lines[self.cursor_row];
        let at = byte_index(line, self.cursor_col);
        line.insert(at, c);
        self.cursor_col += 1;
    }

    pub fn insert_newline(&mut self) {
        if !self.multiline {
            return;
        }
        let line = &mut self.lines[self.cursor_row];
        let at = byte_index(line, self.cursor_col);
        let remaining = line.split_off(at);

        self.cursor_row += 1;
        self.cursor_col = 0;
        self.lines.insert(self.cursor_row, remaining);
    }

    pub fn delete_char(&mut self) {
        if self.cursor_col > 0 {
            let line = &mut self.lines[self.cursor_row];
            let at = byte_index(line, self.cursor_col - 1);
            line.remove(at);
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            // Join with previous line
            let current = self.lines.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.lines[self.cursor_row]);
            self.lines[self.cursor_row].push_str(&current);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.lines[self.cursor_row]);
        }
    }

    pub fn move_cursor_right(&mut self) {
        let line_len = char_len(&self.lines[self.cursor_row]);
        if self.cursor_col < line_len {
            self.cursor_col += 1;
        } else if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.clamp_col();
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_to_end_of_line(&mut self) {
        self.cursor_col = char_len(&self.lines[self.cursor_row]);
    }

    fn clamp_col(&mut self) {
        let line_len = char_len(&self.lines[self.cursor_row]);
        if self.cursor_col > line_len {
            self.cursor_col = line_len;
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(s.len())
}
