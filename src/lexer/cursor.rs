// Heavily inspired by the cursor in `rustc_lexer`, cut down to single operand tokens.
// See https://doc.rust-lang.org/beta/nightly-rustc/src/rustc_lexer/cursor.rs.html

/// Peekable iterator over a char sequence.
pub struct Cursor<'a> {
    /// Index that the cursor is pointing to in the source
    curr_pt: usize,
    chars: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Cursor<'a> {
        Cursor {
            curr_pt: 0,
            chars: input,
        }
    }

    /// Token is finished
    pub fn is_eof(&self) -> bool {
        self.curr_pt >= self.chars.len()
    }

    /// Return slice of input starting at the current point of the cursor
    pub fn at_curr_pt(&self) -> &'a str {
        &self.chars[self.curr_pt..]
    }

    /// Peek the next char without consuming it
    pub fn first(&self) -> Option<char> {
        self.at_curr_pt().chars().next()
    }

    /// Advance by one character
    pub fn bump(&mut self) -> Option<char> {
        let c = self.first()?;
        self.curr_pt += c.len_utf8();
        Some(c)
    }

    /// Consume `expected` if it is next
    pub fn eat(&mut self, expected: char) -> bool {
        if self.first() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume chars while `pred` holds and return them
    pub fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.curr_pt;
        while self.first().is_some_and(&mut pred) {
            self.bump();
        }
        &self.chars[start..self.curr_pt]
    }

    /// Returns current cursor position
    pub fn curr_pt(&self) -> usize {
        self.curr_pt
    }

    /// Slice of the input between `start` and the current point
    pub fn since(&self, start: usize) -> &'a str {
        &self.chars[start..self.curr_pt]
    }
}
