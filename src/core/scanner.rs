//! Character scanner for the pull parser
//!
//! Works on already-decoded text and hands out one character at a time with
//! up to two characters of lookahead. Line ends are normalized while peeking:
//! a lone CR becomes LF and CR LF collapses to a single LF.
//!
//! Runs of plain text are copied in bulk with memchr, which uses SIMD when
//! available:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)

use memchr::{memchr3, memchr_iter, memrchr};

/// Lookahead depth
const PEEK_SLOTS: usize = 2;

/// Scanner over a decoded document
pub struct Scanner {
    input: String,
    /// Byte offset of the next raw character
    pos: usize,
    peek: [Option<char>; PEEK_SLOTS],
    peek_count: usize,
    /// The last raw character was a CR, so a following LF is dropped
    was_cr: bool,
    line: usize,
    column: usize,
}

impl Scanner {
    /// Create a new scanner for the given text
    pub fn new(input: String) -> Self {
        Scanner {
            input,
            pos: 0,
            peek: [None; PEEK_SLOTS],
            peek_count: 0,
            was_cr: false,
            line: 1,
            column: 0,
        }
    }

    /// Current line (1-based)
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Column of the last consumed character on the current line
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Next raw character, advancing the byte cursor
    #[inline]
    fn next_raw(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Look at the character `slot` positions ahead (0 or 1) without consuming it.
    /// Returns `None` at end of input.
    pub fn peek(&mut self, slot: usize) -> Option<char> {
        debug_assert!(slot < PEEK_SLOTS);
        while slot >= self.peek_count {
            let normalized = loop {
                match self.next_raw() {
                    Some('\r') => {
                        self.was_cr = true;
                        break Some('\n');
                    }
                    Some('\n') if self.was_cr => {
                        self.was_cr = false;
                    }
                    other => {
                        self.was_cr = false;
                        break other;
                    }
                }
            };
            self.peek[self.peek_count] = normalized;
            self.peek_count += 1;
        }
        self.peek[slot]
    }

    /// Consume one character, tracking line and column
    pub fn read(&mut self) -> Option<char> {
        let c = self.peek(0);
        self.peek[0] = self.peek[1];
        self.peek[1] = None;
        self.peek_count -= 1;

        if let Some(ch) = c {
            self.column += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            }
        }
        c
    }

    /// Consume a run of characters containing none of `<`, `&` or `\r` and
    /// append it to `out`. Lookahead is drained first, then the rest of the
    /// run is located with memchr and copied in one piece.
    ///
    /// Returns the number of bytes appended.
    pub fn read_plain_run(&mut self, out: &mut String) -> usize {
        let start = out.len();

        while self.peek_count > 0 {
            match self.peek[0] {
                Some(c) if c != '<' && c != '&' => {
                    out.push(c);
                    self.read();
                }
                _ => return out.len() - start,
            }
        }
        // A pending CR means the next raw LF must be dropped by `peek`
        if self.was_cr {
            return out.len() - start;
        }

        let rest = &self.input.as_bytes()[self.pos..];
        let end = memchr3(b'<', b'&', b'\r', rest).unwrap_or(rest.len());
        if end == 0 {
            return out.len() - start;
        }

        let run = &self.input[self.pos..self.pos + end];
        let bytes = run.as_bytes();
        let newlines = memchr_iter(b'\n', bytes).count();
        match memrchr(b'\n', bytes) {
            Some(last) => {
                self.line += newlines;
                self.column = run[last + 1..].chars().count();
            }
            None => self.column += run.chars().count(),
        }
        out.push_str(run);
        self.pos += end;

        out.len() - start
    }
}
