//! Lexer: Lox source text in, [`Token`]s out.
//!
//! [`Scanner`] is a lazy iterator of `Result<Token>`.  A bad character or an
//! unterminated string yields one `Err` and scanning resumes right after it,
//! so a single pass surfaces every lexical error.  The stream always ends
//! with exactly one `EOF` token carrying the last line number.
//!
//! Lines count `\n` bytes, including those inside string literals.  Only
//! ASCII is meaningful outside strings; any other character is reported
//! whole, never split mid‑code‑point.
//!
//! [`scan_tokens`] drains a scanner into separate token and error lists, the
//! shape the parser and the session want.
//!
//! ```rust
//! use rox::scanner::scan_tokens;
//!
//! let (tokens, errors) = scan_tokens("print 123; // ignored");
//!
//! assert!(errors.is_empty());
//! assert_eq!(tokens.len(), 4); // PRINT NUMBER SEMICOLON EOF
//! ```

use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

// ─────────────────────────────────────────────────────────────────────────────
// Static keyword map (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

/// A single pass **scanner / lexer** that converts source text into a
/// sequence of [`Token`]s.
///
/// All structural characters are ASCII, so every lexeme boundary falls on a
/// UTF‑8 character boundary and `&src[start..curr]` slicing is always valid.
pub struct Scanner<'a> {
    src: &'a str,               // entire source text
    bytes: &'a [u8],            // same text, byte view for the hot path
    start: usize,               // index of the *first* byte of the current lexeme
    curr: usize,                // index *one past* the last byte examined
    line: usize,                // 1‑based line counter (\n increments)
    pending: Option<TokenType>, // recognised token kind waiting to be emitted
}

impl<'a> Scanner<'a> {
    /// Create a new lexer over `src`.
    #[inline]
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            bytes: src.as_bytes(),
            start: 0,
            curr: 0,
            line: 1,
            pending: None,
        }
    }

    // ───────────────────────────── primitive helpers ────────────────────────

    /// Return the length of the input slice.
    #[inline(always)]
    const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Are we at (or past) the end of input?
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.len()
    }

    /// Advance one byte and return it.  *Panics* if called at EOF – higher‑level
    /// code always guards with [`is_at_end`].
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let b = self.bytes[self.curr];
        self.curr += 1;
        b
    }

    /// Peek at the current byte without consuming it.  Returns `0` if past EOF
    /// to avoid branching at call‑site.
    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.bytes[self.curr]
        }
    }

    /// Peek one byte beyond [`peek`].  Safe at EOF.
    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.len() {
            0
        } else {
            self.bytes[self.curr + 1]
        }
    }

    /// Conditionally consume a byte **iff** it matches `expected`.
    /// Returns `true` on success so callers can branch inline without an else.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Pick `double` when the next byte is `=`, else `single`.
    #[inline(always)]
    fn with_equal(&mut self, double: TokenType, single: TokenType) -> TokenType {
        if self.match_byte(b'=') {
            double
        } else {
            single
        }
    }

    // ───────────────────────────── core lexing ─────────────────────────────

    /// Scan a *single* token starting at `self.curr`.  If the lexeme produces an
    /// actual token the kind is stored in `self.pending`.  Whitespace and
    /// comments are skipped by returning `Ok(())` with `pending = None`.
    fn scan_token(&mut self) -> Result<()> {
        let b = self.advance();

        match b {
            // ── single‑character punctuators ──────────────────────────────
            b'(' => self.pending = Some(TokenType::LEFT_PAREN),
            b')' => self.pending = Some(TokenType::RIGHT_PAREN),
            b'{' => self.pending = Some(TokenType::LEFT_BRACE),
            b'}' => self.pending = Some(TokenType::RIGHT_BRACE),
            b',' => self.pending = Some(TokenType::COMMA),
            b'.' => self.pending = Some(TokenType::DOT),
            b'-' => self.pending = Some(TokenType::MINUS),
            b'+' => self.pending = Some(TokenType::PLUS),
            b';' => self.pending = Some(TokenType::SEMICOLON),
            b'*' => self.pending = Some(TokenType::STAR),

            // ── two‑character operators (!=, ==, <=, >=) ─────────────────
            b'!' => {
                let tt = self.with_equal(TokenType::BANG_EQUAL, TokenType::BANG);
                self.pending = Some(tt);
            }

            b'=' => {
                let tt = self.with_equal(TokenType::EQUAL_EQUAL, TokenType::EQUAL);
                self.pending = Some(tt);
            }

            b'<' => {
                let tt = self.with_equal(TokenType::LESS_EQUAL, TokenType::LESS);
                self.pending = Some(tt);
            }

            b'>' => {
                let tt = self.with_equal(TokenType::GREATER_EQUAL, TokenType::GREATER);
                self.pending = Some(tt);
            }

            // ── whitespace / newline ─────────────────────────────────────
            b' ' | b'\r' | b'\t' => {
                return Ok(()); // skip insignificants
            }

            b'\n' => {
                self.line += 1; // track for diagnostics

                return Ok(());
            }

            // ── comments (// … until newline) ────────────────────────────
            b'/' => {
                if self.match_byte(b'/') {
                    // Fast‑forward to the next newline, leaving it for the
                    // line counter.  If none found, skip to EOF.
                    if let Some(pos) = memchr(b'\n', &self.bytes[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.len();
                    }

                    return Ok(());
                }

                self.pending = Some(TokenType::SLASH);
            }

            // ── string literal " … " ─────────────────────────────────––
            b'"' => {
                return self.parse_string();
            }

            // ── number literal (digit‑leading) ───────────────────────────
            b'0'..=b'9' => {
                self.parse_number();
            }

            // ── identifiers / keywords (alpha or underscore‑leading) ─────
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            // ── unexpected character ─────────────────────────────────────
            _ => {
                // Consume the whole character so multi‑byte input reports once.
                let c: char = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.curr = self.start + c.len_utf8();

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", c),
                ));
            }
        }

        Ok(())
    }

    /// Parse a double‑quoted string literal.
    ///
    /// * `self.start` still points to the opening `"`.
    /// * When we return, `self.curr` points **past** the closing `"`.
    fn parse_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.advance() == b'\n' {
                self.line += 1; // support multi‑line strings (allowed in Lox)
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.advance(); // consume closing quote

        // Slice excluding the surrounding quotes.
        let s: &str = &self.src[self.start + 1..self.curr - 1];

        self.pending = Some(TokenType::STRING(s.to_owned()));

        Ok(())
    }

    /// Parse a numeric literal (`123`, `3.14`).  Fractions are optional.
    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // Optional fractional part.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume "."

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let s: &str = &self.src[self.start..self.curr];
        let n: f64 = s.parse::<f64>().unwrap_or(0.0); // parse never fails (checked digits)
        self.pending = Some(TokenType::NUMBER(n));
    }

    /// Parse an identifier and decide if it is a **keyword** or a generic
    /// `IDENTIFIER` token.
    fn parse_identifier(&mut self) {
        while {
            let c: u8 = self.peek();
            c.is_ascii_alphanumeric() || c == b'_'
        } {
            self.advance();
        }

        let slice: &[u8] = &self.bytes[self.start..self.curr];

        let tt: TokenType = KEYWORDS
            .get(slice)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.pending = Some(tt);
    }
}

// ───────────────────────── Iterator implementation ─────────────────────────

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>; // alias = Result<T, LoxError>

    fn next(&mut self) -> Option<Self::Item> {
        // Loop until we either emit a token, hit EOF, or see an error.
        while self.curr <= self.len() {
            // 1. EOF guard – emit exactly one EOF then terminate.
            if self.curr == self.len() {
                self.curr += 1; // ensure fused semantics
                return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
            }

            // 2. Reset per‑token state.
            self.start = self.curr;
            self.pending = None;

            // 3. Attempt to scan a token.
            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            // 4. If a real token was recognised, build and return it.
            if let Some(tt) = self.pending.take() {
                let lex: &str = &self.src[self.start..self.curr];
                debug!("Scanned token ({:?}) on line {}", tt, self.line);

                return Some(Ok(Token::new(tt, lex, self.line)));
            }
            // Otherwise it was whitespace / comment → continue loop.
        }

        None // already yielded EOF
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan all of `src`, returning every token (ending with `EOF`) alongside
/// every lexical error, each list in source order.
pub fn scan_tokens(src: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for item in Scanner::new(src) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    info!(
        "Scanned {} token(s) with {} error(s)",
        tokens.len(),
        errors.len()
    );

    (tokens, errors)
}
