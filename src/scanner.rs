use std::iter::FusedIterator;

use log::debug;
use phf::phf_map;

use crate::error::LoxError;
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and" => TokenType::AND,
    b"class" => TokenType::CLASS,
    b"else" => TokenType::ELSE,
    b"false" => TokenType::FALSE,
    b"fun" => TokenType::FUN,
    b"for" => TokenType::FOR,
    b"if" => TokenType::IF,
    b"nil" => TokenType::NIL,
    b"or" => TokenType::OR,
    b"print" => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super" => TokenType::SUPER,
    b"this" => TokenType::THIS,
    b"true" => TokenType::TRUE,
    b"var" => TokenType::VAR,
    b"while" => TokenType::WHILE,
};

/// Single-pass scanner over the raw source bytes.
///
/// Yields `Result<Token, LoxError>` so the driver can feed errors to the
/// `Reporter` and keep scanning; the final item is always the `EOF` token.
#[derive(Debug, Clone)]
pub struct Scanner<'src> {
    source: &'src [u8],
    start: usize,
    current: usize,
    line: usize,
    // line of the first character of the lexeme being scanned
    token_line: usize,
    pending_token: Option<TokenType>,
    eof_emitted: bool,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src [u8]) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
            token_line: 1,
            pending_token: None,
            eof_emitted: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    fn scan_token(&mut self) -> Result<(), LoxError> {
        let byte: u8 = self.advance();

        match byte {
            b'(' => self.add_token(TokenType::LEFT_PAREN),

            b')' => self.add_token(TokenType::RIGHT_PAREN),

            b'{' => self.add_token(TokenType::LEFT_BRACE),

            b'}' => self.add_token(TokenType::RIGHT_BRACE),

            b',' => self.add_token(TokenType::COMMA),

            b'.' => self.add_token(TokenType::DOT),

            b'-' => self.add_token(TokenType::MINUS),

            b'+' => self.add_token(TokenType::PLUS),

            b';' => self.add_token(TokenType::SEMICOLON),

            b'*' => self.add_token(TokenType::STAR),

            b'?' => self.add_token(TokenType::QUESTION),

            b':' => self.add_token(TokenType::COLON),

            b'!' => {
                let token_type = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };
                self.add_token(token_type);
            }

            b'=' => {
                let token_type = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };
                self.add_token(token_type);
            }

            b'<' => {
                let token_type = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };
                self.add_token(token_type);
            }

            b'>' => {
                let token_type = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };
                self.add_token(token_type);
            }

            b' ' | b'\r' | b'\t' => {}

            b'\n' => {
                self.line += 1;
            }

            b'/' => {
                if self.match_byte(b'/') {
                    // comment runs to end of line
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            b'"' => {
                self.parse_string()?;
            }

            b'0'..=b'9' => {
                self.parse_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.parse_identifier();
            }

            _ => {
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", byte as char),
                ));
            }
        }

        Ok(())
    }

    fn parse_string(&mut self) -> Result<(), LoxError> {
        while !self.is_at_end() && self.peek() != b'"' {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        // closing quote
        self.advance();

        let literal: String = unsafe {
            String::from_utf8_unchecked(self.source[self.start + 1..self.current - 1].to_vec())
        };

        self.add_token(TokenType::STRING(literal));

        Ok(())
    }

    fn parse_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // consume the '.' only when a digit follows; "123." is NUMBER then DOT
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme: &str =
            unsafe { std::str::from_utf8_unchecked(&self.source[self.start..self.current]) };

        let number: f64 = lexeme.parse().unwrap_or(0.0);

        self.add_token(TokenType::NUMBER(number));
    }

    fn parse_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text: &[u8] = &self.source[self.start..self.current];

        match KEYWORDS.get(text) {
            Some(token_type) => self.add_token(token_type.clone()),
            None => self.add_token(TokenType::IDENTIFIER),
        }
    }

    #[inline]
    fn add_token(&mut self, token_type: TokenType) {
        self.pending_token = Some(token_type);
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        let byte = self.source[self.current];
        self.current += 1;
        byte
    }

    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.len()
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_at_end() {
            if !self.eof_emitted {
                self.eof_emitted = true;
                return Some(Ok(Token::new(TokenType::EOF, String::new(), self.line)));
            }

            return None;
        }

        self.pending_token = None;
        self.start = self.current;
        self.token_line = self.line;

        if let Err(e) = self.scan_token() {
            debug!("scan error: {e}");
            return Some(Err(e));
        }

        if let Some(token_type) = self.pending_token.take() {
            let lexeme: &str =
                unsafe { std::str::from_utf8_unchecked(&self.source[self.start..self.current]) };

            Some(Ok(Token::new(
                token_type,
                lexeme.to_string(),
                self.token_line,
            )))
        } else {
            // whitespace or comment; keep going
            self.next()
        }
    }
}

impl FusedIterator for Scanner<'_> {}
