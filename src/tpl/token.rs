use crate::Result;
use crate::error::LiquidError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Dot,
    LeftBracket,
    RightBracket,
    Operator,
    Pipe,
    Colon,
    Comma,
    BooleanLiteral,
    IntegerLiteral,
    StringLiteral,
    Nil,
}

/// A token borrowed from the template source.
///
/// `offset` is the absolute byte offset in the template, not in the
/// `{{ }}` / `{% %}` span the token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

const PUNCTUATORS: [char; 4] = ['!', '<', '>', '='];

/// Splits the inside of a delimiter pair into tokens.
///
/// Every call scans from scratch; nothing is kept between calls.
pub struct Tokenizer<'a> {
    input: &'a str,
    base: usize,
    pos: usize,
    start: usize,
}

impl<'a> Tokenizer<'a> {
    /// `base` is the offset of `input` within the template source.
    pub fn new(input: &'a str, base: usize) -> Self {
        Self {
            input,
            base,
            pos: 0,
            start: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token<'a>>> {
        let mut tokens = Vec::new();
        self.read_spaces();
        while !self.at_end() {
            tokens.push(self.read()?);
        }
        Ok(tokens)
    }

    fn read(&mut self) -> Result<Token<'a>> {
        self.start = self.pos;

        let Some(c) = self.peek() else {
            return Err(LiquidError::tokenize(
                "Unexpected end of input",
                self.base + self.pos,
            ));
        };

        match c {
            '|' => Ok(self.single(TokenKind::Pipe)),
            ':' => Ok(self.single(TokenKind::Colon)),
            '.' => Ok(self.single(TokenKind::Dot)),
            ',' => Ok(self.single(TokenKind::Comma)),
            '[' => Ok(self.single(TokenKind::LeftBracket)),
            ']' => Ok(self.single(TokenKind::RightBracket)),
            '\'' | '"' => self.read_string_literal(c),
            c if c.is_ascii_digit() => Ok(self.read_integer_literal()),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_identifier()),
            c if PUNCTUATORS.contains(&c) => Ok(self.read_operator(c)),
            _ => Err(LiquidError::tokenize(
                "Tokenizer::read() : error",
                self.base + self.pos,
            )),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Skips whitespace up to, but not including, a newline.
    fn read_spaces(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() || c == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn produce(&mut self, kind: TokenKind) -> Token<'a> {
        let text = &self.input[self.start..self.pos];
        let token = Token {
            kind,
            text,
            offset: self.base + self.start,
        };
        self.read_spaces();
        token
    }

    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        self.bump();
        self.produce(kind)
    }

    fn read_identifier(&mut self) -> Token<'a> {
        while let Some(c) = self.peek() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            self.bump();
        }

        let mut token = self.produce(TokenKind::Identifier);
        match token.text {
            "or" | "and" => token.kind = TokenKind::Operator,
            "true" | "false" => token.kind = TokenKind::BooleanLiteral,
            _ => {}
        }
        token
    }

    fn read_integer_literal(&mut self) -> Token<'a> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.produce(TokenKind::IntegerLiteral)
    }

    fn read_string_literal(&mut self, quote: char) -> Result<Token<'a>> {
        self.bump();
        let Some(end) = self.input[self.pos..].find(quote) else {
            return Err(LiquidError::tokenize(
                "Malformed string literal",
                self.base + self.start,
            ));
        };
        self.pos += end + quote.len_utf8();
        Ok(self.produce(TokenKind::StringLiteral))
    }

    fn read_operator(&mut self, first: char) -> Token<'a> {
        self.bump();
        match (first, self.peek()) {
            ('<' | '>' | '=' | '!', Some('=')) | ('<', Some('>')) => {
                self.bump();
            }
            _ => {}
        }
        self.produce(TokenKind::Operator)
    }
}

/// Tokenizes a standalone string (offsets start at zero).
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>> {
    Tokenizer::new(input, 0).tokenize()
}
