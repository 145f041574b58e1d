//! Tokenizer for ASCII scene layers

use crate::error::IoError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifiers and keywords; namespaced names keep their `:` separators
    Ident(String),
    Number { value: f64, integral: bool },
    String(String),
    Asset(String),
    Path(String),
    Punct(char),
    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("`{}`", s),
            Token::Number { value, .. } => format!("number {}", value),
            Token::String(s) => format!("string {:?}", s),
            Token::Asset(s) => format!("asset @{}@", s),
            Token::Path(s) => format!("path <{}>", s),
            Token::Punct(c) => format!("`{}`", c),
            Token::Eof => "end of file".to_string(),
        }
    }
}

/// A token with the 1-based position where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

const PUNCTUATION: &[char] = &['(', ')', '[', ']', '{', '}', '=', ',', ';', ':', '.'];

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input; the last token is always [`Token::Eof`]
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, IoError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned, IoError> {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);
        let token = match self.chars.peek().copied() {
            None => Token::Eof,
            Some('"') | Some('\'') => self.string()?,
            Some('@') => self.asset()?,
            Some('<') => self.path()?,
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' => self.number()?,
            Some(c) if c.is_alphabetic() || c == '_' || c == '!' => self.ident(),
            Some(c) if PUNCTUATION.contains(&c) => {
                self.bump();
                Token::Punct(c)
            }
            Some(c) => {
                return Err(IoError::parse(line, column, format!("unexpected character {:?}", c)))
            }
        };
        Ok(Spanned { token, line, column })
    }

    fn ident(&mut self) -> Token {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            // `!` covers op-order markers such as `!invert!`
            if c.is_alphanumeric() || c == '_' || c == ':' || c == '!' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token::Ident(text)
    }

    fn number(&mut self) -> Result<Token, IoError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        if let Some(&sign) = self.chars.peek() {
            if sign == '-' || sign == '+' {
                text.push(sign);
                self.bump();
            }
        }
        // `-inf` and friends
        if self.chars.peek().is_some_and(|c| c.is_alphabetic()) {
            if let Token::Ident(word) = self.ident() {
                text.push_str(&word);
            }
            return Ok(Token::Ident(text));
        }

        let mut integral = true;
        while let Some(&c) = self.chars.peek() {
            let exponent_sign = (c == '-' || c == '+') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || exponent_sign {
                text.push(c);
            } else if c == '.' || c == 'e' || c == 'E' {
                integral = false;
                text.push(c);
            } else {
                break;
            }
            self.bump();
        }

        text.parse::<f64>()
            .map(|value| Token::Number { value, integral })
            .map_err(|_| IoError::parse(line, column, format!("invalid number `{}`", text)))
    }

    fn string(&mut self) -> Result<Token, IoError> {
        let (line, column) = (self.line, self.column);
        let quote = self.bump().unwrap_or('"');

        let mut triple = false;
        if self.chars.peek() == Some(&quote) {
            self.bump();
            if self.chars.peek() == Some(&quote) {
                self.bump();
                triple = true;
            } else {
                return Ok(Token::String(String::new()));
            }
        }

        let mut text = String::new();
        loop {
            let c = self
                .bump()
                .ok_or_else(|| IoError::parse(line, column, "unterminated string"))?;
            match c {
                '\\' => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(other) => text.push(other),
                    None => return Err(IoError::parse(line, column, "unterminated string")),
                },
                '\n' if !triple => {
                    return Err(IoError::parse(line, column, "newline in string"));
                }
                c if c == quote && !triple => return Ok(Token::String(text)),
                c if c == quote => {
                    if self.chars.peek() == Some(&quote) {
                        self.bump();
                        if self.chars.peek() == Some(&quote) {
                            self.bump();
                            return Ok(Token::String(text));
                        }
                        text.push(quote);
                    }
                    text.push(quote);
                }
                c => text.push(c),
            }
        }
    }

    fn asset(&mut self) -> Result<Token, IoError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.delimited('@')
            .map(Token::Asset)
            .ok_or_else(|| IoError::parse(line, column, "unterminated asset path"))
    }

    fn path(&mut self) -> Result<Token, IoError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        self.delimited('>')
            .map(Token::Path)
            .ok_or_else(|| IoError::parse(line, column, "unterminated path"))
    }

    fn delimited(&mut self, close: char) -> Option<String> {
        let mut text = String::new();
        loop {
            match self.bump()? {
                '\n' => return None,
                c if c == close => return Some(text),
                c => text.push(c),
            }
        }
    }
}
