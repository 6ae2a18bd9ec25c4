//! Tokenizer for the scene-description language.
//!
//! The lexer reads characters one at a time, tracking the source
//! location of everything it produces so grammar errors can point at
//! the offending file, line and column. Filenames live in a
//! process-wide registry and tokens only carry an index into it.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use thiserror::Error;

/// Symbols accepted by the grammar.
const SYMBOLS: &str = ",()[]<>*";

static FILES: OnceLock<Mutex<Vec<String>>> = OnceLock::new();

/// Process-wide, append-only table of source filenames.
///
/// Registering the same name twice returns the original index.
pub struct FileRegistry;

impl FileRegistry {
    pub fn register(file_name: &str) -> usize {
        let mut files = FILES
            .get_or_init(|| Mutex::new(Vec::new()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(index) = files.iter().position(|f| f == file_name) {
            return index;
        }
        files.push(file_name.to_string());
        files.len() - 1
    }

    pub fn get(index: usize) -> Option<String> {
        let files = FILES
            .get()?
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        files.get(index).cloned()
    }
}

/// A position in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub file_index: Option<usize>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file_index: Option<usize>, line: u32, column: u32) -> Self {
        Self {
            file_index,
            line,
            column,
        }
    }

    pub fn file_name(&self) -> String {
        self.file_index
            .and_then(FileRegistry::get)
            .unwrap_or_default()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_name(), self.line, self.column)
    }
}

/// An error in the scene text, anchored to a source location.
#[derive(Error, Debug, Clone)]
#[error("{location}: {message}")]
pub struct GrammarError {
    pub location: SourceLocation,
    pub message: String,
}

impl GrammarError {
    pub fn new(location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

/// The reserved words of the scene language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    New,
    Float,
    // transformations
    Identity,
    Translation,
    RotationX,
    RotationY,
    RotationZ,
    Scaling,
    // cameras
    Camera,
    Orthogonal,
    Perspective,
    // shapes and lights
    Sphere,
    Plane,
    PointLight,
    // materials and textures
    Material,
    Uniform,
    Checkered,
    Image,
    Diffuse,
    Specular,
}

impl Keyword {
    pub fn from_identifier(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "new" => Keyword::New,
            "float" => Keyword::Float,
            "identity" => Keyword::Identity,
            "translation" => Keyword::Translation,
            "rotationX" => Keyword::RotationX,
            "rotationY" => Keyword::RotationY,
            "rotationZ" => Keyword::RotationZ,
            "scaling" => Keyword::Scaling,
            "camera" => Keyword::Camera,
            "orthogonal" => Keyword::Orthogonal,
            "perspective" => Keyword::Perspective,
            "sphere" => Keyword::Sphere,
            "plane" => Keyword::Plane,
            "pointLight" => Keyword::PointLight,
            "material" => Keyword::Material,
            "uniform" => Keyword::Uniform,
            "checkered" => Keyword::Checkered,
            "image" => Keyword::Image,
            "diffuse" => Keyword::Diffuse,
            "specular" => Keyword::Specular,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::New => "new",
            Keyword::Float => "float",
            Keyword::Identity => "identity",
            Keyword::Translation => "translation",
            Keyword::RotationX => "rotationX",
            Keyword::RotationY => "rotationY",
            Keyword::RotationZ => "rotationZ",
            Keyword::Scaling => "scaling",
            Keyword::Camera => "camera",
            Keyword::Orthogonal => "orthogonal",
            Keyword::Perspective => "perspective",
            Keyword::Sphere => "sphere",
            Keyword::Plane => "plane",
            Keyword::PointLight => "pointLight",
            Keyword::Material => "material",
            Keyword::Uniform => "uniform",
            Keyword::Checkered => "checkered",
            Keyword::Image => "image",
            Keyword::Diffuse => "diffuse",
            Keyword::Specular => "specular",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexical element of the scene language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(String),
    StringLiteral(String),
    NumberLiteral(f32),
    Symbol(char),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(keyword) => write!(f, "\"{}\"", keyword),
            TokenKind::Identifier(name) => write!(f, "\"{}\"", name),
            TokenKind::StringLiteral(value) => write!(f, "\"{}\"", value),
            TokenKind::NumberLiteral(value) => write!(f, "{}", value),
            TokenKind::Symbol(symbol) => write!(f, "'{}'", symbol),
            TokenKind::Eof => write!(f, "<EOF>"),
        }
    }
}

/// A token together with where it starts in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

/// Character reader over a scene source, with location tracking and
/// one-token pushback.
pub struct InputStream {
    chars: Vec<char>,
    pos: usize,
    pub location: SourceLocation,
    saved_location: SourceLocation,
    saved_token: Option<Token>,
    tab_width: u32,
}

impl InputStream {
    /// Wrap `text`, registering `file_name` for error reporting.
    pub fn new(text: &str, file_name: &str) -> Self {
        Self::with_file_index(text, FileRegistry::register(file_name))
    }

    pub fn with_file_index(text: &str, file_index: usize) -> Self {
        let location = SourceLocation::new(Some(file_index), 1, 1);
        Self {
            chars: text.chars().collect(),
            pos: 0,
            location,
            saved_location: location,
            saved_token: None,
            tab_width: 4,
        }
    }

    /// Read the next character, advancing the location. `None` at end
    /// of input.
    pub fn read(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        self.saved_location = self.location;
        self.update_location(c);
        Some(c)
    }

    /// Step back over the last character read. Only one step is
    /// remembered.
    pub fn unread(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
            self.location = self.saved_location;
        }
    }

    /// Look at the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn update_location(&mut self, c: char) {
        match c {
            '\n' => {
                self.location.line += 1;
                self.location.column = 1;
            }
            '\t' => self.location.column += self.tab_width,
            _ => self.location.column += 1,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\n' | '\r' => {
                    self.read();
                }
                '#' => {
                    // comments run to the end of the line
                    while let Some(c) = self.read() {
                        if c == '\n' || c == '\r' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Read the next token, skipping whitespace and comments.
    pub fn read_token(&mut self) -> Result<Token, GrammarError> {
        if let Some(token) = self.saved_token.take() {
            return Ok(token);
        }

        self.skip_whitespace_and_comments();
        let location = self.location;

        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                location,
            });
        };

        if SYMBOLS.contains(c) {
            self.read();
            Ok(Token {
                kind: TokenKind::Symbol(c),
                location,
            })
        } else if c == '"' {
            self.read();
            self.read_string_token(location)
        } else if c.is_ascii_digit() || c == '-' {
            self.read_number_token(location)
        } else if c.is_ascii_alphabetic() {
            Ok(self.read_identifier_or_keyword(location))
        } else {
            self.read();
            Err(GrammarError::new(
                location,
                format!("invalid character '{}'", c),
            ))
        }
    }

    /// Put a token back; the next `read_token` returns it again. At
    /// most one token can be pending.
    pub fn unread_token(&mut self, token: Token) {
        debug_assert!(self.saved_token.is_none(), "a token is already unread");
        self.saved_token = Some(token);
    }

    fn read_identifier_or_keyword(&mut self, location: SourceLocation) -> Token {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            word.push(c);
            self.read();
        }

        let kind = match Keyword::from_identifier(&word) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(word),
        };
        Token { kind, location }
    }

    fn read_string_token(&mut self, location: SourceLocation) -> Result<Token, GrammarError> {
        let mut value = String::new();
        loop {
            match self.read() {
                Some('"') => break,
                Some(c) => value.push(c),
                None => return Err(GrammarError::new(location, "unterminated string")),
            }
        }
        Ok(Token {
            kind: TokenKind::StringLiteral(value),
            location,
        })
    }

    fn read_number_token(&mut self, location: SourceLocation) -> Result<Token, GrammarError> {
        let mut literal = String::new();

        // only a leading minus belongs to the number
        if self.peek() == Some('-') {
            literal.push('-');
            self.read();
        }

        let mut seen_dot = false;
        let mut seen_exponent = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => {
                    literal.push(c);
                    self.read();
                }
                '.' => {
                    if seen_dot {
                        return Err(GrammarError::new(
                            self.location,
                            "too many '.' in number literal",
                        ));
                    }
                    seen_dot = true;
                    literal.push(c);
                    self.read();
                }
                'e' | 'E' => {
                    if seen_exponent {
                        return Err(GrammarError::new(
                            self.location,
                            "too many exponents in number literal",
                        ));
                    }
                    seen_exponent = true;
                    literal.push(c);
                    self.read();
                    // one optional sign directly after the exponent
                    if let Some(sign) = self.peek() {
                        if sign == '+' || sign == '-' {
                            literal.push(sign);
                            self.read();
                        }
                    }
                }
                _ => break,
            }
        }

        match literal.parse::<f32>() {
            Ok(number) if number.is_finite() => Ok(Token {
                kind: TokenKind::NumberLiteral(number),
                location,
            }),
            Ok(_) => Err(GrammarError::new(
                location,
                format!("\"{}\" is out of float range", literal),
            )),
            Err(_) => Err(GrammarError::new(
                location,
                format!("\"{}\" is not a valid number", literal),
            )),
        }
    }
}
