//! Tokenizer for the algebra's surface syntax.
//!
//! Single pass, left to right, with two-character lookahead so digraphs win
//! over their single-character prefixes: `*:` is always one token, never `*`
//! then `:`. Every token carries its (line, column) origin.

use crate::error::{Error, Result};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals and identifiers
    Integer(i64),
    Decimal(Decimal),
    Str(String),
    Boolean(bool),
    Ident(String),

    // Single-character operators
    Question,  // ?   filter / ternary
    Hash,      // #   project
    Star,      // *   natural join / multiply
    At,        // @   rename
    Plus,      // +   extend / add
    Minus,     // -   difference / descending / subtract
    Pipe,      // |   union / OR
    Ampersand, // &   intersect / AND
    Slash,     // /   summarize / divide
    Dollar,    // $   sort
    Caret,     // ^   take
    Gt,        // >   greater / rename arrow / nest name
    Lt,        // <   less
    Eq,        // =   equality
    Tilde,     // ~   regex match (reserved)

    // Digraph operators
    QuestionBang, // ?!  negated filter
    QuestionEq,   // ?=  update (reserved)
    StarColon,    // *:  nest join
    LtColon,      // <:  unnest
    SlashDot,     // /.  summarize all
    SlashColon,   // /:  nest by
    HashDot,      // #.  count aggregate
    HashBang,     // #!  remove
    PlusDot,      // +.  sum aggregate
    PlusColon,    // +:  modify (reserved)
    GtDot,        // >.  max aggregate
    LtDot,        // <.  min aggregate
    PercentDot,   // %.  mean aggregate
    ColonEq,      // :=  assign
    ColonColon,   // ::  type check (reserved)
    PipeEq,       // |=  insert (reserved)
    MinusEq,      // -=  delete (reserved)
    BangEq,       // !=  not equal
    BangTilde,    // !~  regex non-match (reserved)
    GtEq,         // >=
    LtEq,         // <=

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Colon,
    Dot,
    Comma,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        match self {
            Integer(i) => write!(f, "{}", i),
            Decimal(d) => write!(f, "{}", d),
            Str(s) => write!(f, "\"{}\"", s),
            Boolean(b) => write!(f, "{}", b),
            Ident(name) => write!(f, "{}", name),
            Question => write!(f, "?"),
            Hash => write!(f, "#"),
            Star => write!(f, "*"),
            At => write!(f, "@"),
            Plus => write!(f, "+"),
            Minus => write!(f, "-"),
            Pipe => write!(f, "|"),
            Ampersand => write!(f, "&"),
            Slash => write!(f, "/"),
            Dollar => write!(f, "$"),
            Caret => write!(f, "^"),
            Gt => write!(f, ">"),
            Lt => write!(f, "<"),
            Eq => write!(f, "="),
            Tilde => write!(f, "~"),
            QuestionBang => write!(f, "?!"),
            QuestionEq => write!(f, "?="),
            StarColon => write!(f, "*:"),
            LtColon => write!(f, "<:"),
            SlashDot => write!(f, "/."),
            SlashColon => write!(f, "/:"),
            HashDot => write!(f, "#."),
            HashBang => write!(f, "#!"),
            PlusDot => write!(f, "+."),
            PlusColon => write!(f, "+:"),
            GtDot => write!(f, ">."),
            LtDot => write!(f, "<."),
            PercentDot => write!(f, "%."),
            ColonEq => write!(f, ":="),
            ColonColon => write!(f, "::"),
            PipeEq => write!(f, "|="),
            MinusEq => write!(f, "-="),
            BangEq => write!(f, "!="),
            BangTilde => write!(f, "!~"),
            GtEq => write!(f, ">="),
            LtEq => write!(f, "<="),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            LBracket => write!(f, "["),
            RBracket => write!(f, "]"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            Colon => write!(f, ":"),
            Dot => write!(f, "."),
            Comma => write!(f, ","),
            Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Tokenizes source text into a vector of tokens ending with `Eof`.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }

    fn err(&self, message: impl Into<String>, line: usize, column: usize) -> Error {
        Error::Lex {
            message: message.into(),
            line,
            column,
        }
    }

    /// Skip whitespace and `--` line comments.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek(0) {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '-' && self.peek(1) == Some('-') {
                while let Some(c) = self.peek(0) {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, line: usize, column: usize) -> Token {
        Token { kind, line, column }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();

        let line = self.line;
        let column = self.column;
        let Some(ch) = self.peek(0) else {
            return Ok(self.token(TokenKind::Eof, line, column));
        };
        let ch2 = self.peek(1);

        // Digraphs first: two-character lookahead decides.
        if let Some(kind) = digraph(ch, ch2) {
            self.advance();
            self.advance();
            return Ok(self.token(kind, line, column));
        }

        // A minus immediately followed by a digit starts a negative number.
        if ch == '-' {
            if let Some(next) = ch2 {
                if next.is_ascii_digit() {
                    self.advance();
                    return self.read_number(line, column, true);
                }
            }
        }

        if let Some(kind) = single(ch) {
            self.advance();
            return Ok(self.token(kind, line, column));
        }

        if ch == '"' {
            return self.read_string(line, column);
        }
        if ch.is_ascii_digit() {
            return self.read_number(line, column, false);
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(self.read_ident(line, column));
        }

        Err(self.err(format!("unexpected character {:?}", ch), line, column))
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<Token> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.peek(0) {
                None => return Err(self.err("unterminated string literal", line, column)),
                Some('"') => {
                    self.advance();
                    return Ok(self.token(TokenKind::Str(text), line, column));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek(0) {
                        None => {
                            return Err(self.err("unterminated string literal", line, column));
                        }
                        Some(esc) => {
                            self.advance();
                            text.push(match esc {
                                'n' => '\n',
                                't' => '\t',
                                other => other, // includes \" and \\
                            });
                        }
                    }
                }
                Some(_) => text.push(self.advance()),
            }
        }
    }

    fn read_number(&mut self, line: usize, column: usize, negative: bool) -> Result<Token> {
        let mut text = String::new();
        if negative {
            text.push('-');
        }
        while let Some(ch) = self.peek(0) {
            if ch.is_ascii_digit() {
                text.push(self.advance());
            } else {
                break;
            }
        }
        // A dot only belongs to the number when a digit follows; otherwise it
        // may open an operator like `#.` or a dotted attribute path.
        let mut is_decimal = false;
        if self.peek(0) == Some('.') {
            if let Some(next) = self.peek(1) {
                if next.is_ascii_digit() {
                    is_decimal = true;
                    text.push(self.advance());
                    while let Some(ch) = self.peek(0) {
                        if ch.is_ascii_digit() {
                            text.push(self.advance());
                        } else {
                            break;
                        }
                    }
                }
            }
        }
        if is_decimal {
            let value = Decimal::from_str(&text)
                .map_err(|_| self.err(format!("invalid number {:?}", text), line, column))?;
            Ok(self.token(TokenKind::Decimal(value), line, column))
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| self.err(format!("invalid number {:?}", text), line, column))?;
            Ok(self.token(TokenKind::Integer(value), line, column))
        }
    }

    fn read_ident(&mut self, line: usize, column: usize) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek(0) {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(self.advance());
            } else {
                break;
            }
        }
        let kind = match text.as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => TokenKind::Ident(text),
        };
        self.token(kind, line, column)
    }
}

fn digraph(first: char, second: Option<char>) -> Option<TokenKind> {
    use TokenKind::*;
    let second = second?;
    Some(match (first, second) {
        ('?', '!') => QuestionBang,
        ('?', '=') => QuestionEq,
        ('*', ':') => StarColon,
        ('<', ':') => LtColon,
        ('/', '.') => SlashDot,
        ('/', ':') => SlashColon,
        ('#', '.') => HashDot,
        ('#', '!') => HashBang,
        ('+', '.') => PlusDot,
        ('+', ':') => PlusColon,
        ('>', '.') => GtDot,
        ('<', '.') => LtDot,
        ('%', '.') => PercentDot,
        (':', '=') => ColonEq,
        (':', ':') => ColonColon,
        ('|', '=') => PipeEq,
        ('-', '=') => MinusEq,
        ('!', '=') => BangEq,
        ('!', '~') => BangTilde,
        ('>', '=') => GtEq,
        ('<', '=') => LtEq,
        _ => return None,
    })
}

fn single(ch: char) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ch {
        '?' => Question,
        '#' => Hash,
        '*' => Star,
        '@' => At,
        '+' => Plus,
        '-' => Minus,
        '|' => Pipe,
        '&' => Ampersand,
        '/' => Slash,
        '$' => Dollar,
        '^' => Caret,
        '>' => Gt,
        '<' => Lt,
        '=' => Eq,
        '~' => Tilde,
        '(' => LParen,
        ')' => RParen,
        '[' => LBracket,
        ']' => RBracket,
        '{' => LBrace,
        '}' => RBrace,
        ':' => Colon,
        '.' => Dot,
        ',' => Comma,
        _ => return None,
    })
}
