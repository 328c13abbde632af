//! Script lexer - turns source text into a token stream

use crate::error::{syntax_error, unexpected_eof, unterminated};
use core_types::{JsError, SourcePosition};

/// Reserved words of the script language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// var keyword
    Var,
    /// let keyword
    Let,
    /// const keyword
    Const,
    /// function keyword
    Function,
    /// return keyword
    Return,
    /// if keyword
    If,
    /// else keyword
    Else,
    /// while keyword
    While,
    /// for keyword
    For,
    /// break keyword
    Break,
    /// continue keyword
    Continue,
    /// new keyword
    New,
    /// this keyword
    This,
    /// typeof keyword
    Typeof,
    /// void keyword
    Void,
    /// delete keyword
    Delete,
    /// instanceof keyword
    Instanceof,
    /// in keyword
    In,
    /// try keyword
    Try,
    /// catch keyword
    Catch,
    /// finally keyword
    Finally,
    /// throw keyword
    Throw,
    /// true literal
    True,
    /// false literal
    False,
    /// null literal
    Null,
    // 'undefined' and 'of' are plain identifiers
}

impl Keyword {
    fn from_identifier(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "var" => Keyword::Var,
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "new" => Keyword::New,
            "this" => Keyword::This,
            "typeof" => Keyword::Typeof,
            "void" => Keyword::Void,
            "delete" => Keyword::Delete,
            "instanceof" => Keyword::Instanceof,
            "in" => Keyword::In,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "throw" => Keyword::Throw,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            _ => return None,
        };
        Some(keyword)
    }

    /// Source spelling of the keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Var => "var",
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::New => "new",
            Keyword::This => "this",
            Keyword::Typeof => "typeof",
            Keyword::Void => "void",
            Keyword::Delete => "delete",
            Keyword::Instanceof => "instanceof",
            Keyword::In => "in",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::Throw => "throw",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
        }
    }
}

/// Operators and delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ;
    Semicolon,
    /// ,
    Comma,
    /// .
    Dot,
    /// :
    Colon,
    /// ?
    Question,
    /// =
    Assign,
    /// =>
    Arrow,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// ==
    EqEq,
    /// ===
    EqEqEq,
    /// !=
    NotEq,
    /// !==
    NotEqEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// &&
    AndAnd,
    /// ||
    OrOr,
    /// ??
    NullishCoalesce,
    /// !
    Not,
    /// +=
    PlusEq,
    /// -=
    MinusEq,
    /// *=
    StarEq,
    /// /=
    SlashEq,
    /// %=
    PercentEq,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
}

/// One piece of a template literal
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text between substitutions (escapes already applied)
    Text(String),
    /// Raw source of a `${...}` substitution
    Substitution(String),
}

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier (variable name, property name, ...)
    Identifier(String),
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Template literal
    Template(Vec<TemplatePart>),
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// End of input
    EOF,
}

impl Token {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::Number(n) => format!("number {}", n),
            Token::String(_) => "string".to_string(),
            Token::Template(_) => "template literal".to_string(),
            Token::Keyword(k) => format!("'{}'", k.as_str()),
            Token::Punctuator(p) => format!("{:?}", p),
            Token::EOF => "end of input".to_string(),
        }
    }
}

/// A token with its location
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token
    pub token: Token,
    /// Where the token starts
    pub position: SourcePosition,
    /// Whether a line terminator preceded the token (for ASI)
    pub newline_before: bool,
}

/// Lexer for script source code
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Self {
            source,
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        };
        lexer.skip_hashbang();
        lexer
    }

    /// The source this lexer reads.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Tokenizes the whole input. The last token is always [`Token::EOF`].
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, JsError> {
        let mut tokens = Vec::new();
        loop {
            let newline_before = self.skip_whitespace_and_comments()?;
            let position = self.current_position();
            if self.is_at_end() {
                tokens.push(SpannedToken {
                    token: Token::EOF,
                    position,
                    newline_before,
                });
                return Ok(tokens);
            }
            let token = self.scan_token(&position)?;
            tokens.push(SpannedToken {
                token,
                position,
                newline_before,
            });
        }
    }

    fn skip_hashbang(&mut self) {
        if self.peek() == Some('#') && self.peek_at(1) == Some('!') {
            while let Some(c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek_at(&self, distance: usize) -> Option<char> {
        self.chars.get(self.position + distance).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column, self.position)
    }

    /// Skips whitespace and comments, reporting whether a newline was crossed.
    fn skip_whitespace_and_comments(&mut self) -> Result<bool, JsError> {
        let mut newline = false;
        while let Some(c) = self.peek() {
            match c {
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => {
                    newline = true;
                    self.advance();
                }
                c if c.is_whitespace() || c == '\u{feff}' => {
                    self.advance();
                }
                '/' if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                '/' if self.peek_at(1) == Some('*') => {
                    let start = self.current_position();
                    self.advance();
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some('\n') => newline = true,
                            Some(_) => {}
                            None => {
                                return Err(unterminated("comment", &start))
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(newline)
    }

    fn scan_token(&mut self, start: &SourcePosition) -> Result<Token, JsError> {
        let ch = match self.advance() {
            Some(ch) => ch,
            None => return Err(unexpected_eof(Some(start.clone()))),
        };
        let punct = |p| Ok(Token::Punctuator(p));

        match ch {
            '(' => punct(Punctuator::LParen),
            ')' => punct(Punctuator::RParen),
            '{' => punct(Punctuator::LBrace),
            '}' => punct(Punctuator::RBrace),
            '[' => punct(Punctuator::LBracket),
            ']' => punct(Punctuator::RBracket),
            ';' => punct(Punctuator::Semicolon),
            ',' => punct(Punctuator::Comma),
            ':' => punct(Punctuator::Colon),
            '.' => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_number('.', start)
                } else {
                    punct(Punctuator::Dot)
                }
            }
            '?' => {
                if self.match_char('?') {
                    punct(Punctuator::NullishCoalesce)
                } else {
                    punct(Punctuator::Question)
                }
            }
            '=' => {
                if self.match_char('>') {
                    punct(Punctuator::Arrow)
                } else if self.match_char('=') {
                    if self.match_char('=') {
                        punct(Punctuator::EqEqEq)
                    } else {
                        punct(Punctuator::EqEq)
                    }
                } else {
                    punct(Punctuator::Assign)
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        punct(Punctuator::NotEqEq)
                    } else {
                        punct(Punctuator::NotEq)
                    }
                } else {
                    punct(Punctuator::Not)
                }
            }
            '+' => {
                if self.match_char('+') {
                    punct(Punctuator::PlusPlus)
                } else if self.match_char('=') {
                    punct(Punctuator::PlusEq)
                } else {
                    punct(Punctuator::Plus)
                }
            }
            '-' => {
                if self.match_char('-') {
                    punct(Punctuator::MinusMinus)
                } else if self.match_char('=') {
                    punct(Punctuator::MinusEq)
                } else {
                    punct(Punctuator::Minus)
                }
            }
            '*' => {
                if self.match_char('=') {
                    punct(Punctuator::StarEq)
                } else {
                    punct(Punctuator::Star)
                }
            }
            '/' => {
                if self.match_char('=') {
                    punct(Punctuator::SlashEq)
                } else {
                    punct(Punctuator::Slash)
                }
            }
            '%' => {
                if self.match_char('=') {
                    punct(Punctuator::PercentEq)
                } else {
                    punct(Punctuator::Percent)
                }
            }
            '<' => {
                if self.match_char('=') {
                    punct(Punctuator::LtEq)
                } else {
                    punct(Punctuator::Lt)
                }
            }
            '>' => {
                if self.match_char('=') {
                    punct(Punctuator::GtEq)
                } else {
                    punct(Punctuator::Gt)
                }
            }
            '&' if self.match_char('&') => punct(Punctuator::AndAnd),
            '|' if self.match_char('|') => punct(Punctuator::OrOr),
            '"' | '\'' => self.scan_string(ch, start),
            '`' => self.scan_template(start),
            c if c.is_ascii_digit() => self.scan_number(c, start),
            c if is_id_start(c) => Ok(self.scan_identifier(c)),
            _ => Err(syntax_error(
                format!("Unexpected character: '{}'", ch),
                Some(start.clone()),
            )),
        }
    }

    fn scan_string(&mut self, quote: char, start: &SourcePosition) -> Result<Token, JsError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(unterminated("string", &start))
                }
                Some(c) if c == quote => return Ok(Token::String(value)),
                Some('\\') => self.scan_escape(&mut value, start)?,
                Some(c) => value.push(c),
            }
        }
    }

    fn scan_escape(&mut self, out: &mut String, start: &SourcePosition) -> Result<(), JsError> {
        let escaped = self
            .advance()
            .ok_or_else(|| unterminated("string", &start))?;
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = self.scan_hex_digits(2, start)?;
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            'u' => {
                let code = if self.match_char('{') {
                    let mut code = 0u32;
                    loop {
                        match self.advance() {
                            Some('}') => break,
                            Some(c) if c.is_ascii_hexdigit() => {
                                code = code
                                    .checked_mul(16)
                                    .and_then(|v| v.checked_add(c.to_digit(16).unwrap_or(0)))
                                    .ok_or_else(|| {
                                        syntax_error("Invalid Unicode escape", Some(start.clone()))
                                    })?;
                            }
                            _ => {
                                return Err(syntax_error(
                                    "Invalid Unicode escape",
                                    Some(start.clone()),
                                ))
                            }
                        }
                    }
                    code
                } else {
                    self.scan_hex_digits(4, start)?
                };
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            // line continuation
            '\n' => {}
            '\r' => {
                self.match_char('\n');
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn scan_hex_digits(&mut self, count: usize, start: &SourcePosition) -> Result<u32, JsError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| syntax_error("Invalid hexadecimal escape", Some(start.clone())))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn scan_template(&mut self, start: &SourcePosition) -> Result<Token, JsError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        loop {
            match self.advance() {
                None => return Err(unterminated("template literal", &start)),
                Some('`') => break,
                Some('\\') => self.scan_escape(&mut text, start)?,
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                    parts.push(TemplatePart::Substitution(self.scan_substitution(start)?));
                }
                Some(c) => text.push(c),
            }
        }
        parts.push(TemplatePart::Text(text));
        Ok(Token::Template(parts))
    }

    /// Collects the raw source of a `${...}` substitution up to its closing brace.
    fn scan_substitution(&mut self, start: &SourcePosition) -> Result<String, JsError> {
        let mut depth = 0usize;
        let mut raw = String::new();
        loop {
            let c = self
                .advance()
                .ok_or_else(|| unterminated("template literal", &start))?;
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return Ok(raw),
                '}' => depth -= 1,
                '"' | '\'' => {
                    raw.push(c);
                    while let Some(inner) = self.advance() {
                        raw.push(inner);
                        if inner == '\\' {
                            if let Some(escaped) = self.advance() {
                                raw.push(escaped);
                            }
                        } else if inner == c {
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }
            raw.push(c);
        }
    }

    fn scan_number(&mut self, first: char, start: &SourcePosition) -> Result<Token, JsError> {
        if first == '0' {
            let radix = match self.peek() {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                let mut digits = String::new();
                while let Some(c) = self.peek() {
                    if c.is_digit(radix) {
                        digits.push(c);
                        self.advance();
                    } else if c == '_' {
                        self.advance();
                    } else {
                        break;
                    }
                }
                if digits.is_empty() {
                    return Err(syntax_error("Invalid number literal", Some(start.clone())));
                }
                let value = digits
                    .chars()
                    .filter_map(|c| c.to_digit(radix))
                    .fold(0f64, |acc, d| acc * radix as f64 + d as f64);
                return Ok(Token::Number(value));
            }
        }

        let mut literal = String::new();
        literal.push(first);
        let mut seen_dot = first == '.';
        let mut seen_exponent = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
            } else if c == '_' {
                // numeric separator
            } else if c == '.' && !seen_dot && !seen_exponent {
                seen_dot = true;
                literal.push(c);
            } else if (c == 'e' || c == 'E') && !seen_exponent {
                seen_exponent = true;
                literal.push(c);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    literal.push(sign);
                    self.advance();
                }
                continue;
            } else {
                break;
            }
            self.advance();
        }
        if self.peek().is_some_and(is_id_start) {
            return Err(syntax_error(
                "Identifier starts immediately after numeric literal",
                Some(start.clone()),
            ));
        }
        literal
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| syntax_error("Invalid number literal", Some(start.clone())))
    }

    fn scan_identifier(&mut self, first: char) -> Token {
        let mut name = String::new();
        name.push(first);
        while let Some(c) = self.peek() {
            if is_id_continue(c) {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match Keyword::from_identifier(&name) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Identifier(name),
        }
    }
}

fn is_id_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_id_continue(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}
