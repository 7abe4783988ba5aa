use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::{errors::errors::{Error, ErrorImpl}, Position, Span};

use super::symbols::{Symbol, SymbolKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler
}

macro_rules! pattern {
    ($regex:literal, $handler:expr) => {
        RegexPattern { regex: Regex::new($regex).unwrap(), handler: $handler }
    };
}

/// Handler for a symbol whose text never varies.
macro_rules! fixed {
    ($kind:ident, $text:literal) => {
        |lexer: &mut Lexer, _regex: &Regex| lexer.emit(SymbolKind::$kind, String::from($text), $text.len())
    };
}

lazy_static! {
    // Order matters: longer operators must come before their prefixes, and
    // annotation delimiters before comments and `.`.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        pattern!(r"^<\?php", skip_handler),
        pattern!(r"^\?>", skip_handler),
        pattern!(r"^\s+", skip_handler),
        pattern!(r"^/\*\.", fixed!(OpenAnnotation, "/*.")),
        pattern!(r"^\.\*/", fixed!(CloseAnnotation, ".*/")),
        pattern!(r"^(?s)/\*.*?\*/", skip_handler),
        pattern!(r"^(//|#)[^\n]*", skip_handler),
        pattern!(r"^\$[a-zA-Z_][a-zA-Z0-9_]*", variable_handler),
        pattern!(r"^\\?[a-zA-Z_][a-zA-Z0-9_]*(\\[a-zA-Z_][a-zA-Z0-9_]*)*", symbol_handler),
        pattern!(r"^[0-9]+(\.[0-9]+)?", number_handler),
        pattern!(r#"^"(?s:[^"\\]|\\.)*""#, string_handler),
        pattern!(r"^'(?s:[^'\\]|\\.)*'", string_handler),
        pattern!(r"^\[", fixed!(OpenBracket, "[")),
        pattern!(r"^\]", fixed!(CloseBracket, "]")),
        pattern!(r"^\{", fixed!(OpenCurly, "{")),
        pattern!(r"^\}", fixed!(CloseCurly, "}")),
        pattern!(r"^\(", fixed!(OpenParen, "(")),
        pattern!(r"^\)", fixed!(CloseParen, ")")),
        pattern!(r"^===", fixed!(Identical, "===")),
        pattern!(r"^!==", fixed!(NotIdentical, "!==")),
        pattern!(r"^==", fixed!(Equals, "==")),
        pattern!(r"^!=", fixed!(NotEquals, "!=")),
        pattern!(r"^=>", fixed!(DoubleArrow, "=>")),
        pattern!(r"^!", fixed!(Not, "!")),
        pattern!(r"^=", fixed!(Assignment, "=")),
        pattern!(r"^<=", fixed!(LessEquals, "<=")),
        pattern!(r"^<", fixed!(Less, "<")),
        pattern!(r"^>=", fixed!(GreaterEquals, ">=")),
        pattern!(r"^>", fixed!(Greater, ">")),
        pattern!(r"^\|\|", fixed!(Or, "||")),
        pattern!(r"^&&", fixed!(And, "&&")),
        pattern!(r"^\|", fixed!(Pipe, "|")),
        pattern!(r"^&", fixed!(Ampersand, "&")),
        pattern!(r"^\.=", fixed!(DotEquals, ".=")),
        pattern!(r"^\.", fixed!(Dot, ".")),
        pattern!(r"^;", fixed!(Semicolon, ";")),
        pattern!(r"^::", fixed!(DoubleColon, "::")),
        pattern!(r"^:", fixed!(Colon, ":")),
        pattern!(r"^\?", fixed!(Question, "?")),
        pattern!(r"^,", fixed!(Comma, ",")),
        pattern!(r"^\+\+", fixed!(PlusPlus, "++")),
        pattern!(r"^->", fixed!(Arrow, "->")),
        pattern!(r"^--", fixed!(MinusMinus, "--")),
        pattern!(r"^\+=", fixed!(PlusEquals, "+=")),
        pattern!(r"^-=", fixed!(MinusEquals, "-=")),
        pattern!(r"^\*=", fixed!(StarEquals, "*=")),
        pattern!(r"^/=", fixed!(SlashEquals, "/=")),
        pattern!(r"^\+", fixed!(Plus, "+")),
        pattern!(r"^-", fixed!(Dash, "-")),
        pattern!(r"^/", fixed!(Slash, "/")),
        pattern!(r"^\*", fixed!(Star, "*")),
        pattern!(r"^%", fixed!(Percent, "%")),
    ];
}

pub struct Lexer {
    symbols: Vec<Symbol>,
    source: String,
    pos: usize,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            pos: 0,
            symbols: vec![],
            source,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    /// Pushes a symbol covering the next `len` bytes and moves past them.
    pub fn emit(&mut self, kind: SymbolKind, value: String, len: usize) {
        let span = self.span_of(len);
        self.push(Symbol { kind, value, span });
        self.advance_n(len);
    }

    pub fn at(&self) -> char {
        self.remainder().chars().next().unwrap_or('\0')
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn position(&self) -> Position {
        Position(self.pos as u32, Rc::clone(&self.file))
    }

    /// The span covering the next `len` bytes of input.
    pub fn span_of(&self, len: usize) -> Span {
        Span {
            start: self.position(),
            end: Position((self.pos + len) as u32, Rc::clone(&self.file)),
        }
    }

    fn matched(&self, regex: &Regex) -> String {
        regex
            .find(self.remainder())
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let len = matched.len();
    lexer.emit(SymbolKind::Number, matched, len);
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    lexer.advance_n(matched.len());
}

fn variable_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    lexer.emit(SymbolKind::Variable, matched[1..].to_string(), matched.len());
}

fn string_handler(lexer: &mut Lexer, regex: &Regex) {
    let matched = lexer.matched(regex);
    let quote = matched.chars().next().unwrap_or('"');
    let literal = &matched[1..matched.len() - 1];

    let mut result = String::new();
    let mut chars = literal.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some('\\') => {
                result.push('\\');
                chars.next();
            }
            Some(next) if *next == quote => {
                result.push(quote);
                chars.next();
            }
            Some('n') if quote == '"' => {
                result.push('\n');
                chars.next();
            }
            Some('t') if quote == '"' => {
                result.push('\t');
                chars.next();
            }
            Some('r') if quote == '"' => {
                result.push('\r');
                chars.next();
            }
            Some('$') if quote == '"' => {
                result.push('$');
                chars.next();
            }
            _ => result.push(ch), // Keep the backslash
        }
    }

    lexer.emit(SymbolKind::String, result, matched.len());
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let value = lexer.matched(regex);
    let len = value.len();
    let kind = RESERVED_LOOKUP
        .get(value.to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(SymbolKind::Identifier);

    lexer.emit(kind, value, len);
}

/// Splits source text into symbols, terminated by a single `EOF` symbol.
pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Symbol>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let mut matched = false;

        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(lex.remainder()) {
                (pattern.handler)(&mut lex, &pattern.regex);
                matched = true;
                break;
            }
        }

        if !matched {
            return Err(Error::new(ErrorImpl::UnrecognisedToken { token: lex.at().to_string() }, lex.position()));
        }
    }

    lex.emit(SymbolKind::EOF, String::from("EOF"), 0);
    trace!(count = lex.symbols.len(), file = %lex.file, "tokenized");
    Ok(lex.symbols)
}
