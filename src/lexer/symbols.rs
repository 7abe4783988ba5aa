use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    /// Reserved words, looked up by their lowercase spelling.
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, SymbolKind> = {
        let mut map = HashMap::new();
        map.insert("function", SymbolKind::Function);
        map.insert("return", SymbolKind::Return);
        map.insert("if", SymbolKind::If);
        map.insert("else", SymbolKind::Else);
        map.insert("elseif", SymbolKind::ElseIf);
        map.insert("while", SymbolKind::While);
        map.insert("do", SymbolKind::Do);
        map.insert("for", SymbolKind::For);
        map.insert("foreach", SymbolKind::Foreach);
        map.insert("as", SymbolKind::As);
        map.insert("switch", SymbolKind::Switch);
        map.insert("case", SymbolKind::Case);
        map.insert("default", SymbolKind::Default);
        map.insert("break", SymbolKind::Break);
        map.insert("continue", SymbolKind::Continue);
        map.insert("try", SymbolKind::Try);
        map.insert("catch", SymbolKind::Catch);
        map.insert("finally", SymbolKind::Finally);
        map.insert("throw", SymbolKind::Throw);
        map.insert("exit", SymbolKind::Exit);
        map.insert("die", SymbolKind::Exit);
        map.insert("echo", SymbolKind::Echo);
        map.insert("class", SymbolKind::Class);
        map.insert("interface", SymbolKind::Interface);
        map.insert("abstract", SymbolKind::Abstract);
        map.insert("final", SymbolKind::Final);
        map.insert("extends", SymbolKind::Extends);
        map.insert("implements", SymbolKind::Implements);
        map.insert("public", SymbolKind::Public);
        map.insert("protected", SymbolKind::Protected);
        map.insert("private", SymbolKind::Private);
        map.insert("static", SymbolKind::Static);
        map.insert("const", SymbolKind::Const);
        map.insert("new", SymbolKind::New);
        map.insert("true", SymbolKind::True);
        map.insert("false", SymbolKind::False);
        map.insert("null", SymbolKind::Null);
        map.insert("instanceof", SymbolKind::Instanceof);
        map.insert("and", SymbolKind::And);
        map.insert("or", SymbolKind::Or);
        map.insert("array", SymbolKind::Array);
        map
    };
}

/// The kind of a lexical symbol.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum SymbolKind {
    EOF,
    Number,
    String,
    Identifier,
    Variable,

    OpenAnnotation,  // /*.
    CloseAnnotation, // .*/

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment,   // =
    Equals,       // ==
    Identical,    // ===
    Not,          // !
    NotEquals,    // !=
    NotIdentical, // !==

    Less,
    LessEquals,
    Greater,
    GreaterEquals,

    Or,  // || and `or`
    And, // && and `and`
    Pipe,
    Ampersand,

    Dot,
    DotEquals,
    Semicolon,
    Colon,
    DoubleColon,
    Question,
    Comma,
    Arrow,       // ->
    DoubleArrow, // =>

    PlusPlus,
    MinusMinus,
    PlusEquals,
    MinusEquals,
    SlashEquals,
    StarEquals,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Function,
    Return,
    If,
    Else,
    ElseIf,
    While,
    Do,
    For,
    Foreach,
    As,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Throw,
    Exit,
    Echo,
    Class,
    Interface,
    Abstract,
    Final,
    Extends,
    Implements,
    Public,
    Protected,
    Private,
    Static,
    Const,
    New,
    True,
    False,
    Null,
    Instanceof,
    Array,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lexical symbol: its kind, the matched text and where it was found.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub value: String,
    pub span: Span,
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol {{\nkind: {},\nvalue: {}}}", self.kind, self.value)
    }
}
