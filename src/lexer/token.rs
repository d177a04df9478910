// Token definitions for the template language

use crate::name::Name;
use crate::span::Span;

/// A single token produced by the lexer
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// All token types in the template language.
///
/// Integer literals are held as `i128` so the full u64 range survives
/// lexing; character literals lex to their integer codepoint (templates
/// use them as byte values).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i128),
    Str(String),

    // Identifier
    Ident(Name),

    // Reserved words
    KwIf,
    KwElse,
    KwStruct,
    KwTypedef,
    KwWhile,
    KwFor,
    KwBreak,
    KwContinue,
    KwReturn,
    KwUnsigned,
    KwLocal,
    KwEnum,
    KwSwitch,
    KwCase,
    KwDefault,
    KwVoid,

    // Operators
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Amp,       // &
    Pipe,      // |
    Caret,     // ^
    Tilde,     // ~
    Bang,      // !
    Shl,       // <<
    Shr,       // >>
    AmpAmp,    // &&
    PipePipe,  // ||
    EqEq,      // ==
    BangEq,    // !=
    Less,      // <
    Greater,   // >
    LessEq,    // <=
    GreaterEq, // >=
    Assign,    // =

    // Punctuation
    Dot,       // .
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }

    // End of file
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Int(v) => write!(f, "integer '{}'", v),
            TokenKind::Str(v) => write!(f, "string \"{}\"", v),
            TokenKind::Ident(_) => write!(f, "identifier"),
            TokenKind::KwIf => write!(f, "'if'"),
            TokenKind::KwElse => write!(f, "'else'"),
            TokenKind::KwStruct => write!(f, "'struct'"),
            TokenKind::KwTypedef => write!(f, "'typedef'"),
            TokenKind::KwWhile => write!(f, "'while'"),
            TokenKind::KwFor => write!(f, "'for'"),
            TokenKind::KwBreak => write!(f, "'break'"),
            TokenKind::KwContinue => write!(f, "'continue'"),
            TokenKind::KwReturn => write!(f, "'return'"),
            TokenKind::KwUnsigned => write!(f, "'unsigned'"),
            TokenKind::KwLocal => write!(f, "'local'"),
            TokenKind::KwEnum => write!(f, "'enum'"),
            TokenKind::KwSwitch => write!(f, "'switch'"),
            TokenKind::KwCase => write!(f, "'case'"),
            TokenKind::KwDefault => write!(f, "'default'"),
            TokenKind::KwVoid => write!(f, "'void'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Percent => write!(f, "'%'"),
            TokenKind::Amp => write!(f, "'&'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::Tilde => write!(f, "'~'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::Shl => write!(f, "'<<'"),
            TokenKind::Shr => write!(f, "'>>'"),
            TokenKind::AmpAmp => write!(f, "'&&'"),
            TokenKind::PipePipe => write!(f, "'||'"),
            TokenKind::EqEq => write!(f, "'=='"),
            TokenKind::BangEq => write!(f, "'!='"),
            TokenKind::Less => write!(f, "'<'"),
            TokenKind::Greater => write!(f, "'>'"),
            TokenKind::LessEq => write!(f, "'<='"),
            TokenKind::GreaterEq => write!(f, "'>='"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

impl TokenKind {
    /// Get the keyword for an identifier string, if any. Reserved words
    /// never lex as identifiers.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "if" => Some(TokenKind::KwIf),
            "else" => Some(TokenKind::KwElse),
            "struct" => Some(TokenKind::KwStruct),
            "typedef" => Some(TokenKind::KwTypedef),
            "while" => Some(TokenKind::KwWhile),
            "for" => Some(TokenKind::KwFor),
            "break" => Some(TokenKind::KwBreak),
            "continue" => Some(TokenKind::KwContinue),
            "return" => Some(TokenKind::KwReturn),
            "unsigned" => Some(TokenKind::KwUnsigned),
            "local" => Some(TokenKind::KwLocal),
            "enum" => Some(TokenKind::KwEnum),
            "switch" => Some(TokenKind::KwSwitch),
            "case" => Some(TokenKind::KwCase),
            "default" => Some(TokenKind::KwDefault),
            "void" => Some(TokenKind::KwVoid),
            _ => None,
        }
    }
}
