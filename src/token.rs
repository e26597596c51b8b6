use bimap::BiMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,
    // Identifiers and literals
    Ident,
    Int,
    String,
    // Operators
    Assign,
    Define,
    DefineConst,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Leq,
    Geq,
    Eq,
    Neq,
    // Punctuation
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    // Keywords
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
}

lazy_static! {
    static ref KEYWORDS: BiMap<&'static str, TokenKind> = {
        let mut m = BiMap::new();
        m.insert("fn", TokenKind::Function);
        m.insert("let", TokenKind::Let);
        m.insert("true", TokenKind::True);
        m.insert("false", TokenKind::False);
        m.insert("if", TokenKind::If);
        m.insert("else", TokenKind::Else);
        m.insert("return", TokenKind::Return);
        m
    };
}

/// Classifies an identifier-shaped word as a keyword or a plain identifier.
pub fn lookup_identifier(word: &str) -> TokenKind {
    KEYWORDS.get_by_left(&word).copied().unwrap_or(TokenKind::Ident)
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let text = match self {
            Illegal => "ILLEGAL",
            Eof => "EOF",
            Ident => "IDENT",
            Int => "INT",
            String => "STRING",
            Assign => "=",
            Define => ":=",
            DefineConst => "::",
            Plus => "+",
            Minus => "-",
            Bang => "!",
            Asterisk => "*",
            Slash => "/",
            Lt => "<",
            Gt => ">",
            Leq => "<=",
            Geq => ">=",
            Eq => "==",
            Neq => "!=",
            Comma => ",",
            Semicolon => ";",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Function => "FN",
            Let => "LET",
            True => "TRUE",
            False => "FALSE",
            If => "IF",
            Else => "ELSE",
            Return => "RETURN",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {} {:?}",
            self.line, self.column, self.kind, self.literal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognised() {
        assert_eq!(lookup_identifier("fn"), TokenKind::Function);
        assert_eq!(lookup_identifier("return"), TokenKind::Return);
        assert_eq!(lookup_identifier("returns"), TokenKind::Ident);
        assert_eq!(lookup_identifier("Let"), TokenKind::Ident);
    }

    #[test]
    fn kinds_display_like_their_source_text() {
        assert_eq!(TokenKind::RBrace.to_string(), "}");
        assert_eq!(TokenKind::DefineConst.to_string(), "::");
        assert_eq!(TokenKind::Function.to_string(), "FN");
        assert_eq!(TokenKind::Eof.to_string(), "EOF");
    }

    #[test]
    fn keyword_kinds_display_as_their_upper_case_word() {
        for (word, kind) in KEYWORDS.iter() {
            assert_eq!(kind.to_string(), word.to_uppercase());
        }
    }
}
