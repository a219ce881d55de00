//! Token kinds produced by the lexer
//!
//! Every kind has a fixed numeric code used by the token dump. Codes run in
//! the order: end of input, error, the four integer bases, name, the
//! punctuation and operator symbols, string, char, then the keywords in
//! table order.
use crate::config::constants::TOKEN_CODE_WIDTH;
use crate::grammar::keywords::Keyword;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Eof,
    /// A lexical error has already been reported for this token
    Error,

    // === LITERALS ===
    DecInt(i64),
    HexInt(i64),
    OctInt(i64),
    BinInt(i64),
    Name(String),

    // === SYMBOLS ===
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]
    LParen,     // (
    RParen,     // )
    Comma,      // ,
    Dot,        // .
    Semicolon,  // ;
    Question,   // ?
    Bang,       // !
    Equals,     // =
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Caret,      // ^
    Percent,    // %
    At,         // @
    NotEquals,  // ~=
    Tilde,      // ~
    LessEq,     // <=
    ShiftLeft,  // <<
    Less,       // <
    GreaterEq,  // >=
    ShiftRight, // >>
    Greater,    // >
    Assign,     // :=
    Colon,      // :
    AndAnd,     // &&
    Ampersand,  // &
    OrOr,       // ||
    Bar,        // |

    Str(String),
    Char(char),

    Keyword(Keyword),
}

/// Symbol tokens in code order
const SYMBOLS: [Token; 33] = [
    Token::LBrace,
    Token::RBrace,
    Token::LBracket,
    Token::RBracket,
    Token::LParen,
    Token::RParen,
    Token::Comma,
    Token::Dot,
    Token::Semicolon,
    Token::Question,
    Token::Bang,
    Token::Equals,
    Token::Plus,
    Token::Minus,
    Token::Star,
    Token::Slash,
    Token::Caret,
    Token::Percent,
    Token::At,
    Token::NotEquals,
    Token::Tilde,
    Token::LessEq,
    Token::ShiftLeft,
    Token::Less,
    Token::GreaterEq,
    Token::ShiftRight,
    Token::Greater,
    Token::Assign,
    Token::Colon,
    Token::AndAnd,
    Token::Ampersand,
    Token::OrOr,
    Token::Bar,
];

const FIRST_SYMBOL_CODE: u32 = 8;
const STRING_CODE: u32 = FIRST_SYMBOL_CODE + SYMBOLS.len() as u32;
const FIRST_KEYWORD_CODE: u32 = STRING_CODE + 2;

impl Token {
    /// Numeric kind code shown in token dumps
    pub fn code(&self) -> u32 {
        match self {
            Self::Eof => 1,
            Self::Error => 2,
            Self::DecInt(_) => 3,
            Self::HexInt(_) => 4,
            Self::OctInt(_) => 5,
            Self::BinInt(_) => 6,
            Self::Name(_) => 7,
            Self::Str(_) => STRING_CODE,
            Self::Char(_) => STRING_CODE + 1,
            Self::Keyword(keyword) => FIRST_KEYWORD_CODE + keyword.index() as u32,
            symbol => {
                let index = SYMBOLS.iter().position(|s| s == symbol).unwrap_or_default();
                FIRST_SYMBOL_CODE + index as u32
            }
        }
    }

    /// Kind name: the spelling for symbols and keywords
    pub fn name(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Error => "error",
            Self::DecInt(_) => "decimal",
            Self::HexInt(_) => "hexdecimal",
            Self::OctInt(_) => "octal",
            Self::BinInt(_) => "binary",
            Self::Name(_) => "name",
            Self::Str(_) => "string",
            Self::Char(_) => "char",
            Self::Keyword(keyword) => keyword.as_str(),
            Self::At => "at",
            symbol => symbol.spelling().unwrap_or("unknown"),
        }
    }

    /// Source spelling of a symbol token
    pub fn spelling(&self) -> Option<&'static str> {
        let text = match self {
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Semicolon => ";",
            Self::Question => "?",
            Self::Bang => "!",
            Self::Equals => "=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Caret => "^",
            Self::Percent => "%",
            Self::At => "@",
            Self::NotEquals => "~=",
            Self::Tilde => "~",
            Self::LessEq => "<=",
            Self::ShiftLeft => "<<",
            Self::Less => "<",
            Self::GreaterEq => ">=",
            Self::ShiftRight => ">>",
            Self::Greater => ">",
            Self::Assign => ":=",
            Self::Colon => ":",
            Self::AndAnd => "&&",
            Self::Ampersand => "&",
            Self::OrOr => "||",
            Self::Bar => "|",
            _ => return None,
        };
        Some(text)
    }

    /// Token begins a specification
    pub fn starts_specification(&self) -> bool {
        matches!(self, Self::Keyword(k) if k.starts_specification())
    }

    /// One line of the token dump: code, kind name and payload
    pub fn dump_line(&self) -> String {
        let mut line = format!(
            "{:>width$} {} ",
            self.code(),
            self.name(),
            width = TOKEN_CODE_WIDTH
        );
        match self {
            Self::Name(text) | Self::Str(text) => line.push_str(text),
            Self::DecInt(value) => line.push_str(&value.to_string()),
            Self::HexInt(value) => line.push_str(&format!("{:x}", value)),
            Self::OctInt(value) => line.push_str(&format!("{:o}", value)),
            Self::BinInt(value) => line.push_str(&format!("{:b}", value)),
            Self::Char(ch) => line.push(*ch),
            _ => {}
        }
        line
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(text) => write!(f, "{}", text),
            Self::DecInt(value) => write!(f, "{}", value),
            Self::HexInt(value) => write!(f, "0x{:x}", value),
            Self::OctInt(value) => write!(f, "0o{:o}", value),
            Self::BinInt(value) => write!(f, "0b{:b}", value),
            Self::Str(text) => write!(f, "\"{}\"", text),
            Self::Char(ch) => write!(f, "'{}'", ch),
            other => write!(f, "{}", other.spelling().unwrap_or_else(|| other.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_kind_order() {
        assert_eq!(Token::Eof.code(), 1);
        assert_eq!(Token::Error.code(), 2);
        assert_eq!(Token::DecInt(0).code(), 3);
        assert_eq!(Token::Name("x".into()).code(), 7);
        assert_eq!(Token::LBrace.code(), 8);
        assert_eq!(Token::Bar.code(), 40);
        assert_eq!(Token::Str(String::new()).code(), 41);
        assert_eq!(Token::Char('a').code(), 42);
        assert_eq!(Token::Keyword(Keyword::Accept).code(), 43);
        assert_eq!(Token::Keyword(Keyword::While).code(), 78);
    }

    #[test]
    fn test_names() {
        assert_eq!(Token::At.name(), "at");
        assert_eq!(Token::HexInt(1).name(), "hexdecimal");
        assert_eq!(Token::ShiftLeft.name(), "<<");
        assert_eq!(Token::Keyword(Keyword::Valof).name(), "valof");
    }

    #[test]
    fn test_dump_lines() {
        assert_eq!(Token::Name("abc".into()).dump_line(), "  7 name abc");
        assert_eq!(Token::DecInt(42).dump_line(), "  3 decimal 42");
        assert_eq!(Token::HexInt(31).dump_line(), "  4 hexdecimal 1f");
        assert_eq!(Token::OctInt(15).dump_line(), "  5 octal 17");
        assert_eq!(Token::BinInt(5).dump_line(), "  6 binary 101");
        assert_eq!(Token::Assign.dump_line(), " 35 := ");
        assert_eq!(Token::Keyword(Keyword::Seq).dump_line(), " 65 seq ");
    }

    #[test]
    fn test_display_keeps_literal_base() {
        assert_eq!(Token::HexInt(31).to_string(), "0x1f");
        assert_eq!(Token::OctInt(8).to_string(), "0o10");
        assert_eq!(Token::BinInt(2).to_string(), "0b10");
        assert_eq!(Token::At.to_string(), "@");
    }
}
