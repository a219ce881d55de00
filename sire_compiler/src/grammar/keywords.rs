//! Reserved words and the keyword table
use crate::tokens::Token;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Accept,
    Alt,
    Call,
    Case,
    Chan,
    Connect,
    Do,
    Else,
    False,
    Final,
    For,
    From,
    Function,
    If,
    Inherits,
    Initial,
    Interface,
    Is,
    On,
    Par,
    Process,
    Result,
    Seq,
    Server,
    Skip,
    Step,
    Stop,
    Test,
    Then,
    To,
    True,
    Until,
    Val,
    Valof,
    Var,
    While,
}

impl Keyword {
    /// Every keyword, in table order
    pub const ALL: [Keyword; 36] = [
        Self::Accept,
        Self::Alt,
        Self::Call,
        Self::Case,
        Self::Chan,
        Self::Connect,
        Self::Do,
        Self::Else,
        Self::False,
        Self::Final,
        Self::For,
        Self::From,
        Self::Function,
        Self::If,
        Self::Inherits,
        Self::Initial,
        Self::Interface,
        Self::Is,
        Self::On,
        Self::Par,
        Self::Process,
        Self::Result,
        Self::Seq,
        Self::Server,
        Self::Skip,
        Self::Step,
        Self::Stop,
        Self::Test,
        Self::Then,
        Self::To,
        Self::True,
        Self::Until,
        Self::Val,
        Self::Valof,
        Self::Var,
        Self::While,
    ];

    /// Spelling in source
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Alt => "alt",
            Self::Call => "call",
            Self::Case => "case",
            Self::Chan => "chan",
            Self::Connect => "connect",
            Self::Do => "do",
            Self::Else => "else",
            Self::False => "false",
            Self::Final => "final",
            Self::For => "for",
            Self::From => "from",
            Self::Function => "function",
            Self::If => "if",
            Self::Inherits => "inherits",
            Self::Initial => "initial",
            Self::Interface => "interface",
            Self::Is => "is",
            Self::On => "on",
            Self::Par => "par",
            Self::Process => "process",
            Self::Result => "result",
            Self::Seq => "seq",
            Self::Server => "server",
            Self::Skip => "skip",
            Self::Step => "step",
            Self::Stop => "stop",
            Self::Test => "test",
            Self::Then => "then",
            Self::To => "to",
            Self::True => "true",
            Self::Until => "until",
            Self::Val => "val",
            Self::Valof => "valof",
            Self::Var => "var",
            Self::While => "while",
        }
    }

    /// Position in `ALL`
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kw| *kw == self)
            .unwrap_or_default()
    }

    /// Keywords that open a specification
    pub const fn starts_specification(self) -> bool {
        matches!(
            self,
            Self::Val
                | Self::Var
                | Self::Chan
                | Self::Call
                | Self::Interface
                | Self::Process
                | Self::Server
                | Self::Function
                | Self::From
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps reserved spellings to keywords; filled once when a lexer is built
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    words: HashMap<&'static str, Keyword>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self {
            words: HashMap::with_capacity(Keyword::ALL.len()),
        }
    }

    /// Table holding every reserved word
    pub fn with_keywords() -> Self {
        let mut table = Self::new();
        for keyword in Keyword::ALL {
            table.insert(keyword.as_str(), keyword);
        }
        table
    }

    /// Register a reserved word; a second registration of the same word is
    /// ignored and reported by returning `false`
    pub fn insert(&mut self, word: &'static str, keyword: Keyword) -> bool {
        if self.words.contains_key(word) {
            return false;
        }
        self.words.insert(word, keyword);
        true
    }

    /// Keyword token for a reserved word, otherwise a name token echoing `text`
    pub fn lookup(&self, text: &str) -> Token {
        match self.words.get(text) {
            Some(keyword) => Token::Keyword(*keyword),
            None => Token::Name(text.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::KEYWORD_COUNT;

    #[test]
    fn test_every_keyword_is_recognised() {
        let table = KeywordTable::with_keywords();
        assert_eq!(table.len(), KEYWORD_COUNT);

        for keyword in Keyword::ALL {
            assert_eq!(table.lookup(keyword.as_str()), Token::Keyword(keyword));
        }
    }

    #[test]
    fn test_other_words_echo_as_names() {
        let table = KeywordTable::with_keywords();
        for word in ["x", "Process", "valx", "seq_1", "alternative", "IF", "a9_b"] {
            assert_eq!(table.lookup(word), Token::Name(word.to_string()));
        }
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut table = KeywordTable::new();
        assert!(table.insert("skip", Keyword::Skip));
        assert!(!table.insert("skip", Keyword::Stop));
        assert_eq!(table.lookup("skip"), Token::Keyword(Keyword::Skip));
    }

    #[test]
    fn test_specification_starters() {
        assert!(Keyword::From.starts_specification());
        assert!(Keyword::Interface.starts_specification());
        assert!(!Keyword::Seq.starts_specification());
    }

    #[test]
    fn test_index_follows_table_order() {
        assert_eq!(Keyword::Accept.index(), 0);
        assert_eq!(Keyword::While.index(), Keyword::ALL.len() - 1);
    }
}
