//! Pull-based lexer
//!
//! `Lexer::next_token` produces one token per call from a single
//! character of lookahead. Whitespace and `#` comments are skipped. Every
//! lexical error is reported through `Diagnostics` together with the
//! trailing character window, after which the rest of the line is skipped
//! and `Token::Error` is returned. Once the input is exhausted every call
//! returns `Token::Eof`.

use super::context::ContextBuffer;
use crate::config::constants::{is_name_continue, is_name_start, MAX_NAME_LENGTH, MAX_STRING_LENGTH};
use crate::diagnostics::{Diagnostics, FatalError};
use crate::grammar::keywords::KeywordTable;
use crate::logging::codes;
use crate::log_debug;
use crate::tokens::Token;
use crate::utils::{Position, Span, Spanned};
use std::str::Chars;

/// Recoverable lexical errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexicalError {
    #[error("illegal character")]
    IllegalCharacter,

    #[error("expected ''' after character constant")]
    UnterminatedCharacter,

    #[error("unterminated string")]
    UnterminatedString,

    #[error("bad string or character constant")]
    BadEscape,

    #[error("malformed number")]
    MalformedNumber,

    #[error("number too large")]
    NumberTooLarge,

    #[error("name too long")]
    NameTooLong,

    #[error("string too long")]
    StringTooLong,
}

impl LexicalError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::IllegalCharacter => codes::lexical::ILLEGAL_CHARACTER,
            Self::UnterminatedCharacter | Self::UnterminatedString => {
                codes::lexical::UNTERMINATED_LITERAL
            }
            Self::BadEscape => codes::lexical::BAD_ESCAPE,
            Self::MalformedNumber | Self::NumberTooLarge => codes::lexical::MALFORMED_NUMBER,
            Self::NameTooLong => codes::lexical::NAME_TOO_LONG,
            Self::StringTooLong => codes::lexical::STRING_TOO_LONG,
        }
    }
}

pub struct Lexer<'src> {
    chars: Chars<'src>,
    /// Lookahead character, `None` at end of input
    ch: Option<char>,
    /// Position of the lookahead character
    position: Position,
    context: ContextBuffer,
    keywords: KeywordTable,
    produced: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut chars = source.chars();
        let ch = chars.next();
        let mut context = ContextBuffer::new();
        if let Some(c) = ch {
            context.push(c);
        }

        Self {
            chars,
            ch,
            position: Position::start(),
            context,
            keywords: KeywordTable::with_keywords(),
            produced: 0,
        }
    }

    /// Current line, used for diagnostics
    pub fn line(&self) -> u32 {
        self.position.line
    }

    /// The most recently read characters, oldest first
    pub fn context(&self) -> String {
        self.context.snapshot()
    }

    /// Number of tokens produced so far, end of input excluded
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Read the next token
    pub fn next_token(
        &mut self,
        diagnostics: &mut Diagnostics,
    ) -> Result<Spanned<Token>, FatalError> {
        self.skip_blanks();
        let start = self.position;

        let token = match self.ch {
            None => Token::Eof,
            Some(c) if c.is_ascii_digit() => self.read_number(diagnostics)?,
            Some(c) if is_name_start(c) => self.read_name(diagnostics)?,
            Some('"') => self.read_string(diagnostics)?,
            Some('\'') => self.read_character(diagnostics)?,
            Some(c) => self.read_symbol(c, diagnostics)?,
        };

        if token != Token::Eof {
            self.produced += 1;
        }
        Ok(Spanned::new(token, Span::new(start, self.position)))
    }

    fn bump(&mut self) -> Option<char> {
        let current = self.ch?;
        self.position = self.position.advance(current);
        self.ch = self.chars.next();
        if let Some(next) = self.ch {
            self.context.push(next);
        }
        Some(current)
    }

    fn skip_blanks(&mut self) {
        loop {
            match self.ch {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.bump();
                }
                Some('#') => self.skip_line(),
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while matches!(self.ch, Some(c) if c != '\n') {
            self.bump();
        }
    }

    /// Report a lexical error and resynchronise
    fn fail(
        &mut self,
        error: LexicalError,
        diagnostics: &mut Diagnostics,
    ) -> Result<Token, FatalError> {
        self.report(&error, diagnostics)?;
        self.skip_line();
        Ok(Token::Error)
    }

    fn report(
        &mut self,
        error: &LexicalError,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), FatalError> {
        log_debug!("Lexical error",
            "error" => error,
            "line" => self.position.line
        );
        diagnostics.report(
            error.error_code(),
            self.position.line,
            error.to_string(),
            &self.context.snapshot(),
        )
    }

    // === NUMBERS ===

    fn read_number(&mut self, diagnostics: &mut Diagnostics) -> Result<Token, FatalError> {
        let result = if self.ch == Some('0') {
            self.bump();
            match self.ch {
                Some('x') => {
                    self.bump();
                    self.read_digits(16).map(Token::HexInt)
                }
                Some('o') => {
                    self.bump();
                    self.read_digits(8).map(Token::OctInt)
                }
                Some('b') => {
                    self.bump();
                    self.read_digits(2).map(Token::BinInt)
                }
                Some(c) if c.is_ascii_digit() => self.read_digits(10).map(Token::DecInt),
                _ => Ok(Token::DecInt(0)),
            }
        } else {
            self.read_digits(10).map(Token::DecInt)
        };

        match result {
            Ok(token) => Ok(token),
            Err(error) => self.fail(error, diagnostics),
        }
    }

    fn read_digits(&mut self, radix: u32) -> Result<i64, LexicalError> {
        let mut value: Option<i64> = Some(0);
        let mut digits = 0usize;

        while let Some(digit) = self.ch.and_then(|c| c.to_digit(radix)) {
            value = value
                .and_then(|v| v.checked_mul(i64::from(radix)))
                .and_then(|v| v.checked_add(i64::from(digit)));
            digits += 1;
            self.bump();
        }

        if digits == 0 {
            return Err(LexicalError::MalformedNumber);
        }
        value.ok_or(LexicalError::NumberTooLarge)
    }

    // === NAMES AND KEYWORDS ===

    fn read_name(&mut self, diagnostics: &mut Diagnostics) -> Result<Token, FatalError> {
        let mut text = String::new();
        while let Some(c) = self.ch.filter(|c| is_name_continue(*c)) {
            text.push(c);
            self.bump();
        }

        if text.len() > MAX_NAME_LENGTH {
            self.report(&LexicalError::NameTooLong, diagnostics)?;
            text.truncate(MAX_NAME_LENGTH);
        }
        Ok(self.keywords.lookup(&text))
    }

    // === STRING AND CHARACTER LITERALS ===

    fn read_string(&mut self, diagnostics: &mut Diagnostics) -> Result<Token, FatalError> {
        self.bump();
        let mut text = String::new();

        loop {
            match self.ch {
                None | Some('\n') => {
                    return self.fail(LexicalError::UnterminatedString, diagnostics)
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => match self.read_escape(LexicalError::UnterminatedString) {
                    Ok(c) => text.push(c),
                    Err(error) => return self.fail(error, diagnostics),
                },
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        if text.chars().count() > MAX_STRING_LENGTH {
            self.report(&LexicalError::StringTooLong, diagnostics)?;
            text = text.chars().take(MAX_STRING_LENGTH).collect();
        }
        Ok(Token::Str(text))
    }

    fn read_character(&mut self, diagnostics: &mut Diagnostics) -> Result<Token, FatalError> {
        self.bump();
        let value = match self.ch {
            None | Some('\n') => {
                return self.fail(LexicalError::UnterminatedCharacter, diagnostics)
            }
            Some('\\') => match self.read_escape(LexicalError::UnterminatedCharacter) {
                Ok(c) => c,
                Err(error) => return self.fail(error, diagnostics),
            },
            Some(c) => {
                self.bump();
                c
            }
        };

        if self.ch != Some('\'') {
            return self.fail(LexicalError::UnterminatedCharacter, diagnostics);
        }
        self.bump();
        Ok(Token::Char(value))
    }

    /// Decode an escape; the lookahead is the backslash. A line or input
    /// ending straight after it gives `unterminated`.
    fn read_escape(&mut self, unterminated: LexicalError) -> Result<char, LexicalError> {
        self.bump();
        let decoded = match self.ch {
            Some(c @ ('\\' | '\'' | '"')) => c,
            Some('t' | 'T') => '\t',
            Some('r' | 'R') => '\r',
            Some('n' | 'N') => '\n',
            None | Some('\n') => return Err(unterminated),
            Some(_) => return Err(LexicalError::BadEscape),
        };
        self.bump();
        Ok(decoded)
    }

    // === SYMBOLS ===

    fn read_symbol(&mut self, first: char, diagnostics: &mut Diagnostics) -> Result<Token, FatalError> {
        let single = match first {
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '.' => Some(Token::Dot),
            ';' => Some(Token::Semicolon),
            '?' => Some(Token::Question),
            '!' => Some(Token::Bang),
            '=' => Some(Token::Equals),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '@' => Some(Token::At),
            _ => None,
        };
        if let Some(token) = single {
            self.bump();
            return Ok(token);
        }

        if !matches!(first, '~' | '<' | '>' | ':' | '&' | '|') {
            return self.fail(LexicalError::IllegalCharacter, diagnostics);
        }

        self.bump();
        let double = match (first, self.ch) {
            ('~', Some('=')) => Some(Token::NotEquals),
            ('<', Some('=')) => Some(Token::LessEq),
            ('<', Some('<')) => Some(Token::ShiftLeft),
            ('>', Some('=')) => Some(Token::GreaterEq),
            ('>', Some('>')) => Some(Token::ShiftRight),
            (':', Some('=')) => Some(Token::Assign),
            ('&', Some('&')) => Some(Token::AndAnd),
            ('|', Some('|')) => Some(Token::OrOr),
            _ => None,
        };
        if let Some(token) = double {
            self.bump();
            return Ok(token);
        }

        Ok(match first {
            '~' => Token::Tilde,
            '<' => Token::Less,
            '>' => Token::Greater,
            ':' => Token::Colon,
            '&' => Token::Ampersand,
            _ => Token::Bar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::keywords::Keyword;
    use assert_matches::assert_matches;

    fn lex(source: &str) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Diagnostics::silent().with_threshold(100);
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token(&mut diagnostics).unwrap().into_inner();
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        (tokens, diagnostics)
    }

    fn kinds(source: &str) -> Vec<Token> {
        let (tokens, diagnostics) = lex(source);
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.messages());
        tokens
    }

    #[test]
    fn test_number_bases() {
        assert_eq!(
            kinds("0x1F 0o17 0b101 42 0"),
            vec![
                Token::HexInt(31),
                Token::OctInt(15),
                Token::BinInt(5),
                Token::DecInt(42),
                Token::DecInt(0),
            ]
        );
    }

    #[test]
    fn test_zero_followed_by_name_is_decimal_zero() {
        assert_eq!(
            kinds("0a"),
            vec![Token::DecInt(0), Token::Name("a".into())]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("<= << < >= >> > := : && & || | ~= ~"),
            vec![
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
                Token::NotEquals,
                Token::Tilde,
            ]
        );
    }

    #[test]
    fn test_adjacent_operators_without_spaces() {
        assert_eq!(
            kinds("x:=y<<2"),
            vec![
                Token::Name("x".into()),
                Token::Assign,
                Token::Name("y".into()),
                Token::ShiftLeft,
                Token::DecInt(2),
            ]
        );
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(
            kinds("var x_1 valof"),
            vec![
                Token::Keyword(Keyword::Var),
                Token::Name("x_1".into()),
                Token::Keyword(Keyword::Valof),
            ]
        );
    }

    #[test]
    fn test_comments_and_line_tracking() {
        let mut diagnostics = Diagnostics::silent();
        let mut lexer = Lexer::new("# header\nskip # trailing\n\nstop");
        let first = lexer.next_token(&mut diagnostics).unwrap();
        assert_eq!(first.value, Token::Keyword(Keyword::Skip));
        assert_eq!(first.line(), 2);
        let second = lexer.next_token(&mut diagnostics).unwrap();
        assert_eq!(second.value, Token::Keyword(Keyword::Stop));
        assert_eq!(second.line(), 4);
    }

    #[test]
    fn test_string_and_character_escapes() {
        assert_eq!(
            kinds(r#""a\tb\"" '\n' 'x' '\''"#),
            vec![
                Token::Str("a\tb\"".into()),
                Token::Char('\n'),
                Token::Char('x'),
                Token::Char('\''),
            ]
        );
    }

    #[test]
    fn test_illegal_character_skips_the_line() {
        let (tokens, diagnostics) = lex("skip $ stop stop\nskip");
        assert_eq!(
            tokens,
            vec![
                Token::Keyword(Keyword::Skip),
                Token::Error,
                Token::Keyword(Keyword::Skip),
            ]
        );
        assert_eq!(diagnostics.messages(), vec!["illegal character"]);
        assert_eq!(diagnostics.reports()[0].line, 1);
        assert!(diagnostics.reports()[0].context.starts_with("skip $"));
    }

    #[test]
    fn test_unclosed_character_constant() {
        let (tokens, diagnostics) = lex("'ab'");
        assert_eq!(tokens, vec![Token::Error]);
        assert_eq!(
            diagnostics.messages(),
            vec!["expected ''' after character constant"]
        );
    }

    #[test]
    fn test_escape_cut_off_by_end_of_line() {
        let (tokens, diagnostics) = lex("'\\\nskip");
        assert_eq!(tokens, vec![Token::Error, Token::Keyword(Keyword::Skip)]);
        assert_eq!(
            diagnostics.messages(),
            vec!["expected ''' after character constant"]
        );

        let (tokens, diagnostics) = lex("\"ab\\");
        assert_eq!(tokens, vec![Token::Error]);
        assert_eq!(diagnostics.messages(), vec!["unterminated string"]);
    }

    #[test]
    fn test_bad_escape() {
        let (_, diagnostics) = lex(r#""a\qb""#);
        assert_eq!(diagnostics.messages(), vec!["bad string or character constant"]);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, diagnostics) = lex("\"abc\nskip");
        assert_eq!(tokens, vec![Token::Error, Token::Keyword(Keyword::Skip)]);
        assert_eq!(diagnostics.messages(), vec!["unterminated string"]);
    }

    #[test]
    fn test_malformed_and_oversized_numbers() {
        let (_, diagnostics) = lex("0x\n99999999999999999999");
        assert_eq!(
            diagnostics.messages(),
            vec!["malformed number", "number too large"]
        );
    }

    #[test]
    fn test_long_name_is_truncated() {
        let long = "a".repeat(MAX_NAME_LENGTH + 5);
        let (tokens, diagnostics) = lex(&long);
        assert_matches!(&tokens[..], [Token::Name(text)] if text.len() == MAX_NAME_LENGTH);
        assert_eq!(diagnostics.messages(), vec!["name too long"]);
    }

    #[test]
    fn test_end_of_input_repeats() {
        let mut diagnostics = Diagnostics::silent();
        let mut lexer = Lexer::new("");
        for _ in 0..3 {
            assert_eq!(lexer.next_token(&mut diagnostics).unwrap().value, Token::Eof);
        }
        assert_eq!(lexer.produced(), 0);
    }
}
