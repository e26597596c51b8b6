use crate::token::{lookup_identifier, Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

/// Pull-based tokenizer. Each call to [`Lexer::next_token`] advances the cursor;
/// once the input is exhausted every further call yields an `Eof` token.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
            finished: false,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let (line, column) = (self.line, self.column);
        let token = |kind, literal: &str| Token::new(kind, literal, line, column);

        let (start, ch) = match self.advance() {
            Some(next) => next,
            None => return token(TokenKind::Eof, ""),
        };

        use TokenKind::*;
        match ch {
            '=' => self.one_or_two(token, '=', Assign, Eq),
            '!' => self.one_or_two(token, '=', Bang, Neq),
            '<' => self.one_or_two(token, '=', Lt, Leq),
            '>' => self.one_or_two(token, '=', Gt, Geq),
            ':' => match self.peek_char() {
                Some('=') => {
                    self.advance();
                    token(Define, ":=")
                }
                Some(':') => {
                    self.advance();
                    token(DefineConst, "::")
                }
                _ => token(Illegal, ":"),
            },
            '+' => token(Plus, "+"),
            '-' => token(Minus, "-"),
            '*' => token(Asterisk, "*"),
            '/' => token(Slash, "/"),
            ',' => token(Comma, ","),
            ';' => token(Semicolon, ";"),
            '(' => token(LParen, "("),
            ')' => token(RParen, ")"),
            '{' => token(LBrace, "{"),
            '}' => token(RBrace, "}"),
            '[' => token(LBracket, "["),
            ']' => token(RBracket, "]"),
            '"' => {
                let literal = self.read_string();
                token(String, literal)
            }
            c if is_identifier_start(c) => {
                let word = self.read_while(start, is_identifier_continue);
                token(lookup_identifier(word), word)
            }
            c if c.is_ascii_digit() => {
                let digits = self.read_while(start, |c| c.is_ascii_digit());
                token(Int, digits)
            }
            c => {
                let mut buf = [0; 4];
                token(Illegal, c.encode_utf8(&mut buf))
            }
        }
    }

    fn one_or_two(
        &mut self,
        token: impl Fn(TokenKind, &str) -> Token,
        second: char,
        single: TokenKind,
        double: TokenKind,
    ) -> Token {
        if self.peek_char() == Some(second) {
            self.advance();
            let literal = double.to_string();
            token(double, &literal)
        } else {
            token(single, &single.to_string())
        }
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let (index, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some((index, ch))
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    /// Consumes characters matching `pred` and returns the slice starting at
    /// `start`, which must be the offset of an already-consumed character.
    fn read_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'a str {
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.advance();
        }
        let end = self.offset();
        &self.input[start..end]
    }

    // No escape sequences: the literal runs to the next quote or to the end of input.
    fn read_string(&mut self) -> &'a str {
        let start = self.offset();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                break;
            }
            self.advance();
        }
        let end = self.offset();
        // closing quote, if any
        self.advance();
        &self.input[start..end]
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token up to, but not including, `Eof`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.finished = true;
            return None;
        }
        Some(token)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

// Digits other than ASCII are deliberately excluded, so `٣` lexes as ILLEGAL.
fn is_identifier_continue(c: char) -> bool {
    c.is_alphabetic() || c.is_ascii_digit() || c == '_' || c == '-'
}
