use crate::token::{Token, TokenKind};

/// Byte/char stream → typed tokens with line/column tracking.
///
/// `\r` collapses into `\n` before line counting, matching the corpus's
/// lexer; whitespace is discarded. Comments (`#`, `//`, `/* */`) are lexed
/// but skipped here rather than handed to the parser, since the parser
/// never needs to see them.
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    read_pos: usize,
    ch: Option<char>,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut lexer = Self {
            input: input.chars().collect(),
            pos: 0,
            read_pos: 0,
            ch: None,
            line: 1,
            column: 0,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        if let Some(c) = self.ch {
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
        }
        self.ch = self.input.get(self.read_pos).copied();
        self.pos = self.read_pos;
        self.read_pos += 1;
        if let Some(c) = self.ch {
            if c != '\n' {
                self.column += 1;
            }
        }
        // `\r\n` and bare `\r` both collapse to `\n`.
        if self.ch == Some('\r') {
            self.ch = Some('\n');
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.read_pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, Some(c) if c.is_whitespace()) {
            self.read_char();
        }
    }

    fn skip_line_comment(&mut self) {
        while self.ch.is_some() && self.ch != Some('\n') {
            self.read_char();
        }
    }

    fn skip_block_comment(&mut self) {
        // Consumed up through the opening `/*` by the caller.
        loop {
            match self.ch {
                None => break,
                Some('*') if self.peek_char() == Some('/') => {
                    self.read_char();
                    self.read_char();
                    break;
                }
                _ => self.read_char(),
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while matches!(self.ch, Some(c) if pred(c)) {
            self.read_char();
        }
        self.input[start..self.pos].iter().collect()
    }

    fn read_string(&mut self) -> String {
        // Opening quote already consumed by caller; no escape handling.
        let start = self.pos;
        while self.ch.is_some() && self.ch != Some('"') {
            self.read_char();
        }
        let s: String = self.input[start..self.pos].iter().collect();
        self.read_char(); // consume closing quote
        s
    }

    fn make(&self, kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Token {
        Token {
            kind,
            literal: literal.into(),
            line,
            column,
        }
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            match self.ch {
                Some('#') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('/') if self.peek_char() == Some('/') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('/') if self.peek_char() == Some('*') => {
                    self.read_char();
                    self.read_char();
                    self.skip_block_comment();
                    continue;
                }
                _ => break,
            }
        }

        let (line, column) = (self.line, self.column);

        let Some(c) = self.ch else {
            return self.make(TokenKind::Eof, "", line, column);
        };

        let tok = match c {
            '=' => {
                if self.peek_char() == Some('>') {
                    self.read_char();
                    self.make(TokenKind::Arrow, "=>", line, column)
                } else if self.peek_char() == Some('=') {
                    self.read_char();
                    self.make(TokenKind::Eq, "==", line, column)
                } else {
                    self.make(TokenKind::Illegal, "=", line, column)
                }
            }
            '!' => {
                if self.peek_char() == Some('=') {
                    self.read_char();
                    self.make(TokenKind::NotEq, "!=", line, column)
                } else {
                    self.make(TokenKind::Bang, "!", line, column)
                }
            }
            '<' => self.make(TokenKind::Lt, "<", line, column),
            '>' => self.make(TokenKind::Gt, ">", line, column),
            '+' => self.make(TokenKind::Plus, "+", line, column),
            '-' => self.make(TokenKind::Minus, "-", line, column),
            '*' => self.make(TokenKind::Asterisk, "*", line, column),
            '/' => self.make(TokenKind::Slash, "/", line, column),
            ',' => self.make(TokenKind::Comma, ",", line, column),
            '{' => self.make(TokenKind::LBrace, "{", line, column),
            '}' => self.make(TokenKind::RBrace, "}", line, column),
            '[' => self.make(TokenKind::LBracket, "[", line, column),
            ']' => self.make(TokenKind::RBracket, "]", line, column),
            '"' => {
                self.read_char();
                let s = self.read_string();
                return self.make(TokenKind::String, s, line, column);
            }
            c if c.is_ascii_digit() => {
                let lit = self.read_while(|c| c.is_ascii_digit() || c == '.');
                let kind = if lit.matches('.').count() == 1 {
                    TokenKind::Float
                } else {
                    TokenKind::Int
                };
                return self.make(kind, lit, line, column);
            }
            c if c.is_alphabetic() || c == '_' => {
                let lit = self.read_while(|c| c.is_alphanumeric() || c == '_');
                let kind = TokenKind::keyword(&lit).unwrap_or(TokenKind::Ident);
                return self.make(kind, lit, line, column);
            }
            other => self.make(TokenKind::Illegal, other.to_string(), line, column),
        };
        self.read_char();
        tok
    }
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let tok = self.next_token();
        if tok.kind == TokenKind::Eof {
            None
        } else {
            Some(tok)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_braces() {
        assert_eq!(
            kinds("input { }"),
            vec![TokenKind::Input, TokenKind::LBrace, TokenKind::RBrace]
        );
    }

    #[test]
    fn lexes_arrow_and_string_and_int() {
        let toks: Vec<Token> = Lexer::new(r#"k => "v" n => 3"#).collect();
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[1].kind, TokenKind::Arrow);
        assert_eq!(toks[2].kind, TokenKind::String);
        assert_eq!(toks[2].literal, "v");
        assert_eq!(toks[4].kind, TokenKind::Arrow);
        assert_eq!(toks[5].kind, TokenKind::Int);
    }

    #[test]
    fn float_has_single_dot() {
        let toks: Vec<Token> = Lexer::new("3.5").collect();
        assert_eq!(toks[0].kind, TokenKind::Float);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("# comment\ninput"), vec![TokenKind::Input]);
        assert_eq!(kinds("// comment\ninput"), vec![TokenKind::Input]);
        assert_eq!(kinds("/* block\ncomment */input"), vec![TokenKind::Input]);
    }

    #[test]
    fn tracks_line_numbers() {
        let toks: Vec<Token> = Lexer::new("input\nfilter").collect();
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[1].line, 2);
    }
}
