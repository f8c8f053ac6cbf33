//! Tokenizer for the declaration subset.
//!
//! Keywords are not distinguished from identifiers here; the parser matches
//! them by text. Punctuators are single characters except `=>` and `...`, so
//! `>>` in `A<B<C>>` arrives as two tokens.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    StringLiteral,
    NumericLiteral,
    Punctuation,
    Unknown,
    EndOfFile,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: u32,
    pub end: u32,
    /// Unescaped value (string contents without quotes, identifier with
    /// unicode escapes resolved, punctuator text).
    pub value: String,
    /// Source spelling.
    pub raw: String,
    pub preceded_by_line_break: bool,
}

impl Token {
    #[inline]
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.value == text
    }

    /// Identifier whose source spelling equals `keyword` (escaped spellings never
    /// count as keywords).
    #[inline]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.raw == keyword
    }
}

pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    /// Scan the whole text. The last token is always `EndOfFile`.
    pub fn scan_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.scan();
            let done = token.kind == TokenKind::EndOfFile;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn peek(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    /// Skip trivia; returns whether a line break was crossed.
    fn skip_trivia(&mut self) -> bool {
        let mut line_break = false;
        while self.pos < self.bytes.len() {
            match self.peek(0) {
                b'\n' | b'\r' => {
                    line_break = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == b'/' => {
                    while self.pos < self.bytes.len() && !matches!(self.peek(0), b'\n' | b'\r') {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek(1) == b'*' => {
                    self.pos += 2;
                    while self.pos < self.bytes.len() && !(self.peek(0) == b'*' && self.peek(1) == b'/')
                    {
                        if matches!(self.peek(0), b'\n' | b'\r') {
                            line_break = true;
                        }
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                _ => break,
            }
        }
        line_break
    }

    fn token(&self, kind: TokenKind, start: usize, value: String, line_break: bool) -> Token {
        Token {
            kind,
            pos: start as u32,
            end: self.pos as u32,
            value,
            raw: self.text[start..self.pos].to_string(),
            preceded_by_line_break: line_break,
        }
    }

    fn scan(&mut self) -> Token {
        let line_break = self.skip_trivia();
        let start = self.pos;
        if self.pos >= self.bytes.len() {
            return self.token(TokenKind::EndOfFile, start, String::new(), line_break);
        }

        let ch = self.peek(0);
        if is_identifier_start(ch) || ch == b'\\' || ch >= 0x80 {
            let value = self.scan_identifier();
            if self.pos == start {
                // A lone backslash or a non-identifier unicode character.
                let width = self.text[start..].chars().next().map_or(1, char::len_utf8);
                self.pos += width;
                return self.token(TokenKind::Unknown, start, String::new(), line_break);
            }
            return self.token(TokenKind::Identifier, start, value, line_break);
        }
        if ch.is_ascii_digit() || (ch == b'.' && self.peek(1).is_ascii_digit()) {
            while self.pos < self.bytes.len()
                && (self.peek(0).is_ascii_alphanumeric() || self.peek(0) == b'.' || self.peek(0) == b'_')
            {
                self.pos += 1;
            }
            let value = self.text[start..self.pos].to_string();
            return self.token(TokenKind::NumericLiteral, start, value, line_break);
        }
        if ch == b'"' || ch == b'\'' {
            let value = self.scan_string(ch);
            return self.token(TokenKind::StringLiteral, start, value, line_break);
        }
        if ch == b'=' && self.peek(1) == b'>' {
            self.pos += 2;
            return self.token(TokenKind::Punctuation, start, "=>".into(), line_break);
        }
        if ch == b'.' && self.peek(1) == b'.' && self.peek(2) == b'.' {
            self.pos += 3;
            return self.token(TokenKind::Punctuation, start, "...".into(), line_break);
        }
        if ch.is_ascii_punctuation() {
            self.pos += 1;
            return self.token(TokenKind::Punctuation, start, (ch as char).to_string(), line_break);
        }

        self.pos += 1;
        self.token(TokenKind::Unknown, start, String::new(), line_break)
    }

    fn scan_identifier(&mut self) -> String {
        let mut value = String::new();
        while self.pos < self.bytes.len() {
            let ch = self.peek(0);
            if is_identifier_part(ch) {
                value.push(ch as char);
                self.pos += 1;
            } else if ch >= 0x80 {
                let rest = &self.text[self.pos..];
                let Some(c) = rest.chars().next() else { break };
                if !c.is_alphanumeric() {
                    break;
                }
                value.push(c);
                self.pos += c.len_utf8();
            } else if ch == b'\\' && self.peek(1) == b'u' {
                match self.scan_unicode_escape() {
                    Some(c) => value.push(c),
                    None => break,
                }
            } else {
                break;
            }
        }
        value
    }

    /// `\uXXXX`; leaves the position untouched when malformed.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        let digits = self.text.get(self.pos + 2..self.pos + 6)?;
        let code = u32::from_str_radix(digits, 16).ok()?;
        let c = char::from_u32(code)?;
        self.pos += 6;
        Some(c)
    }

    fn scan_string(&mut self, quote: u8) -> String {
        self.pos += 1;
        let mut value = String::new();
        while self.pos < self.bytes.len() {
            let ch = self.peek(0);
            if ch == quote {
                self.pos += 1;
                return value;
            }
            if matches!(ch, b'\n' | b'\r') {
                // Unterminated; stop at the line end.
                return value;
            }
            if ch == b'\\' {
                let next = self.peek(1);
                match next {
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    b'r' => value.push('\r'),
                    b'0' => value.push('\0'),
                    b'u' => {
                        if let Some(c) = self.scan_unicode_escape() {
                            value.push(c);
                            continue;
                        }
                        value.push('u');
                    }
                    0 => {
                        self.pos += 1;
                        return value;
                    }
                    other => value.push(other as char),
                }
                self.pos += 2;
                continue;
            }
            let rest = &self.text[self.pos..];
            let Some(c) = rest.chars().next() else { break };
            value.push(c);
            self.pos += c.len_utf8();
        }
        value
    }
}

#[inline]
fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_' || ch == b'$'
}

#[inline]
fn is_identifier_part(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_' || ch == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(text: &str) -> Vec<String> {
        Scanner::new(text)
            .scan_all()
            .into_iter()
            .filter(|t| t.kind != TokenKind::EndOfFile)
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_scans_punctuation_and_identifiers() {
        assert_eq!(
            values("var x: List<List<T>> = (a) => 1;"),
            vec![
                "var", "x", ":", "List", "<", "List", "<", "T", ">", ">", "=", "(", "a", ")", "=>",
                "1", ";"
            ]
        );
    }

    #[test]
    fn test_comments_and_line_breaks() {
        let tokens = Scanner::new("a // c\n/* b\n */ b").scan_all();
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[1].value, "b");
        assert!(tokens[1].preceded_by_line_break);
        assert_eq!(tokens[2].kind, TokenKind::EndOfFile);
    }

    #[test]
    fn test_escaped_identifier_and_string() {
        let tokens = Scanner::new(r#"\u0061bc "x\"y" 'm'"#).scan_all();
        assert_eq!(tokens[0].value, "abc");
        assert_eq!(tokens[0].raw, r"\u0061bc");
        assert!(!tokens[0].is_keyword("abc"));
        assert_eq!(tokens[1].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[1].value, "x\"y");
        assert_eq!(tokens[2].raw, "'m'");
        assert_eq!(tokens[2].value, "m");
    }
}
