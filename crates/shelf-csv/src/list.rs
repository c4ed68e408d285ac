//! Parser for list-literal fields.
//!
//! The `authors` and `categories` columns carry Python-style list literals
//! such as `['A. Author', "B. Writer"]`. Element values may contain commas
//! and brackets, so this is a small scanner over the literal syntax, not a
//! comma split.

use crate::{Error, Result};

/// Parse a list literal into its element strings.
///
/// Accepts single- or double-quoted elements, backslash escapes inside
/// them, and a trailing comma before the closing bracket. `[]` yields an
/// empty vector.
pub fn parse_list(input: &str) -> Result<Vec<String>> {
    let mut scanner = Scanner::new(input);
    scanner.skip_whitespace();
    scanner.expect('[')?;

    let mut elements = Vec::new();
    loop {
        scanner.skip_whitespace();
        if scanner.eat(']') {
            break;
        }
        if !elements.is_empty() {
            scanner.expect(',')?;
            scanner.skip_whitespace();
            // Trailing comma right before the closing bracket.
            if scanner.eat(']') {
                break;
            }
        }
        elements.push(scanner.quoted_string()?);
    }

    scanner.skip_whitespace();
    if let Some(unexpected) = scanner.peek() {
        return Err(Error::list_syntax(
            scanner.position(),
            format!("unexpected '{unexpected}' after closing bracket"),
        ));
    }
    Ok(elements)
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    len: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            len: input.len(),
        }
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map(|(index, _)| *index).unwrap_or(self.len)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn advance(&mut self) -> Option<char> {
        self.chars.next().map(|(_, ch)| ch)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        let position = self.position();
        match self.advance() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(Error::list_syntax(
                position,
                format!("expected '{expected}', found '{ch}'"),
            )),
            None => Err(Error::list_syntax(
                position,
                format!("expected '{expected}', found end of input"),
            )),
        }
    }

    fn quoted_string(&mut self) -> Result<String> {
        let position = self.position();
        let quote = match self.advance() {
            Some(ch @ ('\'' | '"')) => ch,
            Some(ch) => {
                return Err(Error::list_syntax(
                    position,
                    format!("expected quoted string, found '{ch}'"),
                ));
            }
            None => {
                return Err(Error::list_syntax(
                    position,
                    "expected quoted string, found end of input",
                ));
            }
        };

        let mut value = String::new();
        loop {
            let position = self.position();
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(Error::list_syntax(
                            position,
                            "unterminated escape sequence",
                        ));
                    }
                },
                Some(ch) if ch == quote => return Ok(value),
                Some(ch) => value.push(ch),
                None => {
                    return Err(Error::list_syntax(position, "unterminated string literal"));
                }
            }
        }
    }
}
