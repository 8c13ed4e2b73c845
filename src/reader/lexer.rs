// Lexer for the constructor-call syntax

use super::token::Token;

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let current_char = input.first().copied();
        Lexer {
            input,
            position: 0,
            current_char,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(ch) = self.current_char else {
            return Token::Eof;
        };

        let punctuation = match ch {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            '{' => Some(Token::LeftBrace),
            '}' => Some(Token::RightBrace),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            '-' => Some(Token::Minus),
            _ => None,
        };
        if let Some(token) = punctuation {
            self.advance();
            return token;
        }

        match ch {
            '\'' | '"' => self.read_string(ch),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            c => {
                self.advance();
                Token::Invalid(format!("Unexpected character '{}'", c))
            }
        }
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a string literal quoted with `quote`, handling backslash escapes
    fn read_string(&mut self, quote: char) -> Token {
        self.advance(); // Skip opening quote
        let mut string = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance(); // Skip closing quote
                return Token::String(string);
            }
            if ch != '\\' {
                string.push(ch);
                self.advance();
                continue;
            }

            self.advance();
            let escaped = match self.current_char {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('r') => '\r',
                Some('b') => '\u{8}',
                Some('f') => '\u{c}',
                Some('u') => match self.read_unicode_escape() {
                    Some(c) => c,
                    None => return Token::Invalid("Invalid unicode escape".to_string()),
                },
                Some(other) => other,
                None => break,
            };
            string.push(escaped);
            self.advance();
        }

        Token::Invalid("Unterminated string literal".to_string())
    }

    /// Read the four hex digits of `\uXXXX`, leaving the cursor on the last one
    fn read_unicode_escape(&mut self) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self.peek()?.to_digit(16)?;
            code = code * 16 + digit;
            self.advance();
        }
        char::from_u32(code)
    }

    /// Read a number (integer, fraction and exponent)
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;
        let mut has_exponent = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && !has_exponent {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && !has_exponent {
                has_exponent = true;
                number.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current_char {
                    number.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }

        tokens
    }
}
