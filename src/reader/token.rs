// Tokens of the constructor-call syntax

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Identifier(String),
    Number(String),
    String(String),

    // Keywords
    True,
    False,
    Null,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Minus,

    /// Malformed input, with a description
    Invalid(String),
    Eof,
}

impl Token {
    /// Both the capitalized and the JSON spellings are keywords
    pub fn keyword_from_str(s: &str) -> Option<Token> {
        match s {
            "True" | "true" => Some(Token::True),
            "False" | "false" => Some(Token::False),
            "None" | "null" => Some(Token::Null),
            _ => None,
        }
    }
}
