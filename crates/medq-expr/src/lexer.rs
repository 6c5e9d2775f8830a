use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    True,
    False,
    None,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub offset: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    tokens: Vec<Token>,
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<(), ExprError> {
        while let Some(&(offset, c)) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '0'..='9' => self.number(offset)?,
                '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                    self.number(offset)?
                }
                '\'' | '"' => self.string(offset, c)?,
                c if c.is_alphabetic() || c == '_' => self.word(offset),
                _ => self.operator(offset, c)?,
            }
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            offset: self.source.len(),
        });
        Ok(())
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn push(&mut self, kind: TokenKind, offset: usize) {
        self.tokens.push(Token { kind, offset });
    }

    fn number(&mut self, start: usize) -> Result<(), ExprError> {
        let mut text = String::new();
        let mut is_float = false;

        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '0'..='9' => text.push(c),
                '_' => {}
                '.' if !is_float => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.chars.next();
                    if let Some(&(_, sign)) = self.chars.peek()
                        && (sign == '+' || sign == '-')
                    {
                        text.push(sign);
                        self.chars.next();
                    }
                    continue;
                }
                _ => break,
            }
            self.chars.next();
        }

        let kind = if is_float {
            let value = text
                .parse::<f64>()
                .map_err(|_| ExprError::syntax(start, format!("invalid number '{text}'")))?;
            TokenKind::Float(value)
        } else {
            let value = text.parse::<i64>().map_err(|_| ExprError::Overflow)?;
            TokenKind::Int(value)
        };
        self.push(kind, start);
        Ok(())
    }

    fn string(&mut self, start: usize, quote: char) -> Result<(), ExprError> {
        self.chars.next();
        let mut value = String::new();

        loop {
            let Some((offset, c)) = self.chars.next() else {
                return Err(ExprError::syntax(start, "unterminated string"));
            };
            match c {
                c if c == quote => break,
                '\\' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        return Err(ExprError::syntax(offset, "unterminated escape"));
                    };
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        '\\' | '\'' | '"' => escaped,
                        other => {
                            return Err(ExprError::syntax(
                                offset,
                                format!("unknown escape '\\{other}'"),
                            ));
                        }
                    });
                }
                '\n' => return Err(ExprError::syntax(offset, "newline in string")),
                c => value.push(c),
            }
        }

        self.push(TokenKind::Str(value), start);
        Ok(())
    }

    fn word(&mut self, start: usize) {
        let mut word = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        let kind = match word.as_str() {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "is" => TokenKind::Is,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => TokenKind::Name(word),
        };
        self.push(kind, start);
    }

    fn operator(&mut self, start: usize, c: char) -> Result<(), ExprError> {
        self.chars.next();
        let next = self.chars.peek().map(|&(_, c)| c);

        let (kind, wide) = match (c, next) {
            ('*', Some('*')) => (TokenKind::DoubleStar, true),
            ('*', _) => (TokenKind::Star, false),
            ('/', Some('/')) => (TokenKind::DoubleSlash, true),
            ('/', _) => (TokenKind::Slash, false),
            ('=', Some('=')) => (TokenKind::Eq, true),
            ('!', Some('=')) => (TokenKind::Ne, true),
            ('<', Some('=')) => (TokenKind::Le, true),
            ('<', _) => (TokenKind::Lt, false),
            ('>', Some('=')) => (TokenKind::Ge, true),
            ('>', _) => (TokenKind::Gt, false),
            ('+', _) => (TokenKind::Plus, false),
            ('-', _) => (TokenKind::Minus, false),
            ('%', _) => (TokenKind::Percent, false),
            ('(', _) => (TokenKind::LParen, false),
            (')', _) => (TokenKind::RParen, false),
            ('[', _) => (TokenKind::LBracket, false),
            (']', _) => (TokenKind::RBracket, false),
            (',', _) => (TokenKind::Comma, false),
            ('=', _) => return Err(ExprError::syntax(start, "assignment is not allowed")),
            ('.', _) => return Err(ExprError::syntax(start, "attribute access is not allowed")),
            (other, _) => {
                return Err(ExprError::syntax(start, format!("unexpected character '{other}'")));
            }
        };
        if wide {
            self.chars.next();
        }
        self.push(kind, start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            kinds("a >= 1.5e2 // 2"),
            vec![
                TokenKind::Name("a".into()),
                TokenKind::Ge,
                TokenKind::Float(150.0),
                TokenKind::DoubleSlash,
                TokenKind::Int(2),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn leading_dot_floats() {
        assert_eq!(
            kinds(".5 + 1."),
            vec![
                TokenKind::Float(0.5),
                TokenKind::Plus,
                TokenKind::Float(1.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strings_with_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "x""#),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("not x in y is None"),
            vec![
                TokenKind::Not,
                TokenKind::Name("x".into()),
                TokenKind::In,
                TokenKind::Name("y".into()),
                TokenKind::Is,
                TokenKind::None,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_attribute_access_and_assignment() {
        assert!(matches!(tokenize("a.b"), Err(ExprError::Syntax { offset: 1, .. })));
        assert!(matches!(tokenize("a = 1"), Err(ExprError::Syntax { offset: 2, .. })));
        assert!(tokenize("'open").is_err());
    }
}
