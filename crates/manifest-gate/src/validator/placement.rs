//! Placement constraint expressions.
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | operand ( cmp operand )?
//! cmp     := "==" | "!=" | ">=" | "<=" | ">" | "<"
//! operand := identifier | number
//! ```
//!
//! Identifiers are letters (any script), digits and `_`. Anything else is
//! rejected, so `NodeType == Front$End` fails.

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(String),
    Compare(&'static str),
    And,
    Or,
    Not,
    Open,
    Close,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Compare("=="));
                i += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Compare("!="));
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '>' | '<' => {
                let op = match (c, next) {
                    ('>', Some('=')) => ">=",
                    ('<', Some('=')) => "<=",
                    ('>', _) => ">",
                    _ => "<",
                };
                i += op.len();
                tokens.push(Token::Compare(op));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                if text.parse::<f64>().is_err() {
                    return Err(format!("invalid number '{}'", text));
                }
                if i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    return Err(format!("invalid token starting at '{}'", text));
                }
                tokens.push(Token::Number(text));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expr(&mut self) -> Result<(), String> {
        self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.bump();
            self.and()?;
        }
        Ok(())
    }

    fn and(&mut self) -> Result<(), String> {
        self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.bump();
            self.unary()?;
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<(), String> {
        if self.peek() == Some(&Token::Not) {
            self.bump();
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<(), String> {
        match self.bump() {
            Some(Token::Open) => {
                self.expr()?;
                match self.bump() {
                    Some(Token::Close) => Ok(()),
                    _ => Err("missing ')'".to_string()),
                }
            }
            Some(Token::Ident(_)) | Some(Token::Number(_)) => {
                if let Some(Token::Compare(_)) = self.peek() {
                    self.bump();
                    match self.bump() {
                        Some(Token::Ident(_)) | Some(Token::Number(_)) => Ok(()),
                        _ => Err("comparison is missing its right operand".to_string()),
                    }
                } else {
                    Ok(())
                }
            }
            Some(token) => Err(format!("unexpected {:?}", token)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

/// Checks a placement constraint expression. Blank expressions mean "no constraint".
pub fn check_placement_constraint(expr: &str) -> Result<(), String> {
    if expr.trim().is_empty() {
        return Ok(());
    }

    let tokens = tokenize(expr).map_err(|e| format!("Invalid placement constraint '{}': {}", expr, e))?;
    let mut parser = Parser { tokens, pos: 0 };
    parser
        .expr()
        .and_then(|_| match parser.peek() {
            None => Ok(()),
            Some(token) => Err(format!("unexpected {:?}", token)),
        })
        .map_err(|e| format!("Invalid placement constraint '{}': {}", expr, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_expressions() {
        for expr in [
            "",
            "NodeType == FrontEnd",
            "(NodeType != BackEnd) && HasSSD",
            "!(Region == West) || Zone >= 2",
            "NodeTypeÄ == Größe_1",
            "Capacity < 10.5",
            "((a==b))",
        ] {
            assert!(check_placement_constraint(expr).is_ok(), "{} should parse", expr);
        }
    }

    #[test]
    fn test_invalid_expressions() {
        for expr in [
            "NodeType == Front$End",
            "NodeType = FrontEnd",
            "NodeType ==",
            "(NodeType == A",
            "NodeType == A)",
            "A && || B",
            "A & B",
            "1abc == 2",
            "A == B == C",
            "NodeType == \"quoted\"",
        ] {
            assert!(check_placement_constraint(expr).is_err(), "{} should fail", expr);
        }
    }

    #[test]
    fn test_error_names_expression() {
        let err = check_placement_constraint("a # b").unwrap_err();
        assert!(err.contains("'a # b'"));
        assert!(err.contains("unexpected character '#'"));
    }
}
