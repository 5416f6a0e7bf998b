//! Formula parser
//!
//! A recursive descent parser over a small hand-written scanner. Operator
//! precedence, lowest first: comparison, `&`, `+ -`, `* /`, `^`, unary
//! `-`/`+` and postfix `%`, then `:` ranges. Binary operators associate to
//! the left, `^` included.

use crate::ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use keysheet_core::{CellAddress, CellError, CellRange};

/// Parse formula text (with its leading `=`) into an expression tree
///
/// ```rust
/// use keysheet_formula::{parse_formula, FormulaExpr};
///
/// let ast = parse_formula("=SUM(F4,E4)").unwrap();
/// assert!(matches!(ast, FormulaExpr::Function { ref name, .. } if name == "SUM"));
/// assert!(parse_formula("SUM(F4)").is_err());
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    let body = formula
        .trim()
        .strip_prefix('=')
        .ok_or_else(|| FormulaError::Parse("Formula must start with '='".into()))?;

    let mut parser = FormulaParser::new(body)?;
    if parser.current == Token::Eof {
        return Err(FormulaError::Parse("Empty formula".into()));
    }
    let expr = parser.parse_expression()?;

    if parser.current != Token::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected {:?} after expression",
            parser.current
        )));
    }
    Ok(expr)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),

    Identifier(String),
    CellRef(String),
    /// `Sheet1!` or `'My Sheet'!`, name unquoted
    SheetRef(String),

    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,
    LeftParen,
    RightParen,

    Eof,
}

struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current: Token,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> FormulaResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current: Token::Eof,
        };
        parser.current = parser.scan_token()?;
        Ok(parser)
    }

    // === Scanner ===

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();
        let Some(c) = self.peek_char() else {
            return Ok(Token::Eof);
        };

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Ampersand),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '=' => Some(Token::Equal),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        match c {
            '<' => {
                self.advance();
                Ok(match self.peek_char() {
                    Some('=') => {
                        self.advance();
                        Token::LessEqual
                    }
                    Some('>') => {
                        self.advance();
                        Token::NotEqual
                    }
                    _ => Token::LessThan,
                })
            }
            '>' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    Ok(Token::GreaterEqual)
                } else {
                    Ok(Token::GreaterThan)
                }
            }
            '"' => self.scan_string(),
            '\'' => self.scan_quoted_sheet(),
            '#' => self.scan_error(),
            c if c.is_ascii_digit() => Ok(self.scan_number()),
            '.' if self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                Ok(self.scan_number())
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => Ok(self.scan_identifier_or_ref()),
            other => Err(FormulaError::Parse(format!(
                "Unexpected character '{}' at position {}",
                other, self.pos
            ))),
        }
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        self.advance();
        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') if self.peek_char_at(1) == Some('"') => {
                    s.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::String(s));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Parse("Unterminated string literal".into())),
            }
        }
    }

    fn scan_quoted_sheet(&mut self) -> FormulaResult<Token> {
        self.advance();
        let mut name = String::new();
        loop {
            match self.peek_char() {
                Some('\'') if self.peek_char_at(1) == Some('\'') => {
                    name.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    name.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Parse("Unterminated sheet name".into())),
            }
        }
        if self.peek_char() != Some('!') {
            return Err(FormulaError::Parse(format!(
                "Expected '!' after sheet name '{}'",
                name
            )));
        }
        self.advance();
        Ok(Token::SheetRef(name))
    }

    fn scan_error(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance();
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '!' | '?'))
        {
            self.advance();
        }
        let text = &self.input[start..self.pos];
        CellError::parse(text)
            .map(Token::Error)
            .ok_or_else(|| FormulaError::Parse(format!("Unknown error literal '{}'", text)))
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        self.skip_digits();
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_digits();
        }
        // Exponent only when digits follow, so `1E` stays a parse error
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_char_at(1), Some('+' | '-')));
            if self.peek_char_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..=sign {
                    self.advance();
                }
                self.skip_digits();
            }
        }
        let text = &self.input[start..self.pos];
        Token::Number(text.parse().unwrap_or(0.0))
    }

    fn scan_identifier_or_ref(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'))
        {
            self.advance();
        }
        let text = &self.input[start..self.pos];

        if self.peek_char() == Some('!') {
            self.advance();
            return Token::SheetRef(text.to_string());
        }

        let before_paren = self.peek_non_space() == Some('(');
        if !before_paren {
            if text.eq_ignore_ascii_case("TRUE") {
                return Token::Boolean(true);
            }
            if text.eq_ignore_ascii_case("FALSE") {
                return Token::Boolean(false);
            }
            if is_cell_reference(text) {
                return Token::CellRef(text.to_string());
            }
        }
        Token::Identifier(text.to_string())
    }

    // === Character helpers ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn peek_non_space(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    // === Token helpers ===

    fn consume(&mut self) -> FormulaResult<Token> {
        let next = self.scan_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token) -> FormulaResult<()> {
        if self.current == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected, self.current
            )))
        }
    }

    // === Grammar ===

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_concatenation()?;
        loop {
            let op = match self.current {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            self.consume()?;
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_additive()?;
        while self.current == Token::Ampersand {
            self.consume()?;
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.current {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.consume()?;
            let right = self.parse_power()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let mut left = self.parse_unary()?;
        while self.current == Token::Caret {
            self.consume()?;
            let right = self.parse_unary()?;
            left = binary(BinaryOperator::Power, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current {
            Token::Minus => {
                self.consume()?;
                let operand = self.parse_unary()?;
                Ok(FormulaExpr::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                })
            }
            Token::Plus => {
                self.consume()?;
                self.parse_unary()
            }
            _ => {
                let mut expr = self.parse_range()?;
                while self.current == Token::Percent {
                    self.consume()?;
                    expr = FormulaExpr::UnaryOp {
                        op: UnaryOperator::Percent,
                        operand: Box::new(expr),
                    };
                }
                Ok(expr)
            }
        }
    }

    fn parse_range(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;
        if self.current != Token::Colon {
            return Ok(left);
        }
        self.consume()?;
        let right = self.parse_primary()?;

        match (left, right) {
            (FormulaExpr::CellRef(start), FormulaExpr::CellRef(end)) => {
                // `Sheet2!A1:B2`: the end inherits the start's sheet
                let sheet = match (start.sheet, end.sheet) {
                    (Some(a), Some(b)) if !a.eq_ignore_ascii_case(&b) => {
                        return Err(FormulaError::Parse(
                            "Range references must be on the same sheet".into(),
                        ))
                    }
                    (a, b) => a.or(b),
                };
                Ok(FormulaExpr::RangeRef(RangeReference {
                    sheet,
                    range: CellRange::new(start.address, end.address),
                }))
            }
            _ => Err(FormulaError::Parse(
                "Range operator needs cell references on both sides".into(),
            )),
        }
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.consume()? {
            Token::Number(n) => Ok(FormulaExpr::Number(n)),
            Token::String(s) => Ok(FormulaExpr::String(s)),
            Token::Boolean(b) => Ok(FormulaExpr::Boolean(b)),
            Token::Error(e) => Ok(FormulaExpr::Error(e)),
            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            Token::SheetRef(sheet) => match self.consume()? {
                Token::CellRef(text) => cell_reference(Some(sheet), &text),
                other => Err(FormulaError::Parse(format!(
                    "Expected cell reference after '{}!', got {:?}",
                    sheet, other
                ))),
            },
            Token::CellRef(text) => cell_reference(None, &text),
            Token::Identifier(name) => {
                if self.current == Token::LeftParen {
                    self.parse_function_call(name)
                } else {
                    Ok(FormulaExpr::NameRef(name))
                }
            }
            Token::Eof => Err(FormulaError::Parse("Unexpected end of formula".into())),
            other => Err(FormulaError::Parse(format!("Unexpected token {:?}", other))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(Token::LeftParen)?;
        let mut args = Vec::new();
        if self.current != Token::RightParen {
            args.push(self.parse_expression()?);
            while self.current == Token::Comma {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }
        self.expect(Token::RightParen)?;
        Ok(FormulaExpr::Function {
            name: name.to_uppercase(),
            args,
        })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn cell_reference(sheet: Option<String>, text: &str) -> FormulaResult<FormulaExpr> {
    let address = CellAddress::parse(text)
        .map_err(|e| FormulaError::Parse(format!("Invalid cell reference '{}': {}", text, e)))?;
    Ok(FormulaExpr::CellRef(CellReference { sheet, address }))
}

/// `[$]letters[$]digits`, nothing else
fn is_cell_reference(text: &str) -> bool {
    let rest = text.strip_prefix('$').unwrap_or(text);
    let letters = rest.chars().take_while(char::is_ascii_alphabetic).count();
    if letters == 0 || letters > 3 {
        return false;
    }
    let rest = &rest[letters..];
    let digits = rest.strip_prefix('$').unwrap_or(rest);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(row: u32, col: u16) -> FormulaExpr {
        FormulaExpr::CellRef(CellReference {
            sheet: None,
            address: CellAddress::new(row, col),
        })
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_formula("=42").unwrap(), FormulaExpr::Number(42.0));
        assert_eq!(parse_formula("=.5").unwrap(), FormulaExpr::Number(0.5));
        assert_eq!(parse_formula("=1e3").unwrap(), FormulaExpr::Number(1000.0));
        assert_eq!(
            parse_formula("=\"a \"\"b\"\"\"").unwrap(),
            FormulaExpr::String("a \"b\"".into())
        );
        assert_eq!(parse_formula("=true").unwrap(), FormulaExpr::Boolean(true));
        assert_eq!(
            parse_formula("=#DIV/0!").unwrap(),
            FormulaExpr::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_parse_precedence() {
        let ast = parse_formula("=1+2*3").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Add,
                FormulaExpr::Number(1.0),
                binary(
                    BinaryOperator::Multiply,
                    FormulaExpr::Number(2.0),
                    FormulaExpr::Number(3.0)
                )
            )
        );

        let ast = parse_formula("=A1&B1=\"x\"").unwrap();
        assert!(matches!(
            ast,
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Equal,
                ..
            }
        ));
    }

    #[test]
    fn test_power_is_left_associative() {
        let ast = parse_formula("=2^3^2").unwrap();
        let FormulaExpr::BinaryOp { left, .. } = ast else {
            panic!("expected binary op");
        };
        assert!(matches!(
            *left,
            FormulaExpr::BinaryOp {
                op: BinaryOperator::Power,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_function_call() {
        assert_eq!(
            parse_formula("=sum(F4, E4)").unwrap(),
            FormulaExpr::Function {
                name: "SUM".into(),
                args: vec![cell(3, 5), cell(3, 4)],
            }
        );
        assert_eq!(
            parse_formula("=PI()").unwrap(),
            FormulaExpr::Function {
                name: "PI".into(),
                args: vec![],
            }
        );
        // LOG10 looks like a reference but is called
        assert!(matches!(
            parse_formula("=LOG10 (100)").unwrap(),
            FormulaExpr::Function { .. }
        ));
    }

    #[test]
    fn test_parse_references() {
        let ast = parse_formula("=$B$2").unwrap();
        let FormulaExpr::CellRef(r) = ast else {
            panic!("expected cell ref");
        };
        assert!(r.address.row_absolute && r.address.col_absolute);

        let ast = parse_formula("='Q1 data'!A1:B3").unwrap();
        let FormulaExpr::RangeRef(r) = ast else {
            panic!("expected range ref");
        };
        assert_eq!(r.sheet.as_deref(), Some("Q1 data"));
        assert_eq!((r.range.row_count(), r.range.col_count()), (3, 2));

        let ast = parse_formula("=Data!C1:C9").unwrap();
        assert!(matches!(ast, FormulaExpr::RangeRef(ref r) if r.sheet.as_deref() == Some("Data")));

        assert_eq!(
            parse_formula("=Rate").unwrap(),
            FormulaExpr::NameRef("Rate".into())
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", "=", "1+2", "=1+", "=(1+2", "=SUM(1,", "=\"open", "=A1:", "=1 2", "=#BOGUS!", "=@A1"] {
            assert!(
                matches!(parse_formula(bad), Err(FormulaError::Parse(_))),
                "{bad:?} should not parse"
            );
        }
    }
}
