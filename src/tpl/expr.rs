use crate::Result;
use crate::error::LiquidError;
use crate::runtime::Value;
use crate::tpl::ast::{BinaryOp, Object};
use crate::tpl::token::{Token, TokenKind};

/// Deepest expression tree the parser builds. Also caps bracket nesting and
/// the number of operators, member/index steps and filters in one expression.
pub(crate) const MAX_EXPRESSION_DEPTH: usize = 128;

/// Parses the tokens of one expression into an [`Object`] tree.
///
/// `end` is the source offset just past the last token; it is reported when
/// the expression stops early.
pub(crate) fn parse_object(tokens: &[Token<'_>], end: usize) -> Result<Object> {
    parse_nested(tokens, end, 0)
}

fn parse_nested(tokens: &[Token<'_>], end: usize, nesting: usize) -> Result<Object> {
    if let [token] = tokens
        && token.kind == TokenKind::Identifier
    {
        return Ok(Object::Variable(token.text.to_string()));
    }

    let mut parser = ExprParser {
        tokens,
        pos: 0,
        end,
        nesting,
        links: 0,
    };
    let object = parser.object()?;

    if let Some(token) = parser.peek() {
        return Err(LiquidError::parse(
            format!("Unexpected token '{}'", token.text),
            token.offset,
        ));
    }

    if object.depth() > MAX_EXPRESSION_DEPTH {
        let offset = tokens.first().map_or(end, |t| t.offset);
        return Err(LiquidError::parse("Expression nested too deeply", offset));
    }

    Ok(object)
}

/// Builds the expression tree from `n` operands and `n - 1` operators.
///
/// The loosest-binding operator becomes the root; among equals the rightmost one
/// is chosen, so `a == b == c` groups as `(a == b) == c`.
fn build_expr(mut operands: Vec<Object>, mut operators: Vec<(BinaryOp, u8)>) -> Object {
    if operators.is_empty() {
        return operands.pop().unwrap_or(Object::Value(Value::Null));
    }

    let mut index = operators.len() - 1;
    for i in (0..operators.len() - 1).rev() {
        if operators[i].1 > operators[index].1 {
            index = i;
        }
    }

    let rhs_operands = operands.split_off(index + 1);
    let rhs_operators = operators.split_off(index + 1);
    let (op, _) = operators[index];
    operators.truncate(index);

    Object::BinOp {
        op,
        lhs: Box::new(build_expr(operands, operators)),
        rhs: Box::new(build_expr(rhs_operands, rhs_operators)),
    }
}

struct ExprParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    end: usize,
    /// Bracket depth of this expression.
    nesting: usize,
    /// Operators, member/index steps and filters seen so far.
    links: usize,
}

impl<'t, 'a> ExprParser<'t, 'a> {
    fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn next(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Offset of the current token, or the end of the expression.
    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    fn error(&self, message: impl Into<String>) -> LiquidError {
        LiquidError::parse(message, self.offset())
    }

    fn link(&mut self) -> Result<()> {
        self.links += 1;
        if self.links > MAX_EXPRESSION_DEPTH {
            return Err(self.error("Expression too long"));
        }
        Ok(())
    }

    fn object(&mut self) -> Result<Object> {
        let mut operands = vec![self.operand()?];
        let mut operators = Vec::new();

        while let Some(kind) = self.peek_kind()
            && kind != TokenKind::Pipe
        {
            self.link()?;
            operators.push(self.operator()?);
            operands.push(self.operand()?);
        }

        let mut object = build_expr(operands, operators);

        while self.peek_kind() == Some(TokenKind::Pipe) {
            self.link()?;
            object = self.filter(object)?;
        }

        Ok(object)
    }

    fn operand(&mut self) -> Result<Object> {
        let Some(token) = self.peek() else {
            return Err(self.error("Expected an expression"));
        };

        let mut object = match token.kind {
            TokenKind::Identifier => {
                self.pos += 1;
                Object::Variable(token.text.to_string())
            }
            TokenKind::BooleanLiteral | TokenKind::IntegerLiteral | TokenKind::StringLiteral => {
                Object::Value(self.literal()?)
            }
            _ => {
                return Err(self.error(format!("Bad object '{}'", token.text)));
            }
        };

        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.link()?;
                    self.pos += 1;
                    match self.peek() {
                        Some(name) if name.kind == TokenKind::Identifier => {
                            self.pos += 1;
                            object = Object::MemberAccess {
                                object: Box::new(object),
                                name: name.text.to_string(),
                            };
                        }
                        _ => return Err(self.error("Expected a member name after '.'")),
                    }
                }
                Some(TokenKind::LeftBracket) => {
                    self.link()?;
                    let index = self.index()?;
                    object = Object::ArrayAccess {
                        object: Box::new(object),
                        index: Box::new(index),
                    };
                }
                _ => break,
            }
        }

        Ok(object)
    }

    /// Parses `[ ... ]`, the opening bracket being the current token.
    fn index(&mut self) -> Result<Object> {
        let open = self.pos;
        if self.nesting >= MAX_EXPRESSION_DEPTH {
            return Err(self.error("Brackets nested too deeply"));
        }
        self.pos += 1;

        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::LeftBracket => depth += 1,
                TokenKind::RightBracket if depth == 0 => {
                    let inner = &self.tokens[open + 1..self.pos];
                    let close = token.offset;
                    self.pos += 1;
                    return parse_nested(inner, close, self.nesting + 1);
                }
                TokenKind::RightBracket => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }

        Err(LiquidError::parse(
            "Bad array: missing ']'",
            self.tokens[open].offset,
        ))
    }

    fn operator(&mut self) -> Result<(BinaryOp, u8)> {
        let offset = self.offset();
        match self.next() {
            Some(token) if token.kind == TokenKind::Operator => BinaryOp::from_token(token.text)
                .ok_or_else(|| {
                    LiquidError::parse(format!("Unknown operator '{}'", token.text), offset)
                }),
            Some(token) => Err(LiquidError::parse(
                format!("Bad expression: expected an operator, got '{}'", token.text),
                offset,
            )),
            None => Err(LiquidError::parse("Expected an operator", offset)),
        }
    }

    fn literal(&mut self) -> Result<Value> {
        let offset = self.offset();
        let Some(token) = self.next() else {
            return Err(LiquidError::parse("Expected a literal", offset));
        };

        match token.kind {
            TokenKind::BooleanLiteral => Ok(Value::Bool(token.is("true"))),
            TokenKind::IntegerLiteral => token.text.parse::<i64>().map(Value::Int).map_err(|_| {
                LiquidError::parse(
                    format!("Integer literal '{}' out of range", token.text),
                    offset,
                )
            }),
            TokenKind::StringLiteral => {
                Ok(Value::Str(token.text[1..token.text.len() - 1].to_string()))
            }
            _ => Err(LiquidError::parse(
                format!("Bad literal '{}'", token.text),
                offset,
            )),
        }
    }

    /// Parses `| name` or `| name: lit, lit, ...`.
    fn filter(&mut self, object: Object) -> Result<Object> {
        self.pos += 1;

        let name = match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.pos += 1;
                token.text.to_string()
            }
            _ => return Err(self.error("Bad filter: expected a filter name")),
        };

        let mut arguments = Vec::new();

        match self.peek_kind() {
            None | Some(TokenKind::Pipe) => {}
            Some(TokenKind::Colon) => {
                self.pos += 1;
                // A bare colon means no arguments.
                if matches!(self.peek_kind(), None | Some(TokenKind::Pipe)) {
                    return Ok(Object::Pipe {
                        object: Box::new(object),
                        filter: name,
                        arguments,
                    });
                }
                loop {
                    arguments.push(self.literal()?);
                    match self.peek_kind() {
                        None | Some(TokenKind::Pipe) => break,
                        Some(TokenKind::Comma) => self.pos += 1,
                        Some(_) => return Err(self.error("Bad filter: expected ','")),
                    }
                }
            }
            Some(_) => return Err(self.error("Bad filter: expected ':' or '|'")),
        }

        Ok(Object::Pipe {
            object: Box::new(object),
            filter: name,
            arguments,
        })
    }
}
