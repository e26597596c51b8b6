//! Syntax tree produced by the parser.
//!
//! Every node keeps the token it started at so that evaluation errors can be
//! positioned. `Display` renders the canonical, fully parenthesised form: it does
//! not depend on how the source was laid out, and parsing it again yields a tree with
//! the same rendering.

use crate::token::Token;
use derive_more::{Deref, DerefMut};
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

#[derive(Deref, DerefMut, Debug, Clone, PartialEq, Default)]
pub struct Program(pub Vec<Statement>);

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub name: String,
}

impl Identifier {
    pub fn from_token(token: Token) -> Self {
        let name = token.literal.clone();
        Self { token, name }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let {
        token: Token,
        name: Identifier,
        value: Expression,
    },
    Return {
        token: Token,
        value: Expression,
    },
    Expression {
        token: Token,
        expression: Expression,
    },
    Block(BlockStatement),
}

/// The three binding operators: `=`, `:=` and `::`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    Reassign,
    Define,
    DefineConst,
}

impl AssignKind {
    pub fn operator(self) -> &'static str {
        match self {
            AssignKind::Reassign => "=",
            AssignKind::Define => ":=",
            AssignKind::DefineConst => "::",
        }
    }
}

/// A function literal. Shared with the closures created from it, so that
/// calling a function never copies its body.
#[derive(Debug, PartialEq)]
pub struct FunctionLiteral {
    pub token: Token,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    Integer {
        token: Token,
        value: i64,
    },
    String {
        token: Token,
        value: String,
    },
    Boolean {
        token: Token,
        value: bool,
    },
    Prefix {
        token: Token,
        operator: String,
        right: Box<Expression>,
    },
    Infix {
        token: Token,
        operator: String,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    If {
        token: Token,
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function(Rc<FunctionLiteral>),
    Call {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array {
        token: Token,
        items: Vec<Expression>,
    },
    Access {
        token: Token,
        collection: Box<Expression>,
        index: Box<Expression>,
    },
    Assign {
        token: Token,
        name: Identifier,
        value: Box<Expression>,
        kind: AssignKind,
    },
}

impl Expression {
    pub fn token(&self) -> &Token {
        use Expression::*;
        match self {
            Identifier(ident) => &ident.token,
            Function(literal) => &literal.token,
            Integer { token, .. }
            | String { token, .. }
            | Boolean { token, .. }
            | Prefix { token, .. }
            | Infix { token, .. }
            | If { token, .. }
            | Call { token, .. }
            | Array { token, .. }
            | Access { token, .. }
            | Assign { token, .. } => token,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iter().join("; "))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ {} }}", self.statements.iter().join("; "))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value, .. } => write!(f, "let {} = {}", name, value),
            Statement::Return { value, .. } => write!(f, "return {}", value),
            Statement::Expression { expression, .. } => write!(f, "{}", expression),
            Statement::Block(block) => write!(f, "{}", block),
        }
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn({}) {}", self.parameters.iter().join(", "), self.body)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Expression::*;
        match self {
            Identifier(ident) => write!(f, "{}", ident),
            Integer { value, .. } => write!(f, "{}", value),
            String { value, .. } => write!(f, "\"{}\"", value),
            Boolean { value, .. } => write!(f, "{}", value),
            Prefix {
                operator, right, ..
            } => write!(f, "({}{})", operator, right),
            Infix {
                operator,
                left,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
            If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if {} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Function(literal) => write!(f, "{}", literal),
            Call {
                function,
                arguments,
                ..
            } => write!(f, "{}({})", function, arguments.iter().join(", ")),
            Array { items, .. } => write!(f, "[ {} ]", items.iter().join(", ")),
            Access {
                collection, index, ..
            } => write!(f, "({}[{}])", collection, index),
            Assign {
                name, value, kind, ..
            } => write!(f, "({} {} {})", name, kind.operator(), value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Identifier {
        Identifier::from_token(Token::new(TokenKind::Ident, name, 1, 1))
    }

    fn expression_statement(expression: Expression) -> Statement {
        Statement::Expression {
            token: expression.token().clone(),
            expression,
        }
    }

    #[test]
    fn if_renders_with_blocks() {
        let program = Program(vec![expression_statement(Expression::If {
            token: Token::new(TokenKind::If, "if", 1, 1),
            condition: Box::new(Expression::Identifier(ident("myVar"))),
            consequence: BlockStatement {
                token: Token::new(TokenKind::LBrace, "{", 1, 10),
                statements: vec![expression_statement(Expression::Identifier(ident(
                    "anotherVar",
                )))],
            },
            alternative: None,
        })]);

        assert_eq!(program.to_string(), "if myVar { anotherVar }");
    }

    #[test]
    fn let_and_array_render() {
        let token = Token::new(TokenKind::LBracket, "[", 1, 9);
        let program = Program(vec![
            Statement::Let {
                token: Token::new(TokenKind::Let, "let", 1, 1),
                name: ident("xs"),
                value: Expression::Array {
                    token: token.clone(),
                    items: vec![],
                },
            },
            expression_statement(Expression::Array {
                token,
                items: vec![
                    Expression::String {
                        token: Token::new(TokenKind::String, "a", 1, 1),
                        value: "a".into(),
                    },
                    Expression::Identifier(ident("xs")),
                ],
            }),
        ]);

        assert_eq!(program.to_string(), r#"let xs = [  ]; [ "a", xs ]"#);
    }
}
