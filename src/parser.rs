use crate::ast::{
    AssignKind, BlockStatement, Expression, FunctionLiteral, Identifier, Program, Statement,
};
use crate::lexer::Lexer;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenKind};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assign,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        use TokenKind::*;
        match kind {
            Assign | Define | DefineConst => Precedence::Assign,
            Eq | Neq => Precedence::Equals,
            Lt | Gt | Leq | Geq => Precedence::LessGreater,
            Plus | Minus => Precedence::Sum,
            Asterisk | Slash => Precedence::Product,
            LParen | LBracket => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken {
        expected: TokenKind,
        got: TokenKind,
    },
    NoPrefixRule(TokenKind),
    BadInteger(String),
    InvalidAssignTarget(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub kind: ParseErrorKind,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedToken { expected, got } => write!(
                f,
                "expected next token to be \"{}\", got \"{}\" instead",
                expected, got
            ),
            ParseErrorKind::NoPrefixRule(kind) => {
                write!(f, "no prefix parse function for \"{}\" found", kind)
            }
            ParseErrorKind::BadInteger(literal) => {
                write!(f, "could not parse \"{}\" as integer", literal)
            }
            ParseErrorKind::InvalidAssignTarget(target) => {
                write!(f, "invalid assignment target: {}", target)
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.line, self.column, self.kind)
    }
}

type PrefixRule<'a> = fn(&mut Parser<'a>) -> Option<Expression>;
type InfixRule<'a> = fn(&mut Parser<'a>, Expression) -> Option<Expression>;

fn prefix_rule<'a>(kind: TokenKind) -> Option<PrefixRule<'a>> {
    use TokenKind::*;
    let rule: PrefixRule<'a> = match kind {
        Ident => Parser::parse_identifier,
        Int => Parser::parse_integer,
        String => Parser::parse_string,
        True | False => Parser::parse_boolean,
        Bang | Minus => Parser::parse_prefix,
        LParen => Parser::parse_grouped,
        If => Parser::parse_if,
        Function => Parser::parse_function,
        LBracket => Parser::parse_array,
        _ => return None,
    };
    Some(rule)
}

fn infix_rule<'a>(kind: TokenKind) -> Option<InfixRule<'a>> {
    use TokenKind::*;
    let rule: InfixRule<'a> = match kind {
        Plus | Minus | Asterisk | Slash | Eq | Neq | Lt | Gt | Leq | Geq => Parser::parse_infix,
        LParen => Parser::parse_call,
        LBracket => Parser::parse_access,
        Assign | Define | DefineConst => Parser::parse_assign,
        _ => return None,
    };
    Some(rule)
}

/// Pratt parser over a [`Lexer`], with one token of lookahead past the current one.
///
/// Errors do not stop the parse: they are collected and the construct that
/// failed is dropped. There is no resynchronisation, so one mistake can produce
/// several messages.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ParseError::to_string).collect()
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.current.is(TokenKind::Eof) {
            if let Some(statement) = self.parse_statement() {
                program.push(statement);
            }
            self.next_token();
        }
        program
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn expect_peek(&mut self, kind: TokenKind) -> Option<()> {
        if self.peek.is(kind) {
            self.next_token();
            Some(())
        } else {
            let got = self.peek.clone();
            self.error_at(
                &got,
                ParseErrorKind::UnexpectedToken {
                    expected: kind,
                    got: got.kind,
                },
            );
            None
        }
    }

    fn skip_semicolon(&mut self) {
        if self.peek.is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    fn error_at(&mut self, token: &Token, kind: ParseErrorKind) {
        let error = ParseError {
            line: token.line,
            column: token.column,
            kind,
        };
        log::debug!("parse error {}", error);
        self.errors.push(error);
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                self.skip_semicolon();
                Some(Statement::Block(block))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::Ident)?;
        let name = Identifier::from_token(self.current.clone());
        self.expect_peek(TokenKind::Assign)?;
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Statement::Let { token, name, value })
    }

    fn parse_return(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Statement::Return { token, value })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();
        Some(Statement::Expression { token, expression })
    }

    /// Expects the current token to be `{`; leaves the parser on the matching `}`.
    fn parse_block(&mut self) -> Option<BlockStatement> {
        let token = self.current.clone();
        let mut statements = Vec::new();
        while !self.peek.is(TokenKind::RBrace) && !self.peek.is(TokenKind::Eof) {
            self.next_token();
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
        }
        self.expect_peek(TokenKind::RBrace)?;
        Some(BlockStatement { token, statements })
    }

    pub fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        ensure_sufficient_stack(|| self.parse_expression_inner(precedence))
    }

    fn parse_expression_inner(&mut self, precedence: Precedence) -> Option<Expression> {
        let prefix = match prefix_rule(self.current.kind) {
            Some(rule) => rule,
            None => {
                let token = self.current.clone();
                self.error_at(&token, ParseErrorKind::NoPrefixRule(token.kind));
                return None;
            }
        };
        let mut left = prefix(self)?;

        while !self.peek.is(TokenKind::Semicolon) && precedence < Precedence::of(self.peek.kind) {
            let infix = match infix_rule(self.peek.kind) {
                Some(rule) => rule,
                None => return Some(left),
            };
            self.next_token();
            left = infix(self, left)?;
        }
        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(Identifier::from_token(
            self.current.clone(),
        )))
    }

    fn parse_integer(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        match token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer { token, value }),
            Err(_) => {
                let literal = token.literal.clone();
                self.error_at(&token, ParseErrorKind::BadInteger(literal));
                None
            }
        }
    }

    fn parse_string(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let value = token.literal.clone();
        Some(Expression::String { token, value })
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let value = token.is(TokenKind::True);
        Some(Expression::Boolean { token, value })
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let operator = token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            token,
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped(&mut self) -> Option<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RParen)?;
        Some(expression)
    }

    fn parse_if(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::LBrace)?;
        let consequence = self.parse_block()?;

        let mut alternative = None;
        if self.peek.is(TokenKind::Else) {
            self.next_token();
            alternative = Some(if self.peek.is(TokenKind::If) {
                self.parse_else_if()?
            } else {
                self.expect_peek(TokenKind::LBrace)?;
                self.parse_block()?
            });
        }

        Some(Expression::If {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    // `else if ...` becomes a block holding the nested if.
    fn parse_else_if(&mut self) -> Option<BlockStatement> {
        let block_token = self.current.clone();
        self.next_token();
        let token = self.current.clone();
        let expression = self.parse_if()?;
        Some(BlockStatement {
            token: block_token,
            statements: vec![Statement::Expression { token, expression }],
        })
    }

    fn parse_function(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        self.expect_peek(TokenKind::LParen)?;
        let parameters = self.parse_parameters()?;
        self.expect_peek(TokenKind::LBrace)?;
        let body = self.parse_block()?;
        Some(Expression::Function(Rc::new(FunctionLiteral {
            token,
            parameters,
            body,
        })))
    }

    fn parse_parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut parameters = Vec::new();
        if self.peek.is(TokenKind::RParen) {
            self.next_token();
            return Some(parameters);
        }

        self.expect_peek(TokenKind::Ident)?;
        parameters.push(Identifier::from_token(self.current.clone()));
        while self.peek.is(TokenKind::Comma) {
            self.next_token();
            self.expect_peek(TokenKind::Ident)?;
            parameters.push(Identifier::from_token(self.current.clone()));
        }

        self.expect_peek(TokenKind::RParen)?;
        Some(parameters)
    }

    fn parse_array(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let items = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::Array { token, items })
    }

    fn parse_infix(&mut self, left: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let operator = token.literal.clone();
        let precedence = Precedence::of(token.kind);
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            token,
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_call(&mut self, function: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::Call {
            token,
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_access(&mut self, collection: Expression) -> Option<Expression> {
        let token = self.current.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenKind::RBracket)?;
        Some(Expression::Access {
            token,
            collection: Box::new(collection),
            index: Box::new(index),
        })
    }

    // Right associative: `a = b = 1` assigns `b` first.
    fn parse_assign(&mut self, target: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let kind = match token.kind {
            TokenKind::Define => AssignKind::Define,
            TokenKind::DefineConst => AssignKind::DefineConst,
            _ => AssignKind::Reassign,
        };
        let name = match target {
            Expression::Identifier(name) => name,
            other => {
                self.error_at(
                    &token,
                    ParseErrorKind::InvalidAssignTarget(other.to_string()),
                );
                return None;
            }
        };
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expression::Assign {
            token,
            name,
            value: Box::new(value),
            kind,
        })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut items = Vec::new();
        if self.peek.is(end) {
            self.next_token();
            return Some(items);
        }

        self.next_token();
        let first = self.parse_expression(Precedence::Lowest);
        let mut complete = first.is_some();
        items.extend(first);
        while self.peek.is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            let item = self.parse_expression(Precedence::Lowest);
            complete &= item.is_some();
            items.extend(item);
        }

        self.expect_peek(end)?;
        match complete {
            true => Some(items),
            false => None,
        }
    }
}

/// Parses a whole source text, returning the program along with every error met.
pub fn parse_program(lexer: Lexer<'_>) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();
    (program, parser.into_errors())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> (Program, Vec<String>) {
        let (program, errors) = parse_program(Lexer::new(input));
        (program, errors.iter().map(ParseError::to_string).collect())
    }

    fn canonical(input: &str) -> String {
        let (program, errors) = parse(input);
        assert_eq!(errors, Vec::<String>::new(), "parsing {:?}", input);
        program.to_string()
    }

    #[test]
    fn operator_precedence() {
        let cases = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a + b * c", "(a + (b * c))"),
            ("a * b + c", "((a * b) + c)"),
            ("a + b / c", "(a + (b / c))"),
            ("1 + 2 * 3", "(1 + (2 * 3))"),
            ("5 > 4 == 3 < 6", "((5 > 4) == (3 < 6))"),
            ("5 <= 4 != 3 >= 6", "((5 <= 4) != (3 >= 6))"),
            ("a + b; -c * d", "(a + b); ((-c) * d)"),
            ("(a + b) * c", "((a + b) * c)"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
        ];
        for (input, expected) in cases.iter() {
            assert_eq!(canonical(input), *expected, "input {:?}", input);
        }
    }

    #[test]
    fn calls_and_access_bind_tightest() {
        let cases = [
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            ),
            ("-f(x)", "(-f(x))"),
            ("a * [1, 2, 3, 4][b * c] * d", "((a * ([ 1, 2, 3, 4 ][(b * c)])) * d)"),
            ("add(a * b[2], b[1], 2 * [1, 2][1])", "add((a * (b[2])), (b[1]), (2 * ([ 1, 2 ][1])))"),
            ("fn(x) { x }(5)", "fn(x) { x }(5)"),
        ];
        for (input, expected) in cases.iter() {
            assert_eq!(canonical(input), *expected, "input {:?}", input);
        }
    }

    #[test]
    fn statements_render_canonically() {
        let cases = [
            ("let x = 5;", "let x = 5"),
            ("let y = true", "let y = true"),
            ("return x + 1;", "return (x + 1)"),
            (r#""hello world""#, r#""hello world""#),
            ("[]", "[  ]"),
            ("[1, 2 * 2]", "[ 1, (2 * 2) ]"),
            ("fn() {}", "fn() {  }"),
            ("fn(x, y) { x + y; }", "fn(x, y) { (x + y) }"),
            ("if (x < y) { x }", "if (x < y) { x }"),
            ("if x < y { x } else { y }", "if (x < y) { x } else { y }"),
            (
                "if a { 1 } else if b { 2 } else { 3 }",
                "if a { 1 } else { if b { 2 } else { 3 } }",
            ),
            ("{ let a = 1; a }", "{ let a = 1; a }"),
            ("a := 1", "(a := 1)"),
            ("a :: b = 2 + 3", "(a :: (b = (2 + 3)))"),
            ("x = x * 2", "(x = (x * 2))"),
        ];
        for (input, expected) in cases.iter() {
            assert_eq!(canonical(input), *expected, "input {:?}", input);
        }
    }

    #[test]
    fn canonical_form_reparses_to_itself() {
        let inputs = [
            "let newAdder = fn(x) {fn(y) {x + y}}; let addTwo = newAdder(2); addTwo(8)",
            "a + b; -c * d",
            "if (1 < 2) { return [1, 2][0] } else { len(\"abc\") }",
            "a := 1; b :: a; (a = 2) + b",
            "f(g)(h)[0]",
            "{ }",
        ];
        for input in inputs.iter() {
            let once = canonical(input);
            assert_eq!(canonical(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn let_statement_structure() {
        let (program, errors) = parse("let answer = 42;");
        assert!(errors.is_empty());
        assert_eq!(program.len(), 1);
        match &program[0] {
            Statement::Let { name, value, token } => {
                assert_eq!(name.name, "answer");
                assert_eq!(token.kind, TokenKind::Let);
                match value {
                    Expression::Integer { value, .. } => assert_eq!(*value, 42),
                    other => panic!("expected integer, got {:?}", other),
                }
            }
            other => panic!("expected let statement, got {:?}", other),
        }
    }

    #[test]
    fn assignment_kinds() {
        for (input, expected) in [
            ("a = 1", AssignKind::Reassign),
            ("a := 1", AssignKind::Define),
            ("a :: 1", AssignKind::DefineConst),
        ]
        .iter()
        {
            let (program, _) = parse(input);
            match &program[0] {
                Statement::Expression {
                    expression: Expression::Assign { kind, name, .. },
                    ..
                } => {
                    assert_eq!(kind, expected);
                    assert_eq!(name.name, "a");
                }
                other => panic!("expected assignment, got {:?}", other),
            }
        }
    }

    #[test]
    fn missing_tokens_are_reported_with_positions() {
        let (program, errors) = parse("let = 5;");
        assert_eq!(program.to_string(), "5");
        assert_eq!(
            errors[0],
            "[1:5] expected next token to be \"IDENT\", got \"=\" instead"
        );

        let (_, errors) = parse("let x 5;");
        assert_eq!(
            errors[0],
            "[1:7] expected next token to be \"=\", got \"INT\" instead"
        );
    }

    #[test]
    fn missing_closing_brace_is_an_error() {
        let (program, errors) = parse("if (true) { 1");
        assert!(program.is_empty());
        assert_eq!(
            errors,
            vec!["[1:14] expected next token to be \"}\", got \"EOF\" instead".to_string()]
        );
    }

    #[test]
    fn no_prefix_rule() {
        let (program, errors) = parse("* 3");
        assert_eq!(program.to_string(), "3");
        assert_eq!(errors, vec!["[1:1] no prefix parse function for \"*\" found".to_string()]);
    }

    #[test]
    fn illegal_tokens_surface_as_missing_prefix_rules() {
        let (_, errors) = parse("@");
        assert_eq!(
            errors,
            vec!["[1:1] no prefix parse function for \"ILLEGAL\" found".to_string()]
        );
    }

    #[test]
    fn integer_overflow_is_a_parse_error() {
        let (_, errors) = parse("99999999999999999999");
        assert_eq!(
            errors,
            vec!["[1:1] could not parse \"99999999999999999999\" as integer".to_string()]
        );
    }

    #[test]
    fn only_identifiers_can_be_assigned() {
        let (program, errors) = parse("1 + 2 = 3");
        assert_eq!(program.to_string(), "3");
        assert_eq!(errors, vec!["[1:7] invalid assignment target: (1 + 2)".to_string()]);
    }

    #[test]
    fn parameters_must_be_identifiers() {
        let (_, errors) = parse("fn(1) { 1 }");
        assert_eq!(
            errors[0],
            "[1:4] expected next token to be \"IDENT\", got \"INT\" instead"
        );
    }

    #[test]
    fn errors_cascade_without_resynchronisation() {
        let (_, errors) = parse("let x = ; let y = 2");
        assert_eq!(
            errors,
            vec!["[1:9] no prefix parse function for \";\" found".to_string()]
        );
        let (program, _) = parse("let x = ; let y = 2");
        assert_eq!(program.to_string(), "let y = 2");

        let (_, errors) = parse("f(1, ) + )");
        assert!(errors.len() >= 2, "{:?}", errors);
    }
}
