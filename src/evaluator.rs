use crate::ast::{AssignKind, BlockStatement, Expression, Identifier, Program, Statement};
use crate::builtins::{Builtins, BUILTINS};
use crate::collector::Collector;
use crate::config::Config;
use crate::environment::Environment;
use crate::stack::ensure_sufficient_stack;
use crate::token::Token;
use crate::types::{BadArgCount, BuiltinFn, Closure, Object};
use itertools::Itertools;
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

/// Evaluation either produces a value or unwinds towards the nearest frame that
/// can handle the interruption: a function call (for `return`) or the program.
pub type Result<T = Object> = std::result::Result<T, Unwind>;

#[derive(Debug)]
pub enum Unwind {
    Return(Object),
    Error(Error),
}

impl From<Error> for Unwind {
    fn from(e: Error) -> Self {
        Self::Error(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    UnknownPrefixOperator {
        operator: String,
        operand: &'static str,
    },
    UnknownInfixOperator {
        left: &'static str,
        operator: String,
        right: &'static str,
    },
    TypeMismatch {
        left: &'static str,
        operator: String,
        right: &'static str,
    },
    IdentifierNotFound(String),
    AlreadyDeclared(String),
    ConstantReassignment(String),
    NonBooleanCondition(&'static str),
    NotAFunction(&'static str),
    IndexNotSupported(&'static str),
    InvalidIndexType(&'static str),
    IndexOutOfBounds {
        index: i64,
        length: usize,
    },
    EmptyCollection {
        function: &'static str,
        collection: &'static str,
    },
    InvalidArgument {
        function: &'static str,
        argument: &'static str,
    },
    DivisionByZero,
    BadArgCount(BadArgCount),
    CallDepthExceeded(usize),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ErrorKind::*;
        match self {
            UnknownPrefixOperator { operator, operand } => {
                write!(f, "unknown operator: {}{}", operator, operand)
            }
            UnknownInfixOperator {
                left,
                operator,
                right,
            } => write!(f, "unknown operator: {} {} {}", left, operator, right),
            TypeMismatch {
                left,
                operator,
                right,
            } => write!(f, "type mismatch: {} {} {}", left, operator, right),
            IdentifierNotFound(name) => write!(f, "identifier not found: {}", name),
            AlreadyDeclared(name) => write!(f, "identifier already declared: {}", name),
            ConstantReassignment(name) => write!(f, "cannot assign to constant: {}", name),
            NonBooleanCondition(t) => write!(f, "non-boolean condition: {}", t),
            NotAFunction(t) => write!(f, "not a function: {}", t),
            IndexNotSupported(t) => write!(f, "index operator not supported: {}", t),
            InvalidIndexType(t) => write!(f, "invalid index type: {}", t),
            IndexOutOfBounds { index, length } => {
                write!(f, "index out of bounds: {} (length {})", index, length)
            }
            EmptyCollection {
                function,
                collection,
            } => write!(
                f,
                "index out of bounds: {} of empty {}",
                function, collection
            ),
            InvalidArgument { function, argument } => {
                write!(f, "invalid argument: {}({})", function, argument)
            }
            DivisionByZero => write!(f, "division by zero"),
            BadArgCount(e) => write!(f, "{}", e),
            CallDepthExceeded(depth) => write!(f, "maximum call depth exceeded: {}", depth),
        }
    }
}

/// A runtime error, positioned at the token of the node that raised it.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
}

impl Error {
    pub fn at(token: &Token, kind: ErrorKind) -> Self {
        Self {
            kind,
            line: token.line,
            column: token.column,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.line, self.column, self.kind)
    }
}

fn fail<T>(token: &Token, kind: ErrorKind) -> Result<T> {
    Err(Unwind::Error(Error::at(token, kind)))
}

pub struct Evaluator {
    builtins: &'static Builtins,
    max_call_depth: usize,
    depth: usize,
    collector: Collector,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Evaluator {
    pub fn new(config: &Config) -> Self {
        Self::with_builtins(&BUILTINS, config)
    }

    fn with_builtins(builtins: &'static Builtins, config: &Config) -> Self {
        Self {
            builtins,
            max_call_depth: config.max_call_depth,
            depth: 0,
            collector: Collector::default(),
        }
    }

    /// Makes a long-lived scope, such as an interpreter's global one, eligible
    /// for collection once its owner lets go of it.
    pub fn track(&mut self, env: &Rc<Environment>) {
        self.collector.track(env);
    }

    /// Frees call scopes that are only kept alive by closures stored in them.
    /// Runs after every program; scopes still referenced from outside survive.
    pub fn collect_garbage(&mut self) -> usize {
        self.collector.collect()
    }

    /// Evaluates a whole program. A top-level `return` ends the program with its
    /// value; the first error ends it with that error.
    pub fn eval(&mut self, program: &Program, env: &Rc<Environment>) -> Object {
        self.depth = 0;
        let result = match self.eval_statements(program, env) {
            Ok(value) | Err(Unwind::Return(value)) => value,
            Err(Unwind::Error(e)) => {
                log::debug!("evaluation failed: {}", e);
                e.into()
            }
        };
        self.collect_garbage();
        result
    }

    fn eval_statements(&mut self, statements: &[Statement], env: &Rc<Environment>) -> Result {
        let mut result = Object::Void;
        for statement in statements {
            result = self.eval_statement(statement, env)?;
        }
        Ok(result)
    }

    // Blocks share the ambient environment; only calls open a new scope.
    fn eval_block(&mut self, block: &BlockStatement, env: &Rc<Environment>) -> Result {
        self.eval_statements(&block.statements, env)
    }

    fn eval_statement(&mut self, statement: &Statement, env: &Rc<Environment>) -> Result {
        match statement {
            Statement::Let { name, value, .. } => {
                let value = self.eval_expression(value, env)?;
                bind(name, &name.token, value, AssignKind::Define, env)?;
                Ok(Object::Void)
            }
            Statement::Return { value, .. } => {
                let value = self.eval_expression(value, env)?;
                Err(Unwind::Return(value))
            }
            Statement::Expression { expression, .. } => self.eval_expression(expression, env),
            Statement::Block(block) => self.eval_block(block, env),
        }
    }

    fn eval_expression(&mut self, expression: &Expression, env: &Rc<Environment>) -> Result {
        ensure_sufficient_stack(|| self.eval_expression_inner(expression, env))
    }

    fn eval_expression_inner(&mut self, expression: &Expression, env: &Rc<Environment>) -> Result {
        match expression {
            Expression::Identifier(ident) => self.eval_identifier(ident, env),
            Expression::Integer { value, .. } => Ok(Object::Integer(*value)),
            Expression::String { value, .. } => Ok(Object::String(value.clone())),
            Expression::Boolean { value, .. } => Ok(Object::Boolean(*value)),
            Expression::Prefix {
                token,
                operator,
                right,
            } => {
                let right = self.eval_expression(right, env)?;
                eval_prefix(token, operator, right)
            }
            Expression::Infix {
                token,
                operator,
                left,
                right,
            } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                eval_infix(token, operator, left, right)
            }
            Expression::If {
                token,
                condition,
                consequence,
                alternative,
            } => match self.eval_expression(condition, env)? {
                Object::Boolean(true) => self.eval_block(consequence, env),
                Object::Boolean(false) => match alternative {
                    Some(alternative) => self.eval_block(alternative, env),
                    None => Ok(Object::Void),
                },
                other => fail(token, ErrorKind::NonBooleanCondition(other.type_name())),
            },
            Expression::Function(literal) => Ok(Object::Function(Rc::new(Closure {
                literal: literal.clone(),
                env: env.clone(),
            }))),
            Expression::Call {
                token,
                function,
                arguments,
            } => {
                let function = self.eval_expression(function, env)?;
                let arguments = self.eval_expressions(arguments, env)?;
                self.apply(token, &function, arguments)
            }
            Expression::Array { items, .. } => {
                self.eval_expressions(items, env).map(Object::wrap_array)
            }
            Expression::Access {
                token,
                collection,
                index,
            } => {
                let collection = self.eval_expression(collection, env)?;
                let index = self.eval_expression(index, env)?;
                eval_index(token, &collection, &index)
            }
            Expression::Assign {
                token,
                name,
                value,
                kind,
            } => {
                let value = self.eval_expression(value, env)?;
                bind(name, token, value, *kind, env)
            }
        }
    }

    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
        env: &Rc<Environment>,
    ) -> Result<Vec<Object>> {
        expressions
            .iter()
            .map(|expression| self.eval_expression(expression, env))
            .collect()
    }

    fn eval_identifier(&self, ident: &Identifier, env: &Rc<Environment>) -> Result {
        if let Some(value) = env.get(&ident.name) {
            return Ok(value);
        }
        match self.builtins.get(&ident.name) {
            Some(func) => Ok(Object::Builtin(func)),
            None => fail(
                &ident.token,
                ErrorKind::IdentifierNotFound(ident.name.clone()),
            ),
        }
    }

    pub(crate) fn apply(&mut self, token: &Token, callable: &Object, args: Vec<Object>) -> Result {
        match callable {
            Object::Builtin(func) => call_builtin(func, token, &args).map_err(Unwind::Error),
            Object::Function(closure) => self.apply_function(token, closure, args),
            other => fail(token, ErrorKind::NotAFunction(other.type_name())),
        }
    }

    fn apply_function(&mut self, token: &Token, closure: &Closure, args: Vec<Object>) -> Result {
        let name = format!("fn({})", closure.literal.parameters.iter().join(", "));
        closure
            .arity()
            .validate_for(args.len(), &name)
            .map_err(|e| Error::at(token, ErrorKind::BadArgCount(e)))?;
        if self.depth >= self.max_call_depth {
            return fail(token, ErrorKind::CallDepthExceeded(self.max_call_depth));
        }

        log::trace!("Call {} with {}", name, pretty_print_args(&args));
        let env = Environment::spawn_from(&closure.env);
        self.collector.track(&env);
        for (parameter, arg) in closure.literal.parameters.iter().zip(args) {
            env.set(parameter.name.clone(), arg);
        }

        self.depth += 1;
        let result = self.eval_block(&closure.literal.body, &env);
        self.depth -= 1;

        match result {
            Err(Unwind::Return(value)) => Ok(value),
            other => other,
        }
    }
}

fn bind(
    name: &Identifier,
    token: &Token,
    value: Object,
    kind: AssignKind,
    env: &Rc<Environment>,
) -> Result {
    let key = name.name.as_str();
    match kind {
        AssignKind::Reassign => match env.owner(key) {
            None => fail(token, ErrorKind::IdentifierNotFound(key.to_string())),
            Some(scope) if scope.is_const(key) => {
                fail(token, ErrorKind::ConstantReassignment(key.to_string()))
            }
            Some(scope) => Ok(scope.set(key, value)),
        },
        _ if env.contains_local(key) => fail(token, ErrorKind::AlreadyDeclared(key.to_string())),
        AssignKind::Define => {
            log::debug!("define {} as {}", key, value);
            Ok(env.set(key, value))
        }
        AssignKind::DefineConst => {
            log::debug!("define constant {} as {}", key, value);
            Ok(env.set_const(key, value))
        }
    }
}

fn eval_prefix(token: &Token, operator: &str, right: Object) -> Result {
    match (operator, &right) {
        ("!", Object::Boolean(value)) => Ok(Object::Boolean(!value)),
        ("!", Object::Void) => Ok(Object::Boolean(true)),
        ("-", Object::Integer(value)) => Ok(Object::Integer(value.wrapping_neg())),
        _ => fail(
            token,
            ErrorKind::UnknownPrefixOperator {
                operator: operator.to_string(),
                operand: right.type_name(),
            },
        ),
    }
}

fn eval_infix(token: &Token, operator: &str, left: Object, right: Object) -> Result {
    let operands = |operator: &str| (left.type_name(), operator.to_string(), right.type_name());
    let unknown = || {
        let (left, operator, right) = operands(operator);
        fail(
            token,
            ErrorKind::UnknownInfixOperator {
                left,
                operator,
                right,
            },
        )
    };

    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => match eval_integer_infix(operator, *l, *r) {
            Some(Ok(value)) => Ok(value),
            Some(Err(kind)) => fail(token, kind),
            None => unknown(),
        },
        _ if left.type_name() != right.type_name() => {
            let (left, operator, right) = operands(operator);
            fail(
                token,
                ErrorKind::TypeMismatch {
                    left,
                    operator,
                    right,
                },
            )
        }
        (Object::String(l), Object::String(r)) => match operator {
            "+" => Ok(Object::String(format!("{}{}", l, r))),
            "==" => Ok(Object::Boolean(l == r)),
            "!=" => Ok(Object::Boolean(l != r)),
            _ => unknown(),
        },
        _ => match operator {
            "==" => Ok(Object::Boolean(left.same(&right))),
            "!=" => Ok(Object::Boolean(!left.same(&right))),
            _ => unknown(),
        },
    }
}

// Arithmetic wraps on overflow; division truncates toward zero.
fn eval_integer_infix(
    operator: &str,
    l: i64,
    r: i64,
) -> Option<std::result::Result<Object, ErrorKind>> {
    use Object::{Boolean, Integer};
    let value = match operator {
        "+" => Integer(l.wrapping_add(r)),
        "-" => Integer(l.wrapping_sub(r)),
        "*" => Integer(l.wrapping_mul(r)),
        "/" if r == 0 => return Some(Err(ErrorKind::DivisionByZero)),
        "/" => Integer(l.wrapping_div(r)),
        "<" => Boolean(l < r),
        ">" => Boolean(l > r),
        "<=" => Boolean(l <= r),
        ">=" => Boolean(l >= r),
        "==" => Boolean(l == r),
        "!=" => Boolean(l != r),
        _ => return None,
    };
    Some(Ok(value))
}

/// Negative indices count from the end: `-1` is the last item and `-len` the first.
fn eval_index(token: &Token, collection: &Object, index: &Object) -> Result {
    match (collection, index) {
        (Object::Array(items), Object::Integer(i)) => {
            let length = items.len();
            let position = if *i < 0 { length as i64 + *i } else { *i };
            match usize::try_from(position).ok().and_then(|p| items.get(p)) {
                Some(item) => Ok(item.clone()),
                None => fail(
                    token,
                    ErrorKind::IndexOutOfBounds {
                        index: *i,
                        length,
                    },
                ),
            }
        }
        (Object::Array(_), other) => fail(token, ErrorKind::InvalidIndexType(other.type_name())),
        (other, _) => fail(token, ErrorKind::IndexNotSupported(other.type_name())),
    }
}

pub(crate) fn pretty_print_args(args: &[Object]) -> String {
    match args.len() {
        0 => "no args".into(),
        1 => args[0].to_string(),
        _ => format!("\n\t{}", args.iter().join("\n\t")),
    }
}

pub fn call_builtin(
    func: &BuiltinFn,
    token: &Token,
    args: &[Object],
) -> std::result::Result<Object, Error> {
    func.arity
        .validate_for(args.len(), func.name)
        .map_err(|e| Error::at(token, ErrorKind::BadArgCount(e)))?;
    log::trace!("Call {} with {}", func.name, pretty_print_args(args));
    let result = (func.fn_ptr)(token, args);
    match &result {
        Ok(val) => log::trace!("Call to {} resulted in {}", func.name, val),
        Err(e) => log::trace!("Call to {} failed: {}", func.name, e),
    }
    result
}
