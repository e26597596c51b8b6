use crate::ast::FunctionLiteral;
use crate::environment::Environment;
use crate::evaluator;
use crate::printer::{pr_str, PrintMode};
use crate::token::Token;
use std::fmt;
use std::fmt::Formatter;
use std::ops::{RangeFrom, RangeInclusive};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Arity {
    Between(RangeInclusive<usize>),
    AtLeast(RangeFrom<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadArgCount {
    pub name: String,
    pub expected: Arity,
    pub got: usize,
}

impl fmt::Display for BadArgCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let problem = match &self.expected {
            Arity::Between(r) if self.got > *r.end() => "too many arguments",
            _ => "not enough arguments",
        };
        write!(
            f,
            "{} for {}: expected {}, found {}",
            problem, self.name, self.expected, self.got
        )
    }
}

impl Arity {
    pub(crate) const fn exactly(n: usize) -> Self {
        Self::Between(n..=n)
    }

    pub(crate) const fn at_least(n: usize) -> Self {
        Self::AtLeast(n..)
    }

    pub(crate) fn contains(&self, n: usize) -> bool {
        match self {
            Self::Between(range) => range.contains(&n),
            Self::AtLeast(range) => range.contains(&n),
        }
    }

    pub(crate) fn validate_for(&self, n: usize, name: &str) -> Result<(), BadArgCount> {
        match self.contains(n) {
            true => Ok(()),
            false => Err(BadArgCount {
                name: name.to_string(),
                expected: self.clone(),
                got: n,
            }),
        }
    }
}

impl PartialEq for Arity {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arity::Between(x), Arity::Between(y)) => x == y,
            (Arity::AtLeast(x), Arity::AtLeast(y)) => x.start == y.start,
            _ => false,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Between(r) => {
                if r.start() == r.end() {
                    write!(f, "{}", r.start())
                } else {
                    write!(f, "{} to {}", r.start(), r.end())
                }
            }
            Arity::AtLeast(r) => write!(f, "at least {}", r.start),
        }
    }
}

/// A function implemented natively. It receives the call's token so that any
/// error it reports points at the call site.
pub struct BuiltinFn {
    pub name: &'static str,
    pub arity: Arity,
    pub fn_ptr: fn(&Token, &[Object]) -> Result<Object, evaluator::Error>,
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "builtin function #<{}>", self.name)
    }
}

#[derive(Clone)]
pub struct Closure {
    pub literal: Rc<FunctionLiteral>,
    pub env: Rc<Environment>,
}

impl Closure {
    pub fn arity(&self) -> Arity {
        Arity::exactly(self.literal.parameters.len())
    }
}

impl fmt::Debug for Closure {
    // Not derived because we want to skip the environment: it may well contain this Closure!
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Closure{{{}}}", self.literal)
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    String(String),
    Boolean(bool),
    Void,
    Error(Rc<evaluator::Error>),
    Function(Rc<Closure>),
    Builtin(&'static BuiltinFn),
    Array(Rc<Vec<Object>>),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::String(_) => "STRING",
            Object::Boolean(_) => "BOOLEAN",
            Object::Void => "VOID",
            Object::Error(_) => "ERROR",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::Array(_) => "ARRAY",
        }
    }

    /// The textual form shown to users, e.g. by the REPL.
    pub fn inspect(&self) -> String {
        pr_str(self, PrintMode::ReadableRepresentation)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    pub(crate) fn wrap_array(items: Vec<Object>) -> Self {
        Self::Array(Rc::new(items))
    }

    /// Identity for the reference types, value for everything else. This is what
    /// `==` means in the language.
    pub(crate) fn same(&self, other: &Object) -> bool {
        use Object::*;
        match (self, other) {
            (Integer(x), Integer(y)) => x == y,
            (String(x), String(y)) => x == y,
            (Boolean(x), Boolean(y)) => x == y,
            (Void, Void) => true,
            (Error(x), Error(y)) => Rc::ptr_eq(x, y),
            (Function(x), Function(y)) => Rc::ptr_eq(x, y),
            (Builtin(x), Builtin(y)) => std::ptr::eq(*x, *y),
            (Array(x), Array(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }
}

// Structural equality, used by tests and by hosts comparing results.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Array(x), Object::Array(y)) => x == y,
            (Object::Error(x), Object::Error(y)) => x == y,
            _ => self.same(other),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inspect())
    }
}

impl From<evaluator::Error> for Object {
    fn from(e: evaluator::Error) -> Self {
        Object::Error(Rc::new(e))
    }
}
