use crate::ast::Program;
use crate::config::Config;
use crate::environment::Environment;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::parser::{self, ParseError};
use crate::types::Object;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Parse(Vec<ParseError>),
    Eval(Object),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(errors) => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
            Error::Eval(obj) => write!(f, "{}", obj),
        }
    }
}

pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let (program, errors) = parser::parse_program(Lexer::new(source));
    match errors.is_empty() {
        true => Ok(program),
        false => Err(errors),
    }
}

/// Lexes, parses and evaluates source text against one long-lived global
/// environment, so that definitions survive from one `run` to the next.
pub struct Interpreter {
    env: Rc<Environment>,
    evaluator: Evaluator,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Interpreter {
    pub fn new(config: &Config) -> Self {
        let env = Environment::new();
        let mut evaluator = Evaluator::new(config);
        evaluator.track(&env);
        Self { env, evaluator }
    }

    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    /// Nothing is evaluated if the source does not parse.
    pub fn run(&mut self, source: &str) -> Result<Object, Error> {
        let program = parse(source).map_err(Error::Parse)?;
        self.eval(&program)
    }

    pub fn eval(&mut self, program: &Program) -> Result<Object, Error> {
        match self.evaluator.eval(program, &self.env) {
            error @ Object::Error(_) => Err(Error::Eval(error)),
            value => Ok(value),
        }
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // Top-level functions close over the global scope; let go of it first so
        // the collector can see whether anything else still does.
        drop(std::mem::replace(&mut self.env, Environment::new()));
        self.evaluator.collect_garbage();
    }
}
