#![allow(dead_code)]

use baboon::config::Config;
use baboon::interpreter::{self, Interpreter};
use baboon::Object;

pub fn eval(source: &str) -> Object {
    eval_with(source, &Config::default())
}

pub fn eval_with(source: &str, config: &Config) -> Object {
    match Interpreter::new(config).run(source) {
        Ok(value) => value,
        Err(interpreter::Error::Eval(error)) => error,
        Err(e) => panic!("{:?} failed to parse:\n{}", source, e),
    }
}

pub fn inspect(source: &str) -> String {
    eval(source).inspect()
}

/// The message of the error `source` evaluates to, without its position.
pub fn error_message(source: &str) -> String {
    match eval(source) {
        Object::Error(e) => e.message(),
        other => panic!("{:?} should have failed, got {}", source, other),
    }
}

pub fn canonical(source: &str) -> String {
    match interpreter::parse(source) {
        Ok(program) => program.to_string(),
        Err(errors) => panic!("{:?} failed to parse: {:?}", source, errors),
    }
}

pub fn parse_errors(source: &str) -> Vec<String> {
    match interpreter::parse(source) {
        Ok(program) => panic!("{:?} should not parse, got {}", source, program),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}
