pub mod ast;
pub mod builtins;
pub mod cmdline;
mod collector;
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod printer;
mod stack;
pub mod token;
pub mod types;

#[macro_use]
extern crate lazy_static;

pub use interpreter::Interpreter;
pub use types::Object;
