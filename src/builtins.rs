//! Natively implemented functions. They are not bindings in any environment:
//! identifier lookup falls back to this registry once every scope has missed.

use crate::evaluator::{Error, ErrorKind};
use crate::printer::{pr_str, PrintMode};
use crate::token::Token;
use crate::types::{Arity, BuiltinFn, Object};
use itertools::Itertools;
use std::collections::HashMap;

type Result = std::result::Result<Object, Error>;

macro_rules! builtin {
    ($NAME:ident, $fn_ptr:ident, $arity:expr) => {
        paste::item! {
            static $NAME: BuiltinFn = BuiltinFn {
                name: stringify!([<$NAME:lower>]),
                fn_ptr: $fn_ptr,
                arity: $arity,
            };
        }
    };
}

fn invalid_argument(token: &Token, function: &'static str, argument: &Object) -> Error {
    Error::at(
        token,
        ErrorKind::InvalidArgument {
            function,
            argument: argument.type_name(),
        },
    )
}

fn empty_collection(token: &Token, function: &'static str, collection: &Object) -> Error {
    Error::at(
        token,
        ErrorKind::EmptyCollection {
            function,
            collection: collection.type_name(),
        },
    )
}

builtin!(LEN, len_, Arity::exactly(1));

/// Strings are measured in bytes.
fn len_(token: &Token, args: &[Object]) -> Result {
    match &args[0] {
        Object::String(s) => Ok(Object::Integer(s.len() as i64)),
        Object::Array(items) => Ok(Object::Integer(items.len() as i64)),
        other => Err(invalid_argument(token, "len", other)),
    }
}

builtin!(PRINT, print_, Arity::at_least(0));

fn print_(_: &Token, args: &[Object]) -> Result {
    println!(
        "{}",
        args.iter()
            .map(|arg| pr_str(arg, PrintMode::Directly))
            .join(" ")
    );
    Ok(Object::Void)
}

builtin!(APPEND, append_, Arity::at_least(2));

// Arrays are immutable: the result is always a fresh array.
fn append_(token: &Token, args: &[Object]) -> Result {
    match &args[0] {
        Object::Array(items) => {
            let mut appended = Vec::with_capacity(items.len() + args.len() - 1);
            appended.extend(items.iter().cloned());
            appended.extend(args[1..].iter().cloned());
            Ok(Object::wrap_array(appended))
        }
        other => Err(invalid_argument(token, "append", other)),
    }
}

builtin!(FIRST, first_, Arity::exactly(1));

fn first_(token: &Token, args: &[Object]) -> Result {
    let collection = &args[0];
    let first = match collection {
        Object::String(s) => s.chars().next().map(|c| Object::String(c.to_string())),
        Object::Array(items) => items.first().cloned(),
        other => return Err(invalid_argument(token, "first", other)),
    };
    first.ok_or_else(|| empty_collection(token, "first", collection))
}

builtin!(TAIL, tail_, Arity::exactly(1));

/// The tail of an empty collection is the collection itself.
fn tail_(token: &Token, args: &[Object]) -> Result {
    match &args[0] {
        Object::String(s) if s.is_empty() => Ok(args[0].clone()),
        Object::String(s) => Ok(Object::String(s.chars().skip(1).collect())),
        Object::Array(items) if items.is_empty() => Ok(args[0].clone()),
        Object::Array(items) => Ok(Object::wrap_array(items[1..].to_vec())),
        other => Err(invalid_argument(token, "tail", other)),
    }
}

builtin!(TYPE, type_, Arity::exactly(1));

fn type_(_: &Token, args: &[Object]) -> Result {
    Ok(Object::String(args[0].type_name().to_string()))
}

/// The registry consulted by the evaluator when an identifier is unbound.
pub struct Builtins(HashMap<&'static str, &'static BuiltinFn>);

impl Builtins {
    pub fn get(&self, name: &str) -> Option<&'static BuiltinFn> {
        self.0.get(name).copied()
    }
}

lazy_static! {
    pub static ref BUILTINS: Builtins = {
        let mut map = HashMap::new();
        let funcs: [&'static BuiltinFn; 6] = [
            // Collections
            &LEN,
            &APPEND,
            &FIRST,
            &TAIL,
            // Other
            &PRINT,
            &TYPE,
        ];
        for func in funcs.iter() {
            map.insert(func.name, *func);
        }
        Builtins(map)
    };
}
