use crate::types::Object;
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Strings are written as their raw contents, as `print` does.
    Directly,
    /// The `inspect` form: strings are quoted so values read back unambiguously.
    ReadableRepresentation,
}

pub fn pr_str(object: &Object, mode: PrintMode) -> String {
    match object {
        Object::Integer(value) => value.to_string(),
        Object::Boolean(value) => value.to_string(),
        Object::String(value) => match mode {
            PrintMode::Directly => value.clone(),
            PrintMode::ReadableRepresentation => format!("\"{}\"", value),
        },
        Object::Void => String::from("void"),
        Object::Error(error) => error.to_string(),
        Object::Function(closure) => closure.literal.to_string(),
        Object::Builtin(func) => format!("builtin function #<{}>", func.name),
        // Items always use the readable form, so `print(["a"])` shows the quotes.
        Object::Array(items) => format!(
            "[{}]",
            items
                .iter()
                .map(|item| pr_str(item, PrintMode::ReadableRepresentation))
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_quoted_only_when_readable() {
        let s = Object::String("hi there".into());
        assert_eq!(pr_str(&s, PrintMode::ReadableRepresentation), "\"hi there\"");
        assert_eq!(pr_str(&s, PrintMode::Directly), "hi there");
    }

    #[test]
    fn arrays_are_comma_separated_without_padding() {
        let xs = Object::wrap_array(vec![
            Object::Integer(1),
            Object::String("two".into()),
            Object::wrap_array(vec![]),
            Object::Boolean(false),
        ]);
        assert_eq!(xs.inspect(), r#"[1, "two", [], false]"#);
        assert_eq!(pr_str(&xs, PrintMode::Directly), r#"[1, "two", [], false]"#);
    }

    #[test]
    fn scalars() {
        assert_eq!(Object::Integer(-42).inspect(), "-42");
        assert_eq!(Object::Boolean(true).inspect(), "true");
        assert_eq!(Object::Void.inspect(), "void");
    }
}
