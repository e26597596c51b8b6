use crate::config::Config;
use crate::interpreter::{self, Interpreter};
use crate::lexer::Lexer;
use crate::parser::{ParseError, Parser};
use crate::types::Object;
use ansi_term::Colour::Red;
use itertools::Itertools;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::io;
use std::path::Path;

pub const PROMPT: &str = ">> ";

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Usage(String),
    Parse(Vec<ParseError>),
    Eval(Object),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Eval(_) => 1,
            Error::Usage(_) | Error::Parse(_) => 2,
            Error::Io(_) => 74,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Usage(program) => write!(f, "usage: {} [FILE]", program),
            Error::Parse(errors) => write!(f, "{}", errors.iter().join("\n")),
            Error::Eval(obj) => write!(f, "{}", obj),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<interpreter::Error> for Error {
    fn from(e: interpreter::Error) -> Self {
        match e {
            interpreter::Error::Parse(errors) => Error::Parse(errors),
            interpreter::Error::Eval(obj) => Error::Eval(obj),
        }
    }
}

pub fn paint_error(message: &str, color: bool) -> String {
    match color {
        true => Red.paint(message).to_string(),
        false => message.to_string(),
    }
}

pub fn setup(config: &Config) -> io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("baboon")?;
    interface.set_prompt(PROMPT)?;
    if let Some(path) = &config.history {
        if let Err(e) = interface.load_history(path) {
            log::debug!("no history loaded from {}: {}", path.display(), e);
        }
    };
    Ok(interface)
}

pub fn save_history<T: Terminal>(interface: &Interface<T>, config: &Config) -> io::Result<()> {
    match &config.history {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// What the REPL does with each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lex,
    Parse,
    Eval,
}

impl Mode {
    fn banner(self) -> &'static str {
        match self {
            Mode::Lex => "[RLPL Mode]",
            Mode::Parse => "[RPPL Mode]",
            Mode::Eval => "[REPL Mode]",
        }
    }
}

enum Command {
    Switch(Mode),
    Exit,
}

fn command(line: &str) -> Option<Command> {
    match line {
        "lex" => Some(Command::Switch(Mode::Lex)),
        "parse" => Some(Command::Switch(Mode::Parse)),
        "eval" => Some(Command::Switch(Mode::Eval)),
        "exit" => Some(Command::Exit),
        _ => None,
    }
}

/// Handles one line of input. `Err` holds text to be shown as an error.
pub fn process(mode: Mode, line: &str, interpreter: &mut Interpreter) -> Result<String, String> {
    match mode {
        Mode::Lex => Ok(Lexer::new(line).join("\n")),
        Mode::Parse => {
            let mut parser = Parser::new(Lexer::new(line));
            let program = parser.parse_program();
            match parser.error_messages() {
                messages if messages.is_empty() => Ok(program.to_string()),
                messages => Err(messages.join("\n")),
            }
        }
        Mode::Eval => interpreter
            .run(line)
            .map(|value| value.inspect())
            .map_err(|e| e.to_string()),
    }
}

pub fn repl<T: Terminal>(
    interface: &Interface<T>,
    interpreter: &mut Interpreter,
    config: &Config,
) -> io::Result<()> {
    let color = config.color_enabled();
    let mut mode = Mode::Eval;
    writeln!(interface, "{}", mode.banner())?;
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig)?;
            }
            Ok(ReadResult::Input(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                interface.add_history_unique(line.clone());
                match command(trimmed) {
                    Some(Command::Exit) => {
                        writeln!(interface, "[Exit]")?;
                        break;
                    }
                    Some(Command::Switch(new_mode)) => {
                        mode = new_mode;
                        writeln!(interface, "{}", mode.banner())?;
                    }
                    None => match process(mode, &line, interpreter) {
                        Ok(output) => writeln!(interface, "{}", output)?,
                        Err(error) => writeln!(interface, "{}", paint_error(&error, color))?,
                    },
                }
            }
            Err(e) => {
                log::error!("failed to read line: {}", e);
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Evaluates a source file in a fresh interpreter, printing the result.
pub fn run_file(path: &Path, config: &Config) -> Result<Object, Error> {
    log::debug!("running {}", path.display());
    let source = std::fs::read_to_string(path)?;
    let mut interpreter = Interpreter::new(config);
    let value = interpreter.run(&source)?;
    println!("{}", value.inspect());
    Ok(value)
}

pub fn launch(args: Vec<String>, config: &Config) -> Result<(), Error> {
    match args.as_slice() {
        [_] => {
            println!("Baboon Interactive Environment");
            let interface = setup(config)?;
            let mut interpreter = Interpreter::new(config);
            let result = repl(&interface, &mut interpreter, config);
            save_history(&interface, config)?;
            Ok(result?)
        }
        [_, path] => run_file(Path::new(path), config).map(|_| ()),
        _ => Err(Error::Usage(
            args.first().cloned().unwrap_or_else(|| "baboon".into()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lex_mode_lists_tokens() {
        let mut interpreter = Interpreter::default();
        assert_eq!(
            process(Mode::Lex, "let x", &mut interpreter),
            Ok("[1:1] LET \"let\"\n[1:5] IDENT \"x\"".to_string())
        );
    }

    #[test]
    fn parse_mode_shows_canonical_form_or_errors() {
        let mut interpreter = Interpreter::default();
        assert_eq!(
            process(Mode::Parse, "1 + 2 * 3", &mut interpreter),
            Ok("(1 + (2 * 3))".to_string())
        );
        assert_eq!(
            process(Mode::Parse, "let = 1", &mut interpreter),
            Err("[1:5] expected next token to be \"IDENT\", got \"=\" instead".to_string())
        );
    }

    #[test]
    fn parse_mode_lists_every_error() {
        let mut interpreter = Interpreter::default();
        let source = "let = 1; let 2";
        let shown = process(Mode::Parse, source, &mut interpreter).unwrap_err();
        let errors = interpreter::parse(source).unwrap_err();
        assert!(errors.len() >= 2);
        assert_eq!(shown, errors.iter().join("\n"));
    }

    #[test]
    fn eval_mode_keeps_state() {
        let mut interpreter = Interpreter::default();
        assert_eq!(
            process(Mode::Eval, "greeting := \"hi\"", &mut interpreter),
            Ok("\"hi\"".to_string())
        );
        assert_eq!(
            process(Mode::Eval, "len(greeting)", &mut interpreter),
            Ok("2".to_string())
        );
        assert_eq!(
            process(Mode::Eval, "-greeting", &mut interpreter),
            Err("[1:1] unknown operator: -STRING".to_string())
        );
    }

    #[test]
    fn commands_are_recognised() {
        assert!(matches!(command("lex"), Some(Command::Switch(Mode::Lex))));
        assert!(matches!(command("exit"), Some(Command::Exit)));
        assert!(command("lexer").is_none());
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Error::Parse(vec![]).exit_code(), 2);
        assert_eq!(Error::Eval(Object::Void).exit_code(), 1);
        let missing = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::from(missing).exit_code(), 74);
    }

    #[test]
    fn errors_are_painted_only_with_color() {
        assert_eq!(paint_error("oops", false), "oops");
        assert_eq!(paint_error("oops", true), Red.paint("oops").to_string());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let config = Config::default();
        let result = run_file(Path::new("/definitely/not/here.bb"), &config);
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
