use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rlox::error::LoxError;
use rlox::interpreter::Interpreter;
use rlox::parser::Parser;
use rlox::reporter::Reporter;
use rlox::resolver::Resolver;
use rlox::token::TokenType;

/// Tree-walking interpreter for the Lox language.
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to run; starts a REPL when omitted
    filename: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = match Cli::try_parse() {
        Ok(args) => args,

        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            return Ok(());
        }

        // usage errors: extra positionals, unknown flags
        Err(err) => {
            err.print()?;
            process::exit(64);
        }
    };

    match args.filename {
        Some(filename) => run_file(&filename),
        None => run_prompt(),
    }
}

/// Run a script.  Exit 65 on compile errors, 70 on a runtime error.
fn run_file(path: &Path) -> anyhow::Result<()> {
    let buf = fs::read(path)?;
    let source = String::from_utf8(buf).map_err(LoxError::from)?;

    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);
    let mut reporter = Reporter::new();

    rlox::run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error() {
        process::exit(65);
    }

    if reporter.had_runtime_error() {
        process::exit(70);
    }

    Ok(())
}

/// Interactive prompt.  The interpreter (and its globals) persists across
/// lines; an empty line or EOF ends the session.
fn run_prompt() -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;

    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if line.is_empty() {
                    break;
                }

                let _ = editor.add_history_entry(&line);

                run_line(&line, &mut interpreter);
            }

            Err(ReadlineError::Interrupted) => continue,

            Err(ReadlineError::Eof) => break,

            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

/// One REPL iteration: fresh reporter, persistent interpreter.
///
/// A line whose token stream has no `;` is tried as a single expression
/// first and its value echoed; when that fails (or the line has statements)
/// it runs as a sequence of declarations.
fn run_line(line: &str, interpreter: &mut Interpreter<'_>) {
    let mut reporter = Reporter::new();

    let tokens = rlox::scan(line, &mut reporter);

    let lone_expression = tokens
        .iter()
        .all(|token| token.token_type != TokenType::SEMICOLON);

    if lone_expression {
        if let Some(expr) = Parser::new(tokens.clone()).parse_expression() {
            let mut resolver = Resolver::new(interpreter, &mut reporter);
            resolver.resolve_expr(&expr);

            if !reporter.had_error() {
                match interpreter.interpret_expression(&expr) {
                    Ok(value) => println!("{value}"),
                    Err(err) => reporter.report(&err),
                }
            }

            return;
        }
    }

    let mut parser = Parser::new(tokens);
    let statements = parser.parse(&mut reporter);

    if reporter.had_error() {
        return;
    }

    let mut resolver = Resolver::new(interpreter, &mut reporter);
    resolver.resolve(&statements);

    if reporter.had_error() {
        return;
    }

    if let Err(err) = interpreter.interpret(&statements) {
        reporter.report(&err);
    }
}
