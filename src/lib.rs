pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod reporter;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use log::info;

use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::reporter::Reporter;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Scan `source` into a token vector, feeding scan errors to `reporter`.
/// The vector always ends with the EOF sentinel, so the parser can run even
/// when scanning reported errors.
pub fn scan(source: &str, reporter: &mut Reporter) -> Vec<Token> {
    let mut tokens = Vec::new();

    for result in Scanner::new(source.as_bytes()) {
        match result {
            Ok(token) => tokens.push(token),
            Err(err) => reporter.report(&err),
        }
    }

    tokens
}

/// Run a program: scan, parse, resolve, interpret.
///
/// Interpretation is skipped entirely when any compile-time diagnostic was
/// reported by the earlier stages; a runtime error aborts the current
/// statement and is reported here.
pub fn run(source: &str, interpreter: &mut Interpreter<'_>, reporter: &mut Reporter) {
    let tokens = scan(source, reporter);

    let mut parser = Parser::new(tokens);
    let statements = parser.parse(reporter);

    if reporter.had_error() {
        return;
    }

    let mut resolver = Resolver::new(interpreter, reporter);
    resolver.resolve(&statements);

    if reporter.had_error() {
        return;
    }

    info!("interpreting {} top-level statement(s)", statements.len());

    if let Err(err) = interpreter.interpret(&statements) {
        reporter.report(&err);
    }
}
