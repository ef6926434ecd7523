//! The full pipeline: scan → parse → resolve → interpret.
//!
//! Each phase only starts if the previous one finished cleanly.  Scanner and
//! parser errors are collected in bulk; resolution and evaluation stop at the
//! first error.

use log::info;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Run `source` against `interpreter`, returning the diagnostics of the first
/// phase that failed.  Globals defined by earlier runs stay visible.
pub fn run_source(
    interpreter: &mut Interpreter,
    source: &str,
    file: &str,
) -> Result<(), Vec<LoxError>> {
    // Lexical analysis
    let scanned = scan_tokens(source, file);
    if scanned.had_error() {
        info!("Scan of '{}' failed with {} error(s)", file, scanned.errors.len());
        return Err(scanned.errors);
    }

    // Parsing
    let parsed = Parser::new(&scanned.tokens).parse();
    if parsed.had_error() {
        info!("Parse of '{}' failed with {} error(s)", file, parsed.errors.len());
        return Err(parsed.errors);
    }

    // Resolution
    Resolver::new(interpreter)
        .resolve(&parsed.statements)
        .map_err(|e| vec![e])?;

    // Evaluation
    interpreter
        .interpret(&parsed.statements)
        .map_err(|e| vec![e])
}
