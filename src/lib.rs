pub mod span;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod typeck;

use std::path::Path;

use config::Config;
use diagnostics::CompileError;
use parser::ast::Program;

pub use typeck::TypeCheckOutput;

/// Lex and parse a source string.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::lex(source)?;
    let mut parser = parser::Parser::new(&tokens, source);
    parser.parse_program()
}

/// Check a source string with the default configuration.
pub fn check_source(source: &str) -> Result<TypeCheckOutput, CompileError> {
    check_source_with(source, &Config::default())
}

/// lex -> parse -> hierarchy -> initialization -> inference.
pub fn check_source_with(source: &str, config: &Config) -> Result<TypeCheckOutput, CompileError> {
    let program = parse(source)?;
    typeck::type_check(&program, &config.inference)
}

pub fn read_source(path: &Path) -> Result<String, CompileError> {
    std::fs::read_to_string(path)
        .map_err(|e| CompileError::io(format!("could not read file: {e}"), path.to_path_buf()))
}

/// Check a file on disk. Returns the source alongside the result so
/// callers can render diagnostics.
pub fn check_file(path: &Path, config: &Config) -> Result<(String, TypeCheckOutput), CompileError> {
    let source = read_source(path)?;
    let output = check_source_with(&source, config)?;
    Ok((source, output))
}

/// The parsed AST as pretty JSON.
pub fn ast_json(source: &str) -> Result<String, CompileError> {
    let program = parse(source)?;
    program
        .to_json()
        .map_err(|e| CompileError::syntax(format!("could not serialize AST: {e}"), span::Span::dummy()))
}

/// The hierarchy as built from declarations, before any inference.
pub fn build_hierarchy(source: &str, config: &Config) -> Result<(typeck::env::ClassHierarchy, Vec<typeck::errors::Diagnostic>), CompileError> {
    let program = parse(source)?;
    let mut diags = Vec::new();
    let hierarchy = typeck::hierarchy::build_hierarchy(&program, &config.inference, &mut diags)?;
    Ok((hierarchy, diags))
}
