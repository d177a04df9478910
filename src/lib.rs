// Binary template language engine
//
// Pipeline: preprocessor (#include expansion, #file markers, line table)
// → lexer → parser (flat expression capture + precedence folding) →
// tree-walking interpreter emitting typed-range and comment annotations
// through the HostInterface.

pub mod error;
pub mod host;
pub mod interp;
pub mod lexer;
pub mod name;
pub mod parser;
pub mod preprocessor;
pub mod span;

pub use error::{ErrorKind, TemplateError};
pub use host::{Aborted, HostInterface, SelectionHost, SliceHost};
pub use interp::ExecStats;
pub use name::{Name, StringInterner};
pub use parser::ast::Ast;
pub use preprocessor::{FileResolver, IncludeResolver, MapResolver, NoopResolver};
pub use span::{LineTable, Location};

use interp::Interpreter;
use lexer::Lexer;
use parser::Parser;
use preprocessor::Preprocessor;
use tracing::debug;

/// Options controlling execution behavior.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// The interpreter ticks once per statement and loop iteration; every
    /// `yield_interval`-th tick consults `HostInterface::yield_now`.
    pub yield_interval: u64,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            yield_interval: 4096,
        }
    }
}

/// A parsed template, ready to execute any number of times.
pub struct ParsedTemplate {
    ast: Ast,
    line_table: LineTable,
    interner: StringInterner,
}

impl ParsedTemplate {
    pub fn ast(&self) -> &Ast {
        &self.ast
    }
}

/// Main entry point: parse and execute binary templates.
pub struct TemplateEngine {
    resolver: Box<dyn IncludeResolver>,
}

impl TemplateEngine {
    /// Create an engine with no include resolution.
    pub fn new() -> Self {
        Self {
            resolver: Box::new(NoopResolver),
        }
    }

    /// Create an engine resolving `#include` through the given resolver.
    pub fn with_resolver(resolver: impl IncludeResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
        }
    }

    /// Preprocess, lex, and parse a template source under a display name.
    pub fn parse(&self, name: &str, source: &str) -> Result<ParsedTemplate, TemplateError> {
        let processed = Preprocessor::new(self.resolver.as_ref()).process(name, source)?;
        self.parse_processed(processed)
    }

    /// Like [`parse`](Self::parse), reading the root file through the
    /// resolver.
    pub fn parse_file(&self, path: &str) -> Result<ParsedTemplate, TemplateError> {
        let processed = Preprocessor::new(self.resolver.as_ref()).process_file(path)?;
        self.parse_processed(processed)
    }

    fn parse_processed(
        &self,
        processed: preprocessor::Preprocessed,
    ) -> Result<ParsedTemplate, TemplateError> {
        let mut interner = StringInterner::new();
        let tokens = Lexer::new(&processed.source, &mut interner)
            .tokenize()
            .map_err(|e| e.resolve(&processed.line_table))?;
        let ast = Parser::new(tokens, &mut interner)
            .parse()
            .map_err(|e| e.resolve(&processed.line_table))?;
        debug!(stmts = ast.stmts.len(), "template parsed");
        Ok(ParsedTemplate {
            ast,
            line_table: processed.line_table,
            interner,
        })
    }

    /// Execute a parsed template against a host.
    pub fn execute(
        &self,
        template: &ParsedTemplate,
        host: &mut dyn HostInterface,
    ) -> Result<ExecStats, TemplateError> {
        self.execute_with_options(template, host, ExecOptions::default())
    }

    pub fn execute_with_options(
        &self,
        template: &ParsedTemplate,
        host: &mut dyn HostInterface,
        options: ExecOptions,
    ) -> Result<ExecStats, TemplateError> {
        let mut interpreter = Interpreter::new(
            host,
            template.interner.clone(),
            &template.line_table,
            options.yield_interval,
        );
        interpreter.run(&template.ast)
    }

    /// Parse and execute in one step.
    pub fn run(
        &self,
        name: &str,
        source: &str,
        host: &mut dyn HostInterface,
    ) -> Result<ExecStats, TemplateError> {
        let template = self.parse(name, source)?;
        self.execute(&template, host)
    }

    /// Parse and execute with options.
    pub fn run_with_options(
        &self,
        name: &str,
        source: &str,
        host: &mut dyn HostInterface,
        options: ExecOptions,
    ) -> Result<ExecStats, TemplateError> {
        let template = self.parse(name, source)?;
        self.execute_with_options(&template, host, options)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
