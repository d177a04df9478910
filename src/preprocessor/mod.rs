// Preprocessor: #include expansion with #file source markers
//
// Output is a single stream: the concatenated file contents separated by
// `#file PATH LINENO` directive lines emitted at column 0. Column-0
// sensitivity is what lets the lexer tell engine-emitted directives apart
// from user code. Alongside the stream, a LineTable maps every emitted
// line back to its original (file, line) for error reporting.

use rustc_hash::FxHashMap;
use std::path::PathBuf;
use tracing::{debug, trace};

use crate::error::{ErrorKind, TemplateError};
use crate::span::LineTable;

/// Maximum include nesting before the expansion is treated as cyclic.
const MAX_INCLUDE_DEPTH: usize = 64;

/// Result of preprocessing a root template.
#[derive(Debug)]
pub struct Preprocessed {
    /// Expanded source with `#file` markers
    pub source: String,
    /// Stream position → original (file, line)
    pub line_table: LineTable,
}

/// Trait for resolving `#include` paths to file contents.
pub trait IncludeResolver {
    fn resolve(&self, path: &str) -> Option<String>;
}

/// Resolver that always fails (no includes available).
pub struct NoopResolver;

impl IncludeResolver for NoopResolver {
    fn resolve(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Map-backed resolver, used by tests and embedders with in-memory
/// template libraries.
#[derive(Default)]
pub struct MapResolver {
    files: FxHashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl IncludeResolver for MapResolver {
    fn resolve(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// Filesystem resolver rooted at a base directory.
pub struct FileResolver {
    base: PathBuf,
}

impl FileResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl IncludeResolver for FileResolver {
    fn resolve(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(self.base.join(path)).ok()
    }
}

/// Preprocessor that inlines includes before lexing.
pub struct Preprocessor<'a> {
    resolver: &'a dyn IncludeResolver,
    output: String,
    table: LineTable,
}

impl<'a> Preprocessor<'a> {
    pub fn new(resolver: &'a dyn IncludeResolver) -> Self {
        Self {
            resolver,
            output: String::new(),
            table: LineTable::new(),
        }
    }

    /// Expand a root source string under the given display name.
    pub fn process(mut self, name: &str, source: &str) -> Result<Preprocessed, TemplateError> {
        debug!(file = name, "preprocessing template");
        self.process_source(name, source, 0)?;
        debug!(bytes = self.output.len(), "preprocessing finished");
        Ok(Preprocessed {
            source: self.output,
            line_table: self.table,
        })
    }

    /// Read and expand a root file through the resolver.
    pub fn process_file(self, path: &str) -> Result<Preprocessed, TemplateError> {
        let source = self.resolver.resolve(path).ok_or_else(|| {
            TemplateError::new(
                ErrorKind::Preprocessor,
                format!("cannot read template file: {}", path),
            )
        })?;
        self.process(path, &source)
    }

    fn process_source(
        &mut self,
        name: &str,
        source: &str,
        depth: usize,
    ) -> Result<(), TemplateError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(TemplateError::with_location(
                ErrorKind::Preprocessor,
                format!("include depth exceeded (max {})", MAX_INCLUDE_DEPTH),
                name,
                1,
            ));
        }

        let file_id = self.table.add_file(name);
        self.emit_file_marker(file_id, name, 1);

        let mut line_num = 0u32;
        for line in source.lines() {
            line_num += 1;

            if let Some(directive) = line.strip_prefix('#') {
                // Column-0 directives only; '#' elsewhere reaches the lexer
                let directive = directive.trim_end();
                if let Some(rest) = directive.strip_prefix("include") {
                    let rest = rest.trim();
                    let path = if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
                        &rest[1..rest.len() - 1]
                    } else {
                        return Err(TemplateError::with_location(
                            ErrorKind::Preprocessor,
                            format!("invalid #include syntax: {}", rest),
                            name,
                            line_num,
                        ));
                    };
                    trace!(from = name, include = path, "resolving include");
                    let content = self.resolver.resolve(path).ok_or_else(|| {
                        TemplateError::with_location(
                            ErrorKind::Preprocessor,
                            format!("cannot resolve include: {}", path),
                            name,
                            line_num,
                        )
                    })?;
                    self.process_source(path, &content, depth + 1)?;
                    // Re-base back to the including file at the next line
                    self.emit_file_marker(file_id, name, line_num + 1);
                    continue;
                }
                return Err(TemplateError::with_location(
                    ErrorKind::Preprocessor,
                    format!("unknown preprocessor directive: #{}", directive),
                    name,
                    line_num,
                ));
            }

            let start = self.output.len() as u32;
            self.output.push_str(line);
            self.output.push('\n');
            self.table
                .push_line(start, self.output.len() as u32, file_id, line_num);
        }
        Ok(())
    }

    /// Emit a `#file PATH LINENO` directive line and map it to the target
    /// location so positions inside the marker still resolve sensibly.
    fn emit_file_marker(&mut self, file_id: u32, name: &str, line: u32) {
        let start = self.output.len() as u32;
        self.output.push_str("#file ");
        self.output.push_str(name);
        self.output.push(' ');
        self.output.push_str(&line.to_string());
        self.output.push('\n');
        self.table
            .push_line(start, self.output.len() as u32, file_id, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess(source: &str) -> Preprocessed {
        Preprocessor::new(&NoopResolver)
            .process("root.bt", source)
            .expect("preprocessing failed")
    }

    fn preprocess_with(source: &str, resolver: &dyn IncludeResolver) -> Preprocessed {
        Preprocessor::new(resolver)
            .process("root.bt", source)
            .expect("preprocessing failed")
    }

    #[test]
    fn test_passthrough_with_marker() {
        let result = preprocess("int x;\nint y;");
        assert!(result.source.starts_with("#file root.bt 1\n"));
        assert!(result.source.contains("int x;\n"));
        assert!(result.source.contains("int y;\n"));
    }

    #[test]
    fn test_line_table_maps_back() {
        let result = preprocess("int x;\nint y;");
        // Position of "int y;" in the stream
        let pos = result.source.find("int y;").unwrap() as u32;
        let loc = result.line_table.locate(pos).unwrap();
        assert_eq!(loc.file, "root.bt");
        assert_eq!(loc.line, 2);
    }

    #[test]
    fn test_include_basic() {
        let mut resolver = MapResolver::new();
        resolver.add("header.bt", "uint32 magic;");
        let result = preprocess_with("#include \"header.bt\"\nuchar x;", &resolver);
        assert!(result.source.contains("#file header.bt 1\n"));
        assert!(result.source.contains("uint32 magic;"));
        // After the include, the marker re-bases to the root at line 2
        assert!(result.source.contains("#file root.bt 2\n"));
        assert!(result.source.contains("uchar x;"));
    }

    #[test]
    fn test_include_nested() {
        let mut resolver = MapResolver::new();
        resolver.add("inner.bt", "uchar inner;");
        resolver.add("outer.bt", "#include \"inner.bt\"\nushort outer;");
        let result = preprocess_with("#include \"outer.bt\"", &resolver);
        assert!(result.source.contains("uchar inner;"));
        assert!(result.source.contains("ushort outer;"));
        let pos = result.source.find("ushort outer;").unwrap() as u32;
        let loc = result.line_table.locate(pos).unwrap();
        assert_eq!(loc.file, "outer.bt");
        assert_eq!(loc.line, 2);
    }

    #[test]
    fn test_include_line_mapping() {
        let mut resolver = MapResolver::new();
        resolver.add("lib.bt", "uchar a;\nuchar b;");
        let result = preprocess_with("int before;\n#include \"lib.bt\"\nint after;", &resolver);
        let pos = result.source.find("uchar b;").unwrap() as u32;
        let loc = result.line_table.locate(pos).unwrap();
        assert_eq!(loc.file, "lib.bt");
        assert_eq!(loc.line, 2);
        let pos = result.source.find("int after;").unwrap() as u32;
        let loc = result.line_table.locate(pos).unwrap();
        assert_eq!(loc.file, "root.bt");
        assert_eq!(loc.line, 3);
    }

    #[test]
    fn test_missing_include() {
        let err = Preprocessor::new(&NoopResolver)
            .process("root.bt", "#include \"nope.bt\"")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Preprocessor);
        assert!(err.message.contains("cannot resolve include"));
        assert_eq!(err.file.as_deref(), Some("root.bt"));
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn test_invalid_include_syntax() {
        let err = Preprocessor::new(&NoopResolver)
            .process("root.bt", "#include <angle.bt>")
            .unwrap_err();
        assert!(err.message.contains("invalid #include syntax"));
    }

    #[test]
    fn test_unknown_directive() {
        let err = Preprocessor::new(&NoopResolver)
            .process("root.bt", "#define FOO 1")
            .unwrap_err();
        assert!(err.message.contains("unknown preprocessor directive"));
    }

    #[test]
    fn test_include_cycle_detected() {
        let mut resolver = MapResolver::new();
        resolver.add("a.bt", "#include \"b.bt\"");
        resolver.add("b.bt", "#include \"a.bt\"");
        let err = Preprocessor::new(&resolver)
            .process("root.bt", "#include \"a.bt\"")
            .unwrap_err();
        assert!(err.message.contains("include depth exceeded"));
    }

    #[test]
    fn test_process_file_missing_root() {
        let err = Preprocessor::new(&NoopResolver)
            .process_file("missing.bt")
            .unwrap_err();
        assert!(err.message.contains("cannot read template file"));
    }

    #[test]
    fn test_empty_input() {
        let result = preprocess("");
        assert_eq!(result.source, "#file root.bt 1\n");
    }
}
