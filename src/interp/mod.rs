// Tree-walking interpreter for the template language
//
// The interpreter owns the execution context described by the language:
// the frame stack, the globals table, the function registry, the cursor
// (`next_variable`), and the endianness flag. It reaches the outside
// world only through the HostInterface.

pub mod builtins;
mod expr;
pub mod frame;
mod stmt;
pub mod types;
pub mod value;

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use crate::error::{ErrorKind, TemplateError};
use crate::host::HostInterface;
use crate::name::{Name, StringInterner};
use crate::parser::ast::*;
use crate::span::{LineTable, Span};

use frame::{Frame, FrameKind, FC_BREAK, FC_CONTINUE, FC_RETURN};
use types::{
    assignable, Base, NumKind, StructDef, TypeDescriptor, S32, S64, TYPE_ALIASES,
    UNSIGNED_ALIASES,
};
use value::{FileRef, Scalar, StructValue, Value};

/// Flow-control sentinel returned from statement evaluation. Frames that
/// handle a kind stop its propagation; a blocked kind crossing a frame is
/// an internal error (the raise-site checks reject it first).
pub(crate) enum ControlFlow {
    None,
    Break,
    Continue,
    Return(Option<(TypeDescriptor, Value)>),
}

/// Counters collected over one template run.
#[derive(Debug, Clone, Default)]
pub struct ExecStats {
    /// Statements evaluated
    pub stmt_count: u64,
    /// Host yield calls performed
    pub yield_count: u64,
    /// Primitive variables bound to the buffer
    pub variables_bound: u64,
    /// Total bytes covered by primitive bindings
    pub bytes_bound: u64,
}

/// A user-defined function.
pub(crate) struct UserFunction {
    pub return_type: TypeDescriptor,
    pub params: Vec<(TypeDescriptor, Name)>,
    pub body: Vec<Stmt>,
}

/// Entry in the function registry.
pub(crate) enum Function {
    User(Rc<UserFunction>),
    Builtin(builtins::Builtin),
}

/// Interpreter that executes an AST against a host buffer.
pub struct Interpreter<'a> {
    pub(crate) host: &'a mut dyn HostInterface,
    pub(crate) interner: StringInterner,
    line_table: &'a LineTable,
    pub(crate) frames: Vec<Frame>,
    pub(crate) globals: FxHashMap<Name, (TypeDescriptor, Value)>,
    pub(crate) functions: FxHashMap<Name, Function>,
    /// Cursor: next byte offset a buffer-binding declaration will use
    pub(crate) next_variable: u64,
    pub(crate) big_endian: bool,
    yield_interval: u64,
    tick_count: u64,
    stats: ExecStats,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        host: &'a mut dyn HostInterface,
        mut interner: StringInterner,
        line_table: &'a LineTable,
        yield_interval: u64,
    ) -> Self {
        let mut base = Frame::base();
        for (alias, prim) in TYPE_ALIASES {
            base.var_types
                .insert(interner.intern(alias), TypeDescriptor::number(*prim));
        }
        for (alias, prim) in UNSIGNED_ALIASES {
            base.var_types
                .insert(interner.intern(alias), TypeDescriptor::number(*prim));
        }
        base.var_types
            .insert(interner.intern("string"), TypeDescriptor::string());

        let mut functions = FxHashMap::default();
        for builtin in builtins::ALL {
            functions.insert(
                interner.intern(builtin.name()),
                Function::Builtin(*builtin),
            );
        }

        Self {
            host,
            interner,
            line_table,
            frames: vec![base],
            globals: FxHashMap::default(),
            functions,
            next_variable: 0,
            big_endian: false,
            yield_interval: yield_interval.max(1),
            tick_count: 0,
            stats: ExecStats::default(),
        }
    }

    /// Execute a template. The cursor and endian flag are in their entry
    /// state; all annotations go to the host in statement order.
    pub fn run(&mut self, ast: &Ast) -> Result<ExecStats, TemplateError> {
        debug!(stmts = ast.stmts.len(), "executing template");
        for stmt in &ast.stmts {
            match self.eval_stmt(stmt)? {
                ControlFlow::None => {}
                _ => {
                    return Err(self.make_error(
                        ErrorKind::Internal,
                        "flow control escaped template scope",
                        stmt.span,
                    ));
                }
            }
        }
        debug!(
            variables = self.stats.variables_bound,
            bytes = self.stats.bytes_bound,
            "template finished"
        );
        Ok(self.stats.clone())
    }

    // ========== Error and yield plumbing ==========

    pub(crate) fn make_error(
        &self,
        kind: ErrorKind,
        message: impl Into<String>,
        span: Span,
    ) -> TemplateError {
        match self.line_table.locate(span.start) {
            Some(loc) => TemplateError::with_location(kind, message, loc.file, loc.line),
            None => TemplateError::new(kind, message),
        }
    }

    /// Cooperative yield hook: called once per statement and once per loop
    /// iteration. The host is consulted every `yield_interval` ticks; an
    /// abort from the host unwinds as `TemplateAborted`.
    pub(crate) fn tick(&mut self, span: Span) -> Result<(), TemplateError> {
        self.tick_count += 1;
        if self.tick_count % self.yield_interval == 0 {
            self.stats.yield_count += 1;
            if self.host.yield_now().is_err() {
                debug!("host aborted template execution");
                return Err(self.make_error(
                    ErrorKind::TemplateAborted,
                    "execution cancelled by host",
                    span,
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn count_stmt(&mut self) {
        self.stats.stmt_count += 1;
    }

    // ========== Name and type lookup ==========

    /// Resolve a written type name against the type tables, walking the
    /// frame stack innermost-first.
    pub(crate) fn find_type(
        &mut self,
        ty: &TypeName,
    ) -> Result<TypeDescriptor, TemplateError> {
        let key = match ty.kind {
            TypeNameKind::Void => return Ok(TypeDescriptor::void()),
            TypeNameKind::Plain(name) => name,
            TypeNameKind::Struct(name) => {
                let key = format!("struct {}", self.interner.resolve(name));
                self.interner.intern(&key)
            }
            TypeNameKind::Enum(name) => {
                let key = format!("enum {}", self.interner.resolve(name));
                self.interner.intern(&key)
            }
            TypeNameKind::Unsigned(name) => {
                let key = format!("unsigned {}", self.interner.resolve(name));
                self.interner.intern(&key)
            }
        };
        for frame in self.frames.iter().rev() {
            if let Some(desc) = frame.var_types.get(&key) {
                return Ok(desc.clone());
            }
        }
        Err(self.make_error(
            ErrorKind::UndefinedType,
            format!("unknown type '{}'", self.interner.resolve(key)),
            ty.span,
        ))
    }

    /// Register a type name in the innermost frame.
    pub(crate) fn define_type(
        &mut self,
        name: Name,
        desc: TypeDescriptor,
        span: Span,
    ) -> Result<(), TemplateError> {
        let frame = self.frames.last().expect("frame stack is never empty");
        if frame.var_types.contains_key(&name) {
            return Err(self.make_error(
                ErrorKind::RedefinedType,
                format!("type '{}' is already defined", self.interner.resolve(name)),
                span,
            ));
        }
        self.frames
            .last_mut()
            .expect("frame stack is never empty")
            .var_types
            .insert(name, desc);
        Ok(())
    }

    /// Look up a variable: innermost frame outwards, stopping at (and not
    /// penetrating) the first function frame, then the globals table.
    pub(crate) fn lookup_var(&self, name: Name) -> Option<(TypeDescriptor, Value)> {
        for frame in self.frames.iter().rev() {
            if let Some((ty, value)) = frame.vars.get(&name) {
                return Some((ty.clone(), value.clone()));
            }
            if frame.kind == FrameKind::Function {
                break;
            }
        }
        self.globals.get(&name).map(|(ty, v)| (ty.clone(), v.clone()))
    }

    fn in_function_body(&self) -> bool {
        self.frames.iter().any(|f| f.kind == FrameKind::Function)
    }

    fn innermost_struct_frame(&self) -> Option<usize> {
        self.frames.iter().rposition(|f| f.kind == FrameKind::Struct)
    }

    // ========== Buffer-binding declarations ==========

    /// Bind a `TYPE NAME (args)? ([len])? ;` declaration: advance the
    /// cursor over the declared bytes, emit annotations, and register the
    /// variable in the struct member table or the globals.
    pub(crate) fn bind_declaration(
        &mut self,
        ty: &TypeDescriptor,
        name: Name,
        args: &[Expr],
        array_len: Option<&Expr>,
        span: Span,
    ) -> Result<(), TemplateError> {
        if self.in_function_body() {
            return Err(self.make_error(
                ErrorKind::GlobalInFunctionBody,
                format!(
                    "cannot declare variable '{}' inside a function body",
                    self.interner.resolve(name)
                ),
                span,
            ));
        }

        match ty.base {
            Base::Str => {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "string type cannot be bound to the buffer",
                    span,
                ));
            }
            Base::Void => {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "void type cannot be bound to the buffer",
                    span,
                ));
            }
            Base::Number(_) if !args.is_empty() => {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "only struct types take arguments",
                    span,
                ));
            }
            _ => {}
        }

        // Destination check: struct member table when inside a struct
        // body, globals otherwise.
        let struct_frame = self.innermost_struct_frame();
        let already_defined = match struct_frame {
            Some(idx) => self.frames[idx].vars.contains_key(&name),
            None => self.globals.contains_key(&name),
        };
        if already_defined {
            return Err(self.make_error(
                ErrorKind::RedefinedVariable,
                format!("variable '{}' is already defined", self.interner.resolve(name)),
                span,
            ));
        }

        // Struct arguments are evaluated once, left to right; array
        // elements share them.
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push((self.eval_expr(arg)?, arg.span));
        }

        let (bound_ty, value) = if let Some(len_expr) = array_len {
            let (len_ty, len_scalar) = self.eval_scalar(len_expr)?;
            if !matches!(len_ty.base, Base::Number(_)) {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "array length must be numeric",
                    len_expr.span,
                ));
            }
            let count = match len_scalar.as_int() {
                Some(v) if v >= 0 => v as u64,
                Some(_) => {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "array length is negative",
                        len_expr.span,
                    ));
                }
                None => {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "array length must be an integer",
                        len_expr.span,
                    ));
                }
            };
            let mut elements = Vec::with_capacity(count.min(0x10000) as usize);
            let base_name = self.interner.resolve(name).to_string();
            for index in 0..count {
                self.tick(span)?;
                let label = format!("{}[{}]", base_name, index);
                elements.push(self.bind_one(ty, &label, &arg_values, span)?);
            }
            (
                ty.as_array(),
                Value::Array(Rc::new(RefCell::new(elements))),
            )
        } else {
            let label = self.interner.resolve(name).to_string();
            (ty.clone(), self.bind_one(ty, &label, &arg_values, span)?)
        };

        match struct_frame {
            Some(idx) => {
                let members = self.frames[idx]
                    .struct_members
                    .clone()
                    .expect("struct frame carries a member table");
                members
                    .borrow_mut()
                    .insert(name, bound_ty.clone(), value.clone());
                self.frames[idx].vars.insert(name, (bound_ty, value));
            }
            None => {
                self.globals.insert(name, (bound_ty, value));
            }
        }
        Ok(())
    }

    /// Bind one element: a primitive advances the cursor and emits its
    /// annotations; a struct executes its body in a fresh struct frame.
    fn bind_one(
        &mut self,
        ty: &TypeDescriptor,
        label: &str,
        args: &[((TypeDescriptor, Value), Span)],
        span: Span,
    ) -> Result<Value, TemplateError> {
        match &ty.base {
            Base::Number(prim) => {
                let offset = self.next_variable;
                let length = prim.length as u64;
                self.next_variable += length;
                self.host
                    .set_data_type(offset, length, prim.code(self.big_endian));
                self.host.set_comment(offset, length, label);
                self.stats.variables_bound += 1;
                self.stats.bytes_bound += length;
                Ok(Value::FileBacked(FileRef::new(
                    offset,
                    *prim,
                    self.big_endian,
                )))
            }
            Base::Struct(def) => {
                let def = Rc::clone(def);
                if args.len() != def.params.len() {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        format!(
                            "struct expects {} arguments, got {}",
                            def.params.len(),
                            args.len()
                        ),
                        span,
                    ));
                }
                let members = Rc::new(RefCell::new(StructValue::new()));
                let mut frame = Frame::struct_frame(Rc::clone(&members));
                for (((arg_ty, arg_value), arg_span), (param_ty, param)) in
                    args.iter().zip(def.params.iter())
                {
                    if !assignable(arg_ty, param_ty) {
                        return Err(self.make_error(
                            ErrorKind::TypeMismatch,
                            format!(
                                "argument of type {} is not assignable to parameter '{}'",
                                arg_ty.describe(&self.interner),
                                self.interner.resolve(param.name),
                            ),
                            *arg_span,
                        ));
                    }
                    frame
                        .vars
                        .insert(param.name, (param_ty.clone(), arg_value.clone()));
                }
                self.frames.push(frame);
                for stmt in &def.body {
                    match self.eval_stmt(stmt)? {
                        ControlFlow::None => {}
                        _ => {
                            return Err(self.make_error(
                                ErrorKind::Internal,
                                "flow control escaped a struct body",
                                stmt.span,
                            ));
                        }
                    }
                }
                self.frames.pop();
                Ok(Value::Struct(members))
            }
            Base::Str | Base::Void => Err(self.make_error(
                ErrorKind::TypeMismatch,
                "type cannot be bound to the buffer",
                span,
            )),
        }
    }

    /// Resolve the declared underlying type of an enum (default `int`).
    pub(crate) fn resolve_enum_underlying(
        &mut self,
        underlying: Option<&TypeName>,
        span: Span,
    ) -> Result<TypeDescriptor, TemplateError> {
        let desc = match underlying {
            Some(ty) => self.find_type(ty)?,
            None => TypeDescriptor::number(S32),
        };
        match desc.primitive() {
            Some(prim) if prim.kind == NumKind::Int => Ok(desc),
            _ => Err(self.make_error(
                ErrorKind::TypeMismatch,
                "enum underlying type must be an integer type",
                span,
            )),
        }
    }

    /// Define an enum member constant. Constants land in the innermost
    /// frame inside functions and struct bodies, in the globals otherwise.
    pub(crate) fn define_enum_member(
        &mut self,
        name: Name,
        ty: TypeDescriptor,
        value: i128,
        span: Span,
    ) -> Result<(), TemplateError> {
        let constant = Value::constant(Scalar::Int(value));
        if self.frames.len() > 1 {
            let frame = self.frames.last().expect("frame stack is never empty");
            if frame.vars.contains_key(&name) {
                return Err(self.make_error(
                    ErrorKind::RedefinedVariable,
                    format!(
                        "enum member '{}' is already defined",
                        self.interner.resolve(name)
                    ),
                    span,
                ));
            }
            self.frames
                .last_mut()
                .expect("frame stack is never empty")
                .vars
                .insert(name, (ty, constant));
        } else {
            if self.globals.contains_key(&name) {
                return Err(self.make_error(
                    ErrorKind::RedefinedVariable,
                    format!(
                        "enum member '{}' is already defined",
                        self.interner.resolve(name)
                    ),
                    span,
                ));
            }
            self.globals.insert(name, (ty, constant));
        }
        Ok(())
    }

    /// Build a struct type from a definition statement's pieces, resolving
    /// parameter types eagerly.
    pub(crate) fn build_struct_def(
        &mut self,
        tag: Option<Name>,
        params: &[ParamDecl],
        body: &[Stmt],
    ) -> Result<Rc<StructDef>, TemplateError> {
        let mut resolved = Vec::with_capacity(params.len());
        for param in params {
            let ty = self.find_type(&param.ty)?;
            resolved.push((ty, *param));
        }
        Ok(Rc::new(StructDef {
            name: tag,
            params: resolved,
            body: body.to_vec(),
        }))
    }
}
