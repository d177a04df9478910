// Statement evaluation methods for the interpreter
use super::*;

/// Result of one loop body iteration.
enum LoopAction {
    Continue,
    Break,
    Propagate(ControlFlow),
}

impl<'a> Interpreter<'a> {
    /// Evaluate a statement, returning the flow-control sentinel.
    pub(crate) fn eval_stmt(&mut self, stmt: &Stmt) -> Result<ControlFlow, TemplateError> {
        self.tick(stmt.span)?;
        self.count_stmt();
        match &stmt.kind {
            StmtKind::Empty => {}
            StmtKind::Block(body) => {
                self.frames.push(Frame::scope(0));
                let result = self.eval_stmts(body);
                self.frames.pop();
                match result? {
                    ControlFlow::None => {}
                    cf => return Ok(cf),
                }
            }
            StmtKind::VarDef(d) => {
                let ty = self.find_type(&d.ty)?;
                self.bind_declaration(&ty, d.name, &d.args, d.array_len.as_ref(), stmt.span)?;
            }
            StmtKind::LocalVarDef(d) => {
                self.eval_local_var(d, stmt.span)?;
            }
            StmtKind::StructDef(d) => {
                self.eval_struct_def(d, stmt.span)?;
            }
            StmtKind::EnumDef(d) => {
                self.eval_enum_def(d, stmt.span)?;
            }
            StmtKind::Typedef(d) => {
                let ty = self.find_type(&d.ty)?;
                self.define_type(d.name, ty, stmt.span)?;
            }
            StmtKind::FuncDef(d) => {
                self.eval_func_def(d, stmt.span)?;
            }
            StmtKind::If(d) => {
                return self.eval_if(d, stmt.span);
            }
            StmtKind::For(d) => {
                return self.eval_for(d, stmt.span);
            }
            StmtKind::Switch(d) => {
                return self.eval_switch(d, stmt.span);
            }
            StmtKind::Break => {
                self.check_flowctrl_legal(FC_BREAK, ErrorKind::BreakOutsideLoop, stmt.span)?;
                return Ok(ControlFlow::Break);
            }
            StmtKind::Continue => {
                self.check_flowctrl_legal(FC_CONTINUE, ErrorKind::ContinueOutsideLoop, stmt.span)?;
                return Ok(ControlFlow::Continue);
            }
            StmtKind::Return(expr) => {
                self.check_flowctrl_legal(FC_RETURN, ErrorKind::ReturnOutsideFunction, stmt.span)?;
                let value = match expr {
                    Some(e) => Some(self.eval_expr(e)?),
                    None => None,
                };
                return Ok(ControlFlow::Return(value));
            }
            StmtKind::ExprStmt(expr) => {
                self.eval_expr(expr)?;
            }
        }
        Ok(ControlFlow::None)
    }

    /// Evaluate a statement list, stopping at the first sentinel.
    pub(crate) fn eval_stmts(&mut self, stmts: &[Stmt]) -> Result<ControlFlow, TemplateError> {
        for stmt in stmts {
            match self.eval_stmt(stmt)? {
                ControlFlow::None => {}
                cf => return Ok(cf),
            }
        }
        Ok(ControlFlow::None)
    }

    /// Raise-site legality check: a flow-control statement must find a
    /// handling frame before any blocking frame.
    fn check_flowctrl_legal(
        &self,
        mask: u8,
        error: ErrorKind,
        span: Span,
    ) -> Result<(), TemplateError> {
        for frame in self.frames.iter().rev() {
            if frame.handles_flowctrl & mask != 0 {
                return Ok(());
            }
            if frame.blocks_flowctrl & mask != 0 {
                break;
            }
        }
        let what = match error {
            ErrorKind::ReturnOutsideFunction => "'return' outside of a function",
            ErrorKind::BreakOutsideLoop => "'break' outside of a loop or switch",
            _ => "'continue' outside of a loop",
        };
        Err(self.make_error(error, what, span))
    }

    fn eval_local_var(
        &mut self,
        d: &LocalVarDefData,
        span: Span,
    ) -> Result<(), TemplateError> {
        let ty = self.find_type(&d.ty)?;
        if matches!(ty.base, Base::Struct(_)) {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                "local variables of struct type are not supported",
                span,
            ));
        }
        if matches!(ty.base, Base::Void) {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                "local variables cannot be void",
                span,
            ));
        }

        // Template-scope locals land in the globals table (functions see
        // parameters and globals only); nested locals land in the
        // innermost frame.
        let at_template_scope = self.frames.len() == 1;
        let frame = self.frames.last().expect("frame stack is never empty");
        let clashes = frame.vars.contains_key(&d.name)
            || (at_template_scope && self.globals.contains_key(&d.name));
        if clashes {
            return Err(self.make_error(
                ErrorKind::RedefinedVariable,
                format!(
                    "variable '{}' is already defined",
                    self.interner.resolve(d.name)
                ),
                span,
            ));
        }

        let default = || match &ty.base {
            Base::Number(prim) if prim.kind == NumKind::Float => Scalar::Float(0.0),
            Base::Number(_) => Scalar::Int(0),
            _ => Scalar::Str(String::new()),
        };

        let (bound_ty, value) = if let Some(len_expr) = &d.array_len {
            if d.init.is_some() {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "local arrays cannot take an initializer",
                    span,
                ));
            }
            let (len_ty, len_scalar) = self.eval_scalar(len_expr)?;
            if !matches!(len_ty.base, Base::Number(_)) {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "array length must be numeric",
                    len_expr.span,
                ));
            }
            let count = match len_scalar.as_int() {
                Some(v) if v >= 0 => v as usize,
                _ => {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "array length must be a non-negative integer",
                        len_expr.span,
                    ));
                }
            };
            let elements = (0..count).map(|_| Value::mutable(default())).collect();
            (
                ty.as_array(),
                Value::Array(Rc::new(RefCell::new(elements))),
            )
        } else {
            let scalar = match &d.init {
                Some(init) => {
                    let (init_ty, scalar) = self.eval_scalar(init)?;
                    if !assignable(&init_ty, &ty) {
                        return Err(self.make_error(
                            ErrorKind::TypeMismatch,
                            format!(
                                "initializer of type {} is not assignable to {}",
                                init_ty.describe(&self.interner),
                                ty.describe(&self.interner)
                            ),
                            init.span,
                        ));
                    }
                    scalar
                }
                None => default(),
            };
            (ty, Value::mutable(scalar))
        };

        if at_template_scope {
            self.globals.insert(d.name, (bound_ty, value));
        } else {
            self.frames
                .last_mut()
                .expect("frame stack is never empty")
                .vars
                .insert(d.name, (bound_ty, value));
        }
        Ok(())
    }

    fn eval_struct_def(&mut self, d: &StructDefData, span: Span) -> Result<(), TemplateError> {
        let def = self.build_struct_def(d.tag, &d.params, &d.body)?;
        let desc = TypeDescriptor::struct_type(Rc::clone(&def));

        if let Some(tag) = d.tag {
            let key = format!("struct {}", self.interner.resolve(tag));
            let key = self.interner.intern(&key);
            self.define_type(key, desc.clone(), span)?;
        }
        if let Some(alias) = d.typedef_name {
            self.define_type(alias, desc.clone(), span)?;
        }
        if let Some(instance) = &d.instance {
            self.bind_declaration(
                &desc,
                instance.name,
                &instance.args,
                instance.array_len.as_ref(),
                instance.span,
            )?;
        }
        Ok(())
    }

    fn eval_enum_def(&mut self, d: &EnumDefData, span: Span) -> Result<(), TemplateError> {
        let underlying_span = d.underlying.map(|t| t.span).unwrap_or(span);
        let underlying = self.resolve_enum_underlying(d.underlying.as_ref(), underlying_span)?;

        if let Some(tag) = d.tag {
            let key = format!("enum {}", self.interner.resolve(tag));
            let key = self.interner.intern(&key);
            self.define_type(key, underlying.clone(), span)?;
        }
        if let Some(alias) = d.typedef_name {
            self.define_type(alias, underlying.clone(), span)?;
        }

        // Members without an explicit value continue from the previous
        // member plus one; the first member starts at zero.
        let mut next_value: i128 = 0;
        for member in &d.members {
            let value = match &member.value {
                Some(expr) => {
                    let (value_ty, scalar) = self.eval_scalar(expr)?;
                    if !matches!(value_ty.base, Base::Number(_)) {
                        return Err(self.make_error(
                            ErrorKind::TypeMismatch,
                            "enum member value must be numeric",
                            expr.span,
                        ));
                    }
                    match scalar.as_int() {
                        Some(v) => v,
                        None => {
                            return Err(self.make_error(
                                ErrorKind::TypeMismatch,
                                "enum member value must be an integer",
                                expr.span,
                            ));
                        }
                    }
                }
                None => next_value,
            };
            self.define_enum_member(member.name, underlying.clone(), value, member.span)?;
            next_value = value + 1;
        }

        if let Some(instance) = &d.instance {
            self.bind_declaration(
                &underlying,
                instance.name,
                &instance.args,
                instance.array_len.as_ref(),
                instance.span,
            )?;
        }
        Ok(())
    }

    fn eval_func_def(&mut self, d: &FuncDefData, span: Span) -> Result<(), TemplateError> {
        let return_type = self.find_type(&d.return_ty)?;
        let mut params = Vec::with_capacity(d.params.len());
        for param in &d.params {
            let ty = self.find_type(&param.ty)?;
            params.push((ty, param.name));
        }
        if self.functions.contains_key(&d.name) {
            return Err(self.make_error(
                ErrorKind::RedefinedFunction,
                format!(
                    "function '{}' is already defined",
                    self.interner.resolve(d.name)
                ),
                span,
            ));
        }
        self.functions.insert(
            d.name,
            Function::User(Rc::new(UserFunction {
                return_type,
                params,
                body: d.body.clone(),
            })),
        );
        Ok(())
    }

    fn eval_if(&mut self, d: &IfData, span: Span) -> Result<ControlFlow, TemplateError> {
        let (cond_ty, cond) = self.eval_scalar(&d.cond)?;
        if !matches!(cond_ty.base, Base::Number(_)) {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                "condition must have numeric base",
                span,
            ));
        }
        let body = if cond.is_truthy() {
            Some(&d.then_body)
        } else {
            d.else_body.as_ref()
        };
        match body {
            Some(stmts) => {
                self.frames.push(Frame::scope(0));
                let result = self.eval_stmts(stmts);
                self.frames.pop();
                result
            }
            None => Ok(ControlFlow::None),
        }
    }

    fn eval_for(&mut self, d: &ForData, span: Span) -> Result<ControlFlow, TemplateError> {
        self.frames.push(Frame::scope(FC_BREAK | FC_CONTINUE));
        let result = self.eval_for_inner(d, span);
        self.frames.pop();
        result
    }

    fn eval_for_inner(&mut self, d: &ForData, span: Span) -> Result<ControlFlow, TemplateError> {
        if let Some(init) = &d.init {
            match self.eval_stmt(init)? {
                ControlFlow::None => {}
                _ => {
                    return Err(self.make_error(
                        ErrorKind::Internal,
                        "flow control escaped a loop initializer",
                        init.span,
                    ));
                }
            }
        }
        loop {
            self.tick(span)?;
            if let Some(cond) = &d.cond {
                let (cond_ty, value) = self.eval_scalar(cond)?;
                if !matches!(cond_ty.base, Base::Number(_)) {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "condition must have numeric base",
                        cond.span,
                    ));
                }
                if !value.is_truthy() {
                    return Ok(ControlFlow::None);
                }
            }
            match self.exec_loop_body(&d.body)? {
                LoopAction::Continue => {}
                LoopAction::Break => return Ok(ControlFlow::None),
                LoopAction::Propagate(cf) => return Ok(cf),
            }
            if let Some(step) = &d.step {
                self.eval_expr(step)?;
            }
        }
    }

    fn exec_loop_body(&mut self, body: &[Stmt]) -> Result<LoopAction, TemplateError> {
        self.frames.push(Frame::scope(0));
        let result = self.eval_stmts(body);
        self.frames.pop();
        Ok(match result? {
            ControlFlow::None | ControlFlow::Continue => LoopAction::Continue,
            ControlFlow::Break => LoopAction::Break,
            cf @ ControlFlow::Return(_) => LoopAction::Propagate(cf),
        })
    }

    /// Switch: first matching case (or `default` when none matches)
    /// starts execution; fallthrough runs into following cases until a
    /// `break` or the closing brace.
    fn eval_switch(&mut self, d: &SwitchData, span: Span) -> Result<ControlFlow, TemplateError> {
        let (_, scrutinee) = self.eval_scalar(&d.scrutinee)?;

        let mut start = None;
        let mut default = None;
        for (index, case) in d.cases.iter().enumerate() {
            match &case.label {
                CaseLabel::Value(expr) => {
                    let (_, label) = self.eval_scalar(expr)?;
                    if self.scalars_equal(&scrutinee, &label, expr.span)? {
                        start = Some(index);
                        break;
                    }
                }
                CaseLabel::Default => {
                    if default.is_none() {
                        default = Some(index);
                    }
                }
            }
        }
        let Some(start) = start.or(default) else {
            return Ok(ControlFlow::None);
        };

        self.frames.push(Frame::scope(FC_BREAK));
        let mut outcome = Ok(ControlFlow::None);
        'cases: for case in &d.cases[start..] {
            self.tick(span)?;
            self.frames.push(Frame::scope(0));
            let result = self.eval_stmts(&case.body);
            self.frames.pop();
            match result {
                Ok(ControlFlow::None) => {}
                Ok(ControlFlow::Break) => break 'cases,
                Ok(cf) => {
                    outcome = Ok(cf);
                    break 'cases;
                }
                Err(e) => {
                    outcome = Err(e);
                    break 'cases;
                }
            }
        }
        self.frames.pop();
        outcome
    }

    /// `==` semantics shared by the equality operators and switch cases.
    pub(crate) fn scalars_equal(
        &self,
        lhs: &Scalar,
        rhs: &Scalar,
        span: Span,
    ) -> Result<bool, TemplateError> {
        match (lhs, rhs) {
            (Scalar::Int(a), Scalar::Int(b)) => Ok(a == b),
            (Scalar::Str(a), Scalar::Str(b)) => Ok(a == b),
            (Scalar::Float(_), _) | (_, Scalar::Float(_))
                if lhs.is_numeric() && rhs.is_numeric() =>
            {
                Ok(lhs.as_float() == rhs.as_float())
            }
            _ => Err(self.make_error(
                ErrorKind::TypeMismatch,
                "cannot compare values of different bases",
                span,
            )),
        }
    }
}
