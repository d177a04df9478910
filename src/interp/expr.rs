// Expression evaluation methods for the interpreter
use super::*;

impl<'a> Interpreter<'a> {
    /// Evaluate an expression to a `(type, value)` pair. The value stays
    /// aliased to its storage: re-reading a file-backed reference goes
    /// back through the host.
    pub(crate) fn eval_expr(
        &mut self,
        expr: &Expr,
    ) -> Result<(TypeDescriptor, Value), TemplateError> {
        match &expr.kind {
            ExprKind::IntLiteral(v) => Ok((
                TypeDescriptor::number(S64),
                Value::constant(Scalar::Int(*v)),
            )),
            ExprKind::StringLiteral(s) => Ok((
                TypeDescriptor::string(),
                Value::constant(Scalar::Str(s.clone())),
            )),
            ExprKind::Path(path) => self.resolve_path(path, expr.span),
            ExprKind::Call { name, args } => self.eval_call(*name, args, expr.span),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, expr.span),
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, expr.span),
            ExprKind::Assign { target, value } => self.eval_assign(target, value, expr.span),
        }
    }

    /// Evaluate an expression and read it through to a scalar.
    pub(crate) fn eval_scalar(
        &mut self,
        expr: &Expr,
    ) -> Result<(TypeDescriptor, Scalar), TemplateError> {
        let (ty, value) = self.eval_expr(expr)?;
        let scalar = self.read_scalar(&ty, &value, expr.span)?;
        Ok((ty, scalar))
    }

    /// Read a value cell through to its scalar. File-backed cells re-read
    /// the host on every call; a short read yields no value, which any
    /// consuming expression surfaces as a type mismatch.
    pub(crate) fn read_scalar(
        &mut self,
        ty: &TypeDescriptor,
        value: &Value,
        span: Span,
    ) -> Result<Scalar, TemplateError> {
        if ty.is_void() {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                "void value used in an expression",
                span,
            ));
        }
        match value {
            Value::Constant(scalar) => Ok(scalar.clone()),
            Value::Mutable(cell) => Ok(cell.borrow().clone()),
            Value::FileBacked(file_ref) => {
                let bytes = self.host.read_data(file_ref.offset, file_ref.length as u64);
                match file_ref.decode(&bytes) {
                    Some(scalar) => Ok(scalar),
                    None => Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "variable has no value (file too short)",
                        span,
                    )),
                }
            }
            Value::Struct(_) => Err(self.make_error(
                ErrorKind::TypeMismatch,
                "struct value used as a scalar",
                span,
            )),
            Value::Array(_) => Err(self.make_error(
                ErrorKind::TypeMismatch,
                "array value used as a scalar",
                span,
            )),
        }
    }

    /// Resolve a path left to right: the head through the frame stack and
    /// globals, then each index and member segment.
    fn resolve_path(
        &mut self,
        path: &PathExpr,
        span: Span,
    ) -> Result<(TypeDescriptor, Value), TemplateError> {
        let (mut ty, mut value) = self.lookup_var(path.head).ok_or_else(|| {
            self.make_error(
                ErrorKind::UndefinedVariable,
                format!(
                    "undefined variable '{}'",
                    self.interner.resolve(path.head)
                ),
                span,
            )
        })?;

        for segment in &path.segments {
            match segment {
                PathSeg::Index(index_expr) => {
                    let elements = match (&value, ty.is_array) {
                        (Value::Array(elements), true) => Rc::clone(elements),
                        _ => {
                            return Err(self.make_error(
                                ErrorKind::TypeMismatch,
                                "indexed value is not an array",
                                index_expr.span,
                            ));
                        }
                    };
                    let (index_ty, index) = self.eval_scalar(index_expr)?;
                    if !matches!(index_ty.base, Base::Number(_)) {
                        return Err(self.make_error(
                            ErrorKind::TypeMismatch,
                            "array index must be numeric",
                            index_expr.span,
                        ));
                    }
                    let Some(index) = index.as_int() else {
                        return Err(self.make_error(
                            ErrorKind::TypeMismatch,
                            "array index must be an integer",
                            index_expr.span,
                        ));
                    };
                    let elements = elements.borrow();
                    if index < 0 || index as usize >= elements.len() {
                        return Err(self.make_error(
                            ErrorKind::OutOfRangeIndex,
                            format!(
                                "index {} out of range for array of length {}",
                                index,
                                elements.len()
                            ),
                            index_expr.span,
                        ));
                    }
                    value = elements[index as usize].clone();
                    drop(elements);
                    ty = ty.element();
                }
                PathSeg::Member(member) => {
                    let members = match &value {
                        Value::Struct(members) => Rc::clone(members),
                        _ => {
                            return Err(self.make_error(
                                ErrorKind::TypeMismatch,
                                "member access on a non-struct value",
                                span,
                            ));
                        }
                    };
                    let members = members.borrow();
                    match members.get(*member) {
                        Some((member_ty, member_value)) => {
                            ty = member_ty.clone();
                            value = member_value.clone();
                        }
                        None => {
                            return Err(self.make_error(
                                ErrorKind::UndefinedMember,
                                format!(
                                    "struct has no member '{}'",
                                    self.interner.resolve(*member)
                                ),
                                span,
                            ));
                        }
                    }
                }
            }
        }
        Ok((ty, value))
    }

    fn eval_call(
        &mut self,
        name: Name,
        args: &[Expr],
        span: Span,
    ) -> Result<(TypeDescriptor, Value), TemplateError> {
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            let (ty, value) = self.eval_expr(arg)?;
            arg_values.push((ty, value, arg.span));
        }

        let function = match self.functions.get(&name) {
            Some(Function::Builtin(builtin)) => {
                let builtin = *builtin;
                return builtins::dispatch(self, builtin, &arg_values, span);
            }
            Some(Function::User(func)) => Rc::clone(func),
            None => {
                return Err(self.make_error(
                    ErrorKind::UndefinedFunction,
                    format!("undefined function '{}'", self.interner.resolve(name)),
                    span,
                ));
            }
        };

        if arg_values.len() != function.params.len() {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                format!(
                    "function '{}' expects {} arguments, got {}",
                    self.interner.resolve(name),
                    function.params.len(),
                    arg_values.len()
                ),
                span,
            ));
        }

        let mut frame = Frame::function(function.return_type.clone());
        for ((arg_ty, arg_value, arg_span), (param_ty, param_name)) in
            arg_values.into_iter().zip(function.params.iter())
        {
            if !assignable(&arg_ty, param_ty) {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    format!(
                        "argument of type {} is not assignable to parameter '{}'",
                        arg_ty.describe(&self.interner),
                        self.interner.resolve(*param_name)
                    ),
                    arg_span,
                ));
            }
            frame.vars.insert(*param_name, (param_ty.clone(), arg_value));
        }

        self.frames.push(frame);
        let outcome = self.eval_stmts(&function.body);
        self.frames.pop();

        match outcome? {
            ControlFlow::Return(Some((value_ty, value))) => {
                if !assignable(&value_ty, &function.return_type) {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        format!(
                            "return value of type {} is not assignable to declared type {}",
                            value_ty.describe(&self.interner),
                            function.return_type.describe(&self.interner)
                        ),
                        span,
                    ));
                }
                Ok((function.return_type.clone(), value))
            }
            ControlFlow::Return(None) => {
                if !function.return_type.is_void() {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        format!(
                            "function '{}' must return a value",
                            self.interner.resolve(name)
                        ),
                        span,
                    ));
                }
                Ok((TypeDescriptor::void(), Value::constant(Scalar::Int(0))))
            }
            ControlFlow::None => {
                if !function.return_type.is_void() {
                    return Err(self.make_error(
                        ErrorKind::MissingReturn,
                        format!(
                            "function '{}' ended without returning a value",
                            self.interner.resolve(name)
                        ),
                        span,
                    ));
                }
                Ok((TypeDescriptor::void(), Value::constant(Scalar::Int(0))))
            }
            ControlFlow::Break | ControlFlow::Continue => Err(self.make_error(
                ErrorKind::Internal,
                "blocked flow control reached a function frame",
                span,
            )),
        }
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        span: Span,
    ) -> Result<(TypeDescriptor, Value), TemplateError> {
        let (ty, scalar) = self.eval_scalar(operand)?;
        if !matches!(ty.base, Base::Number(_)) || ty.is_array {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                "unary operand must be numeric",
                span,
            ));
        }
        let result = match op {
            UnaryOp::LogNot => Scalar::Int(if scalar.is_truthy() { 0 } else { 1 }),
            UnaryOp::BitNot => match scalar.as_int() {
                Some(v) => Scalar::Int(!v),
                None => {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "bitwise complement requires an integer operand",
                        span,
                    ));
                }
            },
        };
        Ok((TypeDescriptor::number(S64), Value::constant(result)))
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> Result<(TypeDescriptor, Value), TemplateError> {
        // Short-circuit forms evaluate the right operand only when the
        // left has not already decided the result.
        if matches!(op, BinOp::LogAnd | BinOp::LogOr) {
            let (lhs_ty, lhs_scalar) = self.eval_scalar(lhs)?;
            if !matches!(lhs_ty.base, Base::Number(_)) {
                return Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "logical operand must be numeric",
                    lhs.span,
                ));
            }
            let lhs_truthy = lhs_scalar.is_truthy();
            let decided = match op {
                BinOp::LogAnd => !lhs_truthy,
                _ => lhs_truthy,
            };
            let result = if decided {
                lhs_truthy
            } else {
                let (rhs_ty, rhs_scalar) = self.eval_scalar(rhs)?;
                if !matches!(rhs_ty.base, Base::Number(_)) {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "logical operand must be numeric",
                        rhs.span,
                    ));
                }
                rhs_scalar.is_truthy()
            };
            return Ok((
                TypeDescriptor::number(S64),
                Value::constant(Scalar::Int(if result { 1 } else { 0 })),
            ));
        }

        let (lhs_ty, lhs_scalar) = self.eval_scalar(lhs)?;
        let (rhs_ty, rhs_scalar) = self.eval_scalar(rhs)?;

        // String concatenation and string equality are the only
        // non-numeric operator forms.
        if let (Scalar::Str(a), Scalar::Str(b)) = (&lhs_scalar, &rhs_scalar) {
            return match op {
                BinOp::Add => Ok((
                    TypeDescriptor::string(),
                    Value::constant(Scalar::Str(format!("{}{}", a, b))),
                )),
                BinOp::Eq => Ok(bool_value(a == b)),
                BinOp::Ne => Ok(bool_value(a != b)),
                _ => Err(self.make_error(
                    ErrorKind::TypeMismatch,
                    "operator is not defined for strings",
                    span,
                )),
            };
        }

        if !matches!(lhs_ty.base, Base::Number(_)) || !matches!(rhs_ty.base, Base::Number(_)) {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                "operands must have numeric base",
                span,
            ));
        }
        if lhs_ty.is_array || rhs_ty.is_array {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                "array value used as a scalar",
                span,
            ));
        }

        match op {
            BinOp::Eq => Ok(bool_value(self.scalars_equal(&lhs_scalar, &rhs_scalar, span)?)),
            BinOp::Ne => Ok(bool_value(!self.scalars_equal(&lhs_scalar, &rhs_scalar, span)?)),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let result = match (lhs_scalar.as_int(), rhs_scalar.as_int()) {
                    (Some(a), Some(b)) => match op {
                        BinOp::Lt => a < b,
                        BinOp::Le => a <= b,
                        BinOp::Gt => a > b,
                        _ => a >= b,
                    },
                    _ => {
                        let a = lhs_scalar.as_float().expect("numeric operand");
                        let b = rhs_scalar.as_float().expect("numeric operand");
                        match op {
                            BinOp::Lt => a < b,
                            BinOp::Le => a <= b,
                            BinOp::Gt => a > b,
                            _ => a >= b,
                        }
                    }
                };
                Ok(bool_value(result))
            }
            BinOp::Shl | BinOp::Shr | BinOp::BitAnd | BinOp::BitXor | BinOp::BitOr => {
                let (Some(a), Some(b)) = (lhs_scalar.as_int(), rhs_scalar.as_int()) else {
                    return Err(self.make_error(
                        ErrorKind::TypeMismatch,
                        "bitwise operands must be integers",
                        span,
                    ));
                };
                let result = match op {
                    BinOp::BitAnd => a & b,
                    BinOp::BitXor => a ^ b,
                    BinOp::BitOr => a | b,
                    BinOp::Shl | BinOp::Shr => {
                        if !(0..=127).contains(&b) {
                            return Err(self.make_error(
                                ErrorKind::TypeMismatch,
                                format!("shift amount {} out of range", b),
                                span,
                            ));
                        }
                        if op == BinOp::Shl {
                            a.wrapping_shl(b as u32)
                        } else {
                            a >> b as u32
                        }
                    }
                    _ => unreachable!(),
                };
                Ok((
                    TypeDescriptor::number(S64),
                    Value::constant(Scalar::Int(result)),
                ))
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
                match (lhs_scalar.as_int(), rhs_scalar.as_int()) {
                    (Some(a), Some(b)) => {
                        if matches!(op, BinOp::Div | BinOp::Mod) && b == 0 {
                            return Err(self.make_error(
                                ErrorKind::DivisionByZero,
                                "division by zero",
                                span,
                            ));
                        }
                        let result = match op {
                            BinOp::Add => a.wrapping_add(b),
                            BinOp::Sub => a.wrapping_sub(b),
                            BinOp::Mul => a.wrapping_mul(b),
                            BinOp::Div => a / b,
                            _ => a % b,
                        };
                        Ok((
                            TypeDescriptor::number(S64),
                            Value::constant(Scalar::Int(result)),
                        ))
                    }
                    _ => {
                        let a = lhs_scalar.as_float().expect("numeric operand");
                        let b = rhs_scalar.as_float().expect("numeric operand");
                        if matches!(op, BinOp::Div | BinOp::Mod) && b == 0.0 {
                            return Err(self.make_error(
                                ErrorKind::DivisionByZero,
                                "division by zero",
                                span,
                            ));
                        }
                        let result = match op {
                            BinOp::Add => a + b,
                            BinOp::Sub => a - b,
                            BinOp::Mul => a * b,
                            BinOp::Div => a / b,
                            _ => a % b,
                        };
                        Ok((
                            TypeDescriptor::number(types::F64),
                            Value::constant(Scalar::Float(result)),
                        ))
                    }
                }
            }
            BinOp::LogAnd | BinOp::LogOr => unreachable!("handled above"),
        }
    }

    /// Assignment: resolve the target path, check assignability, and
    /// write through the referent cell. The expression yields the
    /// assigned value.
    fn eval_assign(
        &mut self,
        target: &Expr,
        value: &Expr,
        span: Span,
    ) -> Result<(TypeDescriptor, Value), TemplateError> {
        let (value_ty, scalar) = self.eval_scalar(value)?;
        let (target_ty, target_value) = self.eval_expr(target)?;

        if !assignable(&value_ty, &target_ty) {
            return Err(self.make_error(
                ErrorKind::TypeMismatch,
                format!(
                    "value of type {} is not assignable to {}",
                    value_ty.describe(&self.interner),
                    target_ty.describe(&self.interner)
                ),
                span,
            ));
        }

        if let Err(kind) = target_value.set(scalar.clone()) {
            let message = match kind {
                ErrorKind::AssignmentToConstant => "cannot assign to a constant",
                ErrorKind::AssignmentToFileVariable => "cannot assign to a file-backed variable",
                _ => "assignment target is not a scalar cell",
            };
            return Err(self.make_error(kind, message, span));
        }
        Ok((target_ty, Value::constant(scalar)))
    }
}

fn bool_value(b: bool) -> (TypeDescriptor, Value) {
    (
        TypeDescriptor::number(S64),
        Value::constant(Scalar::Int(if b { 1 } else { 0 })),
    )
}
