//! The semantic analyser: two-pass type checking over the AST.
//!
//! Pass 1 records every top-level function signature in the global scope,
//! so call sites never depend on declaration order. Pass 2 checks function
//! bodies and variable declarations in source order.
//!
//! Expression checking is bidirectional: the caller passes the type it
//! expects (if any), which lets integer literals adopt `i32`/`f64` and so
//! on without explicit suffixes. Where a checked type differs from the
//! required one but an implicit conversion exists, a `Cast` node is
//! inserted in place; otherwise a diagnostic is appended and the failed
//! subtree yields no type, which suppresses cascading errors above it.
//!
//! Constant folding runs along the way (64-bit integer or double
//! precision; division and modulo by zero are left unfolded) and feeds
//! compile-time array sizes and constant symbols.

use kilnc_lex::NameId;
use kilnc_util::Interner;

use kilnc_par::ast::{
    Ast, BinOp, ConstValue, LiteralKind, NodeId, NodeKind, PostfixOp, TypeId, UnOp,
};
use kilnc_par::AssignOp;

use crate::error::{TypeError, TypeErrorKind};
use crate::scope::{ScopeId, ScopeTree, Symbol, SymbolFlags, SymbolKind};
use crate::ty::{TypeKind, TypeStore};

/// The type-checking context for one program.
pub struct Checker<'a, 'ar> {
    ast: &'a mut Ast,
    store: &'a mut TypeStore,
    idents: &'a Interner<'ar, NameId, ()>,
    scopes: ScopeTree,
    global: ScopeId,
    diags: Vec<TypeError>,
    /// Return type of the function currently being checked.
    current_ret: Option<TypeId>,
}

impl<'a, 'ar> Checker<'a, 'ar> {
    pub fn new(
        ast: &'a mut Ast,
        store: &'a mut TypeStore,
        idents: &'a Interner<'ar, NameId, ()>,
    ) -> Self {
        let mut scopes = ScopeTree::new(idents.len());
        let global = scopes.push_scope(None);
        Self {
            ast,
            store,
            idents,
            scopes,
            global,
            diags: Vec::new(),
            current_ret: None,
        }
    }

    /// Run both passes over `root` and return the accumulated diagnostics
    /// in detection order.
    pub fn check_program(mut self, root: NodeId) -> Vec<TypeError> {
        let NodeKind::Program { decls } = self.ast.kind(root).clone() else {
            return self.diags;
        };

        // Pass 1: function signatures only.
        for &decl in &decls {
            if matches!(self.ast.kind(decl), NodeKind::FnDecl { .. }) {
                self.declare_function(decl);
            }
        }

        // Pass 2: bodies and variable declarations, in source order.
        for &decl in &decls {
            match self.ast.kind(decl) {
                NodeKind::VarDecl { .. } => self.check_var_decl(decl, self.global),
                NodeKind::FnDecl { .. } => self.check_fn_body(decl),
                _ => {}
            }
        }
        self.diags
    }

    fn error(&mut self, kind: TypeErrorKind, span: kilnc_util::Span) {
        self.diags.push(TypeError { kind, span });
    }

    fn ident_text(&self, name: NameId) -> String {
        self.idents.key(name).to_string()
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.store.display(ty, self.idents)
    }

    // ==================================================================
    // Pass 1
    // ==================================================================

    fn declare_function(&mut self, id: NodeId) {
        let span = self.ast.span(id);
        let NodeKind::FnDecl {
            name, params, ret, ..
        } = self.ast.kind(id).clone()
        else {
            return;
        };

        let mut param_tys = Vec::with_capacity(params.len());
        for &param in &params {
            let NodeKind::Param { ty, .. } = self.ast.kind(param).clone() else {
                continue;
            };
            let resolved = self
                .resolve_type(ty, self.global)
                .unwrap_or(self.store.void_ty);
            self.ast.node_mut(param).ty = Some(resolved);
            param_tys.push(resolved);
        }
        let ret_ty = match ret {
            Some(r) => self
                .resolve_type(r, self.global)
                .unwrap_or(self.store.void_ty),
            None => self.store.void_ty,
        };

        let fn_ty = self.store.intern(TypeKind::Fn {
            ret: ret_ty,
            params: param_tys,
        });
        self.ast.node_mut(id).ty = Some(fn_ty);

        let symbol = Symbol {
            name,
            ty: Some(fn_ty),
            kind: SymbolKind::Function,
            flags: SymbolFlags {
                initialized: true,
                ..Default::default()
            },
            value: None,
        };
        if self.scopes.define(self.global, symbol).is_err() {
            let name = self.ident_text(name);
            self.error(TypeErrorKind::Redeclaration { name }, span);
        }
    }

    // ==================================================================
    // Type resolution
    // ==================================================================

    /// Resolve a syntactic type expression to a canonical type id,
    /// annotating the node. `None` means a diagnostic was already emitted.
    pub fn resolve_type(&mut self, id: NodeId, scope: ScopeId) -> Option<TypeId> {
        let span = self.ast.span(id);
        let resolved = match self.ast.kind(id).clone() {
            NodeKind::PrimType { name } => {
                if let Some(ty) = self.store.primitive_for_name(name) {
                    Some(ty)
                } else {
                    let user = self
                        .scopes
                        .lookup(scope, name)
                        .filter(|(_, sym)| sym.kind == SymbolKind::Type)
                        .and_then(|(_, sym)| sym.ty);
                    if user.is_none() {
                        let name = self.ident_text(name);
                        self.error(TypeErrorKind::UnknownType { name }, span);
                    }
                    user
                }
            }
            NodeKind::PtrType { inner } => {
                let base = self.resolve_type(inner, scope)?;
                Some(self.store.intern(TypeKind::Ptr(base)))
            }
            NodeKind::ArrayType { elem, size } => {
                let elem_ty = self.resolve_type(elem, scope)?;
                match size {
                    None => Some(self.store.intern(TypeKind::Array {
                        elem: elem_ty,
                        size: 0,
                        size_known: false,
                    })),
                    Some(size_expr) => {
                        let size_span = self.ast.span(size_expr);
                        let i64_ty = self.store.i64_ty;
                        let size_ty = self.check_expr(size_expr, scope, Some(i64_ty))?;
                        if !self.store.is_integer(size_ty) {
                            let actual = self.type_name(size_ty);
                            self.error(
                                TypeErrorKind::TypeMismatch {
                                    expected: self.type_name(i64_ty),
                                    actual: Some(actual),
                                },
                                size_span,
                            );
                            return None;
                        }
                        let Some(ConstValue::Int(n)) = self.ast.node(size_expr).const_value
                        else {
                            self.error(TypeErrorKind::NotConst, size_span);
                            return None;
                        };
                        Some(self.store.intern(TypeKind::Array {
                            elem: elem_ty,
                            size: n,
                            size_known: true,
                        }))
                    }
                }
            }
            NodeKind::FnType { params, ret } => {
                let ret_ty = match ret {
                    Some(r) => self
                        .resolve_type(r, scope)
                        .unwrap_or(self.store.void_ty),
                    None => self.store.void_ty,
                };
                let param_tys: Vec<TypeId> = params
                    .iter()
                    .map(|&p| self.resolve_type(p, scope).unwrap_or(self.store.void_ty))
                    .collect();
                Some(self.store.intern(TypeKind::Fn {
                    ret: ret_ty,
                    params: param_tys,
                }))
            }
            _ => None,
        };
        if resolved.is_some() {
            self.ast.node_mut(id).ty = resolved;
        }
        resolved
    }

    // ==================================================================
    // Declarations and statements
    // ==================================================================

    fn check_var_decl(&mut self, id: NodeId, scope: ScopeId) {
        let span = self.ast.span(id);
        let NodeKind::VarDecl {
            name,
            is_const,
            ty: ty_node,
            init,
        } = self.ast.kind(id).clone()
        else {
            return;
        };

        let Some(mut var_ty) = self.resolve_type(ty_node, scope) else {
            let text = self.ident_text(name);
            self.error(
                TypeErrorKind::VariableTypeResolutionFailed { name: text },
                span,
            );
            // Define the symbol without a type so later uses fail quietly
            // instead of reporting it undeclared.
            let symbol = Symbol {
                name,
                ty: None,
                kind: SymbolKind::Variable,
                flags: SymbolFlags {
                    is_const,
                    initialized: init.is_some(),
                    ..Default::default()
                },
                value: None,
            };
            if self.scopes.define(scope, symbol).is_err() {
                let name = self.ident_text(name);
                self.error(TypeErrorKind::Redeclaration { name }, span);
            }
            return;
        };

        let mut value = None;
        if let Some(init_id) = init {
            let init_span = self.ast.span(init_id);
            let is_list = matches!(self.ast.kind(init_id), NodeKind::InitList { .. });
            if let Some(init_ty) = self.check_expr(init_id, scope, Some(var_ty)) {
                if is_list {
                    // The list yields a fully concrete array type; adopt it
                    // when the declared type left sizes to be inferred.
                    if init_ty != var_ty && self.store.can_implicit_cast(var_ty, init_ty) {
                        var_ty = init_ty;
                        self.materialize_inferred_sizes(ty_node, init_ty);
                    }
                } else if init_ty != var_ty {
                    if self.store.can_implicit_cast(var_ty, init_ty) {
                        self.insert_cast(init_id, var_ty);
                    } else {
                        let actual = self.type_name(init_ty);
                        self.error(
                            TypeErrorKind::TypeMismatch {
                                expected: self.type_name(var_ty),
                                actual: Some(actual),
                            },
                            init_span,
                        );
                    }
                }
                if is_const && self.ast.node(init_id).is_const_expr() {
                    value = self.ast.node(init_id).const_value;
                }
            }
        }

        let flags = SymbolFlags {
            is_const,
            used: false,
            initialized: init.is_some(),
            computed_value: value.is_some(),
        };
        let symbol = Symbol {
            name,
            ty: Some(var_ty),
            kind: SymbolKind::Variable,
            flags,
            value,
        };
        if self.scopes.define(scope, symbol).is_err() {
            let name = self.ident_text(name);
            self.error(TypeErrorKind::Redeclaration { name }, span);
        }
        self.ast.node_mut(id).ty = Some(var_ty);
    }

    fn check_fn_body(&mut self, id: NodeId) {
        let NodeKind::FnDecl { params, body, .. } = self.ast.kind(id).clone() else {
            return;
        };
        let ret_ty = match self.ast.ty(id).map(|t| self.store.kind(t).clone()) {
            Some(TypeKind::Fn { ret, .. }) => ret,
            _ => self.store.void_ty,
        };

        let fn_scope = self.scopes.push_scope(Some(self.global));
        for &param in &params {
            let param_span = self.ast.span(param);
            let NodeKind::Param { name, .. } = self.ast.kind(param).clone() else {
                continue;
            };
            let symbol = Symbol {
                name,
                ty: self.ast.ty(param),
                kind: SymbolKind::Variable,
                flags: SymbolFlags {
                    initialized: true,
                    ..Default::default()
                },
                value: None,
            };
            if self.scopes.define(fn_scope, symbol).is_err() {
                let name = self.ident_text(name);
                self.error(TypeErrorKind::Redeclaration { name }, param_span);
            }
        }

        let saved = self.current_ret.replace(ret_ty);
        // The body block shares the parameter scope.
        self.check_block(body, fn_scope, false);
        self.current_ret = saved;
    }

    fn check_block(&mut self, id: NodeId, scope: ScopeId, own_scope: bool) {
        let NodeKind::Block { stmts } = self.ast.kind(id).clone() else {
            return;
        };
        let block_scope = if own_scope {
            self.scopes.push_scope(Some(scope))
        } else {
            scope
        };
        for stmt in stmts {
            self.check_statement(stmt, block_scope);
        }
    }

    fn check_statement(&mut self, id: NodeId, scope: ScopeId) {
        let span = self.ast.span(id);
        match self.ast.kind(id).clone() {
            NodeKind::VarDecl { .. } => self.check_var_decl(id, scope),
            NodeKind::Block { .. } => self.check_block(id, scope, true),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond, scope);
                self.check_statement(then_branch, scope);
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch, scope);
                }
            }
            NodeKind::While { cond, body } => {
                self.check_condition(cond, scope);
                self.check_statement(body, scope);
            }
            NodeKind::For {
                init,
                cond,
                post,
                body,
            } => {
                // The init clause lives in its own scope covering the loop.
                let for_scope = self.scopes.push_scope(Some(scope));
                if let Some(init) = init {
                    if matches!(self.ast.kind(init), NodeKind::VarDecl { .. }) {
                        self.check_var_decl(init, for_scope);
                    } else {
                        self.check_expr(init, for_scope, None);
                    }
                }
                if let Some(cond) = cond {
                    self.check_condition(cond, for_scope);
                }
                if let Some(post) = post {
                    self.check_expr(post, for_scope, None);
                }
                self.check_statement(body, for_scope);
            }
            NodeKind::Return { expr } => {
                let expected = self.current_ret.unwrap_or(self.store.void_ty);
                match expr {
                    Some(expr) => {
                        if let Some(actual) = self.check_expr(expr, scope, Some(expected)) {
                            if actual != expected {
                                if self.store.can_implicit_cast(expected, actual) {
                                    self.insert_cast(expr, expected);
                                } else {
                                    let actual = self.type_name(actual);
                                    self.error(
                                        TypeErrorKind::ReturnMismatch {
                                            expected: self.type_name(expected),
                                            actual,
                                        },
                                        span,
                                    );
                                }
                            }
                        }
                    }
                    None => {
                        if expected != self.store.void_ty {
                            let void = self.type_name(self.store.void_ty);
                            self.error(
                                TypeErrorKind::ReturnMismatch {
                                    expected: self.type_name(expected),
                                    actual: void,
                                },
                                span,
                            );
                        }
                    }
                }
            }
            NodeKind::Break | NodeKind::Continue => {}
            NodeKind::ExprStmt { expr } => {
                self.check_expr(expr, scope, None);
            }
            _ => {}
        }
    }

    fn check_condition(&mut self, cond: NodeId, scope: ScopeId) {
        let span = self.ast.span(cond);
        let bool_ty = self.store.bool_ty;
        if let Some(actual) = self.check_expr(cond, scope, Some(bool_ty)) {
            if actual != bool_ty {
                let actual = self.type_name(actual);
                self.error(
                    TypeErrorKind::TypeMismatch {
                        expected: self.type_name(bool_ty),
                        actual: Some(actual),
                    },
                    span,
                );
            }
        }
    }

    // ==================================================================
    // Expressions
    // ==================================================================

    /// Check an expression, annotate its node, and return its type.
    /// `None` means the subtree failed and already reported; callers must
    /// not pile further diagnostics onto it.
    pub fn check_expr(
        &mut self,
        id: NodeId,
        scope: ScopeId,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let span = self.ast.span(id);
        match self.ast.kind(id).clone() {
            NodeKind::Literal { kind } => {
                let ty = match kind {
                    LiteralKind::Int => match expected {
                        Some(exp) if self.store.is_integer(exp) => exp,
                        Some(exp) if self.store.is_float(exp) => {
                            // Retype the literal to float.
                            if let Some(ConstValue::Int(v)) = self.ast.node(id).const_value {
                                self.ast.node_mut(id).const_value =
                                    Some(ConstValue::Float(v as f64));
                            }
                            exp
                        }
                        _ => self.store.i64_ty,
                    },
                    LiteralKind::Float => match expected {
                        Some(exp) if self.store.is_float(exp) => exp,
                        _ => self.store.f64_ty,
                    },
                    LiteralKind::Bool => self.store.bool_ty,
                    LiteralKind::Str => self.store.str_ty,
                    LiteralKind::Char => self.store.char_ty,
                };
                self.ast.node_mut(id).ty = Some(ty);
                Some(ty)
            }

            NodeKind::Ident { name } => {
                let Some((def_scope, symbol)) = self.scopes.lookup(scope, name) else {
                    let name = self.ident_text(name);
                    self.error(TypeErrorKind::Undeclared { name }, span);
                    return None;
                };
                let ty = symbol.ty;
                let constant = if symbol.flags.is_const || symbol.flags.computed_value {
                    symbol.value
                } else {
                    None
                };
                if let Some(symbol) = self.scopes.symbol_mut(def_scope, name) {
                    symbol.flags.used = true;
                }
                let ty = ty?;
                let node = self.ast.node_mut(id);
                node.ty = Some(ty);
                if constant.is_some() {
                    node.const_value = constant;
                }
                Some(ty)
            }

            NodeKind::Call { callee, args } => {
                let callee_ty = self.check_expr(callee, scope, None)?;
                let TypeKind::Fn { ret, params } = self.store.kind(callee_ty).clone() else {
                    let actual = self.type_name(callee_ty);
                    self.error(TypeErrorKind::NotCallable { actual }, span);
                    return None;
                };
                if args.len() != params.len() {
                    self.error(
                        TypeErrorKind::ArgCountMismatch {
                            expected: params.len(),
                            actual: args.len(),
                        },
                        span,
                    );
                    return None;
                }
                for (&arg, &param_ty) in args.iter().zip(&params) {
                    let arg_span = self.ast.span(arg);
                    let Some(arg_ty) = self.check_expr(arg, scope, Some(param_ty)) else {
                        continue;
                    };
                    if arg_ty != param_ty {
                        if self.store.can_implicit_cast(param_ty, arg_ty) {
                            self.insert_cast(arg, param_ty);
                        } else {
                            let actual = self.type_name(arg_ty);
                            self.error(
                                TypeErrorKind::TypeMismatch {
                                    expected: self.type_name(param_ty),
                                    actual: Some(actual),
                                },
                                arg_span,
                            );
                        }
                    }
                }
                self.ast.node_mut(id).ty = Some(ret);
                Some(ret)
            }

            NodeKind::Index { target, index } => {
                let target_ty = self.check_expr(target, scope, None)?;
                let elem = match self.store.kind(target_ty) {
                    TypeKind::Array { elem, .. } => *elem,
                    TypeKind::Ptr(base) => *base,
                    _ => {
                        let actual = self.type_name(target_ty);
                        self.error(TypeErrorKind::NotIndexable { actual }, span);
                        return None;
                    }
                };
                let index_span = self.ast.span(index);
                let i64_ty = self.store.i64_ty;
                if let Some(index_ty) = self.check_expr(index, scope, Some(i64_ty)) {
                    if !self.store.is_integer(index_ty) {
                        let actual = self.type_name(index_ty);
                        self.error(
                            TypeErrorKind::TypeMismatch {
                                expected: self.type_name(i64_ty),
                                actual: Some(actual),
                            },
                            index_span,
                        );
                    }
                }
                self.ast.node_mut(id).ty = Some(elem);
                Some(elem)
            }

            NodeKind::Unary { op, expr } => self.check_unary(id, op, expr, scope, expected),

            NodeKind::Postfix { op, expr } => {
                if !self.ast.is_lvalue(expr) {
                    self.error(TypeErrorKind::NotLValue, self.ast.span(expr));
                    return None;
                }
                let ty = self.check_expr(expr, scope, None)?;
                if !self.store.is_numeric(ty) {
                    let operand = self.type_name(ty);
                    let op = match op {
                        PostfixOp::Inc => "++",
                        PostfixOp::Dec => "--",
                    };
                    self.error(TypeErrorKind::UnOpMismatch { op, operand }, span);
                    return None;
                }
                self.ast.node_mut(id).ty = Some(ty);
                Some(ty)
            }

            NodeKind::Binary { op, lhs, rhs } => {
                self.check_binary(id, op, lhs, rhs, scope, expected)
            }

            NodeKind::Assign { op, target, value } => {
                let target_ty = self.check_expr(target, scope, None)?;
                if let &NodeKind::Ident { name } = self.ast.kind(target) {
                    let is_const = self
                        .scopes
                        .lookup(scope, name)
                        .is_some_and(|(_, sym)| sym.flags.is_const);
                    if is_const {
                        self.error(TypeErrorKind::ConstAssign, span);
                    }
                }
                if let Some(value_ty) = self.check_expr(value, scope, Some(target_ty)) {
                    if op != AssignOp::Assign
                        && (!self.store.is_numeric(target_ty) || !self.store.is_numeric(value_ty))
                    {
                        let left = self.type_name(target_ty);
                        let right = self.type_name(value_ty);
                        self.error(
                            TypeErrorKind::BinOpMismatch {
                                op: op.symbol(),
                                left,
                                right,
                            },
                            span,
                        );
                    } else if value_ty != target_ty {
                        if self.store.can_implicit_cast(target_ty, value_ty) {
                            self.insert_cast(value, target_ty);
                        } else {
                            let actual = self.type_name(value_ty);
                            self.error(
                                TypeErrorKind::TypeMismatch {
                                    expected: self.type_name(target_ty),
                                    actual: Some(actual),
                                },
                                self.ast.span(value),
                            );
                        }
                    }
                }
                self.ast.node_mut(id).ty = Some(target_ty);
                Some(target_ty)
            }

            NodeKind::InitList { elems } => self.check_init_list(id, &elems, scope, expected),

            // Synthesised by insert_cast; already fully annotated.
            NodeKind::Cast { to, .. } => Some(to),

            _ => None,
        }
    }

    fn check_unary(
        &mut self,
        id: NodeId,
        op: UnOp,
        expr: NodeId,
        scope: ScopeId,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let span = self.ast.span(id);
        match op {
            UnOp::Not => {
                let bool_ty = self.store.bool_ty;
                let ty = self.check_expr(expr, scope, Some(bool_ty))?;
                if ty != bool_ty {
                    let operand = self.type_name(ty);
                    self.error(TypeErrorKind::UnOpMismatch { op: "!", operand }, span);
                    return None;
                }
                let folded = match self.ast.node(expr).const_value {
                    Some(ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
                    _ => None,
                };
                let node = self.ast.node_mut(id);
                node.ty = Some(bool_ty);
                node.const_value = folded;
                Some(bool_ty)
            }
            UnOp::Neg | UnOp::Plus => {
                let hint = expected.filter(|&e| self.store.is_numeric(e));
                let ty = self.check_expr(expr, scope, hint)?;
                if !self.store.is_numeric(ty) {
                    let operand = self.type_name(ty);
                    self.error(
                        TypeErrorKind::UnOpMismatch {
                            op: op.symbol(),
                            operand,
                        },
                        span,
                    );
                    return None;
                }
                let folded = match (op, self.ast.node(expr).const_value) {
                    (UnOp::Neg, Some(ConstValue::Int(v))) => Some(ConstValue::Int(v.wrapping_neg())),
                    (UnOp::Neg, Some(ConstValue::Float(v))) => Some(ConstValue::Float(-v)),
                    (UnOp::Plus, v) => v,
                    _ => None,
                };
                let node = self.ast.node_mut(id);
                node.ty = Some(ty);
                node.const_value = folded;
                Some(ty)
            }
            UnOp::Deref => {
                let ty = self.check_expr(expr, scope, None)?;
                let &TypeKind::Ptr(base) = self.store.kind(ty) else {
                    let operand = self.type_name(ty);
                    self.error(TypeErrorKind::UnOpMismatch { op: "*", operand }, span);
                    return None;
                };
                self.ast.node_mut(id).ty = Some(base);
                Some(base)
            }
            UnOp::AddrOf => {
                if !self.ast.is_lvalue(expr) {
                    self.error(TypeErrorKind::NotLValue, self.ast.span(expr));
                    return None;
                }
                let ty = self.check_expr(expr, scope, None)?;
                let ptr = self.store.intern(TypeKind::Ptr(ty));
                self.ast.node_mut(id).ty = Some(ptr);
                Some(ptr)
            }
            UnOp::PreInc | UnOp::PreDec => {
                if !self.ast.is_lvalue(expr) {
                    self.error(TypeErrorKind::NotLValue, self.ast.span(expr));
                    return None;
                }
                let ty = self.check_expr(expr, scope, None)?;
                if !self.store.is_numeric(ty) {
                    let operand = self.type_name(ty);
                    self.error(
                        TypeErrorKind::UnOpMismatch {
                            op: op.symbol(),
                            operand,
                        },
                        span,
                    );
                    return None;
                }
                self.ast.node_mut(id).ty = Some(ty);
                Some(ty)
            }
        }
    }

    fn check_binary(
        &mut self,
        id: NodeId,
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
        scope: ScopeId,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let span = self.ast.span(id);
        if op.is_arithmetic() {
            // The caller's numeric hint flows into both operands so bare
            // integer literals adopt the surrounding type.
            let hint = expected.filter(|&e| self.store.is_numeric(e));
            let lt = self.check_expr(lhs, scope, hint);
            let rt = self.check_expr(rhs, scope, hint);
            let (Some(lt), Some(rt)) = (lt, rt) else {
                return None;
            };
            let Some(common) = self.store.common_numeric(lt, rt) else {
                let left = self.type_name(lt);
                let right = self.type_name(rt);
                self.error(
                    TypeErrorKind::BinOpMismatch {
                        op: op.symbol(),
                        left,
                        right,
                    },
                    span,
                );
                return None;
            };
            if lt != common {
                self.insert_cast(lhs, common);
            }
            if rt != common {
                self.insert_cast(rhs, common);
            }
            self.fold_binary(id, op, lhs, rhs);
            self.ast.node_mut(id).ty = Some(common);
            Some(common)
        } else if op.is_comparison() {
            let lt = self.check_expr(lhs, scope, None);
            let rt = self.check_expr(rhs, scope, None);
            let (Some(lt), Some(rt)) = (lt, rt) else {
                return None;
            };
            let bool_ty = self.store.bool_ty;
            let identical_pointers = op.is_equality() && lt == rt && self.store.is_pointer(lt);
            if !identical_pointers {
                let Some(common) = self.store.common_numeric(lt, rt) else {
                    let left = self.type_name(lt);
                    let right = self.type_name(rt);
                    self.error(
                        TypeErrorKind::BinOpMismatch {
                            op: op.symbol(),
                            left,
                            right,
                        },
                        span,
                    );
                    return None;
                };
                if lt != common {
                    self.insert_cast(lhs, common);
                }
                if rt != common {
                    self.insert_cast(rhs, common);
                }
                self.fold_binary(id, op, lhs, rhs);
            }
            self.ast.node_mut(id).ty = Some(bool_ty);
            Some(bool_ty)
        } else {
            // Logical && / ||.
            let bool_ty = self.store.bool_ty;
            let lt = self.check_expr(lhs, scope, Some(bool_ty));
            let rt = self.check_expr(rhs, scope, Some(bool_ty));
            let (Some(lt), Some(rt)) = (lt, rt) else {
                return None;
            };
            if lt != bool_ty || rt != bool_ty {
                let left = self.type_name(lt);
                let right = self.type_name(rt);
                self.error(
                    TypeErrorKind::BinOpMismatch {
                        op: op.symbol(),
                        left,
                        right,
                    },
                    span,
                );
                return None;
            }
            self.fold_binary(id, op, lhs, rhs);
            self.ast.node_mut(id).ty = Some(bool_ty);
            Some(bool_ty)
        }
    }

    /// Fold a binary expression whose operands are (post-promotion)
    /// constants. Division and modulo by zero are left unfolded.
    fn fold_binary(&mut self, id: NodeId, op: BinOp, lhs: NodeId, rhs: NodeId) {
        let (Some(a), Some(b)) = (
            self.ast.node(lhs).const_value,
            self.ast.node(rhs).const_value,
        ) else {
            return;
        };
        use ConstValue::{Bool, Float, Int};
        let folded = match (a, b) {
            (Int(x), Int(y)) => match op {
                BinOp::Add => Some(Int(x.wrapping_add(y))),
                BinOp::Sub => Some(Int(x.wrapping_sub(y))),
                BinOp::Mul => Some(Int(x.wrapping_mul(y))),
                BinOp::Div => (y != 0).then(|| Int(x.wrapping_div(y))),
                BinOp::Rem => (y != 0).then(|| Int(x.wrapping_rem(y))),
                BinOp::Eq => Some(Bool(x == y)),
                BinOp::Ne => Some(Bool(x != y)),
                BinOp::Lt => Some(Bool(x < y)),
                BinOp::Gt => Some(Bool(x > y)),
                BinOp::Le => Some(Bool(x <= y)),
                BinOp::Ge => Some(Bool(x >= y)),
                BinOp::And | BinOp::Or => None,
            },
            (Float(x), Float(y)) => match op {
                BinOp::Add => Some(Float(x + y)),
                BinOp::Sub => Some(Float(x - y)),
                BinOp::Mul => Some(Float(x * y)),
                BinOp::Div => (y != 0.0).then(|| Float(x / y)),
                BinOp::Rem => (y != 0.0).then(|| Float(x % y)),
                BinOp::Eq => Some(Bool(x == y)),
                BinOp::Ne => Some(Bool(x != y)),
                BinOp::Lt => Some(Bool(x < y)),
                BinOp::Gt => Some(Bool(x > y)),
                BinOp::Le => Some(Bool(x <= y)),
                BinOp::Ge => Some(Bool(x >= y)),
                BinOp::And | BinOp::Or => None,
            },
            (Bool(x), Bool(y)) => match op {
                BinOp::And => Some(Bool(x && y)),
                BinOp::Or => Some(Bool(x || y)),
                _ => None,
            },
            _ => None,
        };
        if folded.is_some() {
            self.ast.node_mut(id).const_value = folded;
        }
    }

    fn check_init_list(
        &mut self,
        id: NodeId,
        elems: &[NodeId],
        scope: ScopeId,
        expected: Option<TypeId>,
    ) -> Option<TypeId> {
        let span = self.ast.span(id);
        let expected_ty = expected.unwrap_or(self.store.void_ty);
        let TypeKind::Array {
            elem,
            size,
            size_known,
        } = self.store.kind(expected_ty).clone()
        else {
            let expected = self.type_name(expected_ty);
            self.error(TypeErrorKind::UnexpectedList { expected }, span);
            return None;
        };

        let expected_rank = self.store.array_rank(expected_ty);
        let actual_rank = self.list_rank(id);
        if expected_rank != actual_rank {
            self.error(
                TypeErrorKind::DimensionMismatch {
                    expected_ndim: expected_rank,
                    actual_ndim: actual_rank,
                },
                span,
            );
            return None;
        }
        if size_known && size != elems.len() as i64 {
            self.error(
                TypeErrorKind::ArraySizeMismatch {
                    expected_size: size,
                    actual_size: elems.len() as i64,
                },
                span,
            );
            return None;
        }

        let elem_is_array = self.store.is_array(elem);
        let mut concrete_elem = elem;
        for &e in elems {
            let elem_span = self.ast.span(e);
            let Some(elem_ty) = self.check_expr(e, scope, Some(elem)) else {
                continue;
            };
            if elem_ty == elem {
                continue;
            }
            if elem_is_array {
                if !self.store.is_array(elem_ty) {
                    let actual = self.type_name(elem_ty);
                    self.error(
                        TypeErrorKind::ExpectedArray {
                            expected: self.type_name(elem),
                            actual,
                        },
                        elem_span,
                    );
                } else if self.store.can_implicit_cast(elem, elem_ty) {
                    // An unsized expected element; the value supplies the
                    // concrete shape.
                    concrete_elem = elem_ty;
                } else {
                    let actual = self.type_name(elem_ty);
                    self.error(
                        TypeErrorKind::TypeMismatch {
                            expected: self.type_name(elem),
                            actual: Some(actual),
                        },
                        elem_span,
                    );
                }
            } else if self.store.can_implicit_cast(elem, elem_ty) {
                self.insert_cast(e, elem);
            } else if self.store.is_array(elem_ty) {
                // An array value where a scalar element is expected.
                let actual = self.type_name(elem_ty);
                self.error(
                    TypeErrorKind::TypeMismatch {
                        expected: self.type_name(elem),
                        actual: Some(actual),
                    },
                    elem_span,
                );
            }
            // Remaining scalar differences defer to the declared element
            // type; uses of the element are checked against it later.
        }

        let result = self.store.intern(TypeKind::Array {
            elem: concrete_elem,
            size: elems.len() as i64,
            size_known: true,
        });
        self.ast.node_mut(id).ty = Some(result);
        Some(result)
    }

    /// Depth of nested `{ ... }` in an initializer.
    fn list_rank(&self, id: NodeId) -> usize {
        match self.ast.kind(id) {
            NodeKind::InitList { elems } => {
                1 + elems
                    .iter()
                    .map(|&e| self.list_rank(e))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    // ==================================================================
    // Cast insertion and size inference
    // ==================================================================

    /// Rewrite `expr` in place into `Cast { original, target }`. The
    /// original payload moves to a fresh node id; constantness is
    /// preserved, with numeric constants re-expressed in the target form.
    fn insert_cast(&mut self, expr: NodeId, target: TypeId) {
        let original = self.ast.node(expr).clone();
        let const_value = self.recast_const(original.const_value, target);
        let moved = self.ast.nodes.push(original);
        let node = self.ast.node_mut(expr);
        node.kind = NodeKind::Cast {
            expr: moved,
            to: target,
        };
        node.ty = Some(target);
        node.const_value = const_value;
    }

    fn recast_const(&self, value: Option<ConstValue>, target: TypeId) -> Option<ConstValue> {
        let value = value?;
        let recast = match value {
            ConstValue::Int(v) if self.store.is_float(target) => ConstValue::Float(v as f64),
            ConstValue::Float(v) if self.store.is_integer(target) => ConstValue::Int(v as i64),
            other => other,
        };
        Some(recast)
    }

    /// After array size inference, write the inferred sizes back into the
    /// syntactic type expression as synthesised integer literals, bottom
    /// up, so the declared type reads concretely from the AST.
    fn materialize_inferred_sizes(&mut self, ty_node: NodeId, concrete: TypeId) {
        let NodeKind::ArrayType { elem, size } = self.ast.kind(ty_node).clone() else {
            self.ast.node_mut(ty_node).ty = Some(concrete);
            return;
        };
        let TypeKind::Array {
            elem: concrete_elem,
            size: n,
            size_known: true,
        } = self.store.kind(concrete).clone()
        else {
            return;
        };
        self.materialize_inferred_sizes(elem, concrete_elem);
        if size.is_none() {
            let span = self.ast.span(ty_node);
            let i64_ty = self.store.i64_ty;
            let literal = self.ast.push(
                NodeKind::Literal {
                    kind: LiteralKind::Int,
                },
                span,
            );
            let lit_node = self.ast.node_mut(literal);
            lit_node.ty = Some(i64_ty);
            lit_node.const_value = Some(ConstValue::Int(n));
            let NodeKind::ArrayType { size, .. } = &mut self.ast.node_mut(ty_node).kind else {
                unreachable!();
            };
            *size = Some(literal);
        }
        self.ast.node_mut(ty_node).ty = Some(concrete);
    }
}
