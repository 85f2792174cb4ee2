//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: a stack of `HashMap<String, bool>` tracking
//!    declared (false) and fully defined (true) names, mirroring exactly the
//!    environments the interpreter will create — blocks, function parameter
//!    scopes, and the synthetic `this` scope around class methods.
//! 2. **Enforces static rules**: duplicate declaration in a local scope,
//!    reading a variable in its own initializer, `return` outside a
//!    function, returning a value from `init`, `this` outside a class.
//!    Errors go to the [`Reporter`] and resolution continues, so one bad
//!    binding does not hide the rest.
//! 3. **Records binding distances**: each `Variable`/`Assign`/`This` node is
//!    either noted as a local at some hop count (0 = innermost scope) or
//!    left to the interpreter's dynamic global lookup.

use std::collections::HashMap;

use log::debug;

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::reporter::Reporter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body are we inside?  Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Are we inside a class body?  Validates `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'i, 'out, 'r> {
    interpreter: &'i mut Interpreter<'out>,
    reporter: &'r mut Reporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'i, 'out, 'r> Resolver<'i, 'out, 'r> {
    pub fn new(interpreter: &'i mut Interpreter<'out>, reporter: &'r mut Reporter) -> Self {
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Block(statements) => {
                self.begin_scope();
                for stmt in statements {
                    self.resolve_stmt(stmt);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare, resolve the initializer, then define: reading the
                // name inside its own initializer is caught in between
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // declared and defined before the body so the function can
                // recurse
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(FunctionType::Function, declaration);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.reporter.report(&LoxError::resolve(
                        keyword,
                        "Can't return from top-level code.",
                    ));
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter.report(&LoxError::resolve(
                            keyword,
                            "Can't return a value from an initializer.",
                        ));
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Class { name, methods } => {
                // the class name is visible inside its own methods
                self.declare(name);
                self.define(name);

                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                // the scope a bound method's `this` lives in; it must
                // contain `this` and nothing else, matching the bind
                // environment built at runtime
                self.begin_scope();
                self.scopes
                    .last_mut()
                    .unwrap()
                    .insert("this".to_string(), true);

                for method in methods {
                    let kind = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(kind, method);
                }

                self.end_scope();

                self.current_class = enclosing_class;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    pub fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.reporter.report(&LoxError::resolve(
                            name,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // right-hand side first, then bind the target
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => {
                // property names are looked up dynamically; only the object
                // resolves
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.reporter.report(&LoxError::resolve(
                        keyword,
                        "Can't use 'this' outside of a class.",
                    ));
                    return;
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters and body.
    fn resolve_function(&mut self, kind: FunctionType, declaration: &FunctionDecl) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for statement in &declaration.body {
            self.resolve_stmt(statement);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        // only local scopes are checked; the global scope allows
        // re-declaration
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.reporter.report(&LoxError::resolve(
                    name,
                    "Already a variable with this name in this scope.",
                ));
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at its depth, or as a global when
    /// no scope contains the name.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("resolved '{}' as global", name.lexeme);
        self.interpreter.note_global(id);
    }
}
