//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, self‑read in an initializer, misplaced
//!    `return`, `this` and `super`).
//! 3. Tell the interpreter, for *each* variable occurrence, how many scopes out
//!    its binding lives.  Occurrences left unrecorded are globals.
//!
//! Errors do not stop the walk: every one found is collected and handed back
//! together, so a program with two mistakes reports both.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::class::INITIALIZER;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::token::Token;
use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body are we in?  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    /// Global variable whose initializer is being resolved.
    global_initializer: Option<String>,
    /// Top-level names defined earlier in this pass.
    globals: HashSet<String>,
    errors: Vec<LoxError>,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            global_initializer: None,
            globals: HashSet::new(),
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements.
    ///
    /// Returns every static error found, in source order.  Bindings of a
    /// program that fails may already be recorded; the caller must not run it.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<(), Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            info!("Resolve pass found {} error(s)", self.errors.len());
            Err(self.errors)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Block(statements) => {
                // ① Push a new anonymous scope for `{ … }`
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // ② var declaration: declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    let enclosing = if self.scopes.is_empty() {
                        self.global_initializer.replace(name.lexeme.clone())
                    } else {
                        self.global_initializer.take()
                    };
                    self.resolve_expr(expr);
                    self.global_initializer = enclosing;
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // ③ function declaration: name is visible *inside* its own body
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                // Both branches, whichever one runs.
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                // ④ return only allowed inside a function, and bare in `init`
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            // Scope holding `super`, wrapped around the `this` scope.
            self.begin_scope();
            self.insert_defined("super");
        }

        self.begin_scope();
        self.insert_defined("this");

        for method in methods {
            let kind = if method.name.lexeme == INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // Cannot read in own initializer
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                } else if self.global_initializer.as_deref() == Some(name.lexeme.as_str())
                    && !self.is_known_global(&name.lexeme)
                {
                    self.error(name, "Can't read global variable in its own initializer.");
                }
                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.")
                    }
                    ClassType::Class => self.error(
                        keyword,
                        "Can't use 'super' in a class with no superclass.",
                    ),
                    ClassType::Subclass => {}
                }
                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        let enclosing_initializer = self.global_initializer.take();
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing_function;
        self.global_initializer = enclosing_initializer;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.lexeme.clone(), true);
            }
            None => {
                self.globals.insert(name.lexeme.clone());
            }
        }
    }

    /// Redeclaring a global may read the previous binding.
    fn is_known_global(&self, name: &str) -> bool {
        self.globals.contains(name) || self.interpreter.is_global(name)
    }

    fn insert_defined(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        debug!("Resolve error at line {}: {}", token.line, message);
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) when no scope declares the name.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        // innermost → outermost
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
