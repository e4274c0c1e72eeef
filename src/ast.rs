//! **Abstract syntax tree** for Lox.
//!
//! Two closed sum types, [`Expr`] and [`Stmt`], cover every construct of the
//! language; each pass (resolver, interpreter, printer) matches on them
//! exhaustively.  Nodes own their tokens so a parsed program is independent
//! of the source buffer it came from.
//!
//! Nodes the resolver annotates (`Variable`, `Assign`, `This`, `Super`) carry
//! an [`ExprId`].  The interpreter's side‑table is keyed by that id, which
//! gives per‑node identity without relying on addresses.

use std::fmt;
use std::rc::Rc;

use crate::token::Token;

/// Identity of a resolvable expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub usize);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic [`ExprId`] generator.
///
/// One generator lives as long as the session, so ids stay unique across
/// every chunk of source parsed into the same interpreter.
#[derive(Debug, Default)]
pub struct NodeIds {
    next: usize,
}

impl NodeIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// The parser converts the token payload at parse time so the tree does not
/// depend on token kinds for constants.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal (Lox’s `null`).
    Nil,
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Function‑, method‑ or constructor‑call expression
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method` inside a subclass method.
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

/// A function or method declaration.
///
/// Shared through `Rc`: every closure created from the declaration keeps it
/// alive after the statement list it was parsed into is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// Statement nodes.  A program is a sequence of these.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// Class declaration.  `superclass` is always an `Expr::Variable`.
    Class {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
