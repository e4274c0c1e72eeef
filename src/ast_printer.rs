use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};

/// Converts syntax trees to the Crafting‑Interpreters parenthesized prefix
/// form, e.g. `(* (- 123.0) (group 45.67))`.
///
/// Strings are quoted and numbers always keep a fractional part, so the
/// output shows exactly which literal the parser saw.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => format!("\"{}\"", s.replace('"', "\\\"")),

                // `{:?}` keeps the `.0` on whole numbers: 3 → 3.0
                LiteralValue::Number(n) => format!("{:?}", n),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── variables ───────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    /// One statement, nested statements included.
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::sequence("(block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(declaration) => Self::function("fun", declaration),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    s.push_str(" < ");
                    s.push_str(&Self::print(superclass));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::function("method", method));
                }
                s.push(')');
                s
            }
        }
    }

    fn function(keyword: &str, declaration: &FunctionDecl) -> String {
        let params: Vec<&str> = declaration
            .params
            .iter()
            .map(|param| param.lexeme.as_str())
            .collect();

        let head = format!(
            "({} {}({})",
            keyword,
            declaration.name.lexeme,
            params.join(" ")
        );

        Self::sequence(&head, &declaration.body)
    }

    fn sequence(head: &str, statements: &[Stmt]) -> String {
        let mut s = head.to_string();
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}
