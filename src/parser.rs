/*!
Time & Space Complexity: whole‑file overview
============================================

Definitions
-----------
* **n** = number of tokens (including the sole EOF).
* **m** = number of AST nodes (`m ≤ n`, because each token contributes at most one node).

### Time

| Phase / function              | Cost | Rationale                                                             |
|-------------------------------|-----:|-----------------------------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is consumed once via `advance()`.                          |
| Individual productions        | O(1) per token | Recursive descent is stream‑oriented; no extra scans. |
| Error recovery `synchronize()`| O(k) | Discards tokens ≤ next statement boundary ( `k ≤ n`).                 |

**Overall:** **Θ(n)**.

### Space

| Structure                | Asymptotic | Notes                                                         |
|--------------------------|-----------:|---------------------------------------------------------------|
| Borrowed token slice     | O(n)       | Tokens are cloned only into nodes that keep them.             |
| AST (`Vec`, `Box`, `Rc`) | O(m) ≈ O(n)| One `Box` per interior node; declarations shared via `Rc`.    |
| Parser scratch fields    | O(1)       | A few indices and temporaries.                                |

Call‑stack depth grows with syntactic nesting (≪ n in practice).

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths (`consume`, etc.)| `debug`| Context before returning structured error.|
| `synchronize`                | `debug`| Tokens skipped during panic‑mode recovery.|

--------------------------------------------------------------------------------
Grammar (EBNF, condensed, Crafting Interpreters dialect)
--------------------------------------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt
               | returnStmt | whileStmt | block ;
exprStmt       → expression ";" ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
ifStmt         → "if" "(" expression ")" statement
               ( "else" statement )? ;
printStmt      → "print" expression ";" ;
returnStmt     → "return" expression? ";" ;
whileStmt      → "while" "(" expression ")" statement ;
block          → "{" declaration* "}" ;
parameters     → IDENT ( "," IDENT )* ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
arguments      → expression ( "," expression )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" | "super" "." IDENT ;
```

`for` has no node of its own: it is desugared into `Block` + `While`.

Errors are *collected*, not thrown to the caller.  A failing declaration is
dropped, the parser synchronizes to the next statement boundary and carries
on, so one pass reports every independently malformed statement.  Some
problems (invalid assignment target, more than 255 arguments) are recorded
without abandoning the statement at all.
*/

use crate::ast::{Expr, FunctionDecl, LiteralValue, NodeIds, Stmt};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

use std::rc::Rc;

use log::{debug, info};

/// Maximum number of call arguments and function parameters.
pub const MAX_ARITY: usize = 255;

/// Top‑level parser over an immutable slice of tokens.
///
/// The slice must end with an `EOF` token, as produced by the scanner.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    ids: &'a mut NodeIds,
    errors: Vec<LoxError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.  `ids` hands out node identities.
    pub fn new(tokens: &'a [Token], ids: &'a mut NodeIds) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            ids,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.
    ///
    /// Returns every statement that parsed, plus every syntax error found on
    /// the way, in source order.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<LoxError>) {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors.len()
        );

        (statements, self.errors)
    }

    // ──────────────────────── declaration rules ───────────────────

    /// One declaration, or `None` after reporting and recovering from an error.
    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration");

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::FUN) {
            self.function("function").map(Stmt::Function)
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!("Parse error, synchronizing: {}", e);

                self.errors.push(e);
                self.synchronize();

                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expect class name.")?
            .clone();

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let super_name: Token = self
                .consume(TokenType::IDENTIFIER, "Expect superclass name.")?
                .clone();

            Some(Expr::Variable {
                id: self.ids.fresh(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        debug!(
            "Parsed class '{}' with {} method(s)",
            name.lexeme,
            methods.len()
        );

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `IDENT "(" parameters? ")" block`, shared by functions and methods.
    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?
            .clone();

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token: &Token = self.peek();
                    self.error(token, "Can't have more than 255 parameters.");
                }

                params.push(
                    self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?
                        .clone(),
                );

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body: Vec<Stmt> = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expect variable name.")?
            .clone();

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────
    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(LiteralValue::True)),
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        debug!("Desugared for loop into while");

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    /// Statements up to the closing `}`.  Broken declarations inside the
    /// block are reported and skipped without abandoning the block.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────
    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: &Token = self.previous();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.ids.fresh(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                // Reported, but the statement itself is still well formed.
                other => {
                    self.error(equals, "Invalid assignment target.");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// One left‑associative binary precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = operand(self)?;

        while operators.iter().any(|op| self.check(op.clone())) {
            let operator: Token = self.advance().clone();
            let right: Expr = operand(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token = self
                    .consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?
                    .clone();

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let token: &Token = self.peek();
                    self.error(token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self
            .consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }

        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }

        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        match &self.peek().token_type {
            TokenType::NUMBER(n) => {
                let n: f64 = *n;
                self.advance();
                return Ok(Expr::Literal(LiteralValue::Number(n)));
            }

            TokenType::STRING(s) => {
                let s: String = s.clone();
                self.advance();
                return Ok(Expr::Literal(LiteralValue::Str(s)));
            }

            _ => {}
        }

        if self.matches(TokenType::SUPER) {
            let keyword: Token = self.previous().clone();

            self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;

            let method: Token = self
                .consume(TokenType::IDENTIFIER, "Expect superclass method name.")?
                .clone();

            return Ok(Expr::Super {
                id: self.ids.fresh(),
                keyword,
                method,
            });
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: self.ids.fresh(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.ids.fresh(),
                name: self.previous().clone(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "Expect expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Record an error without unwinding the current rule.
    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::parse(token, message));
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            debug!("Skipping token '{}'", self.peek().lexeme);

            self.advance();
        }
    }
}
