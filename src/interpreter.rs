//! Tree‑walking **evaluator**.
//!
//! Statements execute for their effects and report a [`Flow`]; expressions
//! evaluate to a [`Value`].  Variable references consult the resolver's
//! side‑table: a recorded hop count means "walk exactly that many
//! environments up from the current one", no entry means "global".
//!
//! Evaluation recurses on the host stack and has no depth check: deeply
//! recursive Lox functions overflow it (a few hundred frames in debug builds
//! with an 8 MiB stack, several thousand in release builds).

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::callable::{self, Callable, LoxCallable, LoxFunction};
use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::{Env, Environment};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
///
/// `Return` travels up through blocks and loops untouched and is consumed by
/// the nearest function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Env,
    environment: Env,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Interpreter printing to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Interpreter printing to `out`.  Defines native functions such as `clock`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: Env = Env::default();

        let clock = callable::clock();
        debug!("Defining native function '{}'", clock.name);
        globals
            .borrow_mut()
            .define(clock.name, Value::Callable(Callable::Native(Rc::new(clock))));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Resolver callback: `id` refers to a binding `depth` scopes out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting {} at depth {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Hop count recorded for `id`, if the resolver found it in a local scope.
    pub fn resolved_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Is `name` bound in the global environment?
    pub fn is_global(&self, name: &str) -> bool {
        self.globals.borrow().contains(name)
    }

    /// Interprets a list of statements (a "program").
    ///
    /// A runtime error stops the remaining statements and is returned; the
    /// globals keep whatever the earlier statements did.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        // Leftover from an aborted run: start again from the globals.
        self.environment = Rc::clone(&self.globals);

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                debug!("Printing value: {}", value);
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment: Env = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                // Capture the current environment as the closure.
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let superclass: Option<Rc<LoxClass>> = match superclass {
                    Some(expr) => Some(self.evaluate_superclass(expr)?),
                    None => None,
                };

                // Methods of a subclass close over an extra scope holding `super`.
                let method_env: Env = match &superclass {
                    Some(superclass) => {
                        let env: Env = Environment::child_of(&self.environment);
                        env.borrow_mut().define(
                            "super",
                            Value::Callable(Callable::Class(Rc::clone(superclass))),
                        );
                        env
                    }
                    None => Rc::clone(&self.environment),
                };

                let table: HashMap<String, Rc<LoxFunction>> = methods
                    .iter()
                    .map(|method| {
                        let function = LoxFunction::new(
                            Rc::clone(method),
                            Rc::clone(&method_env),
                            method.name.lexeme == INITIALIZER,
                        );
                        (method.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect();

                let class = LoxClass::new(name.lexeme.clone(), superclass, table);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Callable(Callable::Class(Rc::new(class))))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `environment`, then put the previous
    /// environment back whether they finished, returned or failed.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Env) -> Result<Flow> {
        debug!("Entering block with {} statements", statements.len());

        let previous: Env = std::mem::replace(&mut self.environment, environment);
        let result: Result<Flow> = self.execute_sequence(statements);
        self.environment = previous;

        result
    }

    fn execute_sequence(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn evaluate_superclass(&mut self, expr: &Expr) -> Result<Rc<LoxClass>> {
        let Expr::Variable { name, .. } = expr else {
            return Err(LoxError::internal("superclass is not a variable"));
        };

        match self.evaluate(expr)? {
            Value::Callable(Callable::Class(class)) => Ok(class),
            _ => Err(LoxError::runtime(name, "Superclass must be a class.")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let function: Callable = match callee {
                    Value::Callable(function) => function,
                    other => {
                        return Err(LoxError::runtime(
                            paren,
                            format!("'{}' is not callable.", other),
                        ))
                    }
                };

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                if values.len() != function.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            values.len()
                        ),
                    ));
                }

                function.call(self, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super { id, method, .. } => {
                let distance: usize = self
                    .resolved_depth(*id)
                    .ok_or_else(|| LoxError::internal("unresolved 'super'"))?;

                let Value::Callable(Callable::Class(superclass)) =
                    Environment::get_at(&self.environment, distance, "super")?
                else {
                    return Err(LoxError::internal("'super' is not bound to a class"));
                };

                // `this` lives in the scope just inside the one holding `super`.
                let this_distance: usize = distance
                    .checked_sub(1)
                    .ok_or_else(|| LoxError::internal("'super' resolved at depth 0"))?;

                let Value::Instance(instance) =
                    Environment::get_at(&self.environment, this_distance, "this")?
                else {
                    return Err(LoxError::internal("'this' is not bound to an instance"));
                };

                let method_fn: Rc<LoxFunction> =
                    superclass.find_method(&method.lexeme).ok_or_else(|| {
                        LoxError::runtime(
                            method,
                            format!(
                                "Superclass doesn't implement method '{}'.",
                                method.lexeme
                            ),
                        )
                    })?;

                Ok(Value::Callable(Callable::Function(Rc::new(
                    method_fn.bind(instance),
                ))))
            }
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operand of '-' must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(LoxError::internal(format!(
                "invalid unary operator '{}'",
                operator.lexeme
            ))),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        debug!(
            "Binary '{}' on {:?} and {:?}",
            operator.lexeme, left, right
        );

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => {
                let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                    return Err(LoxError::runtime(
                        operator,
                        format!("Operands of '{}' must be numbers.", operator.lexeme),
                    ));
                };

                let (a, b): (f64, f64) = (*a, *b);

                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(LoxError::internal(format!(
                        "invalid binary operator '{}'",
                        operator.lexeme
                    ))),
                }
            }
        }
    }
}
