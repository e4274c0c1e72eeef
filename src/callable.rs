//! The **callable** capability and the function values that provide it.
//!
//! Three kinds of value can appear in call position: user functions
//! ([`LoxFunction`], closures over their defining environment), classes
//! (calling one constructs an instance, see [`crate::class`]) and native
//! builtins ([`NativeFunction`]).  [`Callable`] is the closed set of them as
//! stored inside a [`Value`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{Env, Environment};
use crate::error::Result;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Anything that can be invoked with `callee(args…)`.
///
/// The interpreter checks `arity` against the argument count *before*
/// calling, so implementations may assume `arguments.len() == self.arity()`.
pub trait LoxCallable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value>;
}

/// Callable runtime values.  Clones share the underlying object.
#[derive(Clone)]
pub enum Callable {
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Native(Rc<NativeFunction>),
}

impl LoxCallable for Callable {
    fn arity(&self) -> usize {
        match self {
            Callable::Function(f) => f.arity(),
            Callable::Class(c) => c.arity(),
            Callable::Native(n) => n.arity(),
        }
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        match self {
            Callable::Function(f) => f.call(interpreter, arguments),
            Callable::Class(c) => LoxClass::instantiate(c, interpreter, arguments),
            Callable::Native(n) => n.call(interpreter, arguments),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "{}", function),
            Callable::Class(class) => write!(f, "{}", class),
            Callable::Native(native) => write!(f, "{}", native),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A closure: a declaration paired with the environment it was defined in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Env,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Env, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure binds `this` to `instance`.
    ///
    /// The new environment sits between the method's closure and the
    /// environment each call creates, which is the extra hop the resolver
    /// accounts for with its `this` scope.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let environment: Env = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }
}

impl LoxCallable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment: Env = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, environment)?;

        // Initializers hand back the instance no matter how they exit.
        if self.is_initializer {
            return Environment::get_at(&self.closure, 0, "this");
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native builtins
// ─────────────────────────────────────────────────────────────────────────────

/// A builtin implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl LoxCallable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// `clock()`: seconds since the Unix epoch, with millisecond precision.
pub fn clock() -> NativeFunction {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_args: &[Value]| {
            let millis: i64 = chrono::Utc::now().timestamp_millis();
            Value::Number(millis as f64 / 1000.0)
        },
    }
}
