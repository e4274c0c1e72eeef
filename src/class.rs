//! Classes and instances.
//!
//! A class is a named method table with an optional single superclass.
//! Method lookup walks the superclass chain, nearest definition first.
//! Instances start with no fields; fields are created only by assignment
//! and shadow methods of the same name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, LoxCallable, LoxFunction};
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// Name of the method run on construction.
pub const INITIALIZER: &str = "init";

pub struct LoxClass {
    name: String,
    superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    /// Own methods first, then the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// Arity of `init`, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    /// Construct an instance and run the initializer on it, if any.
    pub fn instantiate(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance: Rc<RefCell<LoxInstance>> =
            Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method(INITIALIZER) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Display for LoxClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property read: a field if present, else a method bound to `instance`.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method: Option<Rc<LoxFunction>> = instance.borrow().class.find_method(&name.lexeme);

        match method {
            Some(method) => {
                let bound: LoxFunction = method.bind(Rc::clone(instance));
                Ok(Value::Callable(Callable::Function(Rc::new(bound))))
            }
            None => Err(LoxError::runtime(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
