use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to an environment.  Blocks, calls and closures all hold
/// one; an environment lives as long as its longest holder.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    /// Bind `name` in *this* environment, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Is `name` bound in this environment itself?
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Overwrite the nearest existing binding.  Never creates one.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The environment exactly `distance` links up the chain from `env`.
    pub fn ancestor(env: &Env, distance: usize) -> Result<Env> {
        let mut current: Env = Rc::clone(env);

        for _ in 0..distance {
            let next: Env = current.borrow().enclosing.clone().ok_or_else(|| {
                LoxError::internal(format!("no environment at distance {}", distance))
            })?;
            current = next;
        }

        Ok(current)
    }

    /// Read `name` from the environment `distance` links up, trusting the
    /// resolver that it is there.
    pub fn get_at(env: &Env, distance: usize, name: &str) -> Result<Value> {
        debug!("get_at distance={} name={}", distance, name);

        let target: Env = Self::ancestor(env, distance)?;
        let value = target.borrow().values.get(name).cloned();

        value.ok_or_else(|| {
            LoxError::internal(format!(
                "resolved variable '{}' missing at distance {}",
                name, distance
            ))
        })
    }

    pub fn assign_at(env: &Env, distance: usize, name: &Token, value: Value) -> Result<()> {
        debug!("assign_at distance={} name={}", distance, name.lexeme);

        let target: Env = Self::ancestor(env, distance)?;
        target.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(name: &str) -> Token {
        Token::identifier(name, 1)
    }

    #[test]
    fn define_shadows_instead_of_mutating_outer() {
        let outer: Env = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner: Env = Environment::child_of(&outer);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(inner.borrow().get(&token("a")).unwrap(), Value::Number(2.0));
        assert_eq!(outer.borrow().get(&token("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn assign_walks_the_chain() {
        let outer: Env = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Nil);

        let inner: Env = Environment::child_of(&outer);
        inner
            .borrow_mut()
            .assign(&token("a"), Value::Bool(true))
            .unwrap();

        assert_eq!(outer.borrow().get(&token("a")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn assign_to_unknown_name_fails() {
        let env = Environment::new().assign(&token("ghost"), Value::Nil);

        match env {
            Err(e) => assert_eq!(e.to_string(), "Undefined variable 'ghost'.\n[line 1]"),
            Ok(()) => panic!("assignment should not create a global"),
        }
    }

    #[test]
    fn get_at_skips_closer_bindings() {
        let outer: Env = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Number(1.0));

        let inner: Env = Environment::child_of(&outer);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(
            Environment::get_at(&inner, 1, "a").unwrap(),
            Value::Number(1.0)
        );

        Environment::assign_at(&inner, 1, &token("a"), Value::Number(3.0)).unwrap();
        assert_eq!(
            Environment::get_at(&outer, 0, "a").unwrap(),
            Value::Number(3.0)
        );
        assert!(Environment::get_at(&inner, 5, "a").is_err());
    }
}
