use crate::error::{LoxError, Position, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Closures keep their defining scope alive through
/// this handle after the block or call that created it has finished.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: a name→value table plus a link to the enclosing scope.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    pub fn enclosing(&self) -> Option<EnvRef> {
        self.enclosing.clone()
    }

    /// Bind `name` in this scope, shadowing or overwriting any previous value.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup walking the whole chain; used for globals.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name.pos.clone(),
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name.pos.clone(),
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Read `name` from this scope only, without walking the chain.
    pub fn get_here(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }
}

/// Walk exactly `distance` parent links up from `env`.
pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
    let mut current: EnvRef = Rc::clone(env);

    for _ in 0..distance {
        let next = current.borrow().enclosing()?;
        current = next;
    }

    Some(current)
}

/// Read `name` from the scope exactly `distance` hops up.  A miss means the
/// resolver and the runtime scope chain disagree.
pub fn get_at(env: &EnvRef, distance: usize, name: &str, pos: &Position) -> Result<Value> {
    ancestor(env, distance)
        .and_then(|scope| scope.borrow().get_here(name))
        .ok_or_else(|| {
            LoxError::internal(
                pos.clone(),
                format!("'{}' is not bound {} scope(s) up from its use.", name, distance),
            )
        })
}

pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
    let scope = ancestor(env, distance)
        .filter(|scope| scope.borrow().values.contains_key(&name.lexeme))
        .ok_or_else(|| {
            LoxError::internal(
                name.pos.clone(),
                format!(
                    "'{}' is not bound {} scope(s) up from its assignment.",
                    name.lexeme, distance
                ),
            )
        })?;

    scope.borrow_mut().define(&name.lexeme, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, Rc::from("test"), 1, 1)
    }

    #[test]
    fn get_falls_back_to_enclosing_scope() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::child_of(&globals);

        assert_eq!(inner.borrow().get(&ident("a")).ok(), Some(Value::Number(1.0)));
    }

    #[test]
    fn assign_updates_defining_scope() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));
        let inner = Environment::child_of(&globals);

        inner
            .borrow_mut()
            .assign(&ident("a"), Value::Bool(true))
            .expect("assign");

        assert_eq!(globals.borrow().get_here("a"), Some(Value::Bool(true)));
        assert_eq!(inner.borrow().get_here("a"), None);
    }

    #[test]
    fn undefined_variable_is_runtime_error() {
        let env = Environment::new();
        let err = env.get(&ident("missing")).unwrap_err();

        assert!(err.to_string().contains("Undefined variable 'missing'."));
    }

    #[test]
    fn get_at_reads_exact_ancestor() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Number(1.0));
        let middle = Environment::child_of(&outer);
        middle.borrow_mut().define("x", Value::Number(2.0));
        let inner = Environment::child_of(&middle);

        let pos = ident("x").pos;

        assert_eq!(get_at(&inner, 1, "x", &pos).ok(), Some(Value::Number(2.0)));
        assert_eq!(get_at(&inner, 2, "x", &pos).ok(), Some(Value::Number(1.0)));
        assert!(matches!(
            get_at(&inner, 0, "x", &pos),
            Err(LoxError::Internal { .. })
        ));
    }
}
