//! The call capability and the two kinds of plain functions: host‑provided
//! natives and user closures.  Classes implement [`Callable`] as constructors
//! in [`crate::class`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::FunctionDecl;
use crate::class::Instance;
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::interpreter::{Flow, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything that can appear in callee position.
pub trait Callable {
    /// Exact number of arguments the callee accepts.
    fn arity(&self) -> usize;

    /// Invoke with already evaluated arguments.  `paren` locates errors.
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, paren: &Token)
        -> Result<Value>;
}

/// Signature shared by every native function body.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String>;

/// A function implemented by the host.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        let result = (self.func)(interpreter, &arguments)
            .map_err(|message| LoxError::runtime(paren.pos.clone(), message))?;

        info!("Native function '{}' returned: {}", self.name, result);
        Ok(result)
    }
}

/// The natives every interpreter starts with.
pub fn natives() -> Vec<NativeFunction> {
    vec![
        NativeFunction {
            name: "clock",
            arity: 0,
            func: clock,
        },
        NativeFunction {
            name: "input",
            arity: 1,
            func: input,
        },
    ]
}

/// Seconds since the Unix epoch, with microsecond resolution.
fn clock(_interpreter: &mut Interpreter, _args: &[Value]) -> std::result::Result<Value, String> {
    let micros = Utc::now().timestamp_micros();
    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

/// Print the prompt (when it is a non‑empty string) and read one line.
/// Yields `nil` once the input is exhausted.
fn input(interpreter: &mut Interpreter, args: &[Value]) -> std::result::Result<Value, String> {
    if let Some(Value::String(prompt)) = args.first() {
        if !prompt.is_empty() {
            interpreter
                .write_prompt(prompt)
                .map_err(|e| format!("Failed to write prompt: {}", e))?;
        }
    }

    let line = interpreter
        .read_line()
        .map_err(|e| format!("Failed to read input: {}", e))?;

    Ok(match line {
        Some(line) => Value::String(Rc::from(line.as_str())),
        None => Value::Nil,
    })
}

/// A user function or method together with the scope it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// Produce a copy whose closure additionally defines `this`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }

    /// `this` as bound by [`bind`](Self::bind); initializers always yield it.
    fn bound_this(&self) -> Value {
        self.closure
            .borrow()
            .get_here("this")
            .unwrap_or(Value::Nil)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.declaration.params.len())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _paren: &Token,
    ) -> Result<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment = Environment::child_of(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(self.bound_this());
        }

        let value = match flow {
            Flow::Return(value) => value,
            Flow::Normal | Flow::Break => Value::Nil,
        };

        info!("Function '{}' returned: {}", self.name(), value);
        Ok(value)
    }
}
