//! Built-in scalar functions.
//!
//! Functions are looked up by name in a registry; adding one means
//! implementing [`Function`] and registering it in [`FunctionRegistry::global`].

use crate::error::Result;
use crate::types::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

mod round;

/// A scalar function callable from extend computations.
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply the function to fully evaluated arguments.
    fn call(&self, args: &[Value]) -> Result<Value>;
}

pub struct FunctionRegistry {
    functions: HashMap<&'static str, Box<dyn Function>>,
}

static REGISTRY: LazyLock<FunctionRegistry> = LazyLock::new(|| {
    let mut registry = FunctionRegistry {
        functions: HashMap::new(),
    };
    registry.register(Box::new(round::Round));
    registry
});

impl FunctionRegistry {
    /// The registry of all built-ins.
    pub fn global() -> &'static FunctionRegistry {
        &REGISTRY
    }

    fn register(&mut self, function: Box<dyn Function>) {
        self.functions.insert(function.name(), function);
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Function> {
        self.functions.get(name).map(|f| f.as_ref())
    }
}
