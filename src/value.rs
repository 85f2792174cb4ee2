use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::stmt::FunctionDecl;

/// Runtime value.  Primitives compare by value, callables and instances by
/// identity (see `is_equal` in the interpreter).
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Native(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<RefCell<LoxInstance>>),
}

/// A built-in function.  Errors carry no line; the call site stamps one on.
#[derive(Debug)]
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

/// A user function: declaration plus the environment captured at its
/// declaration site.  `is_initializer` marks methods named `init`, which
/// always yield the `this` bound in their closure.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Pair this method with an instance: a fresh child of the method's
    /// closure binds `this`, and every later call through the bound method
    /// shares that environment.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Some(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn find_method(&self, name: &str) -> Option<&Rc<LoxFunction>> {
        self.methods.get(name)
    }

    /// Calling a class runs `init` if present, so the class's arity is its
    /// initializer's.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    pub fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // integral doubles print with no decimal point
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::Str(s) => write!(f, "{}", s),

            Value::Native(native) => write!(f, "<native fn {}>", native.name),

            Value::Function(function) => write!(f, "<fn {}>", function.declaration.name.lexeme),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}
