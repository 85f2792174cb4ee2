//! Tree-walking evaluator.
//!
//! Holds the `globals` environment (with the `clock` built-in), a mutable
//! "current" environment forming the lexical chain, and the hop-count map
//! recorded by the resolver.  Local variable references walk exactly the
//! resolved number of environment links; names with no entry fall back to a
//! dynamic lookup in `globals`.
//!
//! `return` travels as [`Unwind::Return`] on the evaluator's error channel:
//! it crosses any number of blocks and loops untouched and is caught only at
//! function-call boundaries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::{Expr, ExprId, Literal};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, NativeFunction, Value};

/// Non-local exit from statement execution: either an early `return`
/// carrying its value, or a runtime error on its way to the top level.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(error: LoxError) -> Self {
        Unwind::Error(error)
    }
}

type ExecResult = Result<(), Unwind>;
type EvalResult = Result<Value, Unwind>;

pub struct Interpreter<'out> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    output: &'out mut dyn Write,
}

impl<'out> Interpreter<'out> {
    /// Build an interpreter whose `print` statements write to `output`.
    pub fn new(output: &'out mut dyn Write) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Some(Value::Native(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: clock_native,
            }))),
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    // ─── resolver callbacks ──────────────────────────────────────────────

    /// Record that the reference `id` binds `depth` environments out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Record that a reference resolved to no lexical scope: absence from
    /// the hop map is what sends a lookup to `globals`.
    pub fn note_global(&mut self, id: ExprId) {
        debug!("reference {id:?} falls through to globals");
    }

    // ─── entry points ────────────────────────────────────────────────────

    /// Execute a resolved program.  A runtime error aborts the current
    /// statement and surfaces here.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(Unwind::Error(err)) => return Err(err),
                // the resolver rejects top-level `return`
                Err(Unwind::Return(_)) => {}
            }
        }

        Ok(())
    }

    /// Evaluate a lone expression (REPL echo mode).
    pub fn interpret_expression(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),
            Err(Unwind::Error(err)) => Err(err),
            // return signals originate inside calls and are caught there;
            // a stray one degrades to its value
            Err(Unwind::Return(value)) => Ok(value),
        }
    }

    // ─── statements ──────────────────────────────────────────────────────

    fn execute(&mut self, statement: &Stmt) -> ExecResult {
        match statement {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value).map_err(LoxError::Io)?;
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction {
                    declaration: Rc::clone(declaration),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                };

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Some(Value::Function(Rc::new(function))),
                );

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class { name, methods } => {
                // bind the name first so methods can close over the class
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Some(Value::Nil));

                let mut method_map = HashMap::new();
                for declaration in methods {
                    let function = LoxFunction {
                        declaration: Rc::clone(declaration),
                        closure: Rc::clone(&self.environment),
                        is_initializer: declaration.name.lexeme == "init",
                    };

                    method_map.insert(declaration.name.lexeme.clone(), Rc::new(function));
                }

                let class = Value::Class(Rc::new(LoxClass {
                    name: name.lexeme.clone(),
                    methods: method_map,
                }));

                self.environment
                    .borrow_mut()
                    .assign(&name.lexeme, class, name.line)?;

                Ok(())
            }
        }
    }

    /// Run `statements` under `environment`, restoring the previous
    /// environment on every exit path (including return and error).
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(());
        for statement in statements {
            result = self.execute(statement);
            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    // ─── expressions ─────────────────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

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
            } => self.evaluate_logical(left, operator, right),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => Ok(self.lookup_variable(*id, name)?),

            Expr::This { id, keyword } => Ok(self.lookup_variable(*id, keyword)?),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self.globals.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => self.evaluate_get(object, name),

            Expr::Set {
                object,
                name,
                value,
            } => self.evaluate_set(object, name, value),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> EvalResult {
        let operand = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match operand {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&operand))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(numbers_expected(operator).into()),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(numbers_expected(operator).into()),
            },

            // IEEE-754 semantics: 1/0 is inf, 0/0 is NaN
            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => Err(numbers_expected(operator).into()),
            },

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(numbers_expected(operator).into()),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(numbers_expected(operator).into()),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(numbers_expected(operator).into()),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(numbers_expected(operator).into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left, &right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

            // comma: left evaluated for side effects, right is the result
            TokenType::COMMA => Ok(right),

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> EvalResult {
        let left = self.evaluate(left)?;

        // yields the operand value itself, not a boolean
        match operator.token_type {
            TokenType::OR if is_truthy(&left) => Ok(left),
            TokenType::AND if !is_truthy(&left) => Ok(left),
            _ => self.evaluate(right),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> EvalResult {
        let callee = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        match callee {
            Value::Native(native) => {
                check_arity(native.arity, args.len(), paren)?;

                (native.func)(&args)
                    .map_err(|msg| LoxError::runtime(paren.line, msg).into())
            }

            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;
                self.call_function(&function, args, paren.line)
            }

            Value::Class(class) => {
                check_arity(class.arity(), args.len(), paren)?;
                self.call_class(&class, args, paren.line)
            }

            _ => Err(LoxError::runtime(paren.line, "Can only call functions and classes.").into()),
        }
    }

    /// Invoke a user function: fresh child of its closure, parameters
    /// bound, body executed.  Catches the return signal here and nowhere
    /// else.  Initializers always yield the `this` bound in their closure.
    fn call_function(
        &mut self,
        function: &LoxFunction,
        arguments: Vec<Value>,
        line: usize,
    ) -> EvalResult {
        let mut environment = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, Some(argument));
        }
        let environment = Rc::new(RefCell::new(environment));

        let returned = match self.execute_block(&function.declaration.body, environment) {
            Ok(()) => None,
            Err(Unwind::Return(value)) => Some(value),
            Err(err) => return Err(err),
        };

        if function.is_initializer {
            return Ok(Environment::get_at(&function.closure, 0, "this", line)?);
        }

        Ok(returned.unwrap_or(Value::Nil))
    }

    /// Calling a class constructs an instance, runs `init` bound to it if
    /// present, and yields the instance regardless of how `init` exited.
    fn call_class(
        &mut self,
        class: &Rc<LoxClass>,
        arguments: Vec<Value>,
        line: usize,
    ) -> EvalResult {
        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method("init") {
            let bound = initializer.bind(Value::Instance(Rc::clone(&instance)));
            self.call_function(&bound, arguments, line)?;
        }

        Ok(Value::Instance(instance))
    }

    fn evaluate_get(&mut self, object: &Expr, name: &Token) -> EvalResult {
        let object = self.evaluate(object)?;

        match object {
            Value::Instance(instance) => {
                if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
                    return Ok(value.clone());
                }

                let method = instance
                    .borrow()
                    .class
                    .find_method(&name.lexeme)
                    .map(Rc::clone);

                match method {
                    Some(method) => Ok(Value::Function(Rc::new(
                        method.bind(Value::Instance(Rc::clone(&instance))),
                    ))),

                    None => Err(LoxError::runtime(
                        name.line,
                        format!("Undefined property '{}'.", name.lexeme),
                    )
                    .into()),
                }
            }

            _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
        }
    }

    fn evaluate_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> EvalResult {
        let object = self.evaluate(object)?;

        match object {
            Value::Instance(instance) => {
                let value = self.evaluate(value)?;

                instance
                    .borrow_mut()
                    .fields
                    .insert(name.lexeme.clone(), value.clone());

                Ok(value)
            }

            _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
        }
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Value, LoxError> {
        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::get_at(&self.environment, distance, &name.lexeme, name.line)
            }

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Nil => Value::Nil,
    }
}

fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<(), LoxError> {
    if expected == got {
        Ok(())
    } else {
        Err(LoxError::runtime(
            paren.line,
            format!("Expected {expected} arguments but got {got}."),
        ))
    }
}

fn numbers_expected(operator: &Token) -> LoxError {
    LoxError::runtime(operator.line, "Operands must be numbers.")
}

/// Only `false` and `nil` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Value equality for primitives, identity for callables and instances.
/// NaN compares equal to itself, by language policy rather than IEEE-754.
fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,

        (Value::Bool(a), Value::Bool(b)) => a == b,

        (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),

        (Value::Str(a), Value::Str(b)) => a == b,

        (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),

        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),

        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),

        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

        _ => false,
    }
}

fn clock_native(_args: &[Value]) -> Result<Value, String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("Clock error: {}", e))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
