//! Recursive-descent parser with panic-mode error recovery.
//!
//! Precedence, low to high: comma, ternary, assignment, or, and, equality,
//! comparison, term, factor, unary, call, primary.  Assignment binds tighter
//! than ternary, so a ternary's branches are parsed by `assignment`; call
//! arguments are parsed at `ternary` level so `,` inside an argument list is
//! a separator, not the comma operator.
//!
//! A parse error inside a declaration is recorded and the parser
//! synchronizes to the next statement boundary, so one bad statement does
//! not hide the rest of the program.  Diagnostics are buffered and drained
//! into the [`Reporter`] by [`Parser::parse`]; the REPL's expression mode
//! ([`Parser::parse_expression`]) reports nothing and simply answers
//! "no expression" with `None`.

use std::rc::Rc;

use log::debug;

use crate::error::LoxError;
use crate::expr::{Expr, ExprId, Literal};
use crate::reporter::Reporter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

type ExprResult = Result<Expr, LoxError>;
type StmtResult = Result<Stmt, LoxError>;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    diagnostics: Vec<LoxError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Parse a whole program, recovering at statement boundaries.
    pub fn parse(&mut self, reporter: &mut Reporter) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        for err in self.diagnostics.drain(..) {
            reporter.report(&err);
        }

        statements
    }

    /// REPL single-expression mode: one expression followed by EOF.
    ///
    /// Any parse error (or leftover tokens, or a buffered diagnostic) means
    /// the line was not a lone expression; the caller falls back to
    /// statement mode.
    pub fn parse_expression(&mut self) -> Option<Expr> {
        let expr = self.expression().ok()?;

        if self.is_at_end() && self.diagnostics.is_empty() {
            Some(expr)
        } else {
            None
        }
    }

    // ─── declarations ────────────────────────────────────────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_tokens(&[TokenType::CLASS]) {
            self.class_declaration()
        } else if self.match_tokens(&[TokenType::FUN]) {
            self.function("function").map(Stmt::Function)
        } else if self.match_tokens(&[TokenType::VAR]) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.diagnostics.push(err);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> StmtResult {
        let name = self.consume(&TokenType::IDENTIFIER, "Expect class name.")?;
        self.consume(&TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(&TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class { name, methods })
    }

    fn function(&mut self, kind: &str) -> Result<Rc<FunctionDecl>, LoxError> {
        let name = self.consume(&TokenType::IDENTIFIER, format!("Expect {kind} name."))?;

        self.consume(
            &TokenType::LEFT_PAREN,
            format!("Expect '(' after {kind} name."),
        )?;

        let mut params = Vec::new();
        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 255 {
                    let at = self.peek().clone();
                    self.diagnostics
                        .push(LoxError::parse(&at, "Can't have more than 255 parameters."));
                }

                params.push(self.consume(&TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            &TokenType::LEFT_BRACE,
            format!("Expect '{{' before {kind} body."),
        )?;
        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self.consume(&TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer = if self.match_tokens(&[TokenType::EQUAL]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            &TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ─── statements ──────────────────────────────────────────────────────

    fn statement(&mut self) -> StmtResult {
        if self.match_tokens(&[TokenType::FOR]) {
            self.for_statement()
        } else if self.match_tokens(&[TokenType::IF]) {
            self.if_statement()
        } else if self.match_tokens(&[TokenType::PRINT]) {
            self.print_statement()
        } else if self.match_tokens(&[TokenType::RETURN]) {
            self.return_statement()
        } else if self.match_tokens(&[TokenType::WHILE]) {
            self.while_statement()
        } else if self.match_tokens(&[TokenType::LEFT_BRACE]) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// `for` is lowered here to `Block`/`While`; it never reaches the
    /// resolver or the interpreter.
    fn for_statement(&mut self) -> StmtResult {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer = if self.match_tokens(&[TokenType::SEMICOLON]) {
            None
        } else if self.match_tokens(&[TokenType::VAR]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment = if !self.check(&TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal(Literal::Bool(true)));
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);

        // `else` binds to the nearest unmatched `if`
        let else_branch = if self.match_tokens(&[TokenType::ELSE]) {
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

    fn print_statement(&mut self) -> StmtResult {
        let value = self.expression()?;
        self.consume(&TokenType::SEMICOLON, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();

        let value = if !self.check(&TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(&TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(&TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;
        self.consume(&TokenType::SEMICOLON, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut statements = Vec::new();

        while !self.check(&TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(&TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─── expressions ─────────────────────────────────────────────────────

    fn expression(&mut self) -> ExprResult {
        self.comma()
    }

    fn comma(&mut self) -> ExprResult {
        let mut expr = self.ternary()?;

        while self.match_tokens(&[TokenType::COMMA]) {
            let operator = self.previous().clone();
            let right = self.ternary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn ternary(&mut self) -> ExprResult {
        let expr = self.assignment()?;
        self.finish_ternary(expr)
    }

    /// `A ? B : C ? D : E` re-nests to `Ternary(A, B, Ternary(C, D, E))`:
    /// each subsequent `?:` attaches under the alternative of the previous
    /// one, to arbitrary depth.
    fn finish_ternary(&mut self, condition: Expr) -> ExprResult {
        if !self.match_tokens(&[TokenType::QUESTION]) {
            return Ok(condition);
        }

        let then_branch = self.assignment()?;
        self.consume(
            &TokenType::COLON,
            "Expect ':' after then branch of ternary expression.",
        )?;
        let alternative = self.assignment()?;
        let else_branch = self.finish_ternary(alternative)?;

        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn assignment(&mut self) -> ExprResult {
        let expr = self.or()?;

        if self.match_tokens(&[TokenType::EQUAL]) {
            let equals = self.previous().clone();
            let value = Box::new(self.assignment()?);

            return Ok(match expr {
                Expr::Variable { name, .. } => Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value,
                },

                Expr::Get { object, name } => Expr::Set {
                    object,
                    name,
                    value,
                },

                // not fatal: keep parsing with the left-hand side
                other => {
                    self.diagnostics
                        .push(LoxError::parse(&equals, "Invalid assignment target."));
                    other
                }
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> ExprResult {
        let mut expr = self.and()?;

        while self.match_tokens(&[TokenType::OR]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn and(&mut self) -> ExprResult {
        let mut expr = self.equality()?;

        while self.match_tokens(&[TokenType::AND]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;

        while self.match_tokens(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;

        while self.match_tokens(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;

        while self.match_tokens(&[TokenType::MINUS, TokenType::PLUS]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;

        while self.match_tokens(&[TokenType::SLASH, TokenType::STAR]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if self.match_tokens(&[TokenType::BANG, TokenType::MINUS]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> ExprResult {
        let mut expr = self.primary()?;

        loop {
            if self.match_tokens(&[TokenType::LEFT_PAREN]) {
                expr = self.finish_call(expr)?;
            } else if self.match_tokens(&[TokenType::DOT]) {
                let name =
                    self.consume(&TokenType::IDENTIFIER, "Expect property name after '.'.")?;
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

    fn finish_call(&mut self, callee: Expr) -> ExprResult {
        let mut arguments = Vec::new();

        if !self.check(&TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let at = self.peek().clone();
                    self.diagnostics
                        .push(LoxError::parse(&at, "Can't have more than 255 arguments."));
                }

                // `ternary`, not `expression`: a comma here separates
                // arguments instead of being the comma operator
                arguments.push(self.ternary()?);

                if !self.match_tokens(&[TokenType::COMMA]) {
                    break;
                }
            }
        }

        let paren = self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ExprResult {
        if self.match_tokens(&[TokenType::FALSE]) {
            return Ok(Expr::Literal(Literal::Bool(false)));
        }

        if self.match_tokens(&[TokenType::TRUE]) {
            return Ok(Expr::Literal(Literal::Bool(true)));
        }

        if self.match_tokens(&[TokenType::NIL]) {
            return Ok(Expr::Literal(Literal::Nil));
        }

        if self.match_tokens(&[TokenType::NUMBER(0.0), TokenType::STRING(String::new())]) {
            return Ok(match &self.previous().token_type {
                TokenType::NUMBER(n) => Expr::Literal(Literal::Number(*n)),
                TokenType::STRING(s) => Expr::Literal(Literal::Str(s.clone())),
                _ => unreachable!("literal token changed kind between match and read"),
            });
        }

        if self.match_tokens(&[TokenType::THIS]) {
            return Ok(Expr::This {
                id: ExprId::fresh(),
                keyword: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::IDENTIFIER]) {
            return Ok(Expr::Variable {
                id: ExprId::fresh(),
                name: self.previous().clone(),
            });
        }

        if self.match_tokens(&[TokenType::LEFT_PAREN]) {
            let expr = self.expression()?;
            self.consume(&TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "Expect expression."))
    }

    // ─── recovery and cursor helpers ─────────────────────────────────────

    /// Discard tokens until just past a `;` or just before a token that
    /// can begin a declaration, then resume parsing.
    fn synchronize(&mut self) {
        debug!("synchronizing at line {}", self.peek().line);

        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
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

                _ => {
                    self.advance();
                }
            }
        }
    }

    fn match_tokens(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn consume<S: Into<String>>(
        &mut self,
        token_type: &TokenType,
        message: S,
    ) -> Result<Token, LoxError> {
        if self.check(token_type) {
            return Ok(self.advance().clone());
        }

        Err(LoxError::parse(self.peek(), message))
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }
}
