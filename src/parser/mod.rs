pub mod ast;

use crate::diagnostics::CompileError;
use crate::lexer::token::Token;
use crate::span::{Span, Spanned};
use ast::*;

/// Implicit superclass of classes declared without `extends`.
pub const ROOT_CLASS: &str = "Obj";

pub struct Parser<'a> {
    tokens: &'a [Spanned<Token>],
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Spanned<Token>], source: &'a str) -> Self {
        Self { tokens, source, pos: 0 }
    }

    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, expected: &Token) -> bool {
        self.peek()
            .is_some_and(|tok| std::mem::discriminant(&tok.node) == std::mem::discriminant(expected))
    }

    fn advance(&mut self) -> Option<&Spanned<Token>> {
        if self.pos < self.tokens.len() {
            let tok = &self.tokens[self.pos];
            self.pos += 1;
            Some(tok)
        } else {
            None
        }
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek_is(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if std::mem::discriminant(&tok.node) == std::mem::discriminant(expected) => {
                self.pos += 1;
                Ok(tok.span)
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected {expected}, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                format!("expected {expected}, found end of file"),
                self.eof_span(),
            )),
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>, CompileError> {
        match self.tokens.get(self.pos) {
            Some(tok) if matches!(tok.node, Token::Ident) => {
                let name = self.source[tok.span.start..tok.span.end].to_string();
                self.pos += 1;
                Ok(Spanned::new(name, tok.span))
            }
            Some(tok) => Err(CompileError::syntax(
                format!("expected identifier, found {}", tok.node),
                tok.span,
            )),
            None => Err(CompileError::syntax(
                "expected identifier, found end of file",
                self.eof_span(),
            )),
        }
    }

    fn eof_span(&self) -> Span {
        if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::dummy()
        }
    }

    /// Span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            Span::dummy()
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_else(|| self.eof_span())
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut classes = Vec::new();
        while self.peek_is(&Token::Class) {
            classes.push(self.parse_class()?);
        }

        let start = self.current_span();
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            if self.peek_is(&Token::Class) {
                return Err(CompileError::syntax(
                    "class declarations must precede top-level statements",
                    self.current_span(),
                ));
            }
            stmts.push(self.parse_statement()?);
        }
        let span = if stmts.is_empty() { start } else { start.to(self.prev_span()) };

        Ok(Program { classes, statements: Spanned::new(Block { stmts }, span) })
    }

    fn parse_class(&mut self) -> Result<Spanned<ClassDecl>, CompileError> {
        let start = self.expect(&Token::Class)?;
        let name = self.expect_ident()?;
        let params = self.parse_formals()?;
        let header_end = self.prev_span();

        let superclass = if self.eat(&Token::Extends) {
            self.expect_ident()?
        } else {
            Spanned::dummy(ROOT_CLASS.to_string())
        };

        let body_start = self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        let mut methods = Vec::new();
        loop {
            match self.peek().map(|t| &t.node) {
                Some(Token::RBrace) => break,
                Some(Token::Def) => methods.push(self.parse_method()?),
                Some(_) if methods.is_empty() => stmts.push(self.parse_statement()?),
                Some(_) => {
                    return Err(CompileError::syntax(
                        format!("statements in class '{}' must precede its methods", name.node),
                        self.current_span(),
                    ));
                }
                None => {
                    return Err(CompileError::syntax(
                        format!("unterminated body of class '{}'", name.node),
                        self.eof_span(),
                    ));
                }
            }
        }
        let end = self.expect(&Token::RBrace)?;

        let body_span = stmts.last()
            .map(|s: &Spanned<Stmt>| body_start.to(s.span))
            .unwrap_or(body_start);
        let constructor = MethodDecl {
            name: name.clone(),
            params,
            return_type: Some(name.clone()),
            body: Spanned::new(Block { stmts }, body_span),
        };

        Ok(Spanned::new(
            ClassDecl {
                name,
                superclass,
                constructor: Spanned::new(constructor, start.to(header_end)),
                methods,
            },
            start.to(end),
        ))
    }

    fn parse_method(&mut self) -> Result<Spanned<MethodDecl>, CompileError> {
        let start = self.expect(&Token::Def)?;
        let name = self.expect_ident()?;
        let params = self.parse_formals()?;
        let return_type = if self.eat(&Token::Colon) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(Spanned::new(MethodDecl { name, params, return_type, body }, span))
    }

    fn parse_formals(&mut self) -> Result<Vec<Param>, CompileError> {
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.peek_is(&Token::RParen) {
            loop {
                let name = self.expect_ident()?;
                self.expect(&Token::Colon)?;
                let ty = self.expect_ident()?;
                if params.iter().any(|p: &Param| p.name.node == name.node) {
                    return Err(CompileError::syntax(
                        format!("duplicate parameter '{}'", name.node),
                        name.span,
                    ));
                }
                params.push(Param { name, ty });
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(params)
    }

    fn parse_block(&mut self) -> Result<Spanned<Block>, CompileError> {
        let start = self.expect(&Token::LBrace)?;
        let mut stmts = Vec::new();
        while !self.peek_is(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(CompileError::syntax("expected }, found end of file", self.eof_span()));
            }
            stmts.push(self.parse_statement()?);
        }
        let end = self.expect(&Token::RBrace)?;
        Ok(Spanned::new(Block { stmts }, start.to(end)))
    }

    fn parse_statement(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let tok = self.peek().ok_or_else(|| {
            CompileError::syntax("expected statement, found end of file", self.eof_span())
        })?;
        match tok.node {
            Token::If => self.parse_if(),
            Token::While => {
                let start = self.expect(&Token::While)?;
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                let span = start.to(body.span);
                Ok(Spanned::new(Stmt::While { cond, body }, span))
            }
            Token::Return => {
                let start = self.expect(&Token::Return)?;
                let value = if self.peek_is(&Token::Semi) { None } else { Some(self.parse_expr()?) };
                let end = self.expect(&Token::Semi)?;
                Ok(Spanned::new(Stmt::Return { value }, start.to(end)))
            }
            Token::Typecase => self.parse_typecase(),
            _ => self.parse_simple_statement(),
        }
    }

    fn parse_if(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        // `if` and `elif` share this path; the caller has peeked one of them.
        let start = self.current_span();
        self.advance();
        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_block = if self.peek_is(&Token::Elif) {
            let nested = self.parse_if()?;
            let span = nested.span;
            Spanned::new(Block { stmts: vec![nested] }, span)
        } else if self.eat(&Token::Else) {
            self.parse_block()?
        } else {
            let end = then_block.span.end;
            Spanned::new(Block::default(), Span::new(end, end))
        };
        let span = start.to(else_block.span).to(then_block.span);
        Ok(Spanned::new(Stmt::If { cond, then_block, else_block }, span))
    }

    fn parse_typecase(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let start = self.expect(&Token::Typecase)?;
        let scrutinee = self.parse_expr()?;
        self.expect(&Token::LBrace)?;
        let mut alternatives = Vec::new();
        while !self.peek_is(&Token::RBrace) {
            let ident = self.expect_ident()?;
            self.expect(&Token::Colon)?;
            let class_name = self.expect_ident()?;
            let block = self.parse_block()?;
            alternatives.push(TypeAlternative { ident, class_name, block });
        }
        let end = self.expect(&Token::RBrace)?;
        Ok(Spanned::new(Stmt::Typecase { scrutinee, alternatives }, start.to(end)))
    }

    /// Assignment, declared assignment, or expression statement.
    fn parse_simple_statement(&mut self) -> Result<Spanned<Stmt>, CompileError> {
        let expr = self.parse_expr()?;
        let start = expr.span;

        if self.eat(&Token::Colon) {
            let static_type = self.expect_ident()?;
            self.expect(&Token::Eq)?;
            let target = Self::into_lexpr(expr)?;
            let value = self.parse_expr()?;
            let end = self.expect(&Token::Semi)?;
            return Ok(Spanned::new(Stmt::AssignDeclare { target, static_type, value }, start.to(end)));
        }

        if self.eat(&Token::Eq) {
            let target = Self::into_lexpr(expr)?;
            let value = self.parse_expr()?;
            let end = self.expect(&Token::Semi)?;
            return Ok(Spanned::new(Stmt::Assign { target, value }, start.to(end)));
        }

        let end = self.expect(&Token::Semi)?;
        Ok(Spanned::new(Stmt::Expr { expr }, start.to(end)))
    }

    fn into_lexpr(expr: Spanned<Expr>) -> Result<Spanned<LExpr>, CompileError> {
        let span = expr.span;
        match expr.node {
            Expr::Ident { name } => Ok(Spanned::new(LExpr::Ident { name }, span)),
            Expr::Dot { object, field } => Ok(Spanned::new(LExpr::Field { object, field }, span)),
            _ => Err(CompileError::syntax("invalid assignment target", span)),
        }
    }

    pub fn parse_expr(&mut self) -> Result<Spanned<Expr>, CompileError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            let span = lhs.span.to(rhs.span);
            lhs = Spanned::new(Expr::Or { lhs: Box::new(lhs), rhs: Box::new(rhs) }, span);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_not()?;
            let span = lhs.span.to(rhs.span);
            lhs = Spanned::new(Expr::And { lhs: Box::new(lhs), rhs: Box::new(rhs) }, span);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.peek_is(&Token::Not) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_not()?;
            let span = start.to(operand.span);
            return Ok(Spanned::new(Expr::Not { operand: Box::new(operand) }, span));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek().map(|t| &t.node) {
                Some(Token::EqEq) => "==",
                Some(Token::Lt) => "<",
                Some(Token::LtEq) => "<=",
                Some(Token::Gt) => ">",
                Some(Token::GtEq) => ">=",
                _ => break,
            };
            lhs = self.finish_binop(op, lhs, Self::parse_additive)?;
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().map(|t| &t.node) {
                Some(Token::Plus) => "+",
                Some(Token::Minus) => "-",
                _ => break,
            };
            lhs = self.finish_binop(op, lhs, Self::parse_multiplicative)?;
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|t| &t.node) {
                Some(Token::Star) => "*",
                Some(Token::Slash) => "/",
                _ => break,
            };
            lhs = self.finish_binop(op, lhs, Self::parse_unary)?;
        }
        Ok(lhs)
    }

    fn finish_binop(
        &mut self,
        op: &str,
        lhs: Spanned<Expr>,
        operand: fn(&mut Self) -> Result<Spanned<Expr>, CompileError>,
    ) -> Result<Spanned<Expr>, CompileError> {
        let op_span = self.current_span();
        self.advance();
        let rhs = operand(self)?;
        let span = lhs.span.to(rhs.span);
        let method = operator_method(op)
            .ok_or_else(|| CompileError::syntax(format!("unknown operator '{op}'"), op_span))?;
        Ok(Spanned::new(Expr::binop(method, op_span, lhs, rhs), span))
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        if self.peek_is(&Token::Minus) {
            let op_span = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = op_span.to(operand.span);
            let zero = Spanned::new(Expr::IntConst { value: 0 }, op_span);
            return Ok(Spanned::new(Expr::binop("MINUS", op_span, zero, operand), span));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let mut expr = self.parse_primary()?;
        while self.eat(&Token::Dot) {
            let name = self.expect_ident()?;
            if self.peek_is(&Token::LParen) {
                let args = self.parse_args()?;
                let span = expr.span.to(self.prev_span());
                expr = Spanned::new(
                    Expr::Call { receiver: Box::new(expr), method: name, args },
                    span,
                );
            } else {
                let span = expr.span.to(name.span);
                expr = Spanned::new(Expr::Dot { object: Box::new(expr), field: name }, span);
            }
        }
        Ok(expr)
    }

    fn parse_args(&mut self) -> Result<Vec<Spanned<Expr>>, CompileError> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if !self.peek_is(&Token::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>, CompileError> {
        let tok = self.peek().cloned().ok_or_else(|| {
            CompileError::syntax("expected expression, found end of file", self.eof_span())
        })?;
        let span = tok.span;
        let expr = match tok.node {
            Token::IntLit(value) => {
                self.advance();
                Expr::IntConst { value }
            }
            Token::StringLit(value) => {
                self.advance();
                Expr::StrConst { value }
            }
            Token::True => {
                self.advance();
                Expr::BoolConst { value: true }
            }
            Token::False => {
                self.advance();
                Expr::BoolConst { value: false }
            }
            Token::None => {
                self.advance();
                Expr::Nothing
            }
            Token::This => {
                self.advance();
                Expr::This
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.expect(&Token::RParen)?;
                return Ok(Spanned::new(inner.node, span.to(end)));
            }
            Token::Ident => {
                let name = self.expect_ident()?;
                if self.peek_is(&Token::LParen) {
                    let args = self.parse_args()?;
                    let full = span.to(self.prev_span());
                    return Ok(Spanned::new(Expr::Construct { class: name, args }, full));
                }
                Expr::Ident { name: name.node }
            }
            ref other => {
                return Err(CompileError::syntax(
                    format!("expected expression, found {other}"),
                    span,
                ));
            }
        };
        Ok(Spanned::new(expr, span))
    }
}
