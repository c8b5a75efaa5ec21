//! Recursive descent parser.
//!
//! The grammar is a left-to-right postfix chain:
//!
//! ```text
//! chain := atom postfix*
//! atom  := IDENT | '(' chain ')'
//! ```
//!
//! Each postfix operator wraps the chain so far as its left operand, which
//! is what lets `E ? salary > 50000 # [name salary] $ salary-` parse without
//! precedence machinery.
//!
//! Two entry points resolve the algebra's context-sensitive symbols: the
//! chain parser, where `*` is natural join and `/` is summarize, and the
//! computation parser used for extend right-hand sides, where they are
//! multiply and divide with ordinary arithmetic precedence.

use crate::error::{Error, Result};
use crate::parsing::ast::{
    AggregateCall, AggregateFunc, AttrPath, BinaryOp, CompareOp, Condition, Expr, NamedAggregate,
    RelExpr, SortKey,
};
use crate::parsing::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser over a token stream ending with `Eof`.
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Parse the whole stream as one relational chain.
    pub fn parse(mut self) -> Result<RelExpr> {
        let chain = self.parse_chain()?;
        if self.peek(0).kind != TokenKind::Eof {
            return Err(self.unexpected("end of input"));
        }
        Ok(chain)
    }

    // --- Token navigation ---

    fn peek(&self, offset: usize) -> &Token {
        let pos = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[pos]
    }

    fn kind(&self, offset: usize) -> &TokenKind {
        &self.peek(offset).kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn err_at(&self, token: &Token, message: String) -> Error {
        Error::Parse {
            message,
            line: token.line,
            column: token.column,
        }
    }

    /// "expected X, found Y" at the current token, or "unexpected end of
    /// input" when the stream ran out.
    fn unexpected(&self, expected: &str) -> Error {
        let token = self.peek(0);
        let message = if token.kind == TokenKind::Eof {
            format!("unexpected end of input, expected {}", expected)
        } else {
            format!("expected {}, found '{}'", expected, token.kind)
        };
        self.err_at(token, message)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.peek(0).kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match self.kind(0) {
            TokenKind::Ident(_) => match self.advance().kind {
                TokenKind::Ident(name) => Ok(name),
                _ => unreachable!(),
            },
            _ => Err(self.unexpected(expected)),
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek(0).kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    // --- Chains ---

    fn parse_chain(&mut self) -> Result<RelExpr> {
        let atom = self.parse_atom()?;
        self.parse_postfix_chain(atom)
    }

    fn parse_atom(&mut self) -> Result<RelExpr> {
        match self.kind(0) {
            TokenKind::Ident(_) => {
                let name = self.expect_ident("a relation name")?;
                Ok(RelExpr::Name(name))
            }
            TokenKind::LParen => {
                self.advance();
                let chain = self.parse_chain()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(chain)
            }
            _ => Err(self.unexpected("a relation name or '('")),
        }
    }

    fn parse_postfix_chain(&mut self, mut left: RelExpr) -> Result<RelExpr> {
        loop {
            left = match self.kind(0) {
                TokenKind::Question => self.parse_filter(left, false)?,
                TokenKind::QuestionBang => self.parse_filter(left, true)?,
                TokenKind::Hash => self.parse_project(left, false)?,
                TokenKind::HashBang => self.parse_project(left, true)?,
                TokenKind::Star => self.parse_join(left)?,
                TokenKind::StarColon => self.parse_nest_join(left)?,
                TokenKind::LtColon => self.parse_unnest(left)?,
                TokenKind::Plus => self.parse_extend(left)?,
                TokenKind::At => self.parse_rename(left)?,
                TokenKind::Pipe | TokenKind::Minus | TokenKind::Ampersand => {
                    self.parse_set_op(left)?
                }
                TokenKind::Slash => self.parse_summarize(left)?,
                TokenKind::SlashDot => self.parse_summarize_all(left)?,
                TokenKind::SlashColon => self.parse_nest_by(left)?,
                TokenKind::Dollar => self.parse_sort(left)?,
                TokenKind::Caret => self.parse_take(left)?,
                TokenKind::Tilde
                | TokenKind::BangTilde
                | TokenKind::ColonColon
                | TokenKind::PipeEq
                | TokenKind::MinusEq
                | TokenKind::QuestionEq
                | TokenKind::PlusColon
                | TokenKind::ColonEq => {
                    let token = self.peek(0).clone();
                    return Err(self.err_at(
                        &token,
                        format!("operator '{}' is not supported here", token.kind),
                    ));
                }
                _ => return Ok(left),
            };
        }
    }

    // --- Postfix operators ---

    fn parse_filter(&mut self, source: RelExpr, negated: bool) -> Result<RelExpr> {
        self.advance();
        let condition = self.parse_condition()?;
        Ok(RelExpr::Filter {
            source: Box::new(source),
            condition,
            negated,
        })
    }

    fn parse_project(&mut self, source: RelExpr, remove: bool) -> Result<RelExpr> {
        self.advance();
        let attrs = self.parse_attr_list()?;
        let source = Box::new(source);
        Ok(if remove {
            RelExpr::Remove { source, attrs }
        } else {
            RelExpr::Project { source, attrs }
        })
    }

    fn parse_join(&mut self, left: RelExpr) -> Result<RelExpr> {
        self.advance();
        let right = self.expect_ident("a relation name after '*'")?;
        Ok(RelExpr::Join {
            left: Box::new(left),
            right: Box::new(RelExpr::Name(right)),
        })
    }

    fn parse_nest_join(&mut self, left: RelExpr) -> Result<RelExpr> {
        self.advance();
        let right = self.expect_ident("a relation name after '*:'")?;
        self.expect(TokenKind::Gt, "'>' naming the nested attribute")?;
        let alias = self.expect_ident("a nest attribute name")?;
        Ok(RelExpr::NestJoin {
            left: Box::new(left),
            right: Box::new(RelExpr::Name(right)),
            alias,
        })
    }

    fn parse_unnest(&mut self, source: RelExpr) -> Result<RelExpr> {
        self.advance();
        let alias = self.expect_ident("the attribute to unnest")?;
        Ok(RelExpr::Unnest {
            source: Box::new(source),
            alias,
        })
    }

    fn parse_extend(&mut self, source: RelExpr) -> Result<RelExpr> {
        self.advance();
        let computations = if self.eat(TokenKind::LBracket) {
            let mut list = Vec::new();
            while self.kind(0) != &TokenKind::RBracket {
                list.push(self.parse_named_computation()?);
            }
            self.expect(TokenKind::RBracket, "']'")?;
            list
        } else {
            vec![self.parse_named_computation()?]
        };
        Ok(RelExpr::Extend {
            source: Box::new(source),
            computations,
        })
    }

    fn parse_named_computation(&mut self) -> Result<(String, Expr)> {
        let name = self.expect_ident("a computed attribute name")?;
        self.expect(TokenKind::Colon, "':' after the attribute name")?;
        let expr = self.parse_computation_expr()?;
        Ok((name, expr))
    }

    fn parse_rename(&mut self, source: RelExpr) -> Result<RelExpr> {
        self.advance();
        let mappings = if self.eat(TokenKind::LBracket) {
            let mut list = Vec::new();
            while self.kind(0) != &TokenKind::RBracket {
                list.push(self.parse_rename_pair()?);
            }
            self.expect(TokenKind::RBracket, "']'")?;
            list
        } else {
            vec![self.parse_rename_pair()?]
        };
        Ok(RelExpr::Rename {
            source: Box::new(source),
            mappings,
        })
    }

    fn parse_rename_pair(&mut self) -> Result<(String, String)> {
        let old = self.expect_ident("an attribute to rename")?;
        self.expect(TokenKind::Gt, "'>' between old and new names")?;
        let new = self.expect_ident("the new attribute name")?;
        Ok((old, new))
    }

    /// Union, difference, intersect. The right operand is a bare relation
    /// name or a parenthesized chain, nothing else.
    fn parse_set_op(&mut self, left: RelExpr) -> Result<RelExpr> {
        let op = self.advance();
        let right = match self.kind(0) {
            TokenKind::Ident(_) => RelExpr::Name(self.expect_ident("a relation name")?),
            TokenKind::LParen => {
                self.advance();
                let chain = self.parse_chain()?;
                self.expect(TokenKind::RParen, "')'")?;
                chain
            }
            _ => {
                return Err(self.err_at(
                    &op,
                    format!(
                        "right operand of '{}' must be a relation name or a parenthesized chain",
                        op.kind
                    ),
                ));
            }
        };
        let (left, right) = (Box::new(left), Box::new(right));
        Ok(match op.kind {
            TokenKind::Pipe => RelExpr::Union { left, right },
            TokenKind::Minus => RelExpr::Difference { left, right },
            TokenKind::Ampersand => RelExpr::Intersect { left, right },
            _ => unreachable!(),
        })
    }

    fn parse_summarize(&mut self, source: RelExpr) -> Result<RelExpr> {
        self.advance();
        let keys = self.parse_attr_list()?;
        let aggregates = self.parse_aggregate_list()?;
        Ok(RelExpr::Summarize {
            source: Box::new(source),
            keys,
            aggregates,
        })
    }

    fn parse_summarize_all(&mut self, source: RelExpr) -> Result<RelExpr> {
        self.advance();
        let aggregates = self.parse_aggregate_list()?;
        Ok(RelExpr::SummarizeAll {
            source: Box::new(source),
            aggregates,
        })
    }

    fn parse_nest_by(&mut self, source: RelExpr) -> Result<RelExpr> {
        self.advance();
        let keys = self.parse_attr_list()?;
        self.expect(TokenKind::Gt, "'>' naming the nested attribute")?;
        let alias = self.expect_ident("a nest attribute name")?;
        Ok(RelExpr::NestBy {
            source: Box::new(source),
            keys,
            alias,
        })
    }

    fn parse_sort(&mut self, source: RelExpr) -> Result<RelExpr> {
        self.advance();
        let keys = if self.eat(TokenKind::LBracket) {
            let mut list = Vec::new();
            while self.kind(0) != &TokenKind::RBracket {
                list.push(self.parse_sort_key()?);
            }
            self.expect(TokenKind::RBracket, "']'")?;
            list
        } else {
            vec![self.parse_sort_key()?]
        };
        Ok(RelExpr::Sort {
            source: Box::new(source),
            keys,
        })
    }

    fn parse_sort_key(&mut self) -> Result<SortKey> {
        let attr = self.expect_ident("a sort key")?;
        let descending = self.eat(TokenKind::Minus);
        Ok(SortKey { attr, descending })
    }

    /// `^ N`. Take consumes ordered tuples, so the chain to its left must
    /// end in a sort.
    fn parse_take(&mut self, source: RelExpr) -> Result<RelExpr> {
        let caret = self.advance();
        if !matches!(source, RelExpr::Sort { .. }) {
            return Err(self.err_at(
                &caret,
                "'^' requires ordered input: sort with '$' immediately before it".into(),
            ));
        }
        let token = self.peek(0).clone();
        let count = match token.kind {
            TokenKind::Integer(n) if n >= 0 => {
                self.advance();
                n as usize
            }
            _ => return Err(self.unexpected("a non-negative tuple count")),
        };
        Ok(RelExpr::Take {
            source: Box::new(source),
            count,
        })
    }

    /// A single attribute or a bracketed, whitespace-separated list.
    fn parse_attr_list(&mut self) -> Result<Vec<String>> {
        if self.eat(TokenKind::LBracket) {
            let mut attrs = Vec::new();
            while self.kind(0) != &TokenKind::RBracket {
                attrs.push(self.expect_ident("an attribute name")?);
            }
            self.expect(TokenKind::RBracket, "']'")?;
            Ok(attrs)
        } else {
            Ok(vec![self.expect_ident("an attribute name or '['")?])
        }
    }

    // --- Conditions ---

    fn parse_condition(&mut self) -> Result<Condition> {
        if self.eat(TokenKind::LParen) {
            let condition = self.parse_bool_expr()?;
            self.expect(TokenKind::RParen, "')'")?;
            Ok(condition)
        } else {
            self.parse_comparison()
        }
    }

    fn parse_bool_expr(&mut self) -> Result<Condition> {
        let mut left = self.parse_comparison()?;
        loop {
            let and = match self.kind(0) {
                TokenKind::Ampersand => true,
                TokenKind::Pipe => false,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = if and {
                Condition::And(Box::new(left), Box::new(right))
            } else {
                Condition::Or(Box::new(left), Box::new(right))
            };
        }
    }

    fn parse_comparison(&mut self) -> Result<Condition> {
        let left = if aggregate_func(self.kind(0)).is_some() {
            Expr::Aggregate(self.parse_aggregate_call()?)
        } else {
            Expr::Attribute(self.parse_attr_path()?)
        };
        let op = match self.kind(0) {
            TokenKind::Eq => CompareOp::Equal,
            TokenKind::BangEq => CompareOp::NotEqual,
            TokenKind::Lt => CompareOp::LessThan,
            TokenKind::LtEq => CompareOp::LessThanOrEqual,
            TokenKind::Gt => CompareOp::GreaterThan,
            TokenKind::GtEq => CompareOp::GreaterThanOrEqual,
            _ => return Err(self.unexpected("a comparison operator")),
        };
        self.advance();
        let right = self.parse_value_expr()?;
        Ok(Condition::Compare { left, op, right })
    }

    fn parse_attr_path(&mut self) -> Result<AttrPath> {
        let mut parts = vec![self.expect_ident("an attribute name")?];
        while self.kind(0) == &TokenKind::Dot && matches!(self.kind(1), TokenKind::Ident(_)) {
            self.advance();
            parts.push(self.expect_ident("an attribute name")?);
        }
        Ok(AttrPath(parts))
    }

    /// The right-hand side of a comparison: a literal, a set literal, a
    /// parenthesized chain (membership subquery), or an attribute reference.
    fn parse_value_expr(&mut self) -> Result<Expr> {
        match self.kind(0).clone() {
            TokenKind::Integer(i) => {
                self.advance();
                Ok(Expr::Integer(i))
            }
            TokenKind::Decimal(d) => {
                self.advance();
                Ok(Expr::Decimal(d))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expr::Boolean(b))
            }
            TokenKind::LBrace => self.parse_set_literal(),
            TokenKind::LParen => {
                self.advance();
                let chain = self.parse_chain()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Subquery(Box::new(chain)))
            }
            TokenKind::Ident(_) => Ok(Expr::Attribute(self.parse_attr_path()?)),
            _ => Err(self.unexpected("a value")),
        }
    }

    fn parse_set_literal(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut elements = Vec::new();
        while self.kind(0) != &TokenKind::RBrace {
            elements.push(self.parse_value_expr()?);
            self.eat(TokenKind::Comma);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::Set(elements))
    }

    // --- Aggregates ---

    /// `name: #.`, `total: +. salary`, `top: >. team.salary`,
    /// `n: #. (team ? ...)`.
    fn parse_named_aggregate(&mut self) -> Result<NamedAggregate> {
        let name = self.expect_ident("an aggregate name")?;
        self.expect(TokenKind::Colon, "':' after the aggregate name")?;
        let call = self.parse_aggregate_call()?;
        Ok(NamedAggregate { name, call })
    }

    fn parse_aggregate_list(&mut self) -> Result<Vec<NamedAggregate>> {
        self.expect(TokenKind::LBracket, "'[' opening the aggregate list")?;
        let mut aggregates = Vec::new();
        while self.kind(0) != &TokenKind::RBracket {
            aggregates.push(self.parse_named_aggregate()?);
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(aggregates)
    }

    fn parse_aggregate_call(&mut self) -> Result<AggregateCall> {
        let token = self.peek(0).clone();
        let Some(func) = aggregate_func(&token.kind) else {
            return Err(self.unexpected("an aggregate ('#.', '+.', '>.', '<.', '%.')"));
        };
        self.advance();

        let mut attr = None;
        let mut source = None;
        match self.kind(0) {
            // Parenthesized source: a chain evaluated in tuple context.
            TokenKind::LParen => {
                self.advance();
                let chain = self.parse_chain()?;
                self.expect(TokenKind::RParen, "')'")?;
                source = Some(Box::new(chain));
            }
            TokenKind::Ident(_) => {
                // `team.salary` splits into a source relation and an inner
                // attribute. An identifier before ':' belongs to the next
                // named aggregate, not to this one.
                if self.kind(1) == &TokenKind::Dot && matches!(self.kind(2), TokenKind::Ident(_)) {
                    let rel = self.expect_ident("a relation-valued attribute")?;
                    self.advance();
                    attr = Some(self.expect_ident("an attribute name")?);
                    source = Some(Box::new(RelExpr::Name(rel)));
                } else if self.kind(1) != &TokenKind::Colon {
                    let name = self.expect_ident("an attribute name")?;
                    if func == AggregateFunc::Count {
                        // Count folds whole tuples; a bare name is the
                        // relation to count, not an attribute.
                        source = Some(Box::new(RelExpr::Name(name)));
                    } else {
                        attr = Some(name);
                    }
                }
            }
            _ => {}
        }
        Ok(AggregateCall { func, attr, source })
    }

    // --- Computation expressions (extend right-hand sides) ---

    /// In this context `*` multiplies and `/` divides; additive binds looser
    /// than multiplicative, both left-associative.
    fn parse_computation_expr(&mut self) -> Result<Expr> {
        if self.kind(0) == &TokenKind::Question {
            return self.parse_ternary();
        }
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind(0) {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_computation_atom()?;
        loop {
            let op = match self.kind(0) {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_computation_atom()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_computation_atom(&mut self) -> Result<Expr> {
        match self.kind(0).clone() {
            TokenKind::Integer(i) => {
                self.advance();
                Ok(Expr::Integer(i))
            }
            TokenKind::Decimal(d) => {
                self.advance();
                Ok(Expr::Decimal(d))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expr::Boolean(b))
            }
            kind if aggregate_func(&kind).is_some() => {
                Ok(Expr::Aggregate(self.parse_aggregate_call()?))
            }
            TokenKind::Ident(_) => {
                // An identifier followed by '(' is a function call;
                // otherwise an attribute reference.
                if self.kind(1) == &TokenKind::LParen {
                    self.parse_function_call()
                } else {
                    Ok(Expr::Attribute(self.parse_attr_path()?))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_computation_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("a value, attribute, aggregate, or '('")),
        }
    }

    fn parse_function_call(&mut self) -> Result<Expr> {
        let name = self.expect_ident("a function name")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.kind(0) != &TokenKind::RParen {
            loop {
                args.push(self.parse_computation_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::Call { name, args })
    }

    /// `? cond then else`. Branches accept atoms, aggregate calls, and
    /// nested ternaries; bare binary arithmetic must be parenthesized so a
    /// branch can never capture an operator meant for the chain.
    fn parse_ternary(&mut self) -> Result<Expr> {
        self.expect(TokenKind::Question, "'?'")?;
        let condition = self.parse_condition()?;
        let if_true = self.parse_ternary_branch()?;
        self.reject_branch_arithmetic(true)?;
        let if_false = self.parse_ternary_branch()?;
        self.reject_branch_arithmetic(false)?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    fn parse_ternary_branch(&mut self) -> Result<Expr> {
        match self.kind(0) {
            TokenKind::Question => self.parse_ternary(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_computation_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            kind if aggregate_func(kind).is_some() => {
                Ok(Expr::Aggregate(self.parse_aggregate_call()?))
            }
            _ => self.parse_computation_atom_simple(),
        }
    }

    /// A branch atom: literal, attribute, or function call — no operators.
    fn parse_computation_atom_simple(&mut self) -> Result<Expr> {
        match self.kind(0).clone() {
            TokenKind::Integer(i) => {
                self.advance();
                Ok(Expr::Integer(i))
            }
            TokenKind::Decimal(d) => {
                self.advance();
                Ok(Expr::Decimal(d))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expr::Boolean(b))
            }
            TokenKind::Ident(_) => {
                if self.kind(1) == &TokenKind::LParen {
                    self.parse_function_call()
                } else {
                    Ok(Expr::Attribute(self.parse_attr_path()?))
                }
            }
            _ => Err(self.unexpected("a ternary branch value")),
        }
    }

    fn reject_branch_arithmetic(&self, before_else: bool) -> Result<()> {
        let offending = match self.kind(0) {
            TokenKind::Star | TokenKind::Slash => true,
            // Between the branches nothing but the else-branch may follow,
            // so additive operators are also unambiguous errors there.
            TokenKind::Plus | TokenKind::Minus => before_else,
            _ => false,
        };
        if offending {
            Err(self.unexpected(
                "a ternary branch (binary arithmetic in a branch must be parenthesized)",
            ))
        } else {
            Ok(())
        }
    }
}

fn aggregate_func(kind: &TokenKind) -> Option<AggregateFunc> {
    match kind {
        TokenKind::HashDot => Some(AggregateFunc::Count),
        TokenKind::PlusDot => Some(AggregateFunc::Sum),
        TokenKind::GtDot => Some(AggregateFunc::Max),
        TokenKind::LtDot => Some(AggregateFunc::Min),
        TokenKind::PercentDot => Some(AggregateFunc::Mean),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::lexer::Lexer;

    fn parse(source: &str) -> Result<RelExpr> {
        Parser::new(Lexer::new(source).tokenize()?).parse()
    }

    #[test]
    fn chains_nest_left_to_right() {
        let ast = parse("E ? salary > 50000 # [name salary]").unwrap();
        match ast {
            RelExpr::Project { source, attrs } => {
                assert_eq!(attrs, vec!["name".to_string(), "salary".to_string()]);
                assert!(matches!(*source, RelExpr::Filter { negated: false, .. }));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn bracket_elision_for_single_items() {
        let single = parse("E # name").unwrap();
        match single {
            RelExpr::Project { attrs, .. } => assert_eq!(attrs, vec!["name".to_string()]),
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn star_is_join_in_chains_and_multiply_in_extend() {
        let joined = parse("E * D").unwrap();
        assert!(matches!(joined, RelExpr::Join { .. }));

        let extended = parse("E + double: salary * 2").unwrap();
        match extended {
            RelExpr::Extend { computations, .. } => match &computations[0].1 {
                Expr::Binary {
                    op: BinaryOp::Multiply,
                    ..
                } => {}
                other => panic!("unexpected expr: {:?}", other),
            },
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn arithmetic_precedence_in_extend() {
        let ast = parse("E + x: a + b * c").unwrap();
        match ast {
            RelExpr::Extend { computations, .. } => match &computations[0].1 {
                Expr::Binary {
                    op: BinaryOp::Add,
                    right,
                    ..
                } => assert!(matches!(
                    **right,
                    Expr::Binary {
                        op: BinaryOp::Multiply,
                        ..
                    }
                )),
                other => panic!("unexpected expr: {:?}", other),
            },
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn function_call_versus_attribute() {
        let ast = parse("E + [k: round(salary / 1000, 1) plain: salary]").unwrap();
        match ast {
            RelExpr::Extend { computations, .. } => {
                assert!(matches!(&computations[0].1, Expr::Call { name, args }
                    if name == "round" && args.len() == 2));
                assert!(matches!(&computations[1].1, Expr::Attribute(_)));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn ternary_branches_reject_bare_arithmetic() {
        assert!(parse("E + x: ? salary > 1 salary / 2 0").is_err());
        // Parenthesized arithmetic is fine.
        assert!(parse("E + x: ? salary > 1 (salary / 2) 0").is_ok());
    }

    #[test]
    fn set_op_right_operand_shapes() {
        assert!(parse("E # emp_id - (Phone # emp_id)").is_ok());
        assert!(parse("E - Phone").is_ok());
        assert!(parse("E - 5").is_err());
    }

    #[test]
    fn join_right_operand_must_be_a_name() {
        assert!(parse("E * (D ? dept_id = 10)").is_err());
    }

    #[test]
    fn nest_join_requires_an_alias() {
        let ast = parse("E *: Phone > phones").unwrap();
        assert!(matches!(ast, RelExpr::NestJoin { alias, .. } if alias == "phones"));
        assert!(parse("E *: Phone").is_err());
    }

    #[test]
    fn summarize_parses_keys_and_aggregates() {
        let ast = parse("E / dept_id [n: #. avg: %. salary]").unwrap();
        match ast {
            RelExpr::Summarize {
                keys, aggregates, ..
            } => {
                assert_eq!(keys, vec!["dept_id".to_string()]);
                assert_eq!(aggregates.len(), 2);
                assert_eq!(aggregates[0].name, "n");
                assert_eq!(aggregates[0].call.func, AggregateFunc::Count);
                assert_eq!(aggregates[0].call.attr, None);
                assert_eq!(aggregates[1].call.func, AggregateFunc::Mean);
                assert_eq!(aggregates[1].call.attr, Some("salary".to_string()));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn dotted_aggregate_argument_splits_source_and_attr() {
        let ast = parse("E /: dept_id > team + top: >. team.salary").unwrap();
        match ast {
            RelExpr::Extend { computations, .. } => match &computations[0].1 {
                Expr::Aggregate(call) => {
                    assert_eq!(call.attr, Some("salary".to_string()));
                    assert!(matches!(
                        call.source.as_deref(),
                        Some(RelExpr::Name(n)) if n == "team"
                    ));
                }
                other => panic!("unexpected expr: {:?}", other),
            },
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn sort_keys_take_descending_suffix() {
        let ast = parse("E $ [dept_id salary-]").unwrap();
        match ast {
            RelExpr::Sort { keys, .. } => {
                assert!(!keys[0].descending);
                assert!(keys[1].descending);
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn take_requires_a_preceding_sort() {
        assert!(parse("E $ salary- ^ 3").is_ok());
        assert!(parse("(E $ salary-) ^ 3").is_ok());
        let err = parse("E ^ 3").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn filter_conditions_combine_in_parentheses() {
        let ast = parse(r#"E ? (dept_id = 10 & salary > 70000 | role = "manager")"#).unwrap();
        match ast {
            RelExpr::Filter { condition, .. } => {
                assert!(matches!(condition, Condition::Or(_, _)));
            }
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn filter_rhs_shapes() {
        assert!(parse("E ? dept_id = {10, 20}").is_ok());
        assert!(parse("E ? emp_id = (Phone # emp_id)").is_ok());
        assert!(parse("E ? salary > min_wage").is_ok());
    }

    #[test]
    fn aggregate_comparison_on_the_left() {
        let ast = parse("E *: Phone > phones ? #. phones > 1").unwrap();
        match ast {
            RelExpr::Filter { condition, .. } => match condition {
                Condition::Compare { left, .. } => {
                    assert!(matches!(left, Expr::Aggregate(_)));
                }
                other => panic!("unexpected condition: {:?}", other),
            },
            other => panic!("unexpected ast: {:?}", other),
        }
    }

    #[test]
    fn reserved_operators_are_rejected() {
        assert!(parse("E ~ x").is_err());
        assert!(parse("E |= Phone").is_err());
        assert!(parse("E ?= x").is_err());
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        let err = parse("E # name )").unwrap_err();
        match err {
            Error::Parse { message, .. } => assert!(message.contains("expected end of input")),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn unexpected_end_is_reported() {
        let err = parse("E ?").unwrap_err();
        match err {
            Error::Parse { message, .. } => {
                assert!(message.contains("unexpected end of input"));
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }
}
