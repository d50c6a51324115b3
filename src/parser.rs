use std::rc::Rc;

use logos::Logos;

use crate::{
    ast::{AdditiveExpr, AdditiveOp, ComparisonExpr, ComparisonOp, Condition, ConditionExpr, Expr, Function, FunctionCall, IfExpr, LambdaExpr, LetExpr, Var},
    error::{BoiError, EvalResult},
    program::Declaration,
    span::Span,
    value::Value,
};


#[derive(Debug, Clone, PartialEq, Logos)]
#[logos(skip r"([ \t\r\n\f]+|#[^\n]*)")]
enum Token<'a> {
    #[token("let")]
    Let,

    #[token("in")]
    In,

    #[token("if")]
    If,

    #[token("then")]
    Then,

    #[token("else")]
    Else,

    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("=")]
    Assign,

    #[token(";")]
    Semicolon,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token(">")]
    Greater,

    #[token(">=")]
    GreaterEq,

    #[token("<")]
    Less,

    #[token("<=")]
    LessEq,

    #[token("==")]
    Equal,

    #[token("!=")]
    NotEqual,

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_']*", |lex| lex.slice())]
    Identifier(&'a str),
}

impl<'a> Token<'a> {
    fn comparison(&self) -> Option<ComparisonOp> {
        match self {
            Self::Greater => Some(ComparisonOp::Gt),
            Self::GreaterEq => Some(ComparisonOp::Gte),
            Self::Less => Some(ComparisonOp::Lt),
            Self::LessEq => Some(ComparisonOp::Lte),
            Self::Equal => Some(ComparisonOp::Eq),
            Self::NotEqual => Some(ComparisonOp::Neq),
            _ => None,
        }
    }

    fn additive(&self) -> Option<AdditiveOp> {
        match self {
            Self::Plus => Some(AdditiveOp::Add),
            Self::Minus => Some(AdditiveOp::Sub),
            _ => None,
        }
    }

    fn starts_atom(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Identifier(_) | Self::LeftParen)
    }
}

#[derive(Debug)]
struct Lexeme<'a> {
    token: Token<'a>,
    start: usize,
    end: usize,
}

type ParseResult<'t, 's, O> = EvalResult<(&'t [Lexeme<'s>], O)>;

fn lexer(source: &str) -> EvalResult<Vec<Lexeme<'_>>> {
    Token::lexer(source)
        .spanned()
        .map(|(result, range)| match result {
            Ok(token) => Ok(Lexeme { token, start: range.start, end: range.end }),
            Err(_) => Err(BoiError::syntax(
                format!("unrecognized token '{}'", &source[range.clone()]),
                Span::of(source, range.start, range.end),
            )),
        })
        .collect()
}

fn peek<'t, 's>(tokens: &'t [Lexeme<'s>]) -> Option<&'t Token<'s>> {
    tokens.first().map(|lexeme| &lexeme.token)
}

// Holds the source so node spans can slice it
struct Parser<'s> {
    source: &'s str,
}

// A `let` up to and including its value: `let name params? = value`
struct LetHeader {
    name: Var,
    params: Option<Vec<Var>>,
    value: Expr,
    span: Span,
}

impl<'s> Parser<'s> {
    fn span_between(&self, tokens: &[Lexeme<'s>], rest: &[Lexeme<'s>]) -> Span {
        let consumed = &tokens[..tokens.len() - rest.len()];
        match (consumed.first(), consumed.last()) {
            (Some(first), Some(last)) => Span::of(self.source, first.start, last.end),
            _ => Span::empty(),
        }
    }

    fn unexpected(&self, tokens: &[Lexeme<'s>], expected: &str) -> BoiError {
        match tokens.first() {
            Some(lexeme) => BoiError::syntax(
                format!("expected {}, found '{}'", expected, &self.source[lexeme.start..lexeme.end]),
                Span::of(self.source, lexeme.start, lexeme.end),
            ),
            None => BoiError::syntax(
                format!("expected {}, found end of input", expected),
                Span::of(self.source, self.source.len(), self.source.len()),
            ),
        }
    }

    fn expect<'t>(&self, tokens: &'t [Lexeme<'s>], expected: Token<'s>, description: &str) -> ParseResult<'t, 's, ()> {
        match tokens.split_first() {
            Some((lexeme, rest)) if lexeme.token == expected => Ok((rest, ())),
            _ => Err(self.unexpected(tokens, description)),
        }
    }

    fn parse_identifier<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Var> {
        match tokens.split_first() {
            Some((Lexeme { token: Token::Identifier(name), start, end }, rest)) => {
                Ok((rest, Var::new(*name, Span::of(self.source, *start, *end))))
            }
            _ => Err(self.unexpected(tokens, "an identifier")),
        }
    }

    // `()` declares no parameters, a run of identifiers declares those, and
    // anything else means the `let` binds a plain variable
    fn parse_params<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Option<Vec<Var>>> {
        if let [Lexeme { token: Token::LeftParen, .. }, Lexeme { token: Token::RightParen, .. }, rest @ ..] = tokens {
            return Ok((rest, Some(Vec::new())));
        }

        let mut params = Vec::new();
        let mut tokens = tokens;
        while let Some(Token::Identifier(_)) = peek(tokens) {
            let (rest, param) = self.parse_identifier(tokens)?;
            params.push(param);
            tokens = rest;
        }

        Ok((tokens, if params.is_empty() { None } else { Some(params) }))
    }

    fn parse_let_header<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, LetHeader> {
        let (rest, _) = self.expect(tokens, Token::Let, "'let'")?;
        let (rest, name) = self.parse_identifier(rest)?;
        let (rest, params) = self.parse_params(rest)?;
        let (rest, _) = self.expect(rest, Token::Assign, "'='")?;
        let (rest, value) = self.parse_expr(rest)?;

        let span = self.span_between(tokens, rest);
        Ok((rest, LetHeader { name, params, value, span }))
    }

    // `in body` after a header, giving a LetExpr or a LambdaExpr
    fn parse_let_body<'t>(&self, tokens: &'t [Lexeme<'s>], header: LetHeader, rest: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Expr> {
        let (rest, _) = self.expect(rest, Token::In, "'in'")?;
        let (rest, body) = self.parse_expr(rest)?;
        let span = self.span_between(tokens, rest);

        let LetHeader { name, params, value, span: header_span } = header;
        let expr = match params {
            None => Expr::Let(LetExpr { name, value: Box::new(value), body: Box::new(body), span }),
            Some(params) => Expr::Lambda(LambdaExpr {
                function: Rc::new(Function { name, params, body: value, is_lambda: true, span: header_span }),
                usage: Box::new(body),
                span,
            }),
        };
        Ok((rest, expr))
    }

    fn parse_atom<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Expr> {
        match tokens.split_first() {
            Some((Lexeme { token: Token::Number(number), start, end }, rest)) => {
                Ok((rest, Expr::Value(Value::new(*number, Span::of(self.source, *start, *end)))))
            }
            Some((Lexeme { token: Token::Identifier(_), .. }, _)) => {
                let (rest, var) = self.parse_identifier(tokens)?;
                Ok((rest, Expr::Var(var)))
            }
            Some((Lexeme { token: Token::LeftParen, .. }, rest)) => {
                let (rest, expr) = self.parse_expr(rest)?;
                let (rest, _) = self.expect(rest, Token::RightParen, "')'")?;
                Ok((rest, expr))
            }
            _ => Err(self.unexpected(tokens, "an expression")),
        }
    }

    fn parse_application<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Expr> {
        if !matches!(peek(tokens), Some(Token::Identifier(_))) {
            return self.parse_atom(tokens);
        }

        let (rest, name) = self.parse_identifier(tokens)?;
        if let [Lexeme { token: Token::LeftParen, .. }, Lexeme { token: Token::RightParen, .. }, rest @ ..] = rest {
            let span = self.span_between(tokens, rest);
            return Ok((rest, Expr::Call(FunctionCall { name, arguments: Vec::new(), span })));
        }

        let mut arguments = Vec::new();
        let mut rest = rest;
        while peek(rest).is_some_and(Token::starts_atom) {
            let (next, argument) = self.parse_atom(rest)?;
            arguments.push(argument);
            rest = next;
        }

        if arguments.is_empty() {
            return Ok((rest, Expr::Var(name)));
        }
        let span = self.span_between(tokens, rest);
        Ok((rest, Expr::Call(FunctionCall { name, arguments, span })))
    }

    fn parse_additive<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Expr> {
        let (mut rest, mut lhs) = self.parse_application(tokens)?;

        while let Some(op) = peek(rest).and_then(Token::additive) {
            let (next, rhs) = self.parse_application(&rest[1..])?;
            lhs = Expr::Additive(AdditiveExpr {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                span: self.span_between(tokens, next),
            });
            rest = next;
        }

        Ok((rest, lhs))
    }

    fn parse_condition<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Condition> {
        let (rest, lhs) = self.parse_additive(tokens)?;

        match peek(rest).and_then(Token::comparison) {
            Some(op) => {
                let (rest, rhs) = self.parse_additive(&rest[1..])?;
                let span = self.span_between(tokens, rest);
                Ok((rest, Condition::Comparison(ComparisonExpr { lhs: Box::new(lhs), op, rhs: Box::new(rhs), span })))
            }
            None => {
                let span = self.span_between(tokens, rest);
                Ok((rest, Condition::Truthiness(ConditionExpr { expr: Box::new(lhs), span })))
            }
        }
    }

    fn parse_if<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Expr> {
        let (rest, _) = self.expect(tokens, Token::If, "'if'")?;
        let (rest, condition) = self.parse_condition(rest)?;
        let (rest, _) = self.expect(rest, Token::Then, "'then'")?;
        let (rest, true_branch) = self.parse_expr(rest)?;
        let (rest, _) = self.expect(rest, Token::Else, "'else'")?;
        let (rest, false_branch) = self.parse_expr(rest)?;

        let span = self.span_between(tokens, rest);
        Ok((rest, Expr::If(IfExpr {
            condition,
            true_branch: Box::new(true_branch),
            false_branch: Box::new(false_branch),
            span,
        })))
    }

    fn parse_expr<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Expr> {
        match peek(tokens) {
            Some(Token::Let) => {
                let (rest, header) = self.parse_let_header(tokens)?;
                self.parse_let_body(tokens, header, rest)
            }
            Some(Token::If) => self.parse_if(tokens),
            _ => self.parse_additive(tokens),
        }
    }

    // A top-level `let` without `in` declares a function
    fn parse_declaration<'t>(&self, tokens: &'t [Lexeme<'s>]) -> ParseResult<'t, 's, Declaration> {
        if peek(tokens) != Some(&Token::Let) {
            let (rest, expr) = self.parse_expr(tokens)?;
            return Ok((rest, Declaration::Expression(expr)));
        }

        let (rest, header) = self.parse_let_header(tokens)?;
        if peek(rest) == Some(&Token::In) {
            let (rest, expr) = self.parse_let_body(tokens, header, rest)?;
            return Ok((rest, Declaration::Expression(expr)));
        }

        let LetHeader { name, params, value, span } = header;
        match params {
            Some(params) => {
                Ok((rest, Declaration::Function(Rc::new(Function { name, params, body: value, is_lambda: false, span }))))
            }
            None => Err(BoiError::malformed(
                format!("top-level binding '{}' must declare parameters or have an 'in' body", name),
                span,
            )),
        }
    }

    fn parse_program(&self, tokens: &[Lexeme<'s>]) -> EvalResult<Vec<Declaration>> {
        let mut declarations = Vec::new();
        let mut tokens = tokens;

        while !tokens.is_empty() {
            let (rest, declaration) = self.parse_declaration(tokens)?;
            declarations.push(declaration);

            tokens = match rest.split_first() {
                None => rest,
                Some((Lexeme { token: Token::Semicolon, .. }, rest)) => rest,
                Some(_) => return Err(self.unexpected(rest, "';' between declarations")),
            };
        }

        Ok(declarations)
    }
}

pub fn parse(source: &str) -> EvalResult<Vec<Declaration>> {
    let tokens = lexer(source)?;
    Parser { source }.parse_program(&tokens)
}
