//! Pratt parser producing the [AST](super::ast) from a token stream.
//!
//! Expressions are parsed with two dispatch tables indexed by the token kind: the
//! prefix table handles tokens that can start an expression and the infix table
//! handles operators that follow one. Each infix rule carries a binding power that
//! decides how tightly the operator binds its operands. Statements are dispatched
//! on their leading keyword through a third table.
//!
//! Errors do not stop the parser. Each failing statement is recorded and skipped,
//! so the caller receives every error in the input along with a best-effort tree.

use itertools::Itertools;
use lazy_static::lazy_static;
use slog::{debug, o, Discard, Logger};

use std::collections::HashMap;
use std::fmt;

use super::ast::{BinaryOp, Expr, PrefixOp, Program, Stmt, StmtKind};
use super::token::{unescape, Token, TokenKind};
use crate::parsing::{line_location, ErrorExt, LineLocation, Span};

/// Binding power of the prefix operators `-` and `!`.
const PREFIX_POWER: u8 = 60;

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorKind {
    /// The parser found `found` where it expected something else.
    UnexpectedToken {
        found: TokenKind,
        text: String,
        span: Span,
    },
    /// A number literal does not fit into 32 bits.
    InvalidNumber { text: String, span: Span },
    /// A port or interrupt line number does not fit into a byte.
    InvalidPort { text: String, span: Span },
    /// The left side of `=` is neither a variable nor an index expression.
    InvalidAssignmentTarget { span: Span },
}

/// A parse error with a stack of descriptions of what was being parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub context: Vec<&'static str>,
}

impl ParseError {
    fn new(kind: ErrorKind) -> ParseError {
        ParseError {
            kind,
            context: Vec::new(),
        }
    }

    fn unexpected(token: &Token) -> ParseError {
        ParseError::new(ErrorKind::UnexpectedToken {
            found: token.kind,
            text: token.text.to_string(),
            span: token.span.clone(),
        })
    }

    pub fn span(&self) -> &Span {
        match &self.kind {
            ErrorKind::UnexpectedToken { span, .. }
            | ErrorKind::InvalidNumber { span, .. }
            | ErrorKind::InvalidPort { span, .. }
            | ErrorKind::InvalidAssignmentTarget { span } => span,
        }
    }

    /// Line and column of the error in `source`.
    pub fn location(&self, source: &str) -> LineLocation {
        line_location(source, self.span().start)
    }
}

impl<R> ErrorExt<&'static str> for std::result::Result<R, ParseError> {
    fn context<T>(mut self, ctx: T) -> Self
    where
        T: Into<&'static str>,
    {
        if let Err(ref mut err) = self {
            err.context.push(ctx.into());
        }

        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ctx = self.context.iter().rev().join(": ");

        if !ctx.is_empty() {
            write!(f, "{}: ", ctx)?;
        }

        match &self.kind {
            ErrorKind::UnexpectedToken { found: TokenKind::Eof, .. } => {
                write!(f, "unexpected end of input")
            }
            ErrorKind::UnexpectedToken { found, text, span } => {
                write!(f, "unexpected token {} '{}' at {}", found, text, span.start)
            }
            ErrorKind::InvalidNumber { text, span } => {
                write!(f, "number '{}' at {} does not fit in 32 bits", text, span.start)
            }
            ErrorKind::InvalidPort { text, span } => {
                write!(f, "'{}' at {} is not a valid port number", text, span.start)
            }
            ErrorKind::InvalidAssignmentTarget { span } => {
                write!(f, "invalid assignment target at {}", span.start)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

type PrefixParselet = for<'a> fn(&mut Parser<'a>, Token<'a>) -> Result<Expr>;
type InfixParselet = for<'a> fn(&mut Parser<'a>, Expr, Token<'a>, u8) -> Result<Expr>;
type StatementParselet = for<'a> fn(&mut Parser<'a>, Token<'a>) -> Result<StmtKind>;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Associativity {
    Left,
    Right,
}

#[derive(Clone, Copy)]
struct InfixRule {
    power: u8,
    associativity: Associativity,
    parselet: InfixParselet,
}

impl InfixRule {
    fn left(power: u8, parselet: InfixParselet) -> InfixRule {
        InfixRule {
            power,
            associativity: Associativity::Left,
            parselet,
        }
    }

    /// Binding power used when parsing the right operand.
    fn right_power(&self) -> u8 {
        match self.associativity {
            Associativity::Left => self.power,
            Associativity::Right => self.power - 1,
        }
    }
}

lazy_static! {
    static ref PREFIX_RULES: HashMap<TokenKind, PrefixParselet> = {
        let mut rules = HashMap::new();
        rules.insert(TokenKind::Number, number as PrefixParselet);
        rules.insert(TokenKind::Str, string as PrefixParselet);
        rules.insert(TokenKind::Identifier, symbol as PrefixParselet);
        rules.insert(TokenKind::Minus, prefix_operator as PrefixParselet);
        rules.insert(TokenKind::Bang, prefix_operator as PrefixParselet);
        rules.insert(TokenKind::LParen, group as PrefixParselet);
        rules.insert(TokenKind::List, list as PrefixParselet);
        rules.insert(TokenKind::Read, read as PrefixParselet);
        rules
    };

    static ref INFIX_RULES: HashMap<TokenKind, InfixRule> = {
        let mut rules = HashMap::new();

        rules.insert(TokenKind::Assign, InfixRule {
            power: 10,
            associativity: Associativity::Right,
            parselet: assignment,
        });

        for kind in &[TokenKind::Equal, TokenKind::NotEqual] {
            rules.insert(*kind, InfixRule::left(20, binary));
        }

        for kind in &[TokenKind::Less, TokenKind::Greater, TokenKind::LessEqual, TokenKind::GreaterEqual] {
            rules.insert(*kind, InfixRule::left(30, binary));
        }

        for kind in &[TokenKind::Plus, TokenKind::Minus] {
            rules.insert(*kind, InfixRule::left(40, binary));
        }

        for kind in &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent] {
            rules.insert(*kind, InfixRule::left(50, binary));
        }

        rules.insert(TokenKind::LParen, InfixRule::left(70, call));
        rules.insert(TokenKind::LBracket, InfixRule::left(70, index));

        rules
    };

    static ref STATEMENT_RULES: HashMap<TokenKind, StatementParselet> = {
        let mut rules = HashMap::new();
        rules.insert(TokenKind::Let, let_statement as StatementParselet);
        rules.insert(TokenKind::If, if_statement as StatementParselet);
        rules.insert(TokenKind::While, while_statement as StatementParselet);
        rules.insert(TokenKind::Print, print_statement as StatementParselet);
        rules.insert(TokenKind::Inter, inter_statement as StatementParselet);
        rules.insert(TokenKind::IntOn, interrupt_toggle as StatementParselet);
        rules.insert(TokenKind::IntOff, interrupt_toggle as StatementParselet);
        rules.insert(TokenKind::LBrace, block as StatementParselet);
        rules
    };
}

pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    /// End offset of the last consumed token.
    previous_end: usize,
    /// Errors of the statements that failed so far, in source order.
    errors: Vec<ParseError>,
    logger: Logger,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a token stream produced by
    /// [tokenize](super::token::tokenize).
    pub fn new(tokens: Vec<Token<'a>>) -> Parser<'a> {
        Parser::with_logger(tokens, None)
    }

    pub fn with_logger<L>(mut tokens: Vec<Token<'a>>, logger: L) -> Parser<'a>
    where
        L: Into<Option<Logger>>,
    {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);

            tokens.push(Token {
                kind: TokenKind::Eof,
                text: "",
                span: end..end,
            });
        }

        let logger = logger
            .into()
            .unwrap_or_else(|| Logger::root(Discard, o!()))
            .new(o!("stage" => "parsing"));

        Parser {
            tokens,
            position: 0,
            previous_end: 0,
            errors: Vec::new(),
            logger,
        }
    }

    /// Parses the whole token stream.
    ///
    /// The returned program contains every statement that parsed successfully.
    /// It must not be compiled unless the error list is empty.
    pub fn parse(mut self) -> (Program, Vec<ParseError>) {
        let mut statements = Vec::new();

        while !self.check(TokenKind::Eof) {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => self.recover(err),
            }
        }

        (Program { statements }, self.errors)
    }

    /// Parses a single expression. Used by tests and tools.
    pub fn parse_expression(mut self) -> Result<Expr> {
        let expr = self.expression(0)?;
        self.expect(TokenKind::Eof)?;
        Ok(expr)
    }

    fn peek(&self) -> &Token<'a> {
        &self.tokens[self.position]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consumes the current token. The final `Eof` token is never consumed.
    fn advance(&mut self) -> Token<'a> {
        let token = self.tokens[self.position].clone();

        if token.kind != TokenKind::Eof {
            self.position += 1;
            self.previous_end = token.span.end;
        }

        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected(self.peek()))
        }
    }

    /// Skips tokens until a likely statement boundary.
    fn synchronize(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof
                | TokenKind::RBrace
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Inter
                | TokenKind::IntOn
                | TokenKind::IntOff => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        let start = self.peek().span.start;

        let kind = match STATEMENT_RULES.get(&self.peek().kind).copied() {
            Some(parselet) => {
                let token = self.advance();
                parselet(self, token)?
            }
            None => {
                let expr = self.expression(0).context("expression statement")?;
                self.expect(TokenKind::Semicolon).context("expression statement")?;
                StmtKind::Expr(expr)
            }
        };

        Ok(Stmt {
            kind,
            span: start..self.previous_end,
        })
    }

    /// Parses statements until the closing `}`, recovering from errors inside.
    /// The opening brace has already been consumed.
    fn block_body(&mut self) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(err) => self.recover(err),
            }
        }

        self.expect(TokenKind::RBrace).context("block")?;

        Ok(body)
    }

    /// Records the error of a failed statement and skips past it.
    fn recover(&mut self, err: ParseError) {
        debug!(self.logger, "parse error"; "error" => %err);
        self.errors.push(err);
        self.synchronize();
    }

    /// Pratt expression parser. Consumes infix operators that bind tighter
    /// than `rbp`.
    fn expression(&mut self, rbp: u8) -> Result<Expr> {
        let token = self.advance();

        let prefix = match PREFIX_RULES.get(&token.kind).copied() {
            Some(prefix) => prefix,
            None => return Err::<Expr, _>(ParseError::unexpected(&token)).context("expression"),
        };

        let mut lhs = prefix(self, token)?;

        loop {
            let rule = match INFIX_RULES.get(&self.peek().kind).copied() {
                Some(rule) => rule,
                None => break,
            };

            if rule.power <= rbp {
                break;
            }

            let token = self.advance();
            lhs = (rule.parselet)(self, lhs, token, rule.right_power())?;
        }

        Ok(lhs)
    }

    /// Parses `expr, expr, ... )`. The opening parenthesis has been consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();

        if self.check(TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.expression(0)?);

            if self.check(TokenKind::Comma) {
                self.advance();
                continue;
            }

            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn parenthesized(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        let expr = self.expression(0)?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    fn byte_literal(&mut self) -> Result<u8> {
        let token = self.expect(TokenKind::Number)?;

        parse_number(token.text)
            .filter(|n| *n <= u8::max_value() as u32)
            .map(|n| n as u8)
            .ok_or_else(|| ParseError::new(ErrorKind::InvalidPort {
                text: token.text.to_string(),
                span: token.span,
            }))
    }
}

fn parse_number(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

fn number<'a>(_parser: &mut Parser<'a>, token: Token<'a>) -> Result<Expr> {
    // Literals up to u32::MAX are accepted and reinterpreted as two's complement.
    match parse_number(token.text) {
        Some(n) => Ok(Expr::Number(n as i32)),
        None => Err(ParseError::new(ErrorKind::InvalidNumber {
            text: token.text.to_string(),
            span: token.span,
        })),
    }
}

fn string<'a>(_parser: &mut Parser<'a>, token: Token<'a>) -> Result<Expr> {
    Ok(Expr::Str(unescape(token.text)))
}

fn symbol<'a>(_parser: &mut Parser<'a>, token: Token<'a>) -> Result<Expr> {
    Ok(Expr::Symbol(token.text.to_string()))
}

fn prefix_operator<'a>(parser: &mut Parser<'a>, token: Token<'a>) -> Result<Expr> {
    let op = match token.kind {
        TokenKind::Minus => PrefixOp::Negate,
        _ => PrefixOp::Not,
    };

    let rhs = parser.expression(PREFIX_POWER)?;

    Ok(Expr::Prefix {
        op,
        rhs: Box::new(rhs),
    })
}

fn group<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<Expr> {
    let expr = parser.expression(0)?;
    parser.expect(TokenKind::RParen).context("parenthesized expression")?;
    Ok(expr)
}

fn list<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<Expr> {
    parser.expect(TokenKind::LParen).context("list")?;
    let items = parser.arguments().context("list")?;
    Ok(Expr::List(items))
}

fn read<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<Expr> {
    parser.expect(TokenKind::LParen).context("read")?;
    let port = parser.byte_literal().context("read")?;
    parser.expect(TokenKind::RParen).context("read")?;
    Ok(Expr::Read { port })
}

fn binary<'a>(parser: &mut Parser<'a>, lhs: Expr, token: Token<'a>, power: u8) -> Result<Expr> {
    let op = match token.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Equal => BinaryOp::Equal,
        TokenKind::NotEqual => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::LessEqual => BinaryOp::LessEqual,
        TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
        _ => return Err(ParseError::unexpected(&token)),
    };

    let rhs = parser.expression(power)?;

    Ok(Expr::binary(op, lhs, rhs))
}

fn assignment<'a>(parser: &mut Parser<'a>, target: Expr, token: Token<'a>, power: u8) -> Result<Expr> {
    match target {
        Expr::Symbol(_) | Expr::Index { .. } => (),
        _ => {
            return Err::<Expr, _>(ParseError::new(ErrorKind::InvalidAssignmentTarget { span: token.span }))
                .context("assignment")
        }
    }

    let value = parser.expression(power)?;

    Ok(Expr::Assign {
        target: Box::new(target),
        value: Box::new(value),
    })
}

fn call<'a>(parser: &mut Parser<'a>, callee: Expr, _token: Token<'a>, _power: u8) -> Result<Expr> {
    let args = parser.arguments().context("call")?;

    Ok(Expr::Call {
        callee: Box::new(callee),
        args,
    })
}

fn index<'a>(parser: &mut Parser<'a>, target: Expr, _token: Token<'a>, _power: u8) -> Result<Expr> {
    let index = parser.expression(0)?;
    parser.expect(TokenKind::RBracket).context("index")?;

    Ok(Expr::Index {
        target: Box::new(target),
        index: Box::new(index),
    })
}

fn let_statement<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<StmtKind> {
    let name = parser.expect(TokenKind::Identifier).context("let")?;
    parser.expect(TokenKind::Assign).context("let")?;
    let value = parser.expression(0).context("let")?;
    parser.expect(TokenKind::Semicolon).context("let")?;

    Ok(StmtKind::Let {
        name: name.text.to_string(),
        value,
    })
}

fn if_statement<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<StmtKind> {
    let cond = parser.parenthesized().context("if condition")?;
    let then = parser.statement()?;

    let otherwise = if parser.check(TokenKind::Else) {
        parser.advance();
        Some(Box::new(parser.statement()?))
    } else {
        None
    };

    Ok(StmtKind::If {
        cond,
        then: Box::new(then),
        otherwise,
    })
}

fn while_statement<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<StmtKind> {
    let cond = parser.parenthesized().context("while condition")?;
    let body = parser.statement()?;

    Ok(StmtKind::While {
        cond,
        body: Box::new(body),
    })
}

fn print_statement<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<StmtKind> {
    let expr = parser.parenthesized().context("print")?;
    parser.expect(TokenKind::Semicolon).context("print")?;
    Ok(StmtKind::Print(expr))
}

fn inter_statement<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<StmtKind> {
    let line = parser.byte_literal().context("interrupt handler")?;
    parser.expect(TokenKind::LBrace).context("interrupt handler")?;
    let body = parser.block_body()?;
    Ok(StmtKind::Inter { line, body })
}

fn interrupt_toggle<'a>(parser: &mut Parser<'a>, token: Token<'a>) -> Result<StmtKind> {
    parser.expect(TokenKind::Semicolon).context("interrupt toggle")?;

    match token.kind {
        TokenKind::IntOn => Ok(StmtKind::IntOn),
        _ => Ok(StmtKind::IntOff),
    }
}

fn block<'a>(parser: &mut Parser<'a>, _token: Token<'a>) -> Result<StmtKind> {
    Ok(StmtKind::Block(parser.block_body()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::token::tokenize;

    fn parse(source: &str) -> (Program, Vec<ParseError>) {
        Parser::new(tokenize(source).expect("could not tokenize")).parse()
    }

    fn expr(source: &str) -> String {
        Parser::new(tokenize(source).unwrap())
            .parse_expression()
            .expect("could not parse expression")
            .to_string()
    }

    #[test]
    fn test_let_precedence() {
        let (program, errors) = parse("let a = (2 + b) * c - d;");
        assert!(errors.is_empty(), "{:?}", errors);

        match &program.statements[0].kind {
            StmtKind::Let { name, value } => {
                assert_eq!(name, "a");

                let (op, lhs, rhs) = match value {
                    Expr::Binary { op, lhs, rhs } => (op, lhs, rhs),
                    other => panic!("expected a binary expression, got {:?}", other),
                };

                assert_eq!(*op, BinaryOp::Sub);
                assert_eq!(**rhs, Expr::Symbol("d".into()));

                match &**lhs {
                    Expr::Binary { op: BinaryOp::Mul, lhs, rhs } => {
                        assert_eq!(**rhs, Expr::Symbol("c".into()));
                        assert_eq!(
                            **lhs,
                            Expr::binary(BinaryOp::Add, Expr::Number(2), Expr::Symbol("b".into())),
                        );
                    }
                    other => panic!("expected a multiplication, got {:?}", other),
                }

                assert_eq!(value.to_string(), "(- (* (+ 2 b) c) d)");
            }
            other => panic!("expected a let statement, got {:?}", other),
        }
    }

    #[test]
    fn test_associativity() {
        assert_eq!(expr("a - b - c"), "(- (- a b) c)");
        assert_eq!(expr("a = b = c"), "(= a (= b c))");
        assert_eq!(expr("a = b + 1 < c * 2"), "(= a (< (+ b 1) (* c 2)))");
        assert_eq!(expr("a == b != c"), "(!= (== a b) c)");
    }

    #[test]
    fn test_prefix_and_postfix() {
        assert_eq!(expr("-a * b"), "(* (- a) b)");
        assert_eq!(expr("!(a < b)"), "(! (< a b))");
        assert_eq!(expr("xs[i + 1] * 2"), "(* ([] xs (+ i 1)) 2)");
        assert_eq!(expr("f(1, g(2))"), "(call f 1 (call g 2))");
        assert_eq!(expr("list(1, 2, 3)"), "(list 1 2 3)");
        assert_eq!(expr("list()"), "(list)");
        assert_eq!(expr("read(1) + 0x10"), "(+ (read 1) 16)");
    }

    #[test]
    fn test_statements() {
        let source = r#"
            let s = "hi";
            if (a > b) { print(a); } else print(b);
            while (i < 10) i = i + 1;
            inter 1 { print("tick"); }
            intOn;
            intOff;
            { x; }
        "#;

        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(program.statements.len(), 7);

        match &program.statements[1].kind {
            StmtKind::If { cond, otherwise, .. } => {
                assert_eq!(cond.to_string(), "(> a b)");
                assert!(otherwise.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }

        match &program.statements[3].kind {
            StmtKind::Inter { line, body } => {
                assert_eq!(*line, 1);
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected inter, got {:?}", other),
        }

        assert_eq!(program.statements[4].kind, StmtKind::IntOn);
        assert_eq!(program.statements[5].kind, StmtKind::IntOff);
        assert_eq!(&source[program.statements[0].span.clone()], "let s = \"hi\";");
    }

    #[test]
    fn test_error_recovery() {
        let source = "let a = ;\nlet b = 2;\nprint(b)\nlet c = 3;\n{ let d = ; let e = 1; }\n";
        let (program, errors) = parse(source);

        assert_eq!(errors.len(), 3, "{:?}", errors);
        assert_eq!(errors[0].location(source), LineLocation { line: 1, column: 9 });
        assert_eq!(errors[1].location(source), LineLocation { line: 4, column: 1 });

        let names = program
            .statements
            .iter()
            .filter_map(|s| match &s.kind {
                StmtKind::Let { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_errors_inside_blocks_accumulate() {
        let source = "{ let a = ; let b = ; print(1) }\nlet c = ;";
        let (program, errors) = parse(source);

        let locations = errors.iter().map(|e| e.location(source)).collect::<Vec<_>>();

        assert_eq!(locations, vec![
            LineLocation { line: 1, column: 11 },
            LineLocation { line: 1, column: 21 },
            LineLocation { line: 1, column: 32 },
            LineLocation { line: 2, column: 9 },
        ]);

        match &program.statements[0].kind {
            StmtKind::Block(body) => assert_eq!(body.len(), 0),
            other => panic!("expected a block, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_literals() {
        let (_, errors) = parse("let a = 99999999999;");
        assert!(matches!(errors[0].kind, ErrorKind::InvalidNumber { .. }));

        let (_, errors) = parse("let a = read(300);");
        assert!(matches!(errors[0].kind, ErrorKind::InvalidPort { .. }));

        let (_, errors) = parse("1 + 2 = 3;");
        assert!(matches!(errors[0].kind, ErrorKind::InvalidAssignmentTarget { .. }));
    }

    #[test]
    fn test_error_display() {
        let (_, errors) = parse("let = 4;");
        assert_eq!(errors[0].to_string(), "let: unexpected token ASSIGN '=' at 4");

        let (_, errors) = parse("print(1");
        assert_eq!(errors[0].to_string(), "print: unexpected end of input");
    }
}
