//! Abstract syntax tree of the source language.

use std::fmt;

use crate::parsing::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl BinaryOp {
    /// True for operators that only set the flags.
    pub fn is_comparison(self) -> bool {
        match self {
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::Greater
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual => true,
            _ => false,
        }
    }

    /// The comparison that holds exactly when `self` does not.
    pub fn inverted(self) -> Option<BinaryOp> {
        let op = match self {
            BinaryOp::Equal => BinaryOp::NotEqual,
            BinaryOp::NotEqual => BinaryOp::Equal,
            BinaryOp::Less => BinaryOp::GreaterEqual,
            BinaryOp::GreaterEqual => BinaryOp::Less,
            BinaryOp::Greater => BinaryOp::LessEqual,
            BinaryOp::LessEqual => BinaryOp::Greater,
            _ => return None,
        };

        Some(op)
    }

    /// Folds the operator over two constants. `None` when the result is not
    /// statically known, e.g. on division by zero.
    pub fn apply(self, lhs: i32, rhs: i32) -> Option<i32> {
        let value = match self {
            BinaryOp::Add => lhs.wrapping_add(rhs),
            BinaryOp::Sub => lhs.wrapping_sub(rhs),
            BinaryOp::Mul => lhs.wrapping_mul(rhs),
            BinaryOp::Div => lhs.checked_div(rhs)?,
            BinaryOp::Mod => lhs.checked_rem(rhs)?,
            BinaryOp::Equal => (lhs == rhs) as i32,
            BinaryOp::NotEqual => (lhs != rhs) as i32,
            BinaryOp::Less => (lhs < rhs) as i32,
            BinaryOp::Greater => (lhs > rhs) as i32,
            BinaryOp::LessEqual => (lhs <= rhs) as i32,
            BinaryOp::GreaterEqual => (lhs >= rhs) as i32,
        };

        Some(value)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefixOp {
    Negate,
    Not,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrefixOp::Negate => write!(f, "-"),
            PrefixOp::Not => write!(f, "!"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(i32),
    Str(String),
    Symbol(String),
    Prefix {
        op: PrefixOp,
        rhs: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `list(a, b, ...)`
    List(Vec<Expr>),
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `read(port)`
    Read {
        port: u8,
    },
}

impl Expr {
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// The value of the expression if it only consists of number literals.
    pub fn constant_value(&self) -> Option<i32> {
        match self {
            Expr::Number(n) => Some(*n),
            Expr::Prefix { op: PrefixOp::Negate, rhs } => Some(rhs.constant_value()?.wrapping_neg()),
            Expr::Prefix { op: PrefixOp::Not, rhs } => Some((rhs.constant_value()? == 0) as i32),
            Expr::Binary { op, lhs, rhs } => op.apply(lhs.constant_value()?, rhs.constant_value()?),
            _ => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for item in items {
        write!(f, " {}", item)?;
    }

    Ok(())
}

/// Renders the expression as an s-expression, e.g. `(- (* (+ 2 b) c) d)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Str(s) => write!(f, "{:?}", s),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Prefix { op, rhs } => write!(f, "({} {})", op, rhs),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", op, lhs, rhs),
            Expr::Assign { target, value } => write!(f, "(= {} {})", target, value),
            Expr::Call { callee, args } => {
                write!(f, "(call {}", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::List(items) => {
                write!(f, "(list")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            Expr::Index { target, index } => write!(f, "([] {} {})", target, index),
            Expr::Read { port } => write!(f, "(read {})", port),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    Let {
        name: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Print(Expr),
    Block(Vec<Stmt>),
    /// An interrupt handler for the given interrupt line.
    Inter {
        line: u8,
        body: Vec<Stmt>,
    },
    IntOn,
    IntOff,
    Expr(Expr),
}

/// A parsed source file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[test]
fn test_constant_value() {
    let expr = Expr::binary(
        BinaryOp::Mul,
        Expr::binary(BinaryOp::Add, Expr::Number(2), Expr::Number(3)),
        Expr::Prefix { op: PrefixOp::Negate, rhs: Box::new(Expr::Number(4)) },
    );
    assert_eq!(expr.constant_value(), Some(-20));

    let expr = Expr::binary(BinaryOp::Div, Expr::Number(1), Expr::Number(0));
    assert_eq!(expr.constant_value(), None);

    let expr = Expr::binary(BinaryOp::Add, Expr::Number(1), Expr::Symbol("x".into()));
    assert_eq!(expr.constant_value(), None);
}

#[test]
fn test_inverted_comparisons() {
    for op in &[BinaryOp::Equal, BinaryOp::Less, BinaryOp::Greater, BinaryOp::LessEqual] {
        let inverted = op.inverted().unwrap();
        assert_eq!(inverted.inverted(), Some(*op));

        for (a, b) in &[(1, 2), (2, 2), (3, 2)] {
            assert_ne!(op.apply(*a, *b), inverted.apply(*a, *b));
        }
    }

    assert_eq!(BinaryOp::Add.inverted(), None);
}
