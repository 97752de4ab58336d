//! Абстрактное синтаксическое дерево выражения.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nodecodes::{BinaryOp, Function, SymbolKind};

/// Узел дерева выражения.
///
/// Дочерние узлы принадлежат родителю единолично, поэтому дерево
/// всегда конечно и ациклично.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Числовой литерал в исходном написании.
    Literal { text: String },
    /// `z`, `c`, `i` или `-i`.
    Symbol { symbol: SymbolKind },
    /// Лист, который не удалось распознать. Передаётся дальше как есть.
    RawLeaf { text: String },
    /// Бинарная операция.
    BinaryOp {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Вызов функции одного аргумента.
    UnaryFunc { func: Function, operand: Box<Node> },
}

impl Node {
    /// Создать литерал.
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal { text: text.into() }
    }

    /// Создать символьный лист.
    pub fn symbol(symbol: SymbolKind) -> Self {
        Node::Symbol { symbol }
    }

    /// Создать нераспознанный лист.
    pub fn raw(text: impl Into<String>) -> Self {
        Node::RawLeaf { text: text.into() }
    }

    /// Создать бинарную операцию.
    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Создать вызов функции.
    pub fn unary(func: Function, operand: Node) -> Self {
        Node::UnaryFunc {
            func,
            operand: Box::new(operand),
        }
    }

    /// Собрать тексты всех нераспознанных листьев слева направо.
    pub fn raw_leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_raw(&mut out);
        out
    }

    fn collect_raw<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::RawLeaf { text } => out.push(text),
            Node::BinaryOp { left, right, .. } => {
                left.collect_raw(out);
                right.collect_raw(out);
            }
            Node::UnaryFunc { operand, .. } => operand.collect_raw(out),
            Node::Literal { .. } | Node::Symbol { .. } => {}
        }
    }
}

/// Вывод в виде S-выражения: `(+ (^ z 2) c)`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal { text } => write!(f, "{}", text),
            Node::Symbol { symbol } => write!(f, "{}", symbol.token()),
            Node::RawLeaf { text } => write!(f, "{:?}", text),
            Node::BinaryOp { op, left, right } => write!(f, "({} {} {})", op, left, right),
            Node::UnaryFunc { func, operand } => write!(f, "({} {})", func, operand),
        }
    }
}
