//! Модуль парсера выражений комплексных отображений.
//!
//! Парсер не использует лексер: строка нормализуется и рекурсивно делится
//! по операторам вне скобок.
//!
//! # Синтаксис
//!
//! ```text
//! z^2 + c           ; операторы + - * / ^
//! sin(z) * c        ; функции real imag abs arg sin cos sh ch exp ln conj
//! (z - 1) / (z + i) ; скобки, мнимая единица i и -i
//! -0.75 + z^3       ; числовые литералы
//! ```
//!
//! Внутри уровня приоритета выбирается самый правый оператор, поэтому
//! `a-b-c` разбирается как `(a-b)-c`, а `a^b^c` — как `(a^b)^c`.
//!
//! # Пример
//!
//! ```rust
//! use fractalc::parser::parse;
//!
//! let ast = parse("z^2 + c");
//! assert_eq!(ast.to_string(), "(+ (^ z 2) c)");
//! ```

pub mod error;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod span;

pub use error::ParseError;
pub use parser::Parser;
pub use span::Span;

use crate::ast::Node;

/// Нормализовать текст: убрать пробельные символы, заменить `−` на `-`,
/// привести к нижнему регистру.
pub fn normalize(source: &str) -> String {
    source
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Разобрать выражение в дерево.
///
/// Никогда не завершается ошибкой: нераспознанные фрагменты становятся
/// листьями [`Node::RawLeaf`].
pub fn parse(source: &str) -> Node {
    Parser::new(source).parse()
}

/// Разобрать выражение и вернуть дерево вместе с диагностикой.
pub fn parse_with_diagnostics(source: &str) -> (Node, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let node = parser.parse();
    (node, parser.into_diagnostics())
}

/// Разобрать выражение в строгом режиме.
///
/// Возвращает первую ошибку, если хотя бы один фрагмент не распознан.
pub fn parse_strict(source: &str) -> Result<Node, ParseError> {
    let (node, diagnostics) = parse_with_diagnostics(source);
    match diagnostics.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(node),
    }
}
