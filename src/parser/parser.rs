//! Разбор выражения без лексера: рекурсивное деление строки по операторам.
//!
//! Парсер работает над неизменяемой последовательностью символов и
//! рекурсивно делит диапазоны `[start, end)`:
//!
//! 1. по уровням приоритета от низшего к высшему ищется самый правый
//!    оператор вне скобок; унарный минус не считается кандидатом;
//! 2. затем ищутся имена функций одного аргумента;
//! 3. затем снимается один слой внешних скобок;
//! 4. остаток классифицируется как лист.

use log::{debug, trace};

use super::error::ParseError;
use super::normalize;
use super::span::Span;
use crate::ast::Node;
use crate::nodecodes::{SymbolKind, FUNCTIONS, MAX_PRECEDENCE, MIN_PRECEDENCE, OPERATORS};

/// Символы, после которых `-` может быть только унарным.
const UNARY_MINUS_PREDECESSORS: [char; 5] = ['(', '+', '*', '/', '^'];

/// Парсер выражения.
pub struct Parser {
    chars: Vec<char>,
    diagnostics: Vec<ParseError>,
}

impl Parser {
    /// Создать парсер. Текст нормализуется сразу.
    pub fn new(source: &str) -> Self {
        Self {
            chars: normalize(source).chars().collect(),
            diagnostics: Vec::new(),
        }
    }

    /// Разобрать всё выражение. Никогда не завершается ошибкой.
    pub fn parse(&mut self) -> Node {
        let whole = Span::new(0, self.chars.len());
        self.parse_range(whole)
    }

    /// Забрать накопленную диагностику.
    pub fn into_diagnostics(self) -> Vec<ParseError> {
        self.diagnostics
    }

    fn parse_range(&mut self, span: Span) -> Node {
        // Глубокая вложенность скобок даёт глубокую рекурсию
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || self.split(span))
    }

    fn split(&mut self, span: Span) -> Node {
        trace!("split {:?} '{}'", span, self.slice(span));

        if let Some(node) = self.split_operator(span) {
            return node;
        }
        if let Some(node) = self.split_function(span) {
            return node;
        }
        if !span.is_empty() && self.chars[span.start] == '(' {
            let end = (span.end - 1).max(span.start + 1);
            return self.parse_range(Span::new(span.start + 1, end));
        }
        self.classify_leaf(span)
    }

    /// Шаг 1: самый правый оператор низшего из найденных уровней.
    fn split_operator(&mut self, span: Span) -> Option<Node> {
        for tier in MIN_PRECEDENCE..=MAX_PRECEDENCE {
            let found = OPERATORS
                .iter()
                .filter(|op| op.precedence() == tier)
                .filter_map(|&op| self.find_last(span, &[op.symbol()]).map(|pos| (pos, op)))
                .max_by_key(|(pos, _)| *pos);

            if let Some((pos, op)) = found {
                debug!("split '{}' at {} on '{}'", self.slice(span), pos, op);
                let left = self.parse_range(Span::new(span.start, pos));
                let right = self.parse_range(Span::new(pos + 1, span.end));
                return Some(Node::binary(op, left, right));
            }
        }
        None
    }

    /// Шаг 2: первая по списку функция, встречающаяся вне скобок.
    fn split_function(&mut self, span: Span) -> Option<Node> {
        for func in FUNCTIONS {
            let name: Vec<char> = func.name().chars().collect();
            let Some(pos) = self.find_last(span, &name) else {
                continue;
            };

            if pos > span.start {
                let prefix = Span::new(span.start, pos);
                debug!("dropping '{}' before '{}'", self.slice(prefix), func);
                self.diagnostics.push(ParseError::unexpected_prefix(
                    prefix,
                    self.slice(prefix),
                    func.name(),
                ));
            }

            let argument = self.parse_range(Span::new(pos + name.len(), span.end));
            return Some(Node::unary(func, argument));
        }
        None
    }

    /// Шаг 4: число, символ или нераспознанный лист.
    fn classify_leaf(&mut self, span: Span) -> Node {
        let text = self.slice(span);

        if is_numeral(&text) {
            return Node::literal(text);
        }
        if let Some(symbol) = SymbolKind::from_token(&text) {
            return Node::symbol(symbol);
        }

        debug!("raw leaf '{}' at {:?}", text, span);
        if text.is_empty() {
            self.diagnostics.push(ParseError::MissingOperand { span });
        } else {
            self.diagnostics.push(ParseError::unrecognized(span, text.clone()));
        }
        Node::raw(text)
    }

    /// Позиция самого правого вхождения `needle` на нулевой глубине скобок.
    ///
    /// Глубина на позиции `j` учитывает только скобки левее `j`.
    fn find_last(&self, span: Span, needle: &[char]) -> Option<usize> {
        let mut depth: i32 = 0;
        let mut last = None;

        for j in span.start..span.end {
            let candidate = depth == 0
                && self.matches_at(j, span.end, needle)
                && !self.is_unary_minus(span, j, needle);
            if candidate {
                last = Some(j);
            }
            match self.chars[j] {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
        }

        last
    }

    fn matches_at(&self, pos: usize, end: usize, needle: &[char]) -> bool {
        pos + needle.len() <= end && self.chars[pos..pos + needle.len()] == *needle
    }

    fn is_unary_minus(&self, span: Span, pos: usize, needle: &[char]) -> bool {
        needle == ['-']
            && (pos == span.start || UNARY_MINUS_PREDECESSORS.contains(&self.chars[pos - 1]))
    }

    fn slice(&self, span: Span) -> String {
        self.chars[span.start..span.end].iter().collect()
    }
}

/// Число ли это: только цифры, точка, экспонента и знаки, и разбирается как `f64`.
fn is_numeral(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | '+' | '-'))
        && text.parse::<f64>().is_ok()
}
