//! Ошибки парсера.

use super::span::Span;
use thiserror::Error;

/// Ошибка разбора выражения.
///
/// Сам разбор никогда не прерывается: эти ошибки накапливаются как
/// диагностика и возвращаются только в строгом режиме.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Лист, не являющийся числом, `z`, `c`, `i` или `-i`.
    #[error("Unrecognized token '{text}' at position {}", .span.start)]
    UnrecognizedToken { span: Span, text: String },

    /// Пустой операнд (например, `z+` или `()`).
    #[error("Missing operand at position {}", .span.start)]
    MissingOperand { span: Span },

    /// Текст перед именем функции, который отбрасывается при разборе.
    #[error("Unexpected '{text}' before function '{function}' at position {}", .span.start)]
    UnexpectedPrefix {
        span: Span,
        text: String,
        function: String,
    },
}

impl ParseError {
    /// Создать ошибку "нераспознанный токен".
    pub fn unrecognized(span: Span, text: impl Into<String>) -> Self {
        Self::UnrecognizedToken {
            span,
            text: text.into(),
        }
    }

    /// Создать ошибку "лишний текст перед функцией".
    pub fn unexpected_prefix(
        span: Span,
        text: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self::UnexpectedPrefix {
            span,
            text: text.into(),
            function: function.into(),
        }
    }

    /// Получить позицию ошибки.
    pub fn span(&self) -> Span {
        match self {
            Self::UnrecognizedToken { span, .. } => *span,
            Self::MissingOperand { span } => *span,
            Self::UnexpectedPrefix { span, .. } => *span,
        }
    }
}
