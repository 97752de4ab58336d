//! Определения ошибок для fractalc.

use crate::parser::ParseError;
use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type KernelResult<T> = Result<T, KernelError>;

/// Перечисление всех возможных ошибок.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid numeric literal in kernel: {0}")]
    InvalidLiteral(String),

    /// Инструкция ссылается на слот за пределами арены ядра.
    #[error("Kernel instruction refers to missing slot {0}")]
    InvalidSlot(usize),

    #[error("Invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Таблица градиента не содержит нужного индекса. При правильном
    /// построении таблицы не возникает.
    #[error("Gradient table has no entry for index {0}")]
    GradientLookup(usize),

    #[error("Escape-count grid is empty")]
    EmptyGrid,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
