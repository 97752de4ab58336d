//! Позиции в нормализованном тексте выражения.

/// Диапазон символов `[start, end)` в нормализованном тексте.
///
/// Позиции считаются в символах (`char`), а не в байтах: после
/// нормализации минус `−` уже заменён на `-`, но в тексте могут
/// остаться другие не-ASCII символы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Начальная позиция.
    pub start: usize,
    /// Конечная позиция (не включительно).
    pub end: usize,
}

impl Span {
    /// Создать новый Span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Длина диапазона.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Пустой ли диапазон.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
