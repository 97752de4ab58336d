//! Определения кодов для узлов: операторы, функции и символы.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Бинарный оператор выражения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Вычитание (`-`)
    Sub,
    /// Сложение (`+`)
    Add,
    /// Деление (`/`)
    Div,
    /// Умножение (`*`)
    Mul,
    /// Возведение в степень (`^`)
    Pow,
}

/// Все операторы. Уровень берётся из [`BinaryOp::precedence`].
///
/// Порядок внутри уровня значения не имеет: выбирается самое правое вхождение.
pub const OPERATORS: [BinaryOp; 5] = [
    BinaryOp::Sub,
    BinaryOp::Add,
    BinaryOp::Div,
    BinaryOp::Mul,
    BinaryOp::Pow,
];

/// Минимальный уровень приоритета.
pub const MIN_PRECEDENCE: u8 = 1;

/// Максимальный уровень приоритета.
pub const MAX_PRECEDENCE: u8 = 3;

impl BinaryOp {
    /// Символ оператора в исходном тексте.
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Sub => '-',
            BinaryOp::Add => '+',
            BinaryOp::Div => '/',
            BinaryOp::Mul => '*',
            BinaryOp::Pow => '^',
        }
    }

    /// Уровень приоритета (меньше — связывает слабее).
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Sub | BinaryOp::Add => 1,
            BinaryOp::Div | BinaryOp::Mul => 2,
            BinaryOp::Pow => 3,
        }
    }

    /// Имя примитива ядра, который вычисляет эту операцию.
    pub fn primitive(self) -> &'static str {
        match self {
            BinaryOp::Sub => "subtract",
            BinaryOp::Add => "add",
            BinaryOp::Div => "divide",
            BinaryOp::Mul => "multiply",
            BinaryOp::Pow => "computePower",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Функция одного аргумента.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    /// Действительная часть
    Real,
    /// Мнимая часть
    Imag,
    /// Модуль
    Abs,
    /// Аргумент (фаза)
    Arg,
    /// Синус
    Sin,
    /// Косинус
    Cos,
    /// Гиперболический синус
    Sh,
    /// Гиперболический косинус
    Ch,
    /// Экспонента
    Exp,
    /// Натуральный логарифм (главная ветвь)
    Ln,
    /// Комплексное сопряжение
    Conj,
}

/// Распознаваемые функции в порядке поиска.
///
/// Парсер берёт первую функцию из списка, которая встречается в тексте,
/// поэтому порядок менять нельзя.
pub const FUNCTIONS: [Function; 11] = [
    Function::Real,
    Function::Imag,
    Function::Abs,
    Function::Arg,
    Function::Sin,
    Function::Cos,
    Function::Sh,
    Function::Ch,
    Function::Exp,
    Function::Ln,
    Function::Conj,
];

impl Function {
    /// Имя функции в исходном тексте.
    pub fn name(self) -> &'static str {
        match self {
            Function::Real => "real",
            Function::Imag => "imag",
            Function::Abs => "abs",
            Function::Arg => "arg",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Sh => "sh",
            Function::Ch => "ch",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Conj => "conj",
        }
    }

    /// Имя примитива ядра: `compute_` + имя функции.
    pub fn primitive(self) -> String {
        format!("compute_{}", self.name())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Символьный лист выражения.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Итерируемая переменная `z`
    Iterate,
    /// Параметр `c`
    Parameter,
    /// Мнимая единица `i`
    ImagUnit,
    /// Отрицательная мнимая единица `-i`
    NegImagUnit,
}

impl SymbolKind {
    /// Токен символа в нормализованном тексте.
    pub fn token(self) -> &'static str {
        match self {
            SymbolKind::Iterate => "z",
            SymbolKind::Parameter => "c",
            SymbolKind::ImagUnit => "i",
            SymbolKind::NegImagUnit => "-i",
        }
    }

    /// Распознать символ по токену.
    pub fn from_token(token: &str) -> Option<SymbolKind> {
        match token {
            "z" => Some(SymbolKind::Iterate),
            "c" => Some(SymbolKind::Parameter),
            "i" => Some(SymbolKind::ImagUnit),
            "-i" => Some(SymbolKind::NegImagUnit),
            _ => None,
        }
    }
}
