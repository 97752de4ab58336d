//! Ядро: плоская последовательность вызовов комплексных примитивов.
//!
//! Ядро вставляется внутрь вычислительной функции исполнителя
//! (asm.js-модуля или [`Evaluator`]). Исполнитель обязан предоставить:
//!
//! - входы `z_r`, `z_i`, `c_r`, `c_i`;
//! - выходы `outR`, `outI`, куда пишет каждый примитив;
//! - бинарные примитивы `add`, `subtract`, `multiply`, `divide`,
//!   `computePower` с сигнатурой `(realA, imagA, realB, imagB)`;
//! - унарные примитивы `compute_<функция>` с сигнатурой `(real, imag)`.
//!
//! Текст ядра состоит из приведения входов к double, объявлений
//! временных слотов и последовательности инструкций:
//!
//! ```text
//! z_r = +z_r;
//! z_i = +z_i;
//! c_r = +c_r;
//! c_i = +c_i;
//! var __r0 = 0.0;
//! var __i0 = 0.0;
//! ...
//! computePower(__r0, __i0, __r1, __i1);
//! ```

pub mod codegen;
pub mod complex;
pub mod eval;

pub use codegen::generate;
pub use complex::Complex;
pub use eval::Evaluator;

use std::fmt;

use crate::nodecodes::{BinaryOp, Function, SymbolKind};

/// Имена входов ядра.
pub const ITERATE_REAL: &str = "z_r";
pub const ITERATE_IMAG: &str = "z_i";
pub const PARAMETER_REAL: &str = "c_r";
pub const PARAMETER_IMAG: &str = "c_i";

/// Имена выходов ядра.
pub const OUT_REAL: &str = "outR";
pub const OUT_IMAG: &str = "outI";

/// Индекс временного слота (пары `__rN`/`__iN`) в арене ядра.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

impl SlotId {
    /// Имя действительной части слота.
    pub fn real_name(self) -> String {
        format!("__r{}", self.0)
    }

    /// Имя мнимой части слота.
    pub fn imag_name(self) -> String {
        format!("__i{}", self.0)
    }
}

/// Для чего выделен слот.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// Левый операнд бинарной операции.
    Left(BinaryOp),
    /// Правый операнд бинарной операции.
    Right(BinaryOp),
    /// Аргумент функции.
    Argument(Function),
}

/// Запись о слоте в арене.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: SlotId,
    pub role: SlotRole,
}

/// Инструкция ядра.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    /// `outR = +n; outI = +0;`
    LoadLiteral(String),
    /// Загрузка `z`, `c`, `i` или `-i` в выходы.
    LoadSymbol(SymbolKind),
    /// Копирование выходов в слот. Унарные функции копируют без `+`.
    Store { slot: SlotId, coerce: bool },
    /// Вызов бинарного примитива.
    Binary { op: BinaryOp, lhs: SlotId, rhs: SlotId },
    /// Вызов унарного примитива.
    Unary { func: Function, arg: SlotId },
}

impl Instr {
    /// Имя вызываемого примитива, если инструкция — вызов.
    pub fn primitive(&self) -> Option<String> {
        match self {
            Instr::Binary { op, .. } => Some(op.primitive().to_string()),
            Instr::Unary { func, .. } => Some(func.primitive()),
            _ => None,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::LoadLiteral(text) => {
                writeln!(f, "{} = +{};", OUT_REAL, text)?;
                writeln!(f, "{} = +0;", OUT_IMAG)
            }
            Instr::LoadSymbol(symbol) => {
                let (re, im) = match symbol {
                    SymbolKind::Iterate => {
                        (format!("+{}", ITERATE_REAL), format!("+{}", ITERATE_IMAG))
                    }
                    SymbolKind::Parameter => {
                        (format!("+{}", PARAMETER_REAL), format!("+{}", PARAMETER_IMAG))
                    }
                    SymbolKind::ImagUnit => ("0.0".to_string(), "1.0".to_string()),
                    SymbolKind::NegImagUnit => ("0.0".to_string(), "-1.0".to_string()),
                };
                writeln!(f, "{} = {};", OUT_REAL, re)?;
                writeln!(f, "{} = {};", OUT_IMAG, im)
            }
            Instr::Store { slot, coerce } => {
                let sign = if *coerce { "+" } else { "" };
                writeln!(f, "{} = {}{};", slot.real_name(), sign, OUT_REAL)?;
                writeln!(f, "{} = {}{};", slot.imag_name(), sign, OUT_IMAG)
            }
            Instr::Binary { op, lhs, rhs } => writeln!(
                f,
                "{}({}, {}, {}, {});",
                op.primitive(),
                lhs.real_name(),
                lhs.imag_name(),
                rhs.real_name(),
                rhs.imag_name()
            ),
            Instr::Unary { func, arg } => writeln!(
                f,
                "{}({}, {});",
                func.primitive(),
                arg.real_name(),
                arg.imag_name()
            ),
        }
    }
}

/// Скомпилированное ядро.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kernel {
    slots: Vec<Slot>,
    instructions: Vec<Instr>,
}

impl Kernel {
    /// Собрать ядро из арены слотов и инструкций.
    pub fn new(slots: Vec<Slot>, instructions: Vec<Instr>) -> Self {
        Self {
            slots,
            instructions,
        }
    }

    /// Арена временных слотов в порядке выделения.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Инструкции в порядке исполнения.
    pub fn instructions(&self) -> &[Instr] {
        &self.instructions
    }

    /// Количество временных слотов.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Имена вызываемых примитивов в порядке вызова.
    pub fn calls(&self) -> Vec<String> {
        self.instructions
            .iter()
            .filter_map(Instr::primitive)
            .collect()
    }

    /// Текст ядра.
    pub fn to_source(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in [ITERATE_REAL, ITERATE_IMAG, PARAMETER_REAL, PARAMETER_IMAG] {
            writeln!(f, "{} = +{};", input, input)?;
        }
        for slot in &self.slots {
            writeln!(f, "var {} = 0.0;", slot.id.real_name())?;
            writeln!(f, "var {} = 0.0;", slot.id.imag_name())?;
        }
        for instr in &self.instructions {
            write!(f, "{}", instr)?;
        }
        Ok(())
    }
}
