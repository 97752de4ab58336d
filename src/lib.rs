//! # fractalc
//!
//! Компилятор выражений комплексных отображений для escape-time фракталов.
//!
//! Выражение вида `z^2 + c` разбирается в дерево и превращается в ядро:
//! плоскую последовательность вызовов комплексных примитивов, которую
//! исполняет asm.js-модуль или встроенный [`Evaluator`].
//!
//! ## Основные модули
//!
//! - [`parser`] - разбор выражения без лексера
//! - [`ast`] - дерево выражения
//! - [`nodecodes`] - операторы, функции и символы
//! - [`kernel`] - ядро, генерация кода и исполнитель
//! - [`compiler`] - фасад компиляции
//! - [`engine`] - подсчёт итераций по сетке пикселей
//! - [`render`] - раскраска по гистограмме и запись PPM
//! - [`config`] - параметры компиляции и отрисовки
//!
//! ## Пример
//!
//! ```rust
//! use fractalc::{compile, Complex, Evaluator};
//!
//! let kernel = compile("z^2 + c");
//! assert_eq!(kernel.calls(), vec!["computePower", "add"]);
//! assert!(kernel.to_source().starts_with("z_r = +z_r;\n"));
//!
//! let evaluator = Evaluator::new(&kernel).unwrap();
//! let z = evaluator.eval(Complex::real(2.0), Complex::ZERO);
//! assert_eq!(z, Complex::real(4.0));
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod kernel;
pub mod nodecodes;
pub mod parser;
pub mod render;

// === Re-exports для удобства ===
pub use ast::Node;
pub use compiler::{compile, compile_source, compile_with};
pub use config::{CompileOptions, FractalConfig, RawLeafPolicy};
pub use engine::{escape_counts, EngineConfig, IterationMode, Viewport};
pub use error::{KernelError, KernelResult};
pub use kernel::{Complex, Evaluator, Kernel};
pub use nodecodes::{BinaryOp, Function, SymbolKind};
pub use parser::{parse, parse_strict, ParseError};
pub use render::{colorize, render_fractal, write_ppm, Gradient, Rgb};
