//! Конфигурация компилятора и отрисовки.
//!
//! Файл конфигурации — JSON; любое поле можно опустить:
//!
//! ```json
//! {
//!   "expression": "z^2 + c",
//!   "raw_leaf": "strict",
//!   "engine": { "width": 800, "height": 800, "max_iterations": 500,
//!               "escape_radius": 2.0, "mode": { "kind": "mandelbrot" },
//!               "viewport": { "center": { "re": -0.5, "im": 0.0 }, "span": 3.0 },
//!               "threads": 0 },
//!   "gradient": { "low": "#000033", "high": "#ffcc00", "interior": "#000000" }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::error::{KernelError, KernelResult};
use crate::render::Gradient;

/// Что делать с фрагментами выражения, которые не удалось распознать.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawLeafPolicy {
    /// Молча пропустить: фрагмент не порождает инструкций.
    #[default]
    Compat,
    /// Вернуть ошибку с позицией фрагмента.
    Strict,
}

/// Параметры компиляции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompileOptions {
    pub raw_leaf: RawLeafPolicy,
}

impl CompileOptions {
    /// Строгий режим.
    pub fn strict() -> Self {
        Self {
            raw_leaf: RawLeafPolicy::Strict,
        }
    }
}

/// Полная конфигурация отрисовки фрактала.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalConfig {
    /// Выражение отображения.
    pub expression: String,
    pub raw_leaf: RawLeafPolicy,
    pub engine: EngineConfig,
    pub gradient: Gradient,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            expression: "z^2+c".to_string(),
            raw_leaf: RawLeafPolicy::Strict,
            engine: EngineConfig::default(),
            gradient: Gradient::default(),
        }
    }
}

impl FractalConfig {
    /// Разобрать конфигурацию из JSON.
    pub fn from_json(json: &str) -> KernelResult<Self> {
        let config: FractalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Загрузить конфигурацию из файла.
    pub fn from_file(path: impl AsRef<Path>) -> KernelResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Параметры компиляции.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            raw_leaf: self.raw_leaf,
        }
    }

    /// Проверить значения, которые JSON не ограничивает.
    pub fn validate(&self) -> KernelResult<()> {
        let engine = &self.engine;
        if engine.width == 0 || engine.height == 0 {
            return Err(KernelError::InvalidConfig(format!(
                "image size must be positive, got {}x{}",
                engine.width, engine.height
            )));
        }
        if engine.max_iterations == 0 {
            return Err(KernelError::InvalidConfig(
                "max_iterations must be positive".to_string(),
            ));
        }
        if !(engine.escape_radius.is_finite() && engine.escape_radius > 0.0) {
            return Err(KernelError::InvalidConfig(format!(
                "escape_radius must be a positive number, got {}",
                engine.escape_radius
            )));
        }
        if !(engine.viewport.span.is_finite() && engine.viewport.span > 0.0) {
            return Err(KernelError::InvalidConfig(format!(
                "viewport span must be a positive number, got {}",
                engine.viewport.span
            )));
        }
        Ok(())
    }
}
