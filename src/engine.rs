//! Модуль `engine`
//!
//! Эталонный исполнитель escape-time: для каждого пикселя многократно
//! вычисляет ядро и записывает число итераций до выхода за радиус.
//!
//! Строки сетки делятся между потоками через `std::thread::scope`.
//! [`Evaluator`] неизменяем, поэтому разделяется без блокировок;
//! каждый поток держит свой буфер слотов.

use std::num::NonZeroUsize;
use std::thread;

use log::debug;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::kernel::{Complex, Evaluator};

/// Какая величина берётся из координаты пикселя.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IterationMode {
    /// Пиксель задаёт `c`, итерация начинается с `z = 0`.
    #[default]
    Mandelbrot,
    /// Пиксель задаёт начальное `z`, параметр `c` фиксирован.
    Julia { c: Complex },
}

/// Видимая область комплексной плоскости.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Точка в центре изображения.
    pub center: Complex,
    /// Ширина области по действительной оси.
    pub span: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: Complex::new(-0.5, 0.0),
            span: 3.0,
        }
    }
}

impl Viewport {
    /// Координата пикселя. Строка 0 — верх изображения, мнимая ось вверх.
    pub fn point(&self, row: usize, col: usize, width: usize, height: usize) -> Complex {
        let scale = self.span / width.saturating_sub(1).max(1) as f64;
        let x = col as f64 - (width as f64 - 1.0) / 2.0;
        let y = (height as f64 - 1.0) / 2.0 - row as f64;
        Complex::new(self.center.re + x * scale, self.center.im + y * scale)
    }
}

/// Параметры итерации.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    /// Предел итераций; он же значение-метка для точек, которые не ушли.
    pub max_iterations: u32,
    pub escape_radius: f64,
    pub mode: IterationMode,
    pub viewport: Viewport,
    /// Число потоков; 0 — по числу ядер.
    pub threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            max_iterations: 256,
            escape_radius: 2.0,
            mode: IterationMode::default(),
            viewport: Viewport::default(),
            threads: 0,
        }
    }
}

impl EngineConfig {
    fn worker_count(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }
}

/// Число итераций до выхода `|z|` за `escape_radius`.
///
/// Возвращает `max_iterations`, если точка не ушла. NaN считается ушедшим.
pub fn escape_count(
    evaluator: &Evaluator,
    scratch: &mut Vec<Complex>,
    z0: Complex,
    c: Complex,
    max_iterations: u32,
    escape_radius: f64,
) -> u32 {
    let limit = escape_radius * escape_radius;
    let mut z = z0;
    for n in 0..max_iterations {
        z = evaluator.eval_with(scratch, z, c);
        let norm = z.norm_sqr();
        if norm > limit || norm.is_nan() {
            return n;
        }
    }
    max_iterations
}

/// Посчитать сетку чисел итераций для всего изображения.
pub fn escape_counts(evaluator: &Evaluator, config: &EngineConfig) -> KernelResult<Array2<u32>> {
    if config.width == 0 || config.height == 0 {
        return Err(KernelError::EmptyGrid);
    }

    let workers = config.worker_count().min(config.height);
    let rows_per_worker = config.height.div_ceil(workers);
    debug!(
        "escape counts {}x{}, {} workers, {} rows each",
        config.width, config.height, workers, rows_per_worker
    );

    let mut grid = Array2::<u32>::zeros((config.height, config.width));
    thread::scope(|scope| {
        for (chunk_index, mut chunk) in grid
            .axis_chunks_iter_mut(Axis(0), rows_per_worker)
            .enumerate()
        {
            scope.spawn(move || {
                let first_row = chunk_index * rows_per_worker;
                let mut scratch = evaluator.scratch();
                for ((row, col), cell) in chunk.indexed_iter_mut() {
                    let point = config
                        .viewport
                        .point(first_row + row, col, config.width, config.height);
                    let (z0, c) = match config.mode {
                        IterationMode::Mandelbrot => (Complex::ZERO, point),
                        IterationMode::Julia { c } => (point, c),
                    };
                    *cell = escape_count(
                        evaluator,
                        &mut scratch,
                        z0,
                        c,
                        config.max_iterations,
                        config.escape_radius,
                    );
                }
            });
        }
    });

    Ok(grid)
}
