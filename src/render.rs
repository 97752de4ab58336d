//! Модуль `render`
//!
//! Раскраска сетки чисел итераций градиентом по гистограмме.
//!
//! Границы градиента подбираются так, чтобы каждой из них соответствовал
//! хотя бы 1% пикселей: случайные единичные значения не растягивают шкалу.
//! Точки со значением-меткой (`max_iterations`) красятся внутренним цветом.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::compiler::compile_with;
use crate::config::FractalConfig;
use crate::engine::escape_counts;
use crate::error::{KernelError, KernelResult};
use crate::kernel::Evaluator;

/// 24-битный цвет.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Линейная интерполяция к `other` с интенсивностью `0..=255`.
    pub fn lerp(self, other: Rgb, intensity: u8) -> Rgb {
        let channel = |from: u8, to: u8| -> u8 {
            let delta = i32::from(to) - i32::from(from);
            let step = (delta * i32::from(intensity)).div_euclid(255);
            (i32::from(from) + step) as u8
        };
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }
}

impl FromStr for Rgb {
    type Err = KernelError;

    /// Разобрать `#rrggbb` (решётка необязательна).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(KernelError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| KernelError::InvalidColor(s.to_string()))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> String {
        rgb.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Градиент из трёх цветов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gradient {
    /// Цвет нижней границы.
    pub low: Rgb,
    /// Цвет верхней границы.
    pub high: Rgb,
    /// Цвет точек, которые не ушли.
    pub interior: Rgb,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            low: Rgb::new(0x00, 0x00, 0x33),
            high: Rgb::new(0xff, 0xcc, 0x00),
            interior: Rgb::new(0x00, 0x00, 0x00),
        }
    }
}

/// Значения итераций, соответствующие крайним цветам градиента.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

/// Гистограмма значений сетки.
pub fn histogram(grid: &Array2<u32>) -> BTreeMap<u32, usize> {
    let mut counts = BTreeMap::new();
    for &value in grid.iter() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Подобрать границы градиента.
///
/// Порог — `⌊ячеек·1%⌋`, для сетки N×N это `⌊N²·1%⌋`; неквадратная
/// сетка считается по всем ячейкам, а не по числу строк. `min` — наименьшее значение, для которого
/// число ячеек `≤ min` достигает порога; `max` — наибольшее значение
/// без метки, для которого число таких ячеек `≥ max` достигает порога.
pub fn color_bounds(grid: &Array2<u32>, max_iterations: u32) -> KernelResult<Bounds> {
    if grid.is_empty() {
        return Err(KernelError::EmptyGrid);
    }

    let counts = histogram(grid);
    let threshold = grid.len() / 100;

    let min = accumulate_until(counts.iter(), threshold)
        .or_else(|| counts.keys().next().copied())
        .ok_or(KernelError::EmptyGrid)?;

    let escaped = counts.iter().filter(|(value, _)| **value != max_iterations);
    let max = accumulate_until(escaped.clone().rev(), threshold)
        .or_else(|| escaped.map(|(value, _)| *value).next())
        .unwrap_or(min)
        .max(min);

    debug!("color bounds: threshold {}, min {}, max {}", threshold, min, max);
    Ok(Bounds { min, max })
}

/// Первое значение, на котором накопленное число ячеек достигает порога.
fn accumulate_until<'a>(
    entries: impl Iterator<Item = (&'a u32, &'a usize)>,
    threshold: usize,
) -> Option<u32> {
    let mut total = 0;
    for (value, count) in entries {
        total += count;
        if total >= threshold {
            return Some(*value);
        }
    }
    None
}

/// Таблица цветов для значений `0..=max` плюс внутренний цвет.
#[derive(Debug, Clone)]
pub struct GradientTable {
    entries: Vec<Rgb>,
    interior: Rgb,
    max_iterations: u32,
}

impl GradientTable {
    /// Построить таблицу для найденных границ.
    pub fn build(bounds: Bounds, gradient: &Gradient, max_iterations: u32) -> Self {
        let entries = (0..=bounds.max)
            .map(|value| gradient.low.lerp(gradient.high, intensity(value, bounds)))
            .collect();
        Self {
            entries,
            interior: gradient.interior,
            max_iterations,
        }
    }

    /// Количество цветов градиента (без внутреннего).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Цвет для числа итераций.
    ///
    /// Значения за концом таблицы получают последний цвет градиента.
    pub fn lookup(&self, value: u32) -> KernelResult<Rgb> {
        if value == self.max_iterations {
            return Ok(self.interior);
        }
        let index = (value as usize).min(self.entries.len().saturating_sub(1));
        self.entries
            .get(index)
            .copied()
            .ok_or(KernelError::GradientLookup(index))
    }
}

/// Интенсивность `0..=255` значения между границами.
fn intensity(value: u32, bounds: Bounds) -> u8 {
    if bounds.max <= bounds.min {
        return 0;
    }
    let clamped = value.clamp(bounds.min, bounds.max);
    let scaled = 255 * u64::from(clamped - bounds.min) / u64::from(bounds.max - bounds.min);
    scaled as u8
}

/// Раскрасить сетку.
pub fn colorize(
    grid: &Array2<u32>,
    max_iterations: u32,
    gradient: &Gradient,
) -> KernelResult<Array2<Rgb>> {
    let bounds = color_bounds(grid, max_iterations)?;
    let table = GradientTable::build(bounds, gradient, max_iterations);

    let mut image = Array2::from_elem(grid.dim(), gradient.interior);
    for (pixel, &value) in image.iter_mut().zip(grid.iter()) {
        *pixel = table.lookup(value)?;
    }
    Ok(image)
}

/// Записать изображение в двоичном формате PPM (P6).
pub fn write_ppm(image: &Array2<Rgb>, mut out: impl Write) -> KernelResult<()> {
    let (height, width) = image.dim();
    write!(out, "P6\n{} {}\n255\n", width, height)?;
    let mut bytes = Vec::with_capacity(width * height * 3);
    for pixel in image.iter() {
        bytes.extend_from_slice(&[pixel.r, pixel.g, pixel.b]);
    }
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

/// Полный конвейер: компиляция, итерация, раскраска.
pub fn render_fractal(config: &FractalConfig) -> KernelResult<Array2<Rgb>> {
    config.validate()?;
    let kernel = compile_with(&config.expression, &config.compile_options())?;
    let evaluator = Evaluator::new(&kernel)?;
    let grid = escape_counts(&evaluator, &config.engine)?;
    colorize(&grid, config.engine.max_iterations, &config.gradient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    const SENTINEL: u32 = 100;

    fn mostly_fives() -> Array2<u32> {
        let mut grid = Array2::from_elem((10, 10), 5u32);
        grid[[9, 9]] = 40;
        grid
    }

    #[test]
    fn test_rgb_parse_and_display() {
        let rgb: Rgb = "#1A2b3c".parse().unwrap();
        assert_eq!(rgb, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(rgb.to_string(), "#1a2b3c");
        assert_eq!("ffffff".parse::<Rgb>().unwrap(), Rgb::new(255, 255, 255));
        assert!(matches!("#12345".parse::<Rgb>(), Err(KernelError::InvalidColor(_))));
        assert!("#12345g".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_lerp_floors_toward_low() {
        let low = Rgb::new(200, 0, 10);
        let high = Rgb::new(0, 255, 10);
        assert_eq!(low.lerp(high, 0), low);
        assert_eq!(low.lerp(high, 255), high);
        // 200 + ⌊-200·128/255⌋ = 200 - 101
        assert_eq!(low.lerp(high, 128), Rgb::new(99, 128, 10));
    }

    #[test]
    fn test_min_resolves_to_dominant_value() {
        let bounds = color_bounds(&mostly_fives(), SENTINEL).unwrap();
        assert_eq!(bounds, Bounds { min: 5, max: 40 });
    }

    #[test]
    fn test_threshold_counts_all_cells_of_non_square_grid() {
        // 5x40 = 200 ячеек, порог 2; по числу строк (5²·1%) он был бы 0
        let mut grid = Array2::from_elem((5, 40), 10u32);
        grid[[0, 0]] = 1;
        grid[[1, 7]] = 2;
        grid[[2, 20]] = 40;
        grid[[4, 39]] = 50;
        let bounds = color_bounds(&grid, SENTINEL).unwrap();
        assert_eq!(bounds, Bounds { min: 2, max: 40 });

        // Та же сетка, повёрнутая на 40x5, даёт те же границы
        let bounds = color_bounds(&grid.t().to_owned(), SENTINEL).unwrap();
        assert_eq!(bounds, Bounds { min: 2, max: 40 });
    }

    #[test]
    fn test_sentinel_excluded_from_max() {
        let mut grid = Array2::from_elem((10, 10), SENTINEL);
        for col in 0..10 {
            grid[[0, col]] = 3 + col as u32;
        }
        let bounds = color_bounds(&grid, SENTINEL).unwrap();
        assert_eq!(bounds, Bounds { min: 3, max: 12 });
    }

    #[test]
    fn test_threshold_skips_outliers() {
        // 400 ячеек, порог 4: одиночные 1 и 90 не становятся границами
        let mut grid = Array2::from_elem((20, 20), 10u32);
        grid[[0, 0]] = 1;
        for col in 0..5 {
            grid[[1, col]] = 20;
        }
        grid[[2, 0]] = 90;
        let bounds = color_bounds(&grid, SENTINEL).unwrap();
        assert_eq!(bounds, Bounds { min: 10, max: 20 });
    }

    #[test]
    fn test_all_sentinel() {
        let grid = Array2::from_elem((4, 4), SENTINEL);
        let bounds = color_bounds(&grid, SENTINEL).unwrap();
        assert_eq!(bounds, Bounds { min: SENTINEL, max: SENTINEL });
        let image = colorize(&grid, SENTINEL, &Gradient::default()).unwrap();
        assert!(image.iter().all(|p| *p == Gradient::default().interior));
    }

    #[test]
    fn test_lookup_clamps_and_paints_interior() {
        let gradient = Gradient {
            low: Rgb::new(0, 0, 0),
            high: Rgb::new(255, 255, 255),
            interior: Rgb::new(1, 2, 3),
        };
        let table = GradientTable::build(Bounds { min: 2, max: 4 }, &gradient, SENTINEL);
        assert_eq!(table.len(), 5);
        assert_eq!(table.lookup(0).unwrap(), Rgb::new(0, 0, 0));
        assert_eq!(table.lookup(3).unwrap(), Rgb::new(127, 127, 127));
        assert_eq!(table.lookup(4).unwrap(), Rgb::new(255, 255, 255));
        assert_eq!(table.lookup(50).unwrap(), Rgb::new(255, 255, 255));
        assert_eq!(table.lookup(SENTINEL).unwrap(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_colorize_small_grid() {
        let grid = arr2(&[[0u32, 1], [2, SENTINEL]]);
        let gradient = Gradient {
            low: Rgb::new(0, 0, 0),
            high: Rgb::new(0, 0, 255),
            interior: Rgb::new(9, 9, 9),
        };
        let image = colorize(&grid, SENTINEL, &gradient).unwrap();
        assert_eq!(image[[0, 0]], Rgb::new(0, 0, 0));
        assert_eq!(image[[0, 1]], Rgb::new(0, 0, 127));
        assert_eq!(image[[1, 0]], Rgb::new(0, 0, 255));
        assert_eq!(image[[1, 1]], Rgb::new(9, 9, 9));
    }

    #[test]
    fn test_empty_grid() {
        let grid = Array2::<u32>::zeros((0, 0));
        assert!(matches!(color_bounds(&grid, SENTINEL), Err(KernelError::EmptyGrid)));
    }

    #[test]
    fn test_write_ppm() {
        let image = arr2(&[[Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]]);
        let mut out = Vec::new();
        write_ppm(&image, &mut out).unwrap();
        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_gradient_json() {
        let json = serde_json::to_string(&Gradient::default()).unwrap();
        assert_eq!(json, r##"{"low":"#000033","high":"#ffcc00","interior":"#000000"}"##);
        let back: Gradient = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Gradient::default());
    }

    #[test]
    fn test_render_fractal_pipeline() {
        let mut config = FractalConfig::default();
        config.engine.width = 12;
        config.engine.height = 10;
        config.engine.max_iterations = 32;
        let image = render_fractal(&config).unwrap();
        assert_eq!(image.dim(), (10, 12));
        assert!(image.iter().any(|&pixel| pixel == config.gradient.interior));
    }

    #[test]
    fn test_render_fractal_strict_rejects_garbage() {
        let config = FractalConfig {
            expression: "z^2 + foo".to_string(),
            ..FractalConfig::default()
        };
        assert!(matches!(
            render_fractal(&config),
            Err(KernelError::Parse(_))
        ));
    }
}
