//! Исполнитель ядра: эталонная реализация примитивов над `f64`.
//!
//! Регистры `outR`/`outI` и все слоты обнуляются перед каждым вызовом,
//! поэтому ядро с пропущенным листом даёт детерминированный результат.

use super::complex::Complex;
use super::{Instr, Kernel, SlotId};
use crate::error::{KernelError, KernelResult};
use crate::nodecodes::{BinaryOp, Function, SymbolKind};

/// Подготовленная инструкция с уже разобранными литералами.
#[derive(Debug, Clone, Copy)]
enum Op {
    Load(Complex),
    LoadIterate,
    LoadParameter,
    Store(usize),
    Binary(BinaryOp, usize, usize),
    Unary(Function, usize),
}

/// Исполнитель одного ядра. Неизменяем и может разделяться между потоками.
#[derive(Debug, Clone)]
pub struct Evaluator {
    ops: Vec<Op>,
    slot_count: usize,
}

impl Evaluator {
    /// Подготовить ядро к исполнению.
    pub fn new(kernel: &Kernel) -> KernelResult<Self> {
        let slot_count = kernel.slot_count();
        let ops = kernel
            .instructions()
            .iter()
            .map(|instr| prepare(instr, slot_count))
            .collect::<KernelResult<Vec<_>>>()?;
        Ok(Self { ops, slot_count })
    }

    /// Буфер слотов подходящего размера для [`Evaluator::eval_with`].
    pub fn scratch(&self) -> Vec<Complex> {
        vec![Complex::ZERO; self.slot_count]
    }

    /// Вычислить ядро для `z` и `c`.
    pub fn eval(&self, z: Complex, c: Complex) -> Complex {
        let mut slots = self.scratch();
        self.eval_with(&mut slots, z, c)
    }

    /// Вычислить ядро, используя внешний буфер слотов.
    ///
    /// Буфер обнуляется и приводится к числу слотов ядра, поэтому подходит
    /// любой, но [`Evaluator::scratch`] не требует перевыделения.
    pub fn eval_with(&self, slots: &mut Vec<Complex>, z: Complex, c: Complex) -> Complex {
        slots.clear();
        slots.resize(self.slot_count, Complex::ZERO);
        let mut out = Complex::ZERO;

        for op in &self.ops {
            match *op {
                Op::Load(value) => out = value,
                Op::LoadIterate => out = z,
                Op::LoadParameter => out = c,
                Op::Store(slot) => slots[slot] = out,
                Op::Binary(op, lhs, rhs) => out = apply_binary(op, slots[lhs], slots[rhs]),
                Op::Unary(func, arg) => out = apply_unary(func, slots[arg]),
            }
        }

        out
    }
}

/// Индекс слота, проверенный по размеру арены.
fn slot_index(slot: SlotId, slot_count: usize) -> KernelResult<usize> {
    if slot.0 < slot_count {
        Ok(slot.0)
    } else {
        Err(KernelError::InvalidSlot(slot.0))
    }
}

fn prepare(instr: &Instr, slot_count: usize) -> KernelResult<Op> {
    Ok(match instr {
        Instr::LoadLiteral(text) => {
            let value = text
                .parse::<f64>()
                .map_err(|_| KernelError::InvalidLiteral(text.clone()))?;
            Op::Load(Complex::real(value))
        }
        Instr::LoadSymbol(SymbolKind::Iterate) => Op::LoadIterate,
        Instr::LoadSymbol(SymbolKind::Parameter) => Op::LoadParameter,
        Instr::LoadSymbol(SymbolKind::ImagUnit) => Op::Load(Complex::I),
        Instr::LoadSymbol(SymbolKind::NegImagUnit) => Op::Load(-Complex::I),
        Instr::Store { slot, .. } => Op::Store(slot_index(*slot, slot_count)?),
        Instr::Binary { op, lhs, rhs } => Op::Binary(
            *op,
            slot_index(*lhs, slot_count)?,
            slot_index(*rhs, slot_count)?,
        ),
        Instr::Unary { func, arg } => Op::Unary(*func, slot_index(*arg, slot_count)?),
    })
}

/// Бинарные примитивы: `add`, `subtract`, `multiply`, `divide`, `computePower`.
pub fn apply_binary(op: BinaryOp, a: Complex, b: Complex) -> Complex {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Pow => a.powc(b),
    }
}

/// Унарные примитивы `compute_<функция>`.
pub fn apply_unary(func: Function, z: Complex) -> Complex {
    match func {
        Function::Real => Complex::real(z.re),
        Function::Imag => Complex::real(z.im),
        Function::Abs => Complex::real(z.abs()),
        Function::Arg => Complex::real(z.arg()),
        Function::Sin => z.sin(),
        Function::Cos => z.cos(),
        Function::Sh => z.sinh(),
        Function::Ch => z.cosh(),
        Function::Exp => z.exp(),
        Function::Ln => z.ln(),
        Function::Conj => z.conj(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{generate, Slot, SlotRole};
    use crate::parser::parse;

    fn eval(text: &str, z: Complex, c: Complex) -> Complex {
        let kernel = generate(&parse(text));
        Evaluator::new(&kernel).unwrap().eval(z, c)
    }

    fn close(a: Complex, b: Complex) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mandelbrot_step() {
        let out = eval("z^2+c", Complex::real(2.0), Complex::ZERO);
        assert_eq!(out, Complex::real(4.0));

        let out = eval("z^2+c", Complex::new(1.0, 1.0), Complex::new(0.5, -0.5));
        assert_eq!(out, Complex::new(0.5, 1.5));
    }

    #[test]
    fn test_literal_only() {
        for text in ["7", "0.125", "-3"] {
            let value: f64 = text.parse().unwrap();
            assert_eq!(eval(text, Complex::I, Complex::I), Complex::real(value));
        }
    }

    #[test]
    fn test_imaginary_units() {
        assert_eq!(eval("i*i", Complex::ZERO, Complex::ZERO), Complex::real(-1.0));
        assert_eq!(eval("z*-i", Complex::I, Complex::ZERO), Complex::ONE);
    }

    #[test]
    fn test_left_leaning_subtraction() {
        // (10-4)-3, а не 10-(4-3)
        assert_eq!(eval("10-4-3", Complex::ZERO, Complex::ZERO), Complex::real(3.0));
        assert_eq!(eval("8/4/2", Complex::ZERO, Complex::ZERO), Complex::real(1.0));
    }

    #[test]
    fn test_functions() {
        let z = Complex::new(0.4, -1.2);
        assert!(close(eval("real(z)", z, Complex::ZERO), Complex::real(0.4)));
        assert!(close(eval("imag(z)", z, Complex::ZERO), Complex::real(-1.2)));
        assert!(close(eval("abs(z)", z, Complex::ZERO), Complex::real(z.abs())));
        assert!(close(eval("arg(z)", z, Complex::ZERO), Complex::real(z.arg())));
        assert!(close(eval("conj(z)", z, Complex::ZERO), Complex::new(0.4, 1.2)));
        assert!(close(eval("ln(exp(z))", z, Complex::ZERO), z));
        assert!(close(eval("sh(z)", z, Complex::ZERO), z.sinh()));
        assert!(close(eval("ch(z)", z, Complex::ZERO), z.cosh()));
        assert!(close(
            eval("sin(z)^2+cos(z)^2", z, Complex::ZERO),
            Complex::ONE
        ));
    }

    #[test]
    fn test_division_by_zero_is_not_a_panic() {
        let out = eval("1/z", Complex::ZERO, Complex::ZERO);
        assert!(!out.re.is_finite() || !out.im.is_finite());
    }

    #[test]
    fn test_raw_leaf_reads_previous_output() {
        // Лист "foo" ничего не пишет, в правый слот копируется z
        let out = eval("z+foo", Complex::real(3.0), Complex::ZERO);
        assert_eq!(out, Complex::real(6.0));
    }

    #[test]
    fn test_scratch_reuse_is_clean() {
        let kernel = generate(&parse("z*c+1"));
        let evaluator = Evaluator::new(&kernel).unwrap();
        let mut scratch = evaluator.scratch();
        let first = evaluator.eval_with(&mut scratch, Complex::real(2.0), Complex::real(3.0));
        let second = evaluator.eval_with(&mut scratch, Complex::real(2.0), Complex::real(3.0));
        assert_eq!(first, Complex::real(7.0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_literal_rejected() {
        let kernel = Kernel::new(
            Vec::new(),
            vec![
                Instr::LoadLiteral("1e".into()),
                Instr::Store {
                    slot: SlotId(0),
                    coerce: true,
                },
            ],
        );
        assert!(matches!(
            Evaluator::new(&kernel),
            Err(KernelError::InvalidLiteral(text)) if text == "1e"
        ));
    }

    #[test]
    fn test_missing_slot_rejected() {
        let store = Kernel::new(
            Vec::new(),
            vec![
                Instr::LoadSymbol(SymbolKind::Iterate),
                Instr::Store {
                    slot: SlotId(3),
                    coerce: true,
                },
            ],
        );
        assert!(matches!(
            Evaluator::new(&store),
            Err(KernelError::InvalidSlot(3))
        ));

        let slots = vec![Slot {
            id: SlotId(0),
            role: SlotRole::Left(BinaryOp::Add),
        }];
        let binary = Kernel::new(
            slots.clone(),
            vec![Instr::Binary {
                op: BinaryOp::Add,
                lhs: SlotId(0),
                rhs: SlotId(1),
            }],
        );
        assert!(matches!(
            Evaluator::new(&binary),
            Err(KernelError::InvalidSlot(1))
        ));

        let unary = Kernel::new(
            slots,
            vec![Instr::Unary {
                func: Function::Exp,
                arg: SlotId(7),
            }],
        );
        assert!(matches!(
            Evaluator::new(&unary),
            Err(KernelError::InvalidSlot(7))
        ));
    }

    #[test]
    fn test_foreign_buffer_is_resized() {
        let evaluator = Evaluator::new(&generate(&parse("z*c+1"))).unwrap();
        let mut empty = Vec::new();
        let mut oversized = vec![Complex::I; 64];
        let z = Complex::real(2.0);
        let c = Complex::real(3.0);
        assert_eq!(evaluator.eval_with(&mut empty, z, c), Complex::real(7.0));
        assert_eq!(evaluator.eval_with(&mut oversized, z, c), Complex::real(7.0));
        assert_eq!(oversized.len(), evaluator.scratch().len());
    }
}
