//! Генерация ядра из дерева выражения.
//!
//! Прямой структурный перевод без оптимизаций: каждый узел оставляет
//! результат в `outR`/`outI`, бинарная операция копирует результаты
//! операндов в свежие слоты и вызывает примитив.

use log::{debug, warn};

use super::{Instr, Kernel, Slot, SlotId, SlotRole};
use crate::ast::Node;

/// Состояние генерации для одного вызова компилятора.
#[derive(Debug, Default)]
pub struct Emitter {
    slots: Vec<Slot>,
    instructions: Vec<Instr>,
}

impl Emitter {
    /// Создать пустое состояние.
    pub fn new() -> Self {
        Self::default()
    }

    /// Выделить новый слот. Слоты никогда не переиспользуются.
    fn allocate(&mut self, role: SlotRole) -> SlotId {
        let id = SlotId(self.slots.len());
        self.slots.push(Slot { id, role });
        id
    }

    fn push(&mut self, instr: Instr) {
        self.instructions.push(instr);
    }

    /// Сгенерировать инструкции для узла и его потомков.
    pub fn emit(&mut self, node: &Node) {
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || self.emit_node(node))
    }

    fn emit_node(&mut self, node: &Node) {
        match node {
            Node::Literal { text } => self.push(Instr::LoadLiteral(text.clone())),
            Node::Symbol { symbol } => self.push(Instr::LoadSymbol(*symbol)),
            Node::RawLeaf { text } => {
                warn!("skipping unrecognized leaf '{}': kernel output is undefined", text);
            }
            Node::BinaryOp { op, left, right } => {
                // Правый слот выделяется только после обхода левого поддерева
                let lhs = self.allocate(SlotRole::Left(*op));
                self.emit(left);
                self.push(Instr::Store {
                    slot: lhs,
                    coerce: true,
                });

                let rhs = self.allocate(SlotRole::Right(*op));
                self.emit(right);
                self.push(Instr::Store {
                    slot: rhs,
                    coerce: true,
                });

                self.push(Instr::Binary { op: *op, lhs, rhs });
            }
            Node::UnaryFunc { func, operand } => {
                let arg = self.allocate(SlotRole::Argument(*func));
                self.emit(operand);
                self.push(Instr::Store {
                    slot: arg,
                    coerce: false,
                });
                self.push(Instr::Unary { func: *func, arg });
            }
        }
    }

    /// Завершить генерацию.
    pub fn finish(self) -> Kernel {
        debug!(
            "kernel: {} slots, {} instructions",
            self.slots.len(),
            self.instructions.len()
        );
        Kernel::new(self.slots, self.instructions)
    }
}

/// Сгенерировать ядро для дерева выражения.
pub fn generate(ast: &Node) -> Kernel {
    let mut emitter = Emitter::new();
    emitter.emit(ast);
    emitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodecodes::{BinaryOp, Function, SymbolKind};

    const HEADER: &str = "z_r = +z_r;\nz_i = +z_i;\nc_r = +c_r;\nc_i = +c_i;\n";

    #[test]
    fn test_literal_kernel() {
        let kernel = generate(&Node::literal("3.5"));
        assert_eq!(kernel.slot_count(), 0);
        assert_eq!(
            kernel.to_source(),
            format!("{}outR = +3.5;\noutI = +0;\n", HEADER)
        );
    }

    #[test]
    fn test_mandelbrot_kernel_text() {
        let ast = Node::binary(
            BinaryOp::Add,
            Node::binary(
                BinaryOp::Pow,
                Node::symbol(SymbolKind::Iterate),
                Node::literal("2"),
            ),
            Node::symbol(SymbolKind::Parameter),
        );
        let expected = [
            HEADER,
            "var __r0 = 0.0;\nvar __i0 = 0.0;\n",
            "var __r1 = 0.0;\nvar __i1 = 0.0;\n",
            "var __r2 = 0.0;\nvar __i2 = 0.0;\n",
            "var __r3 = 0.0;\nvar __i3 = 0.0;\n",
            "outR = +z_r;\noutI = +z_i;\n",
            "__r1 = +outR;\n__i1 = +outI;\n",
            "outR = +2;\noutI = +0;\n",
            "__r2 = +outR;\n__i2 = +outI;\n",
            "computePower(__r1, __i1, __r2, __i2);\n",
            "__r0 = +outR;\n__i0 = +outI;\n",
            "outR = +c_r;\noutI = +c_i;\n",
            "__r3 = +outR;\n__i3 = +outI;\n",
            "add(__r0, __i0, __r3, __i3);\n",
        ]
        .concat();

        let kernel = generate(&ast);
        assert_eq!(kernel.to_source(), expected);
        assert_eq!(kernel.calls(), vec!["computePower", "add"]);
    }

    #[test]
    fn test_unary_store_without_coercion() {
        let kernel = generate(&Node::unary(
            Function::Conj,
            Node::symbol(SymbolKind::ImagUnit),
        ));
        assert_eq!(
            kernel.to_source(),
            format!(
                "{}var __r0 = 0.0;\nvar __i0 = 0.0;\noutR = 0.0;\noutI = 1.0;\n__r0 = outR;\n__i0 = outI;\ncompute_conj(__r0, __i0);\n",
                HEADER
            )
        );
        assert_eq!(kernel.slots()[0].role, SlotRole::Argument(Function::Conj));
    }

    #[test]
    fn test_raw_leaf_emits_nothing() {
        let kernel = generate(&Node::binary(
            BinaryOp::Mul,
            Node::raw("foo"),
            Node::literal("2"),
        ));
        assert_eq!(kernel.slot_count(), 2);
        assert_eq!(
            kernel.instructions()[0],
            Instr::Store {
                slot: SlotId(0),
                coerce: true
            }
        );
    }

    #[test]
    fn test_slots_are_never_reused() {
        let ast = crate::parser::parse("sin(z)*cos(z)+exp(c)-ln(z)");
        let kernel = generate(&ast);
        let ids: Vec<usize> = kernel.slots().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, (0..kernel.slot_count()).collect::<Vec<_>>());
        // 3 бинарные операции по 2 слота + 4 функции по одному
        assert_eq!(kernel.slot_count(), 10);
    }
}
