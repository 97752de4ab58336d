//! Модуль `compiler`
//!
//! Архитектура frontend/backend в fractalc:
//! - Frontend: разбор текста в дерево ([`crate::parser`])
//! - Backend: генерация ядра ([`crate::kernel::codegen`])
//!
//! Компилятор не хранит состояния между вызовами: счётчик слотов живёт
//! внутри одного вызова, поэтому функции можно вызывать из любых потоков.

use log::{debug, warn};

use crate::config::{CompileOptions, RawLeafPolicy};
use crate::error::KernelResult;
use crate::kernel::{generate, Kernel};
use crate::parser::{parse, parse_strict, parse_with_diagnostics};

/// Скомпилировать выражение в ядро.
///
/// Нераспознанные фрагменты молча пропускаются, поэтому функция никогда
/// не завершается ошибкой. Текст ядра совместим с asm.js-исполнителем.
pub fn compile(source: &str) -> Kernel {
    generate(&parse(source))
}

/// Скомпилировать выражение и сразу получить текст ядра.
pub fn compile_source(source: &str) -> String {
    compile(source).to_source()
}

/// Скомпилировать выражение с заданной политикой ошибок.
///
/// В строгом режиме первый нераспознанный фрагмент возвращается как
/// [`crate::KernelError::Parse`].
pub fn compile_with(source: &str, options: &CompileOptions) -> KernelResult<Kernel> {
    debug!("compiling '{}' ({:?})", source, options.raw_leaf);

    let ast = match options.raw_leaf {
        RawLeafPolicy::Strict => parse_strict(source)?,
        RawLeafPolicy::Compat => {
            let (ast, diagnostics) = parse_with_diagnostics(source);
            for diagnostic in &diagnostics {
                warn!("{}", diagnostic);
            }
            let skipped = ast.raw_leaves();
            if !skipped.is_empty() {
                warn!(
                    "kernel for '{}' skips {} unrecognized leaves: {:?}",
                    source,
                    skipped.len(),
                    skipped
                );
            }
            ast
        }
    };

    Ok(generate(&ast))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KernelError;
    use crate::parser::ParseError;

    #[test]
    fn test_compile_is_pure() {
        let text = "sin(z)^3 + c*(z - i)";
        assert_eq!(compile_source(text), compile_source(text));
    }

    #[test]
    fn test_compat_matches_plain_compile() {
        let text = "z^2 + foo";
        let kernel = compile_with(text, &CompileOptions::default()).unwrap();
        assert_eq!(kernel, compile(text));
    }

    #[test]
    fn test_strict_reports_unrecognized_token() {
        let err = compile_with("z^2 + foo", &CompileOptions::strict()).unwrap_err();
        assert!(matches!(
            err,
            KernelError::Parse(ParseError::UnrecognizedToken { ref text, .. }) if text == "foo"
        ));
        assert_eq!(
            err.to_string(),
            "Parse error: Unrecognized token 'foo' at position 4"
        );
    }

    #[test]
    fn test_strict_accepts_well_formed() {
        let kernel = compile_with("exp(z)*c", &CompileOptions::strict()).unwrap();
        assert_eq!(kernel.calls(), vec!["compute_exp", "multiply"]);
    }

    #[test]
    fn test_concurrent_compiles_agree() {
        let expected = compile_source("z^3 - c/z");
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| compile_source("z^3 - c/z")))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
