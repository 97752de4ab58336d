//! fractalc CLI - интерактивная оболочка и компилятор выражений.
//!
//! Использование:
//!   fractalc                                   - запустить REPL
//!   fractalc -e "expr"                         - напечатать ядро
//!   fractalc --ast "expr"                      - напечатать дерево (JSON)
//!   fractalc --render <config.json> <out.ppm>  - отрисовать фрактал
//!   fractalc --help                            - справка

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::process;

use fractalc::{
    compile_with, parse, render_fractal, write_ppm, CompileOptions, Complex, Evaluator,
    FractalConfig, KernelResult, RawLeafPolicy,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = r#"
fractalc - escape-time fractal expression compiler

USAGE:
    fractalc                                   Start REPL (interactive mode)
    fractalc -e "<expr>"                       Print the kernel for an expression
    fractalc --ast "<expr>"                    Print the expression tree as JSON
    fractalc --render <config.json> <out.ppm>  Render a fractal to a PPM image
    fractalc --help, -h                        Show this help
    fractalc --version, -v                     Show version

OPTIONS:
    --compat                 Silently skip unrecognized fragments (-e and REPL)

REPL COMMANDS:
    :help, :h                Show help
    :quit, :q, :exit         Exit REPL
    :ast <expr>              Show expression tree
    :json <expr>             Show expression tree as JSON
    :kernel <expr>           Show kernel text (same as a bare line)
    :eval <expr> <z> <c>     Evaluate one step, numbers as re,im
    :strict                  Reject unrecognized fragments (default)
    :compat                  Silently skip unrecognized fragments

EXAMPLES:
    fractalc -e "z^2 + c"
    fractalc --ast "sin(z) * c"
    fractalc --render mandelbrot.json mandelbrot.ppm

SYNTAX:
    z^2 + c                  ; operators + - * / ^
    sin(z) * c               ; real imag abs arg sin cos sh ch exp ln conj
    (z - 1) / (z + i)        ; parentheses, imaginary unit i and -i
"#;

fn main() {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut options = CompileOptions::strict();
    if let Some(pos) = args.iter().position(|arg| arg == "--compat") {
        args.remove(pos);
        options.raw_leaf = RawLeafPolicy::Compat;
    }

    match args.as_slice() {
        [] => run_repl(options),
        [flag] => match flag.as_str() {
            "--help" | "-h" => println!("{}", HELP),
            "--version" | "-v" => println!("fractalc {}", VERSION),
            other => fail(&format!("Unknown option: {}", other)),
        },
        [flag, expr] if flag == "-e" || flag == "--emit" => run_expr(expr, &options),
        [flag, expr] if flag == "--ast" => print_json(expr),
        [flag, config, out] if flag == "--render" => run_render(config, out),
        [flag, ..] => fail(&format!("Unknown option or wrong arguments: {}", flag)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    eprintln!("Use --help for usage information.");
    process::exit(1);
}

/// Напечатать ядро выражения.
fn run_expr(expr: &str, options: &CompileOptions) {
    match compile_with(expr, options) {
        Ok(kernel) => print!("{}", kernel),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// Отрисовать фрактал по файлу конфигурации.
fn run_render(config_path: &str, out_path: &str) {
    if let Err(e) = render_to_file(config_path, out_path) {
        eprintln!("Render failed: {}", e);
        process::exit(1);
    }
    println!("Wrote {}", out_path);
}

fn render_to_file(config_path: &str, out_path: &str) -> KernelResult<()> {
    let config = FractalConfig::from_file(config_path)?;
    let image = render_fractal(&config)?;
    let file = File::create(out_path)?;
    write_ppm(&image, BufWriter::new(file))
}

/// Запустить REPL.
fn run_repl(mut options: CompileOptions) {
    println!("fractalc {} - fractal expression compiler", VERSION);
    println!("Type :help for commands, :quit to exit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            process::exit(1);
        }
    };

    let history_path = dirs_next::data_dir()
        .map(|p| p.join("fractalc").join("history.txt"))
        .unwrap_or_else(|| std::path::PathBuf::from(".fractalc_history"));

    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline("fractalc> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with(':') {
                    match handle_command(line, &mut options) {
                        CommandResult::Continue => continue,
                        CommandResult::Exit => break,
                    }
                }

                show_kernel(line, &options);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_path);
}

enum CommandResult {
    Continue,
    Exit,
}

fn handle_command(cmd: &str, options: &mut CompileOptions) -> CommandResult {
    let (command, arg) = match cmd.split_once(' ') {
        Some((command, arg)) => (command, Some(arg.trim())),
        None => (cmd, None),
    };

    match (command, arg) {
        (":help" | ":h", _) => println!("{}", HELP),
        (":quit" | ":q" | ":exit", _) => return CommandResult::Exit,
        (":strict", _) => {
            options.raw_leaf = RawLeafPolicy::Strict;
            println!("Strict mode: unrecognized fragments are errors.");
        }
        (":compat", _) => {
            options.raw_leaf = RawLeafPolicy::Compat;
            println!("Compat mode: unrecognized fragments are skipped.");
        }
        (":ast", Some(expr)) => println!("{}", parse(expr)),
        (":json", Some(expr)) => print_json(expr),
        (":kernel" | ":k", Some(expr)) => show_kernel(expr, options),
        (":eval", Some(rest)) => eval_step(rest, options),
        (":ast" | ":json" | ":kernel" | ":k", None) => {
            println!("Usage: {} <expression>", command);
        }
        (":eval", None) => println!("Usage: :eval <expr> <z> <c>"),
        _ => {
            println!("Unknown command: {}", command);
            println!("Type :help for available commands.");
        }
    }
    CommandResult::Continue
}

fn show_kernel(expr: &str, options: &CompileOptions) {
    match compile_with(expr, options) {
        Ok(kernel) => print!("{}", kernel),
        Err(e) => eprintln!("{}", e),
    }
}

fn print_json(expr: &str) {
    match serde_json::to_string_pretty(&parse(expr)) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Serialization error: {}", e),
    }
}

/// `:eval <expr> <z> <c>`: последние два слова — числа, остальное — выражение.
fn eval_step(rest: &str, options: &CompileOptions) {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let [expr_words @ .., z, c] = words.as_slice() else {
        println!("Usage: :eval <expr> <z> <c>");
        return;
    };
    if expr_words.is_empty() {
        println!("Usage: :eval <expr> <z> <c>");
        return;
    }
    let (Some(z), Some(c)) = (parse_complex(z), parse_complex(c)) else {
        eprintln!("Numbers must look like 1.5 or 1.5,-2");
        return;
    };

    let expr = expr_words.join(" ");
    let result = compile_with(&expr, options).and_then(|kernel| Evaluator::new(&kernel));
    match result {
        Ok(evaluator) => println!("{}", evaluator.eval(z, c)),
        Err(e) => eprintln!("{}", e),
    }
}

/// Разобрать `re` или `re,im`.
fn parse_complex(text: &str) -> Option<Complex> {
    match text.split_once(',') {
        Some((re, im)) => Some(Complex::new(re.parse().ok()?, im.parse().ok()?)),
        None => text.parse().ok().map(Complex::real),
    }
}
