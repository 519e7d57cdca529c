use clap::{error::ErrorKind, Args, Parser, Subcommand};
use dansk::{
    compiler, corpus,
    vm::{FrameLayout, Vm, VmConfig},
};

const USAGE: &str = "\
Usage:
    dansk help                    Print this message
    dansk run <program.dk>        Build program.dk and run in interpreter
    dansk test [filter]           Run tests
";

const CORPUS_FILE: &str = "tests/corpus/sprog.dk";
const CORPUS: &str = include_str!("../tests/corpus/sprog.dk");

#[derive(Debug, Parser)]
#[command(name = "dansk", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Help)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    Help,
    Run(RunArgs),
    Test(TestArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    file: String,
    /// Abort after this many executed instructions.
    #[arg(long)]
    max_steps: Option<u64>,
    /// Give every call frame 64 bytes of locals.
    #[arg(long)]
    fixed_frames: bool,
    /// Print the compiled program before running it.
    #[arg(long)]
    disassemble: bool,
}

impl RunArgs {
    fn vm_config(&self) -> VmConfig {
        VmConfig {
            frame_layout: if self.fixed_frames {
                FrameLayout::COMPATIBLE
            } else {
                FrameLayout::Derived
            },
            step_limit: self.max_steps,
        }
    }
}

#[derive(Debug, Args)]
struct TestArgs {
    /// Only run corpus cases whose name contains this text.
    #[arg(default_value = "")]
    filter: String,
}

fn main() {
    init_tracing();

    let argv: Vec<String> = std::env::args().collect();
    let args = match Cli::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::InvalidSubcommand => {
            println!(
                "Unknown subcommand {}",
                argv.get(1).map(String::as_str).unwrap_or_default()
            );
            return;
        }
        Err(e) => {
            let _ = e.print();
            return;
        }
    };

    match args.command() {
        Command::Help => {
            println!("{USAGE}");
        }
        Command::Run(args) => {
            run_command(args);
        }
        Command::Test(args) => {
            test_command(args);
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_command(args: &RunArgs) {
    let source = match std::fs::read_to_string(&args.file) {
        Ok(source) if !source.is_empty() => source,
        _ => {
            println!("Could not read file: {}", args.file);
            return;
        }
    };

    let program = match compiler::compile(&source, &args.file) {
        Ok(program) => program,
        Err(e) => {
            if let Some(diagnostic) = e.first() {
                print!("{}", diagnostic.render(&source));
            }
            return;
        }
    };

    if args.disassemble {
        println!("{program}");
    }

    let mut vm = Vm::new(&program, args.vm_config());
    let result = vm.run();
    print!("{}", vm.output());
    if let Err(e) = result {
        println!("Runtime error: {e}");
    }
}

fn test_command(args: &TestArgs) {
    let mut passed = 0;
    let mut failed = 0;
    let mut report = |outcome: &corpus::Outcome| {
        if outcome.passed() {
            passed += 1;
            println!("[PASS] {}", outcome.name);
        } else {
            failed += 1;
            println!("[FAIL] {}", outcome.name);
            println!("    Expected: {}", outcome.expected);
            println!("    Actual:   {}", outcome.actual);
        }
    };

    println!("Danish number parsing");
    for outcome in corpus::run_number_cases() {
        report(&outcome);
    }

    println!("{CORPUS_FILE}");
    let cases = corpus::parse(CORPUS, CORPUS_FILE);
    for error in &cases.errors {
        println!("{error}");
    }
    for outcome in corpus::run(&cases, &args.filter, VmConfig::default()) {
        report(&outcome);
    }

    println!("{passed} passed, {failed} failed");
}
