use clap::{Args, Parser, Subcommand};
use pylang_codegen::CodegenOptions;
use pylang_driver::{compile_dir, compile_file, render_errors, write_output, Pass, UnitOutput};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pylang",
    version = "0.1.0",
    about = "Semantic analyzer and RISC-V code generator for a typed Python subset",
    long_about = "Reads the JSON AST produced by the pylang parser, checks it, and emits\neither a typed AST snapshot or RISC-V assembly."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-emit a parsed AST in normalized form
    Parse {
        /// Input AST file (JSON)
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run semantic analysis and emit the typed AST
    Check {
        /// Input AST file (JSON)
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Original source text, for annotated diagnostics
        #[arg(long)]
        source: Option<PathBuf>,
    },

    /// Generate RISC-V assembly
    Compile {
        /// Input AST file (JSON)
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Original source text, for annotated diagnostics
        #[arg(long)]
        source: Option<PathBuf>,

        #[command(flatten)]
        codegen: CodegenArgs,
    },

    /// Run the pipeline up to a chosen pass, on one file or a whole directory
    Run {
        /// Input AST file (JSON); omit with --dir
        #[arg(required_unless_present = "dir")]
        input: Option<PathBuf>,

        /// Last pass to run
        #[arg(long, value_enum, default_value = "codegen")]
        pass: Pass,

        /// Compile every *.json file in this directory
        #[arg(long, conflicts_with = "input")]
        dir: Option<PathBuf>,

        /// Output file, or output directory with --dir
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Original source text, for annotated diagnostics
        #[arg(long, conflicts_with = "dir")]
        source: Option<PathBuf>,

        #[command(flatten)]
        codegen: CodegenArgs,
    },
}

#[derive(Args)]
struct CodegenArgs {
    /// Heap size in 32-bit words
    #[arg(long, default_value_t = 8192)]
    heap_words: u32,

    /// Omit instruction comments
    #[arg(long)]
    no_comments: bool,
}

impl CodegenArgs {
    fn options(&self) -> CodegenOptions {
        CodegenOptions {
            heap_words: self.heap_words,
            comments: !self.no_comments,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Parse { input, out } => {
            unit_command(&input, Pass::Parse, out.as_deref(), None, &CodegenOptions::default())
        }
        Commands::Check { input, out, source } => unit_command(
            &input,
            Pass::Analyze,
            out.as_deref(),
            source.as_deref(),
            &CodegenOptions::default(),
        ),
        Commands::Compile {
            input,
            out,
            source,
            codegen,
        } => unit_command(&input, Pass::Codegen, out.as_deref(), source.as_deref(), &codegen.options()),
        Commands::Run {
            input,
            pass,
            dir,
            out,
            source,
            codegen,
        } => match (dir, input) {
            (Some(dir), _) => dir_command(&dir, pass, out.as_deref(), &codegen.options()),
            (None, Some(input)) => {
                unit_command(&input, pass, out.as_deref(), source.as_deref(), &codegen.options())
            }
            (None, None) => {
                eprintln!("Error: no input file or --dir given");
                ExitCode::FAILURE
            }
        },
    }
}

fn unit_command(
    input: &Path,
    pass: Pass,
    out: Option<&Path>,
    source: Option<&Path>,
    options: &CodegenOptions,
) -> ExitCode {
    let output = match compile_file(input, pass, options) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    report_diagnostics(&output, input, source);

    match out {
        Some(path) => {
            if let Err(e) = write_output(path, &output.text) {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        None => println!("{}", output.text),
    }

    if output.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report_diagnostics(output: &UnitOutput, input: &Path, source: Option<&Path>) {
    if output.errors.is_empty() {
        return;
    }
    let text = source.and_then(|path| match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            eprintln!("Warning: cannot read source {}: {}", path.display(), e);
            None
        }
    });
    let filename = source.unwrap_or(input).to_string_lossy().to_string();
    render_errors(&output.errors, &filename, text.as_deref());
}

fn dir_command(dir: &Path, pass: Pass, out: Option<&Path>, options: &CodegenOptions) -> ExitCode {
    let outcomes = match compile_dir(dir, out, pass, options) {
        Ok(outcomes) => outcomes,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok((path, 0)) => println!("{} -> {}", outcome.input.display(), path.display()),
            Ok((path, errors)) => {
                failed += 1;
                println!("{} -> {} ({} errors)", outcome.input.display(), path.display(), errors);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", outcome.input.display(), e);
            }
        }
    }
    println!("{} files, {} with errors", outcomes.len(), failed);

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
