use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::runner::run_source;
use rox::scanner::scan_tokens;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints its AST
    Parse { filename: PathBuf },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive session (default)
    Repl,
}

/// Memory-maps `filename` and copies it out as validated UTF-8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        info!("File {:?} is empty", filename);
        return Ok(String::new());
    }

    // SAFETY: the mapping is read-only and dropped before this function returns.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let source = std::str::from_utf8(&mmap)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every diagnostic and return the exit code of the first.
fn report(errors: &[LoxError]) -> i32 {
    for e in errors {
        debug!("Reporting: {}", e);
        eprintln!("{}", e);
    }

    errors.first().map_or(0, LoxError::exit_code)
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let scanned = scan_tokens(&source, &filename.to_string_lossy());

    if json {
        let dump = serde_json::to_string_pretty(&scanned.tokens).context("Failed to encode tokens")?;
        println!("{}", dump);
    } else {
        for token in &scanned.tokens {
            println!("{}", token);
        }
    }

    if scanned.had_error() {
        debug!("Tokenization failed");
        return Ok(report(&scanned.errors));
    }

    info!("Tokenization completed successfully");
    Ok(0)
}

fn parse(filename: &Path) -> Result<i32> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;
    let scanned = scan_tokens(&source, &filename.to_string_lossy());

    if scanned.had_error() {
        return Ok(report(&scanned.errors));
    }

    let parsed = Parser::new(&scanned.tokens).parse();

    if parsed.had_error() {
        return Ok(report(&parsed.errors));
    }

    let ast_str = AstPrinter::print_program(&parsed.statements);
    debug!("AST: {}", ast_str);
    println!("{}", ast_str);

    info!("Parse subcommand completed");
    Ok(0)
}

fn run(filename: &Path) -> Result<i32> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let mut interpreter = Interpreter::new();

    match run_source(&mut interpreter, &source, &filename.to_string_lossy()) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }
        Err(errors) => Ok(report(&errors)),
    }
}

/// Read-eval-print loop.  Every line runs in the same interpreter, so
/// declarations persist; errors are printed and the session carries on.
fn repl() -> Result<i32> {
    info!("Starting REPL");

    let mut interpreter = Interpreter::new();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        // stdin is not held across iterations: `input()` reads from it too.
        line.clear();
        if io::stdin()
            .read_line(&mut line)
            .context("Failed to read from stdin")?
            == 0
        {
            println!();
            break;
        }

        if line.trim() == "exit" {
            break;
        }

        if let Err(errors) = run_source(&mut interpreter, &line, "repl") {
            report(&errors);
        }
    }

    info!("REPL finished");
    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => tokenize(&filename, json),
        Commands::Parse { filename } => parse(&filename),
        Commands::Run { filename } => run(&filename),
        Commands::Repl => repl(),
    };

    let code = match code {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            74
        }
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
