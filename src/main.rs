use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast::NodeIds;
use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};
use rox::session::{Lox, RunStatus};

/// Exit status after scan, parse or resolve errors.
const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status after a runtime error.
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints the AST of each statement
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program, or starts a REPL without one
    Run { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
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

fn tokenize(filename: PathBuf, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                if json {
                    println!("{}", serde_json::to_string(&token)?);
                } else {
                    println!("{}", token);
                }
            }

            Err(e) => {
                tokenized = false;

                debug!("Tokenization debug: {}", e);

                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);

        std::process::exit(EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: PathBuf) -> Result<()> {
    info!("Running Parse subcommand");
    let source = read_file(filename)?;

    let (tokens, mut errors) = scan_tokens(&source);
    let mut ids = NodeIds::new();
    let (statements, parse_errors) = Parser::new(&tokens, &mut ids).parse();
    errors.extend(parse_errors);

    if !errors.is_empty() {
        for e in &errors {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
        }
        std::process::exit(EXIT_STATIC_ERROR);
    }

    for stmt in &statements {
        let ast_str = AstPrinter::print_stmt(stmt);

        debug!("AST: {}", ast_str);
        println!("{}", ast_str);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run_file(filename: PathBuf) -> Result<()> {
    info!("Running Run subcommand");
    let source = read_file(filename)?;

    info!("Provided input:\n {}", source);

    let mut lox = Lox::new();

    match lox.run(&source)? {
        RunStatus::Ok => info!("Program executed successfully"),
        RunStatus::StaticError => std::process::exit(EXIT_STATIC_ERROR),
        RunStatus::RuntimeError => std::process::exit(EXIT_RUNTIME_ERROR),
    }

    Ok(())
}

/// Read‑eval‑print loop.  An empty line or end of input ends the session.
fn run_prompt() -> Result<()> {
    info!("Starting REPL");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        let nbytes = stdin.lock().read_line(&mut line)?;
        if nbytes == 0 || line.trim().is_empty() {
            break;
        }

        let status = lox.run(&line)?;
        debug!("REPL line finished with {:?}", status);

        lox.reset_error();
    }

    info!("REPL finished");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Silent unless RUST_LOG asks otherwise
        Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, json),
        Commands::Parse { filename } => parse(filename),
        Commands::Run { filename } => match filename {
            Some(filename) => run_file(filename),
            None => run_prompt(),
        },
    }
}
