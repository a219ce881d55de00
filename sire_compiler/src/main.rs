use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use sire_compiler::config::{self, constants::STDIN_SOURCE_NAME};
use sire_compiler::config::runtime::RuntimeConfig;
use sire_compiler::{logging, tokens, Diagnostics};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "Usage: sire [options] <input>";

#[derive(Debug, ClapParser)]
#[command(name = "sire")]
#[command(version)]
#[command(about = "Front end for the sire process language", long_about = None)]
#[command(override_usage = "sire [options] <input>")]
#[command(after_help = "Reads standard input when no input file is given.")]
struct Cli {
    /// Program file
    input: Option<PathBuf>,

    /// Print tokenisation only
    #[arg(short = 'l')]
    list_tokens: bool,

    /// Print the parse tree in source form
    #[arg(short = 'p')]
    print_tree: bool,

    /// Print the parse tree as JSON
    #[arg(short = 'j')]
    json: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            if e.print().is_err() {
                eprint!("{}", e);
            }
            if e.kind() == ErrorKind::DisplayHelp {
                println!();
                println!("{}", help_footer());
            }
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Invalid argument.");
            eprintln!("{}", USAGE);
            logging::safe_log_error(
                logging::codes::system::INVALID_ARGUMENT,
                &format!("Rejected arguments: {}", e.kind()),
            );
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}

/// Logging preferences and build limits, printed after the clap help text
fn help_footer() -> String {
    format!(
        "{}\nLimits: {}",
        logging::config::get_config_summary(),
        config::build_info::source_info()
    )
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = RuntimeConfig::load()?;
    let initialised = logging::config::init_runtime_preferences(config.logging.clone())
        .and_then(|()| logging::init_global_logging());
    if let Err(reason) = initialised {
        logging::safe_log_error(logging::codes::system::INITIALIZATION_FAILURE, &reason);
        return Err(reason.into());
    }

    let (source_name, source) = match &cli.input {
        Some(path) => (path.display().to_string(), sire_compiler::read_source(path)?),
        None => (STDIN_SOURCE_NAME.to_string(), sire_compiler::read_stdin()?),
    };

    let mut diagnostics = Diagnostics::from_preferences(&config.diagnostics);

    logging::with_file_context(source_name, || -> Result<(), Box<dyn std::error::Error>> {
        if cli.list_tokens {
            let tokens = sire_compiler::tokenize(&source, &mut diagnostics)?;
            print!("{}", tokens::dump(tokens.iter().map(|token| &token.value)));
            return Ok(());
        }

        let tree = sire_compiler::parse_source(&source, &mut diagnostics)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&tree)?);
        } else if cli.print_tree {
            print!("{}", tree);
        }
        Ok(())
    })
}
