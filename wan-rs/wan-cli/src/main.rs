mod logging;
mod session;
mod signals;

use clap::{CommandFactory, Parser};
use session::Session;
use signals::{Farewell, install_interrupt_handler};
use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use wan_config::{ConfigError, SessionConfig, resolve_config_with};
use wan_gemini::{CompletionService, GeminiClient, GeminiError};

const PROGRAM_NAME: &str = "wan-enhancer";
const VERSION: &str = env!("CARGO_PKG_VERSION");

const EXAMPLES: &str = "\
Examples:
  wan-enhancer \"a dragon flying over mountains\"
  wan-enhancer \"dancing in the rain\" --api-key YOUR_KEY
  wan-enhancer --interactive

Get your Gemini API key at: https://makersuite.google.com/app/apikey
WAN 2.2 Guide: https://alidocs.dingtalk.com/i/nodes/EpGBa2Lm8aZxe5myC99MelA2WgN7R35y";

/// WAN prompt enhancer entry point.
///
/// Sends a basic scene description to Gemini wrapped in the WAN 2.2
/// cinematic guide and prints the returned prompt variations.
#[derive(Parser, Debug, Clone)]
#[command(
    name = PROGRAM_NAME,
    author,
    about = "Transform basic prompts into professional WAN 2.2 video generation prompts using AI",
    long_about = None,
    disable_version_flag = true,
    after_help = EXAMPLES
)]
struct Cli {
    /// Basic prompt to enhance into WAN 2.2 style (or use --interactive).
    #[arg(value_name = "PROMPT")]
    prompt: Option<String>,
    /// Gemini API key (alternatively set GEMINI_API_KEY in .env file).
    #[arg(long, value_name = "KEY")]
    api_key: Option<String>,
    /// Gemini model to use (alternatively set GEMINI_MODEL in .env file).
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,
    /// Run in interactive mode for continuous prompt enhancement.
    #[arg(short = 'i', long)]
    interactive: bool,
    /// Print version information.
    #[arg(short = 'v', long)]
    version: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Mode {
    Version,
    Usage,
    Single(String),
    Interactive,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.version {
            Mode::Version
        } else if self.interactive {
            Mode::Interactive
        } else if let Some(prompt) = &self.prompt {
            Mode::Single(prompt.clone())
        } else {
            Mode::Usage
        }
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    logging::init();

    let cli = Cli::parse();

    let console = Console {
        input: io::stdin().lock(),
        out: io::stdout(),
        err: io::stderr(),
        show_progress: io::stderr().is_terminal(),
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run(
            cli,
            console,
            |key| env::var(key).ok(),
            GeminiClient::new,
            |farewell| {
                if let Err(error) = install_interrupt_handler(farewell) {
                    tracing::warn!(%error, "failed to install interrupt handler");
                }
            },
        )
    }));

    match outcome {
        Ok(Ok(code)) => code,
        Ok(Err(error)) => report_fatal(&error),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|message| message.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            report_fatal(&message)
        }
    }
}

fn report_fatal(error: &dyn std::fmt::Display) -> ExitCode {
    tracing::error!(%error, "fatal error");
    eprintln!("\n❌ Fatal error: {error}");
    eprintln!("Please check your setup and try again.");
    ExitCode::FAILURE
}

/// Terminal streams a run reads from and reports to.
struct Console<R, W, E> {
    input: R,
    out: W,
    err: E,
    show_progress: bool,
}

/// Drive one process run and decide its exit status.
///
/// `lookup` supplies environment variables, `connect` builds the completion
/// backend once configuration has resolved, and `on_session_start` receives
/// the farewell to print if the run is interrupted.
fn run<R, W, E, S>(
    cli: Cli,
    console: Console<R, W, E>,
    lookup: impl FnMut(&str) -> Option<String>,
    connect: impl FnOnce(&SessionConfig) -> Result<S, GeminiError>,
    on_session_start: impl FnOnce(Farewell),
) -> io::Result<ExitCode>
where
    R: BufRead,
    W: Write,
    E: Write,
    S: CompletionService + Sync,
{
    let Console {
        input,
        mut out,
        mut err,
        show_progress,
    } = console;

    let mode = cli.mode();
    match mode {
        Mode::Version => {
            writeln!(out, "{PROGRAM_NAME} {VERSION}")?;
            return Ok(ExitCode::SUCCESS);
        }
        Mode::Usage => {
            write_usage(&mut out)?;
            return Ok(ExitCode::FAILURE);
        }
        Mode::Single(_) | Mode::Interactive => {}
    }

    let config = match resolve_config_with(cli.api_key.as_deref(), cli.model.as_deref(), lookup) {
        Ok(config) => config,
        Err(error) => {
            report_config_error(&mut err, &error)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let service = match connect(&config) {
        Ok(service) => service,
        Err(error) => {
            writeln!(err, "❌ Error initializing Gemini client: {error}")?;
            writeln!(err, "Please check your API key and internet connection.")?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let session = Session::new(service, config.model.as_str()).with_progress(show_progress);

    on_session_start(match mode {
        Mode::Interactive => Farewell::Interactive(session.enhanced_counter()),
        _ => Farewell::Plain,
    });

    match mode {
        Mode::Single(prompt) => {
            if session.run_once(&prompt, &mut out)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        _ => {
            session.run_interactive(input, &mut out)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report_config_error<E: Write>(err: &mut E, error: &ConfigError) -> io::Result<()> {
    writeln!(err, "❌ Error: {error}.")?;
    writeln!(err, "{}", error.guidance())
}

fn write_usage<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "🎬 WAN 2.2 Prompt Enhancer")?;
    writeln!(
        out,
        "Transform basic prompts into professional cinematic video generation prompts.\n"
    )?;
    writeln!(out, "{}", Cli::command().render_help())?;
    writeln!(out, "\n⚠️  Please provide a prompt or use --interactive mode")?;
    writeln!(
        out,
        "💡 Quick start: {PROGRAM_NAME} 'your prompt here'"
    )
}

#[cfg(test)]
mod tests;
