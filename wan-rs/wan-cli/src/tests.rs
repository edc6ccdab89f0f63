use super::*;
use std::cell::Cell;
use std::io::Cursor;
use wan_config::{API_KEY_ENV_VAR, API_KEY_URL, MODEL_ENV_VAR, THINKING_BUDGET_ENV_VAR};

const STUB_TEXT: &str = "1. Variation A... 2. Variation B...";

struct StubService {
    reply: Result<&'static str, &'static str>,
}

impl CompletionService for StubService {
    fn generate(&self, _payload: &str) -> Result<String, GeminiError> {
        match self.reply {
            Ok(text) => Ok(text.to_string()),
            Err(message) => Err(GeminiError::Api {
                status: 503,
                message: message.to_string(),
            }),
        }
    }
}

fn answering() -> StubService {
    StubService {
        reply: Ok(STUB_TEXT),
    }
}

fn failing() -> StubService {
    StubService {
        reply: Err("simulated network failure"),
    }
}

struct RunReport {
    code: ExitCode,
    out: String,
    err: String,
    connects: usize,
    farewell: Option<Farewell>,
}

fn run_with<S>(
    args: &[&str],
    env_pairs: &[(&str, &str)],
    stdin: &str,
    connect: impl FnOnce(&SessionConfig) -> Result<S, GeminiError>,
) -> RunReport
where
    S: CompletionService + Sync,
{
    let connects = Cell::new(0);
    let mut farewell = None;
    let mut out = Vec::new();
    let mut err = Vec::new();

    let code = run(
        parse(args),
        Console {
            input: Cursor::new(stdin.as_bytes().to_vec()),
            out: &mut out,
            err: &mut err,
            show_progress: false,
        },
        |key| {
            env_pairs
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
        },
        |config| {
            connects.set(connects.get() + 1);
            connect(config)
        },
        |installed| farewell = Some(installed),
    )
    .expect("run completes");

    RunReport {
        code,
        out: String::from_utf8(out).expect("utf8 stdout"),
        err: String::from_utf8(err).expect("utf8 stderr"),
        connects: connects.get(),
        farewell,
    }
}

fn exit_status(code: ExitCode) -> String {
    format!("{code:?}")
}

fn assert_exit(code: ExitCode, expected: ExitCode) {
    assert_eq!(exit_status(code), exit_status(expected));
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once(PROGRAM_NAME).chain(args.iter().copied()))
        .expect("parse arguments")
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn positional_prompt_selects_single_shot() {
    let cli = parse(&["a dragon flying over mountains"]);
    assert_eq!(
        cli.mode(),
        Mode::Single("a dragon flying over mountains".to_string())
    );
}

#[test]
fn interactive_flag_wins_over_prompt() {
    assert_eq!(parse(&["-i"]).mode(), Mode::Interactive);
    assert_eq!(
        parse(&["--interactive", "cat playing piano"]).mode(),
        Mode::Interactive
    );
}

#[test]
fn missing_prompt_is_a_usage_error() {
    assert_eq!(parse(&[]).mode(), Mode::Usage);
    assert_eq!(parse(&["--model", "gemini-2.5-pro"]).mode(), Mode::Usage);
}

#[test]
fn version_flag_accepts_short_and_long_forms() {
    assert_eq!(parse(&["-v"]).mode(), Mode::Version);
    assert_eq!(parse(&["--version", "-i"]).mode(), Mode::Version);
}

#[test]
fn overrides_are_captured() {
    let cli = parse(&[
        "storm over ocean",
        "--api-key",
        "secret",
        "--model",
        "gemini-2.5-pro",
    ]);
    assert_eq!(cli.api_key.as_deref(), Some("secret"));
    assert_eq!(cli.model.as_deref(), Some("gemini-2.5-pro"));
}

#[test]
fn usage_text_includes_help_and_hint() {
    let mut out = Vec::new();
    write_usage(&mut out).expect("write usage");
    let usage = String::from_utf8(out).expect("utf8 usage");

    assert!(usage.contains("Usage:"));
    assert!(usage.contains("--api-key"));
    assert!(usage.contains("--interactive"));
    assert!(usage.contains("Please provide a prompt or use --interactive mode"));
}

#[test]
fn version_matches_package() {
    assert_eq!(VERSION, "1.0.0");
}

#[test]
fn usage_text_links_wan_guide() {
    let mut out = Vec::new();
    write_usage(&mut out).expect("write usage");
    let usage = String::from_utf8(out).expect("utf8 usage");

    assert!(usage.contains("WAN 2.2 Guide: https://alidocs.dingtalk.com/"));
    assert!(usage.contains("https://makersuite.google.com/app/apikey"));
}

#[test]
fn run_version_exits_zero_without_configuration() {
    let report = run_with(&["-v"], &[], "", |_| Ok(answering()));

    assert_exit(report.code, ExitCode::SUCCESS);
    assert_eq!(report.out.trim(), format!("{PROGRAM_NAME} {VERSION}"));
    assert_eq!(report.connects, 0);
}

#[test]
fn run_without_prompt_prints_usage_and_exits_one() {
    let report = run_with(&[], &[(API_KEY_ENV_VAR, "key")], "", |_| Ok(answering()));

    assert_exit(report.code, ExitCode::FAILURE);
    assert!(report.out.contains("Usage:"));
    assert!(report.out.contains("Please provide a prompt or use --interactive mode"));
    assert_eq!(report.connects, 0);
}

#[test]
fn run_missing_api_key_exits_one_without_building_client() {
    let report = run_with(&["a dragon flying over mountains"], &[], "", |_| {
        Ok(answering())
    });

    assert_exit(report.code, ExitCode::FAILURE);
    assert_eq!(report.connects, 0);
    assert!(report.err.contains("no API key found"));
    assert!(report.err.contains(API_KEY_URL));
    assert!(report.farewell.is_none());
}

#[test]
fn run_invalid_thinking_budget_exits_one_without_building_client() {
    let report = run_with(
        &["-i"],
        &[(API_KEY_ENV_VAR, "key"), (THINKING_BUDGET_ENV_VAR, "abc")],
        "quit\n",
        |_| Ok(answering()),
    );

    assert_exit(report.code, ExitCode::FAILURE);
    assert_eq!(report.connects, 0);
    assert!(report.err.contains("GEMINI_THINKING_BUDGET"));
}

#[test]
fn run_client_build_failure_exits_one() {
    let report = run_with(
        &["storm over ocean", "--api-key", "key"],
        &[],
        "",
        |_| Err::<StubService, _>(GeminiError::MissingApiKey),
    );

    assert_exit(report.code, ExitCode::FAILURE);
    assert_eq!(report.connects, 1);
    assert!(report.err.contains("Error initializing Gemini client"));
}

#[test]
fn run_single_shot_success_exits_zero() {
    let report = run_with(
        &["a dragon flying over mountains"],
        &[(API_KEY_ENV_VAR, "key")],
        "",
        |_| Ok(answering()),
    );

    assert_exit(report.code, ExitCode::SUCCESS);
    assert_eq!(report.connects, 1);
    let framed = format!("{sep}\n{STUB_TEXT}\n{sep}\n", sep = session::separator());
    assert!(report.out.contains(&framed), "stdout was:\n{}", report.out);
    assert!(matches!(report.farewell, Some(Farewell::Plain)));
    assert!(report.err.is_empty());
}

#[test]
fn run_single_shot_failure_exits_one() {
    let report = run_with(
        &["a dragon flying over mountains"],
        &[(API_KEY_ENV_VAR, "key")],
        "",
        |_| Ok(failing()),
    );

    assert_exit(report.code, ExitCode::FAILURE);
    assert!(report.out.contains("Error"));
    assert_eq!(report.out.matches("simulated network failure").count(), 1);
}

#[test]
fn run_interactive_exits_zero_after_quit() {
    let report = run_with(
        &["--interactive"],
        &[(API_KEY_ENV_VAR, "key")],
        "\ncat playing piano\nquit\n",
        |_| Ok(failing()),
    );

    assert_exit(report.code, ExitCode::SUCCESS);
    assert!(report.out.contains("❌ Error generating enhanced prompts"));
    assert!(report.out.contains(&session::farewell(1)));
    match report.farewell {
        Some(Farewell::Interactive(counter)) => {
            assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
        }
        other => panic!("unexpected farewell: {other:?}"),
    }
}

#[test]
fn run_passes_flag_overrides_to_client() {
    let report = run_with(
        &["storm over ocean", "--api-key", "flag-key", "--model", "gemini-2.5-pro"],
        &[
            (API_KEY_ENV_VAR, "env-key"),
            (MODEL_ENV_VAR, "env-model"),
            (THINKING_BUDGET_ENV_VAR, "256"),
        ],
        "",
        |config| {
            assert_eq!(config.api_key, "flag-key");
            assert_eq!(config.model, "gemini-2.5-pro");
            assert_eq!(config.thinking_budget, 256);
            Ok(answering())
        },
    );

    assert_exit(report.code, ExitCode::SUCCESS);
}
