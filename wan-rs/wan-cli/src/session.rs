use std::io::{self, BufRead, ErrorKind, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use wan_gemini::{CompletionService, GeminiError};
use wan_prompt::{PromptError, build_payload};

pub const SEPARATOR_WIDTH: usize = 60;
pub const EXIT_TOKENS: &[&str] = &["quit", "exit", "q", "stop"];

const SERVICE_HINT: &str = "Please check your API key and internet connection.";
const UNEXPECTED_HINT: &str = "Please try again or restart the application.";
const SPINNER_FRAMES: &[&str] = &["|", "/", "-", "\\"];

/// Why a single enhancement produced no text.
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error(transparent)]
    Validation(#[from] PromptError),
    #[error(transparent)]
    Service(#[from] GeminiError),
    #[error("{0}")]
    Unexpected(String),
}

pub fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

pub fn is_exit_token(input: &str) -> bool {
    EXIT_TOKENS
        .iter()
        .any(|token| input.eq_ignore_ascii_case(token))
}

pub fn farewell(enhanced: usize) -> String {
    format!("👋 Thanks for using WAN 2.2 Prompt Enhancer! Enhanced {enhanced} prompts.")
}

pub fn render_error<W: Write>(out: &mut W, error: &EnhanceError) -> io::Result<()> {
    match error {
        EnhanceError::Validation(_) => {
            writeln!(out, "❌ Error: Please provide a valid prompt to enhance.")
        }
        EnhanceError::Service(error) => {
            writeln!(out, "❌ Error generating enhanced prompts: {error}")?;
            writeln!(out, "{SERVICE_HINT}")
        }
        EnhanceError::Unexpected(message) => {
            writeln!(out, "❌ Unexpected error: {message}")?;
            writeln!(out, "{UNEXPECTED_HINT}")
        }
    }
}

/// Drives enhancement exchanges against one completion backend.
pub struct Session<S> {
    service: S,
    model: String,
    enhanced: Arc<AtomicUsize>,
    show_progress: bool,
}

impl<S> Session<S>
where
    S: CompletionService + Sync,
{
    pub fn new(service: S, model: impl Into<String>) -> Self {
        Self {
            service,
            model: model.into(),
            enhanced: Arc::new(AtomicUsize::new(0)),
            show_progress: false,
        }
    }

    /// Animate a spinner on stderr while a request is in flight.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Shared handle to the number of completed attempts.
    pub fn enhanced_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.enhanced)
    }

    pub fn enhanced_count(&self) -> usize {
        self.enhanced.load(Ordering::SeqCst)
    }

    /// Build the payload for `raw_input` and send it to the backend.
    ///
    /// Blank input is rejected before the backend is contacted.
    pub fn enhance(&self, raw_input: &str) -> Result<String, EnhanceError> {
        let payload = build_payload(raw_input)?;
        let result = self.generate_with_progress(&payload);
        self.enhanced.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn generate_with_progress(&self, payload: &str) -> Result<String, EnhanceError> {
        thread::scope(|scope| -> Result<String, EnhanceError> {
            let handle = thread::Builder::new()
                .name("gemini-request".into())
                .spawn_scoped(scope, || self.service.generate(payload))
                .map_err(|error| {
                    EnhanceError::Unexpected(format!("failed to start request worker: {error}"))
                })?;

            if self.show_progress {
                let interval = Duration::from_millis(200);
                let start = Instant::now();
                let mut frame_index = 0;
                while !handle.is_finished() {
                    eprint!("\rWaiting for Gemini {}", SPINNER_FRAMES[frame_index]);
                    let _ = io::stderr().flush();
                    frame_index = (frame_index + 1) % SPINNER_FRAMES.len();
                    thread::sleep(interval);
                }
                eprintln!(
                    "\rWaiting for Gemini ... finished in {:.1}s",
                    start.elapsed().as_secs_f32()
                );
            }

            match handle.join() {
                Ok(result) => result.map_err(|error| {
                    tracing::debug!(%error, "enhancement request failed");
                    EnhanceError::Service(error)
                }),
                Err(_) => Err(EnhanceError::Unexpected(
                    "request worker panicked".to_string(),
                )),
            }
        })
    }

    /// Run one exchange and report it. Returns whether enhancement succeeded.
    pub fn run_once<W: Write>(&self, prompt: &str, out: &mut W) -> io::Result<bool> {
        writeln!(out, "🎯 Enhancing: '{prompt}'")?;
        writeln!(out, "✨ Generating cinematic variations...")?;
        writeln!(out, "{}", separator())?;

        let outcome = self.enhance(prompt);
        match &outcome {
            Ok(text) => writeln!(out, "{text}")?,
            Err(error) => render_error(out, error)?,
        }
        writeln!(out, "{}", separator())?;

        if outcome.is_ok() {
            writeln!(
                out,
                "✅ Enhancement complete! Use these prompts in your video generation tool."
            )?;
        }
        Ok(outcome.is_ok())
    }

    /// Read prompts from `input` until an exit token or end of input.
    ///
    /// Returns the number of enhancement attempts made during the loop.
    pub fn run_interactive<R, W>(&self, mut input: R, out: &mut W) -> io::Result<usize>
    where
        R: BufRead,
        W: Write,
    {
        self.write_welcome(out)?;

        loop {
            write!(out, "📝 Enter your basic prompt: ")?;
            out.flush()?;

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    writeln!(out)?;
                    break;
                }
                Ok(_) => {}
                Err(error) if error.kind() == ErrorKind::InvalidData => {
                    let error = EnhanceError::Unexpected(format!("could not read prompt: {error}"));
                    render_error(out, &error)?;
                    writeln!(out)?;
                    continue;
                }
                Err(error) => return Err(error),
            }

            let prompt = line.trim();
            if is_exit_token(prompt) {
                break;
            }
            if prompt.is_empty() {
                writeln!(out, "⚠️  Please enter a prompt to enhance.\n")?;
                continue;
            }

            if let Err(error) = self.interactive_turn(prompt, out) {
                tracing::debug!(%error, "failed to report enhancement");
                let error = EnhanceError::Unexpected(error.to_string());
                render_error(out, &error)?;
                writeln!(out)?;
            }
        }

        let enhanced = self.enhanced_count();
        writeln!(out, "\n{}", farewell(enhanced))?;
        Ok(enhanced)
    }

    fn write_welcome<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "🎬 WAN 2.2 Prompt Enhancer - Interactive Mode")?;
        writeln!(
            out,
            "Transform basic prompts into professional cinematic video generation prompts."
        )?;
        writeln!(out, "🤖 Using model: {}", self.model)?;
        writeln!(
            out,
            "💡 Tips: Be descriptive but concise. Examples: 'cat playing piano', 'storm over ocean'"
        )?;
        writeln!(out, "🚪 Type 'quit', 'exit', or press Ctrl+C to stop.\n")
    }

    fn interactive_turn<W: Write>(&self, prompt: &str, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n🎯 Enhancing: '{prompt}'")?;
        writeln!(out, "✨ Generating cinematic variations...")?;
        writeln!(out, "{}", separator())?;

        let outcome = self.enhance(prompt);
        match &outcome {
            Ok(text) => writeln!(out, "{text}")?,
            Err(error) => render_error(out, error)?,
        }
        writeln!(out, "{}", separator())?;

        if outcome.is_ok() {
            writeln!(
                out,
                "✅ Enhanced prompt #{}. Ready for your next prompt!\n",
                self.enhanced_count()
            )
        } else {
            writeln!(out, "Ready for your next prompt.\n")
        }
    }
}
