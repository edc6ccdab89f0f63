use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the interrupt listener prints before exiting.
#[derive(Debug, Clone)]
pub enum Farewell {
    /// Report how many prompts the interactive loop enhanced.
    Interactive(Arc<AtomicUsize>),
    Plain,
}

impl Farewell {
    pub fn message(&self) -> String {
        match self {
            Self::Interactive(enhanced) => {
                crate::session::farewell(enhanced.load(Ordering::SeqCst))
            }
            Self::Plain => "👋 Goodbye!".to_string(),
        }
    }
}

/// Exit cleanly with status 0 on SIGINT/SIGTERM, printing `farewell` first.
#[cfg(unix)]
pub fn install_interrupt_handler(farewell: Farewell) -> io::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::io::Write;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("interrupt-listener".into())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                tracing::debug!(signal, "received interrupt");
                let mut stdout = io::stdout();
                let _ = writeln!(stdout, "\n\n{}", farewell.message());
                let _ = stdout.flush();
                std::process::exit(0);
            }
        })?;
    Ok(())
}

/// Interrupts are not intercepted on this platform: Ctrl+C keeps its default
/// behaviour and ends the process without the farewell.
#[cfg(not(unix))]
pub fn install_interrupt_handler(_farewell: Farewell) -> io::Result<()> {
    Ok(())
}
