#![forbid(unsafe_code)]

//! Headless language-switching demo.
//!
//! Builds a window whose title, label and button text are bound to resource
//! keys, then reads commands (`switch`, `lang de`, `close greeting`, `show`,
//! ...) from `--script` or stdin.

mod cli;
mod resources;
mod window;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use relocale::{CultureInfo, LanguageInfo};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Opts;
use crate::window::{Flow, MainWindow};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let opts = Opts::parse();

    let catalog = match resources::load_catalog(opts.resources.as_deref()) {
        Ok(catalog) => catalog,
        Err(err) => {
            error!(error = %err, "failed to load resources");
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let ui_culture = match opts.locale.as_deref().map(CultureInfo::new).transpose() {
        Ok(culture) => culture.unwrap_or_else(|| LanguageInfo::DEFAULT.culture()),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };
    info!(ui_culture = %ui_culture, locales = ?catalog.locales(), "starting demo");

    let mut window = MainWindow::new(catalog, ui_culture);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match opts.script.as_deref() {
        Some(script) => run_script(&mut window, script, &mut out),
        None => run_stdin(&mut window, &mut out),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "i/o failure");
            ExitCode::FAILURE
        }
    }
}

fn run_script(window: &mut MainWindow, script: &str, out: &mut impl Write) -> io::Result<()> {
    window.render(out)?;
    for command in script.split(';') {
        if window.execute(command.trim(), out)? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

fn run_stdin(window: &mut MainWindow, out: &mut impl Write) -> io::Result<()> {
    window.render(out)?;
    for line in io::stdin().lock().lines() {
        if window.execute(line?.trim(), out)? == Flow::Quit {
            break;
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn script_runs_until_quit() {
        let catalog = resources::load_catalog(None).unwrap();
        let mut window = MainWindow::new(catalog, LanguageInfo::DEFAULT.culture());
        let mut out = Vec::new();
        run_script(&mut window, "switch; close switch; show; quit; switch", &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[3], "language: Deutsch (de)");
        assert_eq!(lines[4], "closed switch");
        assert_eq!(lines[6], "[TextBlock greeting] Text=\"Hallo\"");
        assert_eq!(lines.len(), 7);
        assert_eq!(window.ui_culture().name(), "de");
    }
}
