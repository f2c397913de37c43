mod cli;
mod logging;

use std::env;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver};

use anyhow::{Context, Result};
use tracing::{error, info};

use gdbrelay_config::{default_config_dir, load_config};
use gdbrelay_session::{ConsoleInput, PassThroughExit, Session, SessionError};

use crate::cli::{Cli, USAGE};

/// Feed stdin lines and Ctrl-C presses into one channel.
fn console_input() -> Result<Receiver<ConsoleInput>> {
    let (tx, rx) = mpsc::channel();

    let interrupt = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupt.send(ConsoleInput::Interrupt);
    })
    .context("failed to install interrupt handler")?;

    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(ConsoleInput::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(ConsoleInput::Eof);
        })
        .context("failed to spawn stdin reader")?;

    Ok(rx)
}

fn run(cli: Cli) -> Result<()> {
    let config_dir = default_config_dir()?;
    let project_dir = env::current_dir().ok();
    let loaded = load_config(&config_dir, project_dir.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let log_path = logging::init(&config.log)?;
    info!("gdbrelay starting, logging to {}", log_path.display());
    if let Err(e) = &loaded {
        error!("config load failed, using defaults: {}", e);
    }

    let options = cli.launch_options(&config);
    let debugger = options.debugger.clone();
    let mut session =
        Session::launch(options).with_context(|| format!("failed to launch {debugger}"))?;

    let input = console_input()?;
    match session.interact(&input) {
        Ok(PassThroughExit::Eof) => info!("input closed"),
        Ok(PassThroughExit::Interrupted) => info!("interrupted"),
        Err(SessionError::ProcessTerminated { status }) => {
            info!(?status, "debugger exited during pass-through");
            return Ok(());
        }
        Err(e) => return Err(e).context("pass-through failed"),
    }

    session.close().context("failed to close debugger")?;
    info!("gdbrelay exited cleanly");
    Ok(())
}

fn main() {
    let cli = match Cli::parse(env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("gdbrelay: {:#}", e);
            std::process::exit(1);
        }
    };
    if cli.help {
        println!("{USAGE}");
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("gdbrelay: {:#}", e);
        std::process::exit(1);
    }
}
