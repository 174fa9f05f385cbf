use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::{Arc, mpsc as std_mpsc},
    time::{Duration, Instant},
};

use clap::Parser;
use launchpad_client::{
    BUNDLED_CATALOG,
    file_backend::FileBackend,
    launcher::{Launcher, LauncherContext},
    logging::init_logging,
    shell::{self, ShellCommand, ShellOutcome},
    storage,
    worker::{UiEvent, run_persistence_worker},
};
use launchpad_core::{Backend, Catalog, Translator};
use tokio::{runtime::Runtime, sync::mpsc};
use tracing::{error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug, Clone)]
#[command(name = "launchpad")]
struct LauncherArgs {
    /// Directory holding saved servers, settings, the client registry and logs.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Language for this session; also saved as the new default.
    #[arg(long)]
    language: Option<String>,
}

fn main() {
    run();
}

fn run() {
    let args = LauncherArgs::parse();
    let data_dir = storage::data_dir(args.data_dir.as_deref());
    init_logging(&data_dir);

    let catalog = match Catalog::from_json(BUNDLED_CATALOG) {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("bundled translations are invalid: {}", err);
            std::process::exit(1);
        }
    };
    if let Some(language) = &args.language
        && !catalog.has_language(language)
    {
        eprintln!(
            "unknown language `{language}`; available: {}",
            catalog.languages().join(", ")
        );
        std::process::exit(2);
    }

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("tokio runtime init failed: {}", err);
            std::process::exit(1);
        }
    };

    let backend = Arc::new(FileBackend::open(&data_dir, catalog.languages()));
    let (profiles, language, clients) = runtime.block_on(async {
        let profiles = backend.load_profiles().await.unwrap_or_else(|err| {
            warn!(%err, "saved servers unavailable");
            Vec::new()
        });
        let clients = backend.list_installed_clients().await.unwrap_or_else(|err| {
            warn!(%err, "client registry unavailable");
            Vec::new()
        });
        (profiles, backend.current_language().await, clients)
    });

    let (persist_tx, persist_rx) = mpsc::unbounded_channel();
    let (ui_event_tx, ui_event_rx) = std_mpsc::channel();
    let worker = runtime.spawn(run_persistence_worker(
        Arc::clone(&backend),
        persist_rx,
        ui_event_tx,
    ));

    let mut launcher = match Launcher::new(
        LauncherContext { language },
        catalog,
        profiles,
        clients,
        persist_tx,
    ) {
        Ok(launcher) => launcher,
        Err(err) => {
            error!("failed to build launcher: {}", err);
            eprintln!("failed to start: {err}");
            std::process::exit(1);
        }
    };
    if let Some(language) = args.language
        && language != launcher.context().language
        && let Err(err) = launcher.select_language(&language)
    {
        error!("language switch failed: {}", err);
        std::process::exit(1);
    }

    let lines = spawn_stdin_reader();
    print_view(&launcher);

    if let Err(err) = event_loop(&mut launcher, &lines, &ui_event_rx) {
        error!("launcher stopped: {}", err);
        eprintln!("launcher stopped: {err}");
        std::process::exit(1);
    }

    shutdown(&mut launcher, &ui_event_rx);
    drop(launcher);
    if runtime
        .block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, worker).await })
        .is_err()
    {
        warn!("persistence worker did not stop in time");
    }
    info!("launcher exited");
}

fn event_loop<T: Translator>(
    launcher: &mut Launcher<T>,
    lines: &std_mpsc::Receiver<String>,
    ui_events: &std_mpsc::Receiver<UiEvent>,
) -> Result<(), shell::ShellError> {
    loop {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => {
                let outcome = line
                    .parse::<ShellCommand>()
                    .and_then(|command| shell::apply(launcher, command, Instant::now()));
                match outcome {
                    Ok(ShellOutcome::Done) => print_view(launcher),
                    Ok(ShellOutcome::Print(text)) => println!("{text}"),
                    Ok(ShellOutcome::Quit) => return Ok(()),
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => println!("{err}"),
                }
            }
            Err(std_mpsc::RecvTimeoutError::Timeout) => {}
            Err(std_mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
        }

        launcher.tick(Instant::now())?;
        let mut settled = false;
        while let Ok(event) = ui_events.try_recv() {
            launcher.handle_ui_event(event)?;
            settled = true;
        }
        if settled && !launcher.modals().is_empty() {
            print_view(launcher);
        }
    }
}

/// Send outstanding edits and wait for the worker to settle them.
fn shutdown<T: Translator>(launcher: &mut Launcher<T>, ui_events: &std_mpsc::Receiver<UiEvent>) {
    if let Err(err) = launcher.flush_edits() {
        error!("flushing edits failed: {}", err);
        return;
    }
    let deadline = Instant::now() + SHUTDOWN_GRACE;
    while launcher.pending_writes() > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match ui_events.recv_timeout(remaining) {
            Ok(event) => {
                if let Err(err) = launcher.handle_ui_event(event) {
                    error!("settling write failed: {}", err);
                    return;
                }
            }
            Err(_) => {
                warn!(pending = launcher.pending_writes(), "exiting with unsaved changes");
                return;
            }
        }
    }
}

fn spawn_stdin_reader() -> std_mpsc::Receiver<String> {
    let (tx, rx) = std_mpsc::channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_view<T: Translator>(launcher: &Launcher<T>) {
    let tree = launcher.tree();
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "{}", tree.outline(tree.root()));
    let _ = stdout.flush();
}
