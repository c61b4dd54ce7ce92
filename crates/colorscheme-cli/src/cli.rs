//! Argument parsing and command execution.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colorscheme::{OsSchemeProvider, PreferenceController, PreferenceStore, Status, Update};

use crate::config::{StoreLocation, STORE_ENV};

/// Manage the light/dark/system color-scheme preference.
#[derive(Debug, Parser)]
#[command(name = "colorscheme", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Preference file (default: <config dir>/colorscheme/preferences.json)
    #[arg(long, global = true, env = STORE_ENV, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Keep the preference in memory only (overrides --store)
    #[arg(long, global = true)]
    pub no_store: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the stored choice (light, dark or system)
    Get,
    /// Store a new choice
    Set {
        /// light, dark or system
        mode: String,
    },
    /// Print what the operating system prefers
    System,
    /// Print the stored choice and the scheme in effect
    Status {
        /// Print as JSON: {"user": ..., "current": ...}
        #[arg(long)]
        json: bool,
    },
    /// Print a line every time the scheme in effect changes
    Watch {
        /// Milliseconds between checks of the OS setting
        #[arg(long, default_value_t = 1000, value_name = "MS")]
        interval_ms: u64,

        /// Stop after this many checks (default: run forever)
        #[arg(long, value_name = "N")]
        polls: Option<u64>,
    },
}

/// Runs `cli` against a controller built from its global flags.
pub fn run(
    cli: Cli,
    provider: OsSchemeProvider,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    let location = StoreLocation::resolve(cli.global.store.clone(), cli.global.no_store);
    tracing::debug!(?location, "opening preference store");
    let controller = PreferenceController::new(location.open(), provider);
    execute(&cli.command, &controller, out, err)
}

/// Executes one command against an existing controller.
pub fn execute<S>(
    command: &Command,
    controller: &PreferenceController<S, OsSchemeProvider>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()>
where
    S: PreferenceStore + 'static,
{
    if let Some(warning) = controller.load_warning() {
        writeln!(err, "warning: {warning}; using system")?;
    }

    match command {
        Command::Get => {
            writeln!(out, "{}", controller.user_choice().label())?;
        }
        Command::Set { mode } => {
            let update = controller
                .set_user_choice_str(mode)
                .with_context(|| format!("cannot set color scheme to '{mode}'"))?;
            if let Update::InMemoryOnly(cause) = &update {
                writeln!(err, "warning: {cause}; change not saved")?;
            }
            write_status(out, controller.status())?;
        }
        Command::System => {
            writeln!(out, "{}", controller.system_scheme())?;
        }
        Command::Status { json } => {
            let status = controller.status();
            if *json {
                writeln!(out, "{}", serde_json::to_string(&status)?)?;
            } else {
                write_status(out, status)?;
            }
        }
        Command::Watch { interval_ms, polls } => {
            let interval = Duration::from_millis(*interval_ms);
            watch(controller, *polls, out, || thread::sleep(interval))?;
        }
    }
    Ok(())
}

fn write_status(out: &mut dyn Write, status: Status) -> std::io::Result<()> {
    writeln!(out, "{} ({})", status.effective, status.mode.label())
}

/// Polls the OS provider, calling `wait` before each check, and prints every
/// status the controller signals.
fn watch<S>(
    controller: &PreferenceController<S, OsSchemeProvider>,
    polls: Option<u64>,
    out: &mut dyn Write,
    mut wait: impl FnMut(),
) -> Result<()>
where
    S: PreferenceStore + 'static,
{
    let pending: Rc<RefCell<Vec<Status>>> = Rc::default();
    let sink = Rc::clone(&pending);
    let subscription = controller.on_change(move |status| sink.borrow_mut().push(status));

    write_status(out, controller.status())?;
    out.flush()?;

    let mut checks = 0;
    while polls.map_or(true, |limit| checks < limit) {
        wait();
        controller.provider().poll();
        checks += 1;

        for status in pending.borrow_mut().drain(..) {
            write_status(out, status)?;
        }
        out.flush()?;
    }

    controller.unsubscribe(subscription);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorscheme::{MemoryStore, Mode, Scheme, UnavailableStore, STORAGE_KEY};
    use serial_test::serial;
    use std::cell::Cell;
    use tempfile::TempDir;

    thread_local! {
        static DETECTED: Cell<Scheme> = const { Cell::new(Scheme::Dark) };
    }

    fn thread_detector() -> Scheme {
        DETECTED.with(Cell::get)
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("colorscheme").chain(args.iter().copied())).unwrap()
    }

    fn dark_os() -> OsSchemeProvider {
        OsSchemeProvider::with_detector(|| Scheme::Dark)
    }

    fn exec<S: PreferenceStore + 'static>(
        args: &[&str],
        controller: &PreferenceController<S, OsSchemeProvider>,
    ) -> (Result<()>, String, String) {
        let cli = parse(args);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = execute(&cli.command, controller, &mut out, &mut err);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_get_defaults_to_system() {
        let controller = PreferenceController::new(MemoryStore::new(), dark_os());
        let (result, out, err) = exec(&["get"], &controller);
        result.unwrap();
        assert_eq!(out, "system\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_set_then_status() {
        let store = MemoryStore::new();
        let controller = PreferenceController::new(store.clone(), dark_os());

        let (result, out, _) = exec(&["set", "light"], &controller);
        result.unwrap();
        assert_eq!(out, "light (light)\n");
        assert_eq!(store.value(STORAGE_KEY).as_deref(), Some("light"));

        let (_, out, _) = exec(&["set", "system"], &controller);
        assert_eq!(out, "dark (system)\n");
    }

    #[test]
    fn test_set_invalid_mode_fails() {
        let controller = PreferenceController::new(MemoryStore::new(), dark_os());
        let (result, _, _) = exec(&["set", "purple"], &controller);
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("purple"), "got: {message}");
        assert_eq!(controller.user_choice(), Mode::System);
    }

    #[test]
    fn test_status_json() {
        let controller = PreferenceController::new(MemoryStore::new(), dark_os());
        let (result, out, _) = exec(&["status", "--json"], &controller);
        result.unwrap();
        assert_eq!(out.trim(), r#"{"user":"light dark","current":"dark"}"#);
    }

    #[test]
    fn test_system_command() {
        let controller = PreferenceController::new(MemoryStore::new(), dark_os());
        let _ = controller.set_user_choice(Mode::Light);
        let (_, out, _) = exec(&["system"], &controller);
        assert_eq!(out, "dark\n");
    }

    #[test]
    fn test_unavailable_store_warns() {
        let controller = PreferenceController::new(UnavailableStore::new(), dark_os());
        let (result, out, err) = exec(&["set", "dark"], &controller);
        result.unwrap();
        assert_eq!(out, "dark (dark)\n");
        assert!(err.contains("using system"));
        assert!(err.contains("change not saved"));
    }

    #[test]
    fn test_watch_prints_initial_status_and_stops() {
        let controller = PreferenceController::new(MemoryStore::new(), dark_os());
        let (result, out, _) = exec(&["watch", "--interval-ms", "0", "--polls", "2"], &controller);
        result.unwrap();
        assert_eq!(out, "dark (system)\n");
        assert_eq!(controller.subscriber_count(), 0);
    }

    #[test]
    fn test_run_with_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        let store = path.to_str().unwrap();

        let mut out = Vec::new();
        let mut err = Vec::new();
        run(parse(&["--store", store, "set", "dark"]), dark_os(), &mut out, &mut err).unwrap();

        let mut out = Vec::new();
        run(parse(&["get", "--store", store]), dark_os(), &mut out, &mut err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "dark\n");
    }

    #[test]
    fn test_watch_prints_each_system_change() {
        DETECTED.with(|d| d.set(Scheme::Dark));
        let os = OsSchemeProvider::with_detector(thread_detector);
        let controller = PreferenceController::new(MemoryStore::new(), os);

        let mut out = Vec::new();
        watch(&controller, Some(2), &mut out, || {
            DETECTED.with(|d| d.set(d.get().toggled()));
        })
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "dark (system)\nlight (system)\ndark (system)\n"
        );
        assert_eq!(controller.subscriber_count(), 0);
    }

    #[test]
    fn test_watch_pinned_ignores_system_change() {
        DETECTED.with(|d| d.set(Scheme::Dark));
        let os = OsSchemeProvider::with_detector(thread_detector);
        let controller = PreferenceController::new(MemoryStore::new(), os);
        let _ = controller.set_user_choice(Mode::Light);

        let mut out = Vec::new();
        watch(&controller, Some(1), &mut out, || {
            DETECTED.with(|d| d.set(Scheme::Light));
        })
        .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "light (light)\n");
    }

    #[test]
    fn test_store_flag_and_no_store_together() {
        let cli = parse(&["--store", "x.json", "--no-store", "get"]);
        let location = StoreLocation::resolve(cli.global.store, cli.global.no_store);
        assert_eq!(location, StoreLocation::Ephemeral);
    }

    #[test]
    #[serial]
    fn test_store_env_var() {
        std::env::set_var(STORE_ENV, "/tmp/colorscheme-env-prefs.json");

        let cli = parse(&["get"]);
        let location = StoreLocation::resolve(cli.global.store, cli.global.no_store);
        assert_eq!(
            location,
            StoreLocation::File(PathBuf::from("/tmp/colorscheme-env-prefs.json"))
        );

        let cli = parse(&["--no-store", "get"]);
        let location = StoreLocation::resolve(cli.global.store, cli.global.no_store);
        assert_eq!(location, StoreLocation::Ephemeral);

        std::env::remove_var(STORE_ENV);
    }
}
