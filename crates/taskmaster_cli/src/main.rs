use clap::{CommandFactory, Parser};
use log::{debug, warn};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskmaster_cli::cli::{Cli, Command, ConfigOverrideTarget, parse_config_override};
use taskmaster_core::config::{self, Config, ConfigOverrides, Palette};
use taskmaster_core::error::AppError;
use taskmaster_core::form::{self, TaskForm};
use taskmaster_core::model::{RepeatDay, Task, TaskType, parse_date};
use taskmaster_core::notify::{self, Notification, Notifier};
use taskmaster_core::reminder::{self, ReminderScanner, ScanOutcome};
use taskmaster_core::storage::JsonFileStore;
use taskmaster_core::task_store::{self, SharedStore, TaskStore};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tokio::io::{AsyncBufReadExt, BufReader};

const REMINDER_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// State shared by every command of one invocation or interactive session.
struct Session {
    store: SharedStore,
    form: TaskForm,
    config: Config,
    notifier: Arc<dyn Notifier>,
}

impl Session {
    fn open(config: Config) -> Result<Self, AppError> {
        let notifier = notify::notifier_from_env()?;
        let persistence = JsonFileStore::from_env()?;
        debug!("using task store at {}", persistence.path().display());
        let store = TaskStore::open(Box::new(persistence), Arc::clone(&notifier)).into_shared();

        Ok(Self {
            store,
            form: TaskForm::new(),
            config,
            notifier,
        })
    }
}

/// Echoes reminders to the terminal before handing them to the desktop.
struct ConsoleNotifier {
    inner: Arc<dyn Notifier>,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        println!(
            "[{}] {}: {}",
            notification.style, notification.title, notification.description
        );
        self.inner.notify(notification)
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "[x]")]
    done: &'static str,
    title: String,
    priority: &'static str,
    due: String,
    reminder: String,
    repeats: String,
    id: String,
}

impl TaskRow {
    fn new(task: &Task, palette: &Palette) -> Self {
        let title = if task.completed {
            palette.mutedize(&task.title)
        } else {
            palette.paint_priority(task.priority, &task.title)
        };
        let repeats = task
            .repeat_days
            .as_ref()
            .map(|days| {
                days.iter()
                    .map(|day| &day.name()[..3])
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_else(|| "-".to_string());

        Self {
            done: if task.completed { "x" } else { " " },
            title,
            priority: task.priority.as_str(),
            due: task
                .due_date
                .map(|date| date.to_string())
                .unwrap_or_else(|| "-".to_string()),
            reminder: task
                .reminder
                .map(format_reminder)
                .unwrap_or_else(|| "-".to_string()),
            repeats,
            id: task.id.clone(),
        }
    }
}

fn format_reminder(reminder: OffsetDateTime) -> String {
    reminder
        .to_offset(form::local_offset())
        .format(REMINDER_FORMAT)
        .unwrap_or_else(|_| reminder.to_string())
}

fn print_tab(kind: TaskType, tasks: &[Task], palette: &Palette) {
    println!("{} ({})", kind.tab_title(), tasks.len());
    if tasks.is_empty() {
        println!("{}", palette.mutedize("  no tasks"));
        return;
    }

    let rows = tasks.iter().map(|task| TaskRow::new(task, palette));
    println!("{}", Table::new(rows).with(Style::psql()));
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    println!("{}", serde_json::to_string(task)?);
    Ok(())
}

fn print_scan_outcome(outcome: &ScanOutcome, json: bool) {
    if json {
        let notified: Vec<_> = outcome
            .notified
            .iter()
            .map(|due| {
                serde_json::json!({
                    "id": due.task_id,
                    "title": due.notification.description,
                    "notification": due.notification.title,
                    "style": due.notification.style.as_str(),
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(notified));
    } else {
        for due in &outcome.notified {
            println!(
                "Notified task: {} ({})",
                due.notification.description, due.task_id
            );
        }
    }

    for failure in &outcome.failures {
        eprintln!(
            "WARN: reminder for {} not delivered: {}",
            failure.task_id, failure.error
        );
    }
}

fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::ReminderIntervalSecs => {
                let seconds = parsed.value.parse::<u64>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "'{}' is not a number of seconds",
                        parsed.value
                    ))
                })?;
                overrides.reminder_interval_secs = Some(seconds);
            }
        }
    }
    Ok(overrides)
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        warn!("using default configuration: {err}");
    }
    config::merge_overrides(&loaded.config, &collect_overrides(raw_overrides)?)
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli, session: &mut Session) -> Result<(), AppError> {
    match cli.command {
        Command::Add {
            title,
            kind,
            priority,
            due,
            remind_on,
            at,
            repeat,
        } => {
            let Some(title) = title else {
                return Err(AppError::invalid_input("title is required"));
            };
            let due_date = due.as_deref().map(parse_date).transpose()?;
            let reminder_date = remind_on.as_deref().map(parse_date).transpose()?;

            let form = &mut session.form;
            form.title = title;
            form.due_date = due_date;
            form.reminder_date = reminder_date;
            if let Some(kind) = kind {
                form.set_kind(kind);
            }
            if let Some(priority) = priority {
                form.priority = priority;
            }
            for day in RepeatDay::ALL {
                form.set_repeat_day(day, repeat.contains(&day));
            }

            // The time of day only matters next to a reminder date.
            let sticky_time = form.reminder_time.clone();
            if let Some(at) = at {
                let at = at.trim();
                if form.reminder_date.is_some() || form::parse_time_of_day(at).is_ok() {
                    form.reminder_time = at.to_string();
                } else {
                    debug!("ignoring time '{at}' without a reminder date");
                }
            }

            let submitted = {
                let mut store = task_store::lock(&session.store);
                form.submit(&mut store, form::local_offset())
            };
            let submitted = match submitted {
                Ok(submitted) => submitted,
                Err(err) => {
                    form.reminder_time = sticky_time;
                    return Err(err);
                }
            };

            match submitted {
                Some(task) if cli.json => print_task_json(&task)?,
                Some(task) => println!("Added task: {} ({})", task.title, task.id),
                None if cli.json => println!("null"),
                None => {
                    let palette = session.config.palette();
                    println!("{}", palette.mutedize("Nothing added: title is blank"));
                }
            }
        }
        Command::Toggle { id } => {
            let toggled = task_store::lock(&session.store).toggle(&id)?;
            match toggled {
                Some(task) if cli.json => print_task_json(&task)?,
                Some(task) => {
                    let verb = if task.completed { "Completed" } else { "Reopened" };
                    println!("{} task: {} ({})", verb, task.title, task.id);
                }
                None if cli.json => println!("null"),
                None => println!("No task with id {}", id.trim()),
            }
        }
        Command::Delete { id } => {
            let deleted = task_store::lock(&session.store).delete(&id)?;
            match deleted {
                Some(task) if cli.json => print_task_json(&task)?,
                Some(task) => println!("Deleted task: {} ({})", task.title, task.id),
                None if cli.json => println!("null"),
                None => println!("No task with id {}", id.trim()),
            }
        }
        Command::List { kind } => {
            let config = if cli.config_override.is_empty() {
                session.config.clone()
            } else {
                config::merge_overrides(&session.config, &collect_overrides(&cli.config_override)?)?
            };
            let store = task_store::lock(&session.store);

            match kind {
                Some(kind) if cli.json => {
                    println!("{}", serde_json::to_string(store.tasks(kind))?)
                }
                None if cli.json => println!("{}", serde_json::to_string(store.collection())?),
                Some(kind) => print_tab(kind, store.tasks(kind), &config.palette()),
                None => {
                    let palette = config.palette();
                    for (index, kind) in TaskType::ALL.into_iter().enumerate() {
                        if index > 0 {
                            println!();
                        }
                        print_tab(kind, store.tasks(kind), &palette);
                    }
                }
            }
        }
        Command::Remind => {
            let due = reminder::due_reminders(
                task_store::lock(&session.store).collection(),
                OffsetDateTime::now_utc(),
            );
            let outcome = reminder::deliver(due, session.notifier.as_ref());
            print_scan_outcome(&outcome, cli.json);
        }
    }

    Ok(())
}

fn run_interactive(config: Config) -> Result<(), AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(interactive_session(config));
    // A pending stdin read would otherwise hold up shutdown after Ctrl-C.
    runtime.shutdown_background();
    result
}

async fn interactive_session(config: Config) -> Result<(), AppError> {
    let mut session = Session::open(config)?;
    let console: Arc<dyn Notifier> = Arc::new(ConsoleNotifier {
        inner: Arc::clone(&session.notifier),
    });
    let scanner = ReminderScanner::new(session.config.reminder_interval())?;
    debug!(
        "interactive session started, reminders every {}s",
        scanner.interval().as_secs()
    );
    let scanner = scanner.spawn(Arc::clone(&session.store), console);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let next = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(input) = next else {
            break;
        };

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("taskmaster".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) if !err.use_stderr() => {
                println!("{}", err.render());
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() && !matches!(cli.command, Command::List { .. }) {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input(
                    "--config-override only applies to list inside a session; \
                     restart taskmaster with the override for anything else"
                )
            );
            continue;
        }

        if let Err(err) = run_command(cli, &mut session) {
            eprintln!("ERROR: {}", err);
        }
    }

    scanner.stop().await;
    Ok(())
}

fn init_logging() {
    let filters = ["TASKMASTER_LOG", "RUST_LOG"]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "warn".to_string());

    let _ = env_logger::Builder::new()
        .parse_filters(&filters)
        .format_timestamp(None)
        .try_init();
}

fn exit_with(err: AppError) -> ! {
    eprintln!("ERROR: {}", err);
    std::process::exit(1);
}

fn main() {
    init_logging();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = load_config(&[]).and_then(run_interactive) {
            exit_with(err);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => exit_with(normalize_parse_error(err)),
    };

    let result = load_config(&cli.config_override).and_then(|config| {
        let mut session = Session::open(config)?;
        run_command(cli, &mut session)
    });

    if let Err(err) = result {
        exit_with(err);
    }
}
