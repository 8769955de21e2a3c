use clap::{Parser, Subcommand};
use taskmaster_core::model::{Priority, RepeatDay, TaskType};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values for this invocation (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskmaster add "Buy milk"
    /// Example: taskmaster add "Pay rent" --type yearly --priority important --due 2025-01-01
    /// Example: taskmaster add "Stretch" --remind-on 2025-03-10 --at 07:30 --repeat mon --repeat thu
    Add {
        title: Option<String>,
        /// daily, weekly or yearly (defaults to daily, sticky in a session)
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<TaskType>,
        /// very-important, important, normal or optional
        #[arg(long)]
        priority: Option<Priority>,
        /// Due date, YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
        /// Reminder date, YYYY-MM-DD
        #[arg(long = "remind-on", value_name = "DATE")]
        remind_on: Option<String>,
        /// Reminder time of day, HH:MM (24-hour)
        #[arg(long, value_name = "HH:MM")]
        at: Option<String>,
        /// Weekday a daily task repeats on; may be given several times
        #[arg(long = "repeat", value_name = "DAY")]
        repeat: Vec<RepeatDay>,
    },
    /// Mark a task done, or open again
    ///
    /// Example: taskmaster toggle 0b7c0c55-3f5e-4a8e-9d8e-1d2a4f0e6c11
    Toggle { id: String },
    /// Delete a task
    ///
    /// Example: taskmaster delete 0b7c0c55-3f5e-4a8e-9d8e-1d2a4f0e6c11
    Delete { id: String },
    /// List tasks, one tab or all three
    ///
    /// Example: taskmaster list
    /// Example: taskmaster list weekly
    List { kind: Option<TaskType> },
    /// Run one reminder scan now
    ///
    /// Example: taskmaster remind
    Remind,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    ReminderIntervalSecs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| format!("override must be in KEY=VALUE format ({CONFIG_OVERRIDE_FLAG})"))?;

    let value = value_raw.trim().to_string();
    let canonical_field = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "reminder_interval_secs" | "reminder_interval" | "interval" => {
            if value.parse::<u64>().is_err() {
                return Err(format!("'{value}' is not a number of seconds"));
            }
            ConfigOverrideTarget::ReminderIntervalSecs
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
