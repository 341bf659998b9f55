use clap::{Arg, ArgAction, ArgMatches, Command};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod adapters;
mod application;
mod domain;
mod ports;

use adapters::{
    config::FileConfigStore,
    storage::{FileKeyValueStorage, MemoryStorage},
    tui::{run_tui, App},
};
use application::{AppResult, ComplaintStore};
use domain::{require_field, NewComment, Status, VehicleNumber};
use ports::{AppConfig, ConfigStore, KeyValueStorage};

const DATA_DIR_ENV: &str = "COMPLAINT_TRACKER_DATA_DIR";
const AUTHOR_ENV: &str = "COMPLAINT_TRACKER_AUTHOR";

fn build_cli() -> Command {
    Command::new("complaint-tracker")
        .version("0.1.0")
        .about("Track vehicle complaints, their status and technician comments")
        .long_about("Track vehicle complaints, their status and technician comments.\n\nRun without a subcommand to open the terminal interface.")
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory holding the complaint data and log file (or COMPLAINT_TRACKER_DATA_DIR)")
                .global(true)
        )
        .arg(
            Arg::new("author")
                .long("author")
                .value_name("NAME")
                .help("Author recorded on new comments (or COMPLAINT_TRACKER_AUTHOR)")
                .global(true)
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .action(ArgAction::SetTrue)
                .help("Keep complaints in memory only; nothing is read or written")
                .global(true)
        )
        .subcommand(
            Command::new("complaints")
                .about("Complaint operations")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List complaints as JSON"))
                .subcommand(
                    Command::new("get")
                        .about("Get a complaint by vehicle number")
                        .arg(number_arg())
                )
                .subcommand(
                    Command::new("add")
                        .about("Submit a new complaint")
                        .arg(
                            Arg::new("number")
                                .long("number")
                                .short('n')
                                .value_name("NUMBER")
                                .help("Vehicle registration number")
                                .required(true)
                        )
                        .arg(
                            Arg::new("model")
                                .long("model")
                                .short('m')
                                .value_name("MODEL")
                                .help("Vehicle model")
                                .required(true)
                        )
                        .arg(
                            Arg::new("complaint")
                                .long("complaint")
                                .short('c')
                                .value_name("TEXT")
                                .help("Description of the problem")
                                .required(true)
                        )
                )
                .subcommand(
                    Command::new("status")
                        .about("Set the status of a complaint")
                        .arg(number_arg())
                        .arg(
                            Arg::new("status")
                                .help("Pending, \"In Progress\" or Completed")
                                .required(true)
                                .index(2)
                        )
                        .arg(
                            Arg::new("note")
                                .long("note")
                                .value_name("TEXT")
                                .help("Technician summary to store with the change")
                        )
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a complaint")
                        .arg(number_arg())
                )
        )
        .subcommand(
            Command::new("comments")
                .about("Comment operations")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .about("Add a comment to a complaint")
                        .arg(number_arg())
                        .arg(text_arg(2))
                )
                .subcommand(
                    Command::new("edit")
                        .about("Replace the text of a comment")
                        .arg(number_arg())
                        .arg(comment_id_arg())
                        .arg(text_arg(3))
                )
                .subcommand(
                    Command::new("delete")
                        .about("Delete a comment")
                        .arg(number_arg())
                        .arg(comment_id_arg())
                )
        )
        .subcommand(
            Command::new("config")
                .about("Configuration operations")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Print the effective configuration as JSON"))
                .subcommand(Command::new("save").about("Write the effective configuration to the config file"))
        )
}

fn number_arg() -> Arg {
    Arg::new("number")
        .help("Vehicle registration number")
        .required(true)
        .index(1)
}

fn comment_id_arg() -> Arg {
    Arg::new("comment_id")
        .help("Comment ID")
        .required(true)
        .index(2)
}

fn text_arg(index: usize) -> Arg {
    Arg::new("text")
        .help("Comment text")
        .required(true)
        .index(index)
}

/// Layers the environment and then command-line flags over the loaded config.
fn apply_overrides(
    config: &mut AppConfig,
    matches: &ArgMatches,
    env: impl Fn(&str) -> Option<String>,
) {
    if let Some(dir) = matches.get_one::<PathBuf>("data-dir") {
        config.data_dir = Some(dir.clone());
    } else if let Some(dir) = env(DATA_DIR_ENV) {
        config.data_dir = Some(PathBuf::from(dir));
    }

    if let Some(author) = matches.get_one::<String>("author") {
        config.author = author.clone();
    } else if let Some(author) = env(AUTHOR_ENV) {
        if !author.trim().is_empty() {
            config.author = author;
        }
    }
}

fn init_logging(data_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("complaint-tracker.log"))?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Prints the error and exits when a CLI operation fails.
fn or_exit<T>(result: AppResult<T>, action: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            if e.is_not_found() {
                tracing::debug!("Failed to {action}: {e}");
            } else {
                tracing::warn!("Failed to {action}: {e}");
            }
            eprintln!("❌ Failed to {action}: {e}");
            std::process::exit(1);
        }
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    // clap enforces presence of required args
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_default()
}

async fn run_complaints(store: &ComplaintStore, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", _)) => print_json(&*store.snapshot())?,
        Some(("get", get_matches)) => {
            let number = VehicleNumber::from(required(get_matches, "number"));
            match store.complaint(&number) {
                Some(complaint) => print_json(&complaint)?,
                None => {
                    eprintln!("❌ Request not found: {number}");
                    std::process::exit(1);
                }
            }
        }
        Some(("add", add_matches)) => {
            let fields = ["number", "model", "complaint"].map(|field| {
                or_exit(
                    require_field(field, required(add_matches, field)).map_err(Into::into),
                    "add complaint",
                )
            });
            let [number, model, complaint] = fields;
            let complaint =
                store.add_complaint(number.to_uppercase().into(), model, complaint);
            store.flush().await?;
            print_json(&complaint)?;
        }
        Some(("status", status_matches)) => {
            let number = VehicleNumber::from(required(status_matches, "number"));
            let status: Status = or_exit(
                required(status_matches, "status")
                    .parse()
                    .map_err(Into::into),
                "parse status",
            );
            let note = status_matches.get_one::<String>("note").cloned();
            let complaint = or_exit(store.update_status(&number, status, note), "update status");
            store.flush().await?;
            print_json(&complaint)?;
        }
        Some(("delete", delete_matches)) => {
            let number = VehicleNumber::from(required(delete_matches, "number"));
            let removed = or_exit(store.delete_complaint(&number), "delete complaint");
            store.flush().await?;
            print_json(&removed)?;
        }
        _ => {
            eprintln!("❌ Unknown complaints subcommand");
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn run_comments(store: &ComplaintStore, config: &AppConfig, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("add", add_matches)) => {
            let number = VehicleNumber::from(required(add_matches, "number"));
            let text = required(add_matches, "text");
            or_exit(require_field("text", text).map_err(Into::into), "add comment");
            let comment = NewComment::new(text, config.author.as_str(), chrono::Utc::now());
            let id = or_exit(store.add_comment(&number, comment), "add comment");
            store.flush().await?;
            println!("{id}");
        }
        Some(("edit", edit_matches)) => {
            let number = VehicleNumber::from(required(edit_matches, "number"));
            let id = required(edit_matches, "comment_id").into();
            let text = required(edit_matches, "text");
            or_exit(store.edit_comment(&number, &id, text), "edit comment");
            store.flush().await?;
        }
        Some(("delete", delete_matches)) => {
            let number = VehicleNumber::from(required(delete_matches, "number"));
            let id = required(delete_matches, "comment_id").into();
            let removed = or_exit(store.delete_comment(&number, &id), "delete comment");
            store.flush().await?;
            print_json(&removed)?;
        }
        _ => {
            eprintln!("❌ Unknown comments subcommand");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize color-eyre for better error reporting
    color_eyre::install()?;

    let matches = build_cli().get_matches();

    // Load configuration, then layer environment and flags on top
    let config_store = FileConfigStore::new()?;
    let mut config = config_store.load_config().await?;
    apply_overrides(&mut config, &matches, |key| std::env::var(key).ok());

    if let Some(("config", config_matches)) = matches.subcommand() {
        match config_matches.subcommand() {
            Some(("show", _)) => print_json(&serde_json::json!({
                "dataDir": config.data_dir,
                "author": config.author,
                "timeRefreshSeconds": config.time_refresh_seconds,
                "liveTimeLabels": config.live_time_labels,
            }))?,
            Some(("save", _)) => {
                config_store.save_config(&config).await?;
                println!("Configuration saved");
            }
            _ => {
                eprintln!("❌ Unknown config subcommand");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let file_storage = match &config.data_dir {
        Some(dir) => FileKeyValueStorage::with_root(dir),
        None => FileKeyValueStorage::new()?,
    };
    init_logging(file_storage.root())?;

    let storage: Arc<dyn KeyValueStorage> = if matches.get_flag("ephemeral") {
        tracing::info!("Running with in-memory storage");
        Arc::new(MemoryStorage::new())
    } else {
        tracing::info!("Using data directory {}", file_storage.root().display());
        Arc::new(file_storage)
    };

    let store = match ComplaintStore::open(storage).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open complaint store: {e}");
            eprintln!("❌ Failed to open complaint store: {e}");
            std::process::exit(1);
        }
    };

    match matches.subcommand() {
        Some(("complaints", complaints_matches)) => {
            run_complaints(&store, complaints_matches).await?;
        }
        Some(("comments", comments_matches)) => {
            run_comments(&store, &config, comments_matches).await?;
        }
        None => {
            // Default behavior - run TUI
            let app = App::new(store.clone(), config);
            let result = run_tui(app).await;

            if let Err(e) = store.flush().await {
                tracing::warn!("Final save failed: {e}");
                eprintln!("❌ Failed to save complaints: {e}");
            }
            if let Err(e) = result {
                eprintln!("❌ Application error: {e}");
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("❌ Unknown command");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config() -> AppConfig {
        AppConfig {
            data_dir: Some(PathBuf::from("/from/file")),
            author: "File Author".to_string(),
            ..AppConfig::default()
        }
    }

    fn overridden(args: &[&str], env: &[(&str, &str)]) -> AppConfig {
        let matches = build_cli()
            .try_get_matches_from(args.iter().copied())
            .unwrap();
        let mut config = file_config();
        apply_overrides(&mut config, &matches, |key| {
            env.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        });
        config
    }

    #[test]
    fn file_values_stand_without_env_or_flags() {
        let config = overridden(&["complaint-tracker", "complaints", "list"], &[]);

        assert_eq!(config.data_dir, Some(PathBuf::from("/from/file")));
        assert_eq!(config.author, "File Author");
    }

    #[test]
    fn env_beats_config_file() {
        let config = overridden(
            &["complaint-tracker", "complaints", "list"],
            &[(DATA_DIR_ENV, "/from/env"), (AUTHOR_ENV, "Env Author")],
        );

        assert_eq!(config.data_dir, Some(PathBuf::from("/from/env")));
        assert_eq!(config.author, "Env Author");
    }

    #[test]
    fn flags_beat_env() {
        let config = overridden(
            &[
                "complaint-tracker",
                "--data-dir",
                "/from/flag",
                "--author",
                "Flag Author",
                "complaints",
                "list",
            ],
            &[(DATA_DIR_ENV, "/from/env"), (AUTHOR_ENV, "Env Author")],
        );

        assert_eq!(config.data_dir, Some(PathBuf::from("/from/flag")));
        assert_eq!(config.author, "Flag Author");
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let config = overridden(
            &["complaint-tracker", "complaints", "list", "--author", "Late Flag"],
            &[(AUTHOR_ENV, "Env Author")],
        );

        assert_eq!(config.author, "Late Flag");
    }

    #[test]
    fn blank_env_author_is_ignored() {
        let config = overridden(
            &["complaint-tracker", "complaints", "list"],
            &[(AUTHOR_ENV, "   ")],
        );

        assert_eq!(config.author, "File Author");
        assert_eq!(config.data_dir, Some(PathBuf::from("/from/file")));
    }
}
