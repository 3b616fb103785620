use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use todo_core::{ConfigError, Dispatch, SessionConfig, StatusFilter, Todo, TodoId, TodoSession};
use tracing_subscriber::EnvFilter;

mod view;

/// Manage one user's todos on a remote todo API.
#[derive(Parser)]
#[command(name = "todo", version)]
struct Cli {
    /// Base URL of the todo API.
    #[arg(long, env = "TODO_API_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Owner of the todos. Zero or absent blocks every command.
    #[arg(long, env = "TODO_USER_ID", default_value_t = 0)]
    user_id: u64,

    /// Which todos to print: all, active or completed.
    #[arg(long, default_value = "all")]
    filter: StatusFilter,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the list (default).
    List,
    /// Create a todo.
    Add { title: String },
    /// Flip a todo between active and completed.
    Toggle { id: TodoId },
    /// Change a todo's title; an empty title deletes it.
    Rename { id: TodoId, title: String },
    Delete { id: TodoId },
    /// Delete every completed todo, or none if any deletion fails.
    ClearCompleted,
    /// Complete every todo, or reopen all when all are completed.
    ToggleAll,
}

impl Command {
    /// The todo this command acts on, if it names one.
    fn target(&self) -> Option<TodoId> {
        match self {
            Command::Toggle { id } | Command::Rename { id, .. } | Command::Delete { id } => Some(*id),
            _ => None,
        }
    }
}

/// The targeted id when it is not in the loaded list.
fn missing_target(command: &Command, todos: &[Todo]) -> Option<TodoId> {
    command
        .target()
        .filter(|&id| !todos.iter().any(|todo| todo.id == id))
}

fn notice(dispatch: Dispatch) -> Option<String> {
    match dispatch {
        Dispatch::Skipped => Some("nothing to change".to_string()),
        Dispatch::Busy(id) => Some(format!("todo {id} already has a request in flight")),
        Dispatch::Started | Dispatch::Invalid(_) => None,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match SessionConfig::new(&cli.base_url, cli.user_id) {
        Ok(config) => config,
        Err(ConfigError::MissingUserId) => {
            view::print_user_warning();
            std::process::exit(2);
        }
        Err(err) => return Err(err.into()),
    };

    let mut session = TodoSession::connect(&config);
    session.set_status_filter(cli.filter);
    session.load();
    session.settle().await;
    if let Some(kind) = session.error() {
        bail!("{kind}");
    }

    let command = cli.command.unwrap_or(Command::List);
    if let Some(id) = missing_target(&command, session.todos()) {
        bail!("no todo with id {id}");
    }

    let dispatch = match command {
        Command::List => None,
        Command::Add { title } => Some(session.add_todo(&title)),
        Command::Toggle { id } => Some(session.toggle_todo(id)),
        Command::Rename { id, title } => Some(session.rename_todo(id, &title)),
        Command::Delete { id } => Some(session.delete_todo(id)),
        Command::ClearCompleted => Some(session.delete_all_completed()),
        Command::ToggleAll => Some(session.toggle_all()),
    };
    tracing::debug!(?dispatch, "command dispatched");
    if let Some(message) = dispatch.and_then(notice) {
        eprintln!("{message}");
    }
    session.settle().await;

    view::print_session(&session);
    if let Some(kind) = session.error() {
        bail!("{kind}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: TodoId) -> Todo {
        Todo {
            id,
            title: format!("todo {id}"),
            completed: false,
            user_id: 1,
        }
    }

    #[test]
    fn unknown_id_is_reported() {
        let todos = vec![todo(1), todo(2)];
        assert_eq!(missing_target(&Command::Toggle { id: 999 }, &todos), Some(999));
        assert_eq!(missing_target(&Command::Delete { id: 3 }, &todos), Some(3));
        assert_eq!(
            missing_target(&Command::Rename { id: 4, title: String::new() }, &todos),
            Some(4)
        );
    }

    #[test]
    fn known_id_and_untargeted_commands_pass() {
        let todos = vec![todo(1)];
        assert_eq!(missing_target(&Command::Toggle { id: 1 }, &todos), None);
        assert_eq!(missing_target(&Command::ClearCompleted, &todos), None);
        assert_eq!(missing_target(&Command::List, &[]), None);
    }

    #[test]
    fn skipped_and_busy_get_a_notice() {
        assert_eq!(notice(Dispatch::Skipped).as_deref(), Some("nothing to change"));
        assert_eq!(
            notice(Dispatch::Busy(5)).as_deref(),
            Some("todo 5 already has a request in flight")
        );
        assert_eq!(notice(Dispatch::Started), None);
    }
}
