//! Domain types for the todo API and the session's derived view.
//!
//! # Design
//! Wire DTOs mirror the mock-server's schema but are defined independently;
//! integration tests catch any schema drift between the two crates. The view
//! types (`StatusFilter`, `DisplayItem`, `ErrorKind`) never cross the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Server-assigned todo identifier.
pub type TodoId = u64;

/// Id reserved for the optimistic placeholder shown while a create is in flight.
pub const PENDING_ID: TodoId = 0;

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    pub user_id: u64,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub user_id: u64,
}

/// Placeholder for a todo the server has not confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTodo {
    pub title: String,
    pub user_id: u64,
}

impl PendingTodo {
    /// The placeholder as a todo carrying the sentinel id.
    pub fn as_todo(&self) -> Todo {
        Todo {
            id: PENDING_ID,
            title: self.title.clone(),
            completed: false,
            user_id: self.user_id,
        }
    }
}

/// One row of the rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayItem<'a> {
    Confirmed { todo: &'a Todo, loading: bool },
    /// Always rendered as loading.
    Pending(&'a PendingTodo),
}

impl<'a> DisplayItem<'a> {
    pub fn title(&self) -> &'a str {
        match *self {
            DisplayItem::Confirmed { todo, .. } => &todo.title,
            DisplayItem::Pending(pending) => &pending.title,
        }
    }

    pub fn is_loading(&self) -> bool {
        match self {
            DisplayItem::Confirmed { loading, .. } => *loading,
            DisplayItem::Pending(_) => true,
        }
    }
}

/// View-level predicate over the todo collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

/// User-visible error tags. Exactly one is shown at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnableLoadTodo,
    UnableAddTodo,
    UnableUpdateTodo,
    UnableDeleteTodo,
    EmptyTodoTitle,
}

impl ErrorKind {
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::UnableLoadTodo => "Unable to load todos",
            ErrorKind::UnableAddTodo => "Unable to add a todo",
            ErrorKind::UnableUpdateTodo => "Unable to update a todo",
            ErrorKind::UnableDeleteTodo => "Unable to delete a todo",
            ErrorKind::EmptyTodoTitle => "Title should not be empty",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
