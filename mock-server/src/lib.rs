use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
    pub user_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub user_id: u64,
}

/// Every field is optional; `id` in the body is ignored in favour of the path.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub user_id: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<u64>,
}

/// In-memory table; ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct Store {
    todos: BTreeMap<u64, Todo>,
    last_id: u64,
}

impl Store {
    pub fn insert(&mut self, input: CreateTodo) -> Todo {
        self.last_id += 1;
        let todo = Todo {
            id: self.last_id,
            title: input.title,
            completed: input.completed,
            user_id: input.user_id,
        };
        self.todos.insert(todo.id, todo.clone());
        todo
    }

    pub fn get(&self, id: u64) -> Option<&Todo> {
        self.todos.get(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Todo> {
        self.todos.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Db::default())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Db::default()).await
}

pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

async fn list_todos(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<Todo>> {
    let store = db.read().await;
    let todos: Vec<Todo> = store
        .todos
        .values()
        .filter(|todo| query.user_id.map_or(true, |user_id| todo.user_id == user_id))
        .cloned()
        .collect();
    debug!(user_id = ?query.user_id, count = todos.len(), "list");
    Json(todos)
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> (StatusCode, Json<Todo>) {
    let todo = db.write().await.insert(input);
    debug!(id = todo.id, "create");
    (StatusCode::CREATED, Json(todo))
}

async fn get_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Todo>, StatusCode> {
    let store = db.read().await;
    store.get(id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<PatchTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut store = db.write().await;
    let todo = store.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    if let Some(user_id) = input.user_id {
        todo.user_id = user_id;
    }
    debug!(id, "update");
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    debug!(id, "delete");
    store
        .remove(id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_user_id_in_camel_case() {
        let todo = Todo {
            id: 1,
            title: "Test".to_string(),
            completed: false,
            user_id: 9,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Test");
        assert_eq!(json["completed"], false);
        assert_eq!(json["userId"], 9);
    }

    #[test]
    fn create_todo_defaults_completed_to_false() {
        let input: CreateTodo =
            serde_json::from_str(r#"{"title":"No completed field","userId":1}"#).unwrap();
        assert_eq!(input.title, "No completed field");
        assert!(!input.completed);
    }

    #[test]
    fn create_todo_rejects_missing_user() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"title":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn patch_accepts_full_todo_body() {
        let input: PatchTodo = serde_json::from_str(
            r#"{"id":4,"title":"New title","completed":true,"userId":2}"#,
        )
        .unwrap();
        assert_eq!(input.title.as_deref(), Some("New title"));
        assert_eq!(input.completed, Some(true));
    }

    #[test]
    fn store_assigns_increasing_ids() {
        let mut store = Store::default();
        let first = store.insert(CreateTodo {
            title: "a".to_string(),
            completed: false,
            user_id: 1,
        });
        let second = store.insert(CreateTodo {
            title: "b".to_string(),
            completed: true,
            user_id: 1,
        });
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(store.len(), 2);
    }
}
