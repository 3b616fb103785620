//! `TodoSession`: the single owner of all todo state.
//!
//! # Design
//! Every operation mutates local state synchronously, then spawns the
//! network round-trip as a tokio task. Tasks never touch the session; they
//! send a `Completion` back over an mpsc channel and the owner applies it in
//! `next_event` / `settle`. Requests are in flight concurrently, but their
//! effects are applied one at a time and never interleave mid-mutation.
//!
//! Optimistic state lives in two places: the pending placeholder shown while
//! a create is in flight, and the loading set of ids with an outstanding
//! mutation. An id already in the loading set cannot start a second
//! mutation.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::banner::ErrorBanner;
use crate::client::TodoClient;
use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{HttpTransport, Transport};
use crate::types::{DisplayItem, ErrorKind, NewTodo, PendingTodo, StatusFilter, Todo, TodoId, PENDING_ID};

/// What happened when an operation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A request is in flight; its effect arrives through `next_event`.
    Started,
    /// Nothing to send: the change was a no-op or targeted nothing.
    Skipped,
    /// Rejected locally before any request; the error is on the banner.
    Invalid(ErrorKind),
    /// The id already has an outstanding mutation.
    Busy(TodoId),
}

impl Dispatch {
    pub fn is_started(self) -> bool {
        self == Dispatch::Started
    }
}

/// A settled operation or timer, as applied to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Loaded(usize),
    Created(TodoId),
    Updated(TodoId),
    /// The update succeeded but the todo had already left the list.
    UpdateDiscarded(TodoId),
    Deleted(TodoId),
    CompletedCleared(Vec<TodoId>),
    Failed(ErrorKind),
    ErrorExpired(ErrorKind),
}

#[derive(Debug)]
enum Completion {
    Loaded(Result<Vec<Todo>, ApiError>),
    Created(Result<Todo, ApiError>),
    Updated { id: TodoId, result: Result<Todo, ApiError> },
    Deleted { id: TodoId, result: Result<(), ApiError> },
    BatchDeleted { ids: Vec<TodoId>, result: Result<(), ApiError> },
}

pub struct TodoSession {
    client: TodoClient,
    transport: Arc<dyn Transport>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,

    todos: Vec<Todo>,
    pending: Option<PendingTodo>,
    loading: HashSet<TodoId>,
    filter: StatusFilter,
    banner: ErrorBanner,
    draft: String,
    input_disabled: bool,
}

impl TodoSession {
    pub fn new(config: &SessionConfig, transport: Arc<dyn Transport>) -> Self {
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Self {
            client: TodoClient::new(&config.base_url, config.user_id),
            transport,
            completions_tx,
            completions,
            in_flight: 0,
            todos: Vec::new(),
            pending: None,
            loading: HashSet::new(),
            filter: StatusFilter::All,
            banner: ErrorBanner::new(config.error_ttl),
            draft: String::new(),
            input_disabled: false,
        }
    }

    /// Session talking to the real API over `HttpTransport`.
    pub fn connect(config: &SessionConfig) -> Self {
        Self::new(config, Arc::new(HttpTransport::new()))
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Fetch every todo of the configured user, replacing the collection.
    pub fn load(&mut self) -> Dispatch {
        debug!(user_id = self.client.user_id().get(), "loading todos");
        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let result = round_trip(transport.as_ref(), Ok(client.build_list_todos()), |r| {
                client.parse_list_todos(r)
            })
            .await;
            Completion::Loaded(result)
        });
        Dispatch::Started
    }

    pub fn add_todo(&mut self, title: &str) -> Dispatch {
        let title = title.trim();
        if title.is_empty() {
            self.raise(ErrorKind::EmptyTodoTitle);
            return Dispatch::Invalid(ErrorKind::EmptyTodoTitle);
        }
        if self.loading.contains(&PENDING_ID) {
            return Dispatch::Busy(PENDING_ID);
        }

        let input = NewTodo {
            title: title.to_string(),
            completed: false,
            user_id: self.client.user_id().get(),
        };
        self.input_disabled = true;
        self.pending = Some(PendingTodo {
            title: input.title.clone(),
            user_id: input.user_id,
        });
        self.loading.insert(PENDING_ID);
        debug!(title = %input.title, "creating todo");

        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let result = round_trip(transport.as_ref(), client.build_create_todo(&input), |r| {
                client.parse_create_todo(r)
            })
            .await;
            Completion::Created(result)
        });
        Dispatch::Started
    }

    /// Submit the current title draft. The draft is cleared only on success.
    pub fn submit_draft(&mut self) -> Dispatch {
        let title = self.draft.clone();
        self.add_todo(&title)
    }

    /// Send `todo` as the new state of the stored item with the same id.
    /// Identical to what is stored means no request.
    pub fn update_todo(&mut self, todo: Todo) -> Dispatch {
        if self.loading.contains(&todo.id) {
            return Dispatch::Busy(todo.id);
        }
        match self.find(todo.id) {
            None => {
                debug!(id = todo.id, "update of unknown todo ignored");
                return Dispatch::Skipped;
            }
            Some(current) if *current == todo => return Dispatch::Skipped,
            Some(_) => {}
        }

        let id = todo.id;
        self.loading.insert(id);
        debug!(id, "updating todo");

        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let result = round_trip(transport.as_ref(), client.build_update_todo(&todo), |r| {
                client.parse_update_todo(r)
            })
            .await;
            Completion::Updated { id, result }
        });
        Dispatch::Started
    }

    pub fn toggle_todo(&mut self, id: TodoId) -> Dispatch {
        let Some(current) = self.find(id) else {
            return Dispatch::Skipped;
        };
        let toggled = Todo {
            completed: !current.completed,
            ..current.clone()
        };
        self.update_todo(toggled)
    }

    /// An empty title after trimming deletes the todo instead.
    pub fn rename_todo(&mut self, id: TodoId, title: &str) -> Dispatch {
        let title = title.trim();
        if title.is_empty() {
            return self.delete_todo(id);
        }
        let Some(current) = self.find(id) else {
            return Dispatch::Skipped;
        };
        let renamed = Todo {
            title: title.to_string(),
            ..current.clone()
        };
        self.update_todo(renamed)
    }

    /// Complete every active todo, or reopen all of them when none is active.
    pub fn toggle_all(&mut self) -> Dispatch {
        let target = !self.all_completed();
        let changes: Vec<Todo> = self
            .todos
            .iter()
            .filter(|todo| todo.completed != target && !self.loading.contains(&todo.id))
            .map(|todo| Todo {
                completed: target,
                ..todo.clone()
            })
            .collect();
        if changes.is_empty() {
            return Dispatch::Skipped;
        }
        for todo in changes {
            self.update_todo(todo);
        }
        Dispatch::Started
    }

    pub fn delete_todo(&mut self, id: TodoId) -> Dispatch {
        if self.loading.contains(&id) {
            return Dispatch::Busy(id);
        }
        if self.find(id).is_none() {
            debug!(id, "delete of unknown todo ignored");
            return Dispatch::Skipped;
        }
        self.loading.insert(id);
        debug!(id, "deleting todo");

        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let result = round_trip(transport.as_ref(), Ok(client.build_delete_todo(id)), |r| {
                client.parse_delete_todo(r)
            })
            .await;
            Completion::Deleted { id, result }
        });
        Dispatch::Started
    }

    /// Delete every idle completed todo. The batch is all-or-nothing: the
    /// collection only changes when every request succeeded.
    pub fn delete_all_completed(&mut self) -> Dispatch {
        let ids: Vec<TodoId> = self
            .todos
            .iter()
            .filter(|todo| todo.completed && !self.loading.contains(&todo.id))
            .map(|todo| todo.id)
            .collect();
        if ids.is_empty() {
            return Dispatch::Skipped;
        }
        self.loading.extend(ids.iter().copied());
        debug!(count = ids.len(), "deleting completed todos");

        let client = self.client.clone();
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let requests = ids.iter().map(|&id| {
                let client = &client;
                let transport = transport.as_ref();
                async move {
                    round_trip(transport, Ok(client.build_delete_todo(id)), |r| {
                        client.parse_delete_todo(r)
                    })
                    .await
                }
            });
            let results = join_all(requests).await;
            let failed = results.iter().filter(|r| r.is_err()).count();
            if failed > 0 {
                warn!(failed, total = ids.len(), "batch delete incomplete");
            }
            let result = results.into_iter().find_map(Result::err).map_or(Ok(()), Err);
            Completion::BatchDeleted { ids, result }
        });
        Dispatch::Started
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn dismiss_error(&mut self) -> Option<ErrorKind> {
        self.banner.dismiss()
    }

    // -----------------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------------

    /// Wait for the next completion or banner expiry and apply it.
    ///
    /// Returns `None` when no request is in flight and no error is showing.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            let deadline = self.banner.deadline();
            if self.in_flight == 0 && deadline.is_none() {
                return None;
            }
            tokio::select! {
                Some(completion) = self.completions.recv(), if self.in_flight > 0 => {
                    return Some(self.apply(completion));
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(kind) = self.banner.expire(Instant::now()) {
                        return Some(SessionEvent::ErrorExpired(kind));
                    }
                }
                else => return None,
            }
        }
    }

    /// Apply completions until nothing is in flight. A banner whose deadline
    /// passes while waiting is cleared on time.
    pub async fn settle(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while self.in_flight > 0 {
            let deadline = self.banner.deadline();
            tokio::select! {
                completion = self.completions.recv() => match completion {
                    Some(completion) => events.push(self.apply(completion)),
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(kind) = self.banner.expire(Instant::now()) {
                        events.push(SessionEvent::ErrorExpired(kind));
                    }
                }
            }
        }
        events
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    // -----------------------------------------------------------------------
    // Derived view state
    // -----------------------------------------------------------------------

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn pending(&self) -> Option<&PendingTodo> {
        self.pending.as_ref()
    }

    /// Filtered confirmed todos, followed by the pending placeholder if any.
    pub fn visible_items(&self) -> Vec<DisplayItem<'_>> {
        let mut items: Vec<DisplayItem<'_>> = self
            .todos
            .iter()
            .filter(|todo| self.filter.matches(todo))
            .map(|todo| DisplayItem::Confirmed {
                todo,
                loading: self.loading.contains(&todo.id),
            })
            .collect();
        if let Some(pending) = &self.pending {
            items.push(DisplayItem::Pending(pending));
        }
        items
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    pub fn has_completed(&self) -> bool {
        self.todos.iter().any(|todo| todo.completed)
    }

    pub fn all_completed(&self) -> bool {
        !self.todos.is_empty() && self.todos.iter().all(|todo| todo.completed)
    }

    pub fn footer_visible(&self) -> bool {
        !self.todos.is_empty()
    }

    pub fn is_loading(&self, id: TodoId) -> bool {
        self.loading.contains(&id)
    }

    pub fn loading_ids(&self) -> Vec<TodoId> {
        let mut ids: Vec<TodoId> = self.loading.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The banner as of now; an error past its deadline is never reported.
    pub fn error(&self) -> Option<ErrorKind> {
        self.banner.current_at(Instant::now())
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn input_disabled(&self) -> bool {
        self.input_disabled
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn find(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    fn raise(&mut self, kind: ErrorKind) {
        self.banner.raise(kind, Instant::now());
    }

    fn spawn<F>(&mut self, work: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            // Send fails only once the session is gone; the completion is stale.
            let _ = tx.send(work.await);
        });
    }

    fn apply(&mut self, completion: Completion) -> SessionEvent {
        self.in_flight -= 1;
        match completion {
            Completion::Loaded(Ok(todos)) => {
                let count = todos.len();
                self.todos = todos;
                SessionEvent::Loaded(count)
            }
            Completion::Loaded(Err(err)) => self.fail(ErrorKind::UnableLoadTodo, &err),
            Completion::Created(result) => {
                self.pending = None;
                self.loading.remove(&PENDING_ID);
                self.input_disabled = false;
                match result {
                    Ok(todo) => {
                        let id = todo.id;
                        self.todos.push(todo);
                        self.draft.clear();
                        SessionEvent::Created(id)
                    }
                    Err(err) => self.fail(ErrorKind::UnableAddTodo, &err),
                }
            }
            Completion::Updated { id, result } => {
                self.loading.remove(&id);
                match result {
                    Ok(todo) => match self.todos.iter_mut().find(|t| t.id == id) {
                        Some(slot) => {
                            *slot = todo;
                            SessionEvent::Updated(id)
                        }
                        // A reload dropped it while the request was in flight.
                        None => SessionEvent::UpdateDiscarded(id),
                    },
                    Err(err) => self.fail(ErrorKind::UnableUpdateTodo, &err),
                }
            }
            Completion::Deleted { id, result } => {
                self.loading.remove(&id);
                match result {
                    Ok(()) => {
                        self.todos.retain(|todo| todo.id != id);
                        SessionEvent::Deleted(id)
                    }
                    Err(err) => self.fail(ErrorKind::UnableDeleteTodo, &err),
                }
            }
            Completion::BatchDeleted { ids, result } => {
                for id in &ids {
                    self.loading.remove(id);
                }
                match result {
                    Ok(()) => {
                        self.todos.retain(|todo| !ids.contains(&todo.id));
                        SessionEvent::CompletedCleared(ids)
                    }
                    Err(err) => self.fail(ErrorKind::UnableDeleteTodo, &err),
                }
            }
        }
    }

    fn fail(&mut self, kind: ErrorKind, err: &ApiError) -> SessionEvent {
        warn!(error = %err, "{kind}");
        self.raise(kind);
        SessionEvent::Failed(kind)
    }
}

async fn round_trip<T>(
    transport: &dyn Transport,
    request: Result<HttpRequest, ApiError>,
    parse: impl FnOnce(HttpResponse) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let response = transport.execute(request?).await?;
    parse(response)
}
