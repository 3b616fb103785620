//! Plain-text rendering of a session's derived state.

use todo_core::{DisplayItem, StatusFilter, TodoSession};

pub fn print_user_warning() {
    eprintln!("No user id configured.");
    eprintln!("Set TODO_USER_ID (or pass --user-id) to the id of the todo owner.");
}

pub fn print_session(session: &TodoSession) {
    print!("{}", render(session));
}

fn render(session: &TodoSession) -> String {
    let mut out = String::new();
    for item in session.visible_items() {
        out.push_str(&line(&item));
        out.push('\n');
    }
    if session.footer_visible() {
        let left = session.active_count();
        let noun = if left == 1 { "item" } else { "items" };
        out.push_str(&format!("{left} {noun} left"));
        if session.status_filter() != StatusFilter::All {
            out.push_str(&format!(" ({})", session.status_filter()));
        }
        if session.has_completed() {
            out.push_str(" | clear-completed available");
        }
        out.push('\n');
    }
    out
}

fn line(item: &DisplayItem<'_>) -> String {
    match item {
        DisplayItem::Confirmed { todo, loading } => {
            let mark = if todo.completed { "x" } else { " " };
            let busy = if *loading { " …" } else { "" };
            format!("[{mark}] {:>4}  {}{busy}", todo.id, todo.title)
        }
        DisplayItem::Pending(pending) => format!("[ ]    …  {}", pending.title),
    }
}
