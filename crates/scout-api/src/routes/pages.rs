//! Server-rendered HTML pages over the registry and result store.
//!
//! Presentation only: truncation, escaping, and formatting. The store is
//! read per slug; no writes happen on this path.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::Json;
use serde_json::Value;

use scout_core::{ResultStatus, StoredResult, TaskDefinition};

use crate::error::ApiError;
use crate::server::AppState;

const PREVIEW_CHARS: usize = 240;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 56rem; padding: 0 1rem; color: #1a1a1a; }
h1 { font-size: 1.5rem; }
a { color: #0b5cad; text-decoration: none; }
a:hover { text-decoration: underline; }
.card { border: 1px solid #ddd; border-radius: 6px; padding: 1rem; margin: 1rem 0; }
.badge { display: inline-block; border-radius: 4px; padding: 0.1rem 0.5rem; font-size: 0.8rem; }
.badge.completed { background: #e2f5e7; color: #176631; }
.badge.failed { background: #fbe3e4; color: #8f1f24; }
.badge.pending { background: #eee; color: #555; }
.meta { color: #666; font-size: 0.85rem; }
pre { background: #f6f6f6; border-radius: 6px; padding: 1rem; overflow-x: auto; }
"#;

/// Listing page: every registered task with a result preview.
pub(crate) async fn listing(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    let mut cards = String::new();
    for task in state.registry().iter() {
        let stored = state.store().get(&task.slug).await.map_err(ApiError::from)?;
        cards.push_str(&task_card(task, stored.as_ref()));
    }

    Ok(Html(page(
        "scout",
        &format!("<h1>scout</h1>\n<p class=\"meta\">Daily research briefings, refreshed once a day.</p>\n{cards}"),
    )))
}

/// Detail page: one task definition plus its latest stored result.
pub(crate) async fn detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Html<String>, ApiError> {
    let Some(task) = state.registry().get(&slug) else {
        return Err(ApiError::not_found(format!("no task named {slug:?}")));
    };

    let stored = state.store().get(&slug).await.map_err(ApiError::from)?;
    let body = format!(
        "<p class=\"meta\"><a href=\"/\">&larr; all briefings</a></p>\n\
         <h1>{name}</h1>\n\
         <p>{description}</p>\n\
         <p class=\"meta\">processor: {processor}</p>\n\
         <blockquote class=\"meta\">{query}</blockquote>\n\
         {result}",
        name = escape_html(&task.name),
        description = escape_html(&task.description),
        processor = escape_html(&task.processor),
        query = escape_html(&task.query),
        result = result_section(stored.as_ref()),
    );

    Ok(Html(page(&task.name, &body)))
}

/// Raw registry export.
pub(crate) async fn tasks_json(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<TaskDefinition>> {
    Json(state.registry().tasks().to_vec())
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn task_card(task: &TaskDefinition, stored: Option<&StoredResult>) -> String {
    format!(
        "<div class=\"card\">\n\
         <h2><a href=\"/{slug}\">{name}</a> {badge}</h2>\n\
         <p>{description}</p>\n\
         <p class=\"meta\">{preview}</p>\n\
         </div>\n",
        slug = escape_html(&task.slug),
        name = escape_html(&task.name),
        badge = status_badge(stored),
        description = escape_html(&task.description),
        preview = escape_html(&preview_text(stored)),
    )
}

fn result_section(stored: Option<&StoredResult>) -> String {
    match stored {
        None => format!(
            "<p>{} No result yet; the next scheduled run will fill this in.</p>",
            status_badge(None)
        ),
        Some(stored) => {
            let updated = stored.updated_at.format("%Y-%m-%d %H:%M UTC");
            let body = match (&stored.status, &stored.result, &stored.error) {
                (ResultStatus::Completed, Some(result), _) => {
                    format!("<pre>{}</pre>", escape_html(&pretty_json(result)))
                }
                (ResultStatus::Failed, _, Some(error)) => {
                    format!("<p>Run failed: {}</p>", escape_html(error))
                }
                _ => "<p>Result unavailable.</p>".to_string(),
            };
            format!(
                "<p class=\"meta\">{badge} updated {updated}</p>\n{body}",
                badge = status_badge(Some(stored)),
            )
        }
    }
}

fn status_badge(stored: Option<&StoredResult>) -> String {
    let (class, label) = match stored.map(|s| s.status) {
        Some(ResultStatus::Completed) => ("completed", "completed"),
        Some(ResultStatus::Failed) => ("failed", "failed"),
        None => ("pending", "pending"),
    };
    format!("<span class=\"badge {class}\">{label}</span>")
}

fn preview_text(stored: Option<&StoredResult>) -> String {
    match stored {
        None => "Awaiting first result.".to_string(),
        Some(stored) => match (&stored.status, &stored.result, &stored.error) {
            (ResultStatus::Completed, Some(result), _) => {
                truncate_chars(&compact_json(result), PREVIEW_CHARS)
            }
            (ResultStatus::Failed, _, Some(error)) => {
                truncate_chars(&format!("Run failed: {error}"), PREVIEW_CHARS)
            }
            _ => "Result unavailable.".to_string(),
        },
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn compact_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let cut: String = input.chars().take(max_chars).collect();
    format!("{cut}…")
}
