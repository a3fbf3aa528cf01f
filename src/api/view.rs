//! Minimal HTML viewer for a stored task.
//!
//! Shows the nonce, the image the brief points at and the "solved" value
//! derived from that image's file name.

use std::sync::{Arc, LazyLock};

use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::Html,
};
use regex::Regex;
use serde_json::Value;

use super::routes::AppState;
use crate::workspace;

static BRIEF_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?url=(\S+)").expect("brief url regex is valid"));

static DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digits regex is valid"));

/// Image shown for a task: a `?url=` in the brief, else its first attachment.
fn image_url(task: &str, request: &Value) -> Option<String> {
    let brief = request.get("brief").and_then(Value::as_str).unwrap_or("");
    if let Some(m) = BRIEF_URL_REGEX.captures(brief).and_then(|c| c.get(1)) {
        return Some(m.as_str().to_string());
    }
    let name = request
        .get("attachments")?
        .as_array()?
        .first()?
        .get("name")?
        .as_str()?;
    Some(format!(
        "/files/{}/{}",
        urlencoding::encode(task),
        urlencoding::encode(name)
    ))
}

/// Digits in a locally served image's file name, or `solved` when there are none.
fn solved_value(image_url: &str) -> Option<String> {
    if !image_url.starts_with("/files/") {
        return None;
    }
    let name = image_url.rsplit('/').next().unwrap_or(image_url);
    Some(
        DIGITS_REGEX
            .find(name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "solved".to_string()),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render(task: &str, request: &Value) -> String {
    let task_html = escape_html(task);
    let nonce = request.get("nonce").and_then(Value::as_str).unwrap_or("");
    let image = image_url(task, request);
    let solved = image.as_deref().and_then(solved_value);

    let image_html = match &image {
        Some(url) => format!(
            r#"<img src="{}" style="max-width:90vw;max-height:60vh;"/>"#,
            escape_html(url)
        ),
        None => "<p>No image</p>".to_string(),
    };
    let solved_html = solved
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "&mdash;".to_string());

    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>view {task_html}</title></head>\
         <body><h1>Task {task_html}</h1><p>Nonce: {nonce}</p>{image_html}\
         <p>Solved: <strong>{solved_html}</strong></p></body></html>",
        nonce = escape_html(nonce),
    )
}

/// `GET /view/:task`
pub async fn view_task(
    State(state): State<Arc<AppState>>,
    UrlPath(task): UrlPath<String>,
) -> Result<Html<String>, (StatusCode, &'static str)> {
    let request = match workspace::load_request(state.data_dir(), &task).await {
        Ok(Some(request)) => request,
        Ok(None) => return Err((StatusCode::NOT_FOUND, "Task not found")),
        Err(e) => {
            tracing::warn!(task = %task, "Cannot load stored request: {}", e);
            return Err((StatusCode::NOT_FOUND, "Task not found"));
        }
    };
    Ok(Html(render(&task, &request)))
}
