//! Server-rendered pages
//!
//! Pages go through the same store calls as the JSON API, so they see and
//! change exactly what the caller's role allows. Create and edit forms take
//! the record's JSON input and are checked by the same validation. The login form stores the
//! access token in an HTTP-only cookie that [`CurrentCaller`] reads back.

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use campus_common::{policy::table::transitions_for, CampusError, Caller, EntityKind, Filter, Transition};
use handlebars::{Handlebars, TemplateError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::{CurrentCaller, SESSION_COOKIE};
use crate::ApiState;

const ERROR_500: &str = "<!DOCTYPE html>\n<html><head><title>Internal Server Error</title></head>\
<body><h1>Internal Server Error</h1><p>Something went wrong on our end.</p></body></html>";

/// Scalar columns shown in list tables
const LIST_COLUMNS: usize = 6;

/// Registered page templates
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("header", include_str!("../templates/header.hbs"))?;
        registry.register_partial("footer", include_str!("../templates/footer.hbs"))?;
        for (name, source) in [
            ("landing", include_str!("../templates/landing.hbs")),
            ("login", include_str!("../templates/login.hbs")),
            ("dashboard", include_str!("../templates/dashboard.hbs")),
            ("list", include_str!("../templates/list.hbs")),
            ("detail", include_str!("../templates/detail.hbs")),
            ("form", include_str!("../templates/form.hbs")),
            ("error", include_str!("../templates/error.hbs")),
        ] {
            registry.register_template_string(name, source)?;
        }
        Ok(Self { registry })
    }

    /// Renders a template, falling back to a static 500 page
    pub fn render<S: Serialize>(&self, status: StatusCode, name: &str, data: &S) -> Response {
        match self.registry.render(name, data) {
            Ok(body) => (status, Html(body)).into_response(),
            Err(e) => {
                tracing::error!(template = name, error = %e, "Error rendering template");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(ERROR_500)).into_response()
            }
        }
    }
}

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/", get(landing))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/pages/:entity", get(list))
        .route("/pages/:entity/new", get(new_form).post(create))
        .route("/pages/:entity/:id", get(detail))
        .route("/pages/:entity/:id/edit", get(edit_form).post(update))
        .route("/pages/:entity/:id/delete", post(delete))
        .route("/pages/:entity/:id/:transition", post(transition))
}

/// Navigation and signed-in user, shared by every page
fn frame(state: &ApiState, caller: &Caller, title: &str) -> Value {
    let user = state.store.me(caller).ok().map(|account| {
        json!({
            "name": format!("{} {}", account.first_name, account.last_name),
            "role": account.role.as_str(),
        })
    });
    let nav: Vec<Value> = if caller.is_anonymous() {
        Vec::new()
    } else {
        crate::routes::index::areas()
            .into_iter()
            .map(|area| json!({ "area": area.area, "links": area.endpoints }))
            .collect()
    };
    json!({ "title": title, "user": user, "nav": nav })
}

fn with(mut frame: Value, extra: Value) -> Value {
    if let (Some(target), Value::Object(fields)) = (frame.as_object_mut(), extra) {
        target.extend(fields);
    }
    frame
}

/// Maps a store error to a page; unauthenticated visitors go to the login form
fn failure(state: &ApiState, caller: &Caller, error: CampusError) -> Response {
    let (status, message) = match &error {
        CampusError::AuthFailed(_) => return Redirect::to("/login").into_response(),
        CampusError::Validation(_) => (StatusCode::BAD_REQUEST, error.to_string()),
        CampusError::PermissionDenied => (StatusCode::FORBIDDEN, error.to_string()),
        CampusError::NotFound => (StatusCode::NOT_FOUND, error.to_string()),
        CampusError::Conflict(_) | CampusError::InvalidTransition { .. } => {
            (StatusCode::CONFLICT, error.to_string())
        }
        CampusError::Internal(_) => {
            tracing::error!(error = %error, "page failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
        }
    };
    let data = with(frame(state, caller, "Error"), json!({ "status": status.as_u16(), "message": message }));
    state.pages.render(status, "error", &data)
}

fn kind_of(entity: &str) -> Result<EntityKind, CampusError> {
    entity.parse().map_err(|_| CampusError::NotFound)
}

fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Column names and rows for a list of records
fn table(items: &[Value]) -> (Vec<String>, Vec<Value>) {
    let columns: Vec<String> = items
        .first()
        .and_then(Value::as_object)
        .map(|first| {
            first
                .iter()
                .filter(|(name, value)| {
                    !matches!(name.as_str(), "id" | "created_at" | "updated_at") && cell(value).is_some()
                })
                .map(|(name, _)| name.clone())
                .take(LIST_COLUMNS)
                .collect()
        })
        .unwrap_or_default();

    let rows = items
        .iter()
        .map(|item| {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| item.get(c).and_then(cell).unwrap_or_default())
                .collect();
            json!({ "id": item.get("id"), "cells": cells })
        })
        .collect();
    (columns, rows)
}

/// Every field of one record, nested values as JSON
fn fields(record: &Value) -> Vec<Value> {
    record
        .as_object()
        .map(|object| {
            object
                .iter()
                .map(|(name, value)| {
                    let shown = cell(value).unwrap_or_else(|| value.to_string());
                    json!({ "name": name, "value": shown })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fields a caller never sends back
const SERVER_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Editable JSON for an existing record
fn editable(record: &Value) -> String {
    let mut record = record.clone();
    if let Some(object) = record.as_object_mut() {
        for name in SERVER_FIELDS {
            object.remove(name);
        }
    }
    serde_json::to_string_pretty(&record).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct RecordForm {
    /// The record input as JSON
    pub body: String,
}

impl RecordForm {
    fn input(&self) -> Result<Value, CampusError> {
        serde_json::from_str(&self.body).map_err(|e| CampusError::invalid("body", e.to_string()))
    }
}

/// Renders the create or edit form, with any validation messages
fn form_page(
    state: &ApiState,
    caller: &Caller,
    kind: EntityKind,
    id: Option<Uuid>,
    body: &str,
    errors: Option<Value>,
) -> Response {
    let (heading, action) = match id {
        Some(id) => (format!("Edit {}", kind.label()), format!("/pages/{}/{}/edit", kind.slug(), id)),
        None => (format!("New {}", kind.label()), format!("/pages/{}/new", kind.slug())),
    };
    let status = if errors.is_some() { StatusCode::BAD_REQUEST } else { StatusCode::OK };
    let data = with(
        frame(state, caller, &heading),
        json!({
            "heading": heading,
            "entity": kind.slug(),
            "action": action,
            "body": body,
            "errors": errors,
        }),
    );
    state.pages.render(status, "form", &data)
}

/// Saved records go to their detail page; validation failures re-render the form
fn saved(
    state: &ApiState,
    caller: &Caller,
    kind: EntityKind,
    id: Option<Uuid>,
    form: &RecordForm,
    result: Result<Value, CampusError>,
) -> Response {
    match result {
        Ok(record) => {
            let id = record.get("id").and_then(Value::as_str).unwrap_or_default();
            Redirect::to(&format!("/pages/{}/{}", kind.slug(), id)).into_response()
        }
        Err(CampusError::Validation(fields)) => form_page(state, caller, kind, id, &form.body, Some(json!(fields))),
        Err(e) => failure(state, caller, e),
    }
}

async fn landing(State(state): State<Arc<ApiState>>, CurrentCaller(caller): CurrentCaller) -> Response {
    let data = frame(&state, &caller, "Campus");
    state.pages.render(StatusCode::OK, "landing", &data)
}

async fn login_form(State(state): State<Arc<ApiState>>, CurrentCaller(caller): CurrentCaller) -> Response {
    if !caller.is_anonymous() {
        return Redirect::to("/dashboard").into_response();
    }
    let data = frame(&state, &caller, "Sign in");
    state.pages.render(StatusCode::OK, "login", &data)
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

async fn login(State(state): State<Arc<ApiState>>, Form(form): Form<LoginForm>) -> Response {
    let issued = state
        .store
        .authenticate(&form.email, &form.password)
        .and_then(|account| Ok(state.tokens.issue(account.id, account.role)?));
    match issued {
        Ok(tokens) => {
            let cookie = format!(
                "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
                SESSION_COOKIE, tokens.access, state.config.access_ttl_secs
            );
            (AppendHeaders([(header::SET_COOKIE, cookie)]), Redirect::to("/dashboard")).into_response()
        }
        Err(CampusError::AuthFailed(_)) => {
            let data = with(
                frame(&state, &Caller::Anonymous, "Sign in"),
                json!({ "error": "Invalid email or password", "email": form.email }),
            );
            state.pages.render(StatusCode::UNAUTHORIZED, "login", &data)
        }
        Err(e) => failure(&state, &Caller::Anonymous, e),
    }
}

async fn logout() -> Response {
    let cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
    (AppendHeaders([(header::SET_COOKIE, cookie)]), Redirect::to("/")).into_response()
}

async fn dashboard(State(state): State<Arc<ApiState>>, CurrentCaller(caller): CurrentCaller) -> Response {
    match state.store.dashboard_stats(&caller) {
        Ok(stats) => {
            let data = with(frame(&state, &caller, "Dashboard"), json!({ "stats": stats }));
            state.pages.render(StatusCode::OK, "dashboard", &data)
        }
        Err(e) => failure(&state, &caller, e),
    }
}

async fn list(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(entity): Path<String>,
    Query(filter): Query<Filter>,
) -> Response {
    let result = kind_of(&entity).and_then(|kind| Ok((kind, state.store.list_values(&caller, kind, &filter)?)));
    match result {
        Ok((kind, items)) => {
            let (columns, rows) = table(&items);
            let data = with(
                frame(&state, &caller, kind.label()),
                json!({
                    "entity": kind.slug(),
                    "label": kind.label(),
                    "columns": columns,
                    "rows": rows,
                    "total": items.len(),
                    "q": filter.q,
                }),
            );
            state.pages.render(StatusCode::OK, "list", &data)
        }
        Err(e) => failure(&state, &caller, e),
    }
}

async fn detail(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path((entity, id)): Path<(String, Uuid)>,
) -> Response {
    let result = kind_of(&entity).and_then(|kind| Ok((kind, state.store.get_value(&caller, kind, id)?)));
    match result {
        Ok((kind, record)) => {
            let actions: Vec<&str> = transitions_for(kind).iter().map(Transition::slug).collect();
            let data = with(
                frame(&state, &caller, kind.label()),
                json!({
                    "entity": kind.slug(),
                    "label": kind.label(),
                    "id": id,
                    "fields": fields(&record),
                    "actions": actions,
                    "can_delete": caller.is_admin(),
                }),
            );
            state.pages.render(StatusCode::OK, "detail", &data)
        }
        Err(e) => failure(&state, &caller, e),
    }
}

async fn new_form(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(entity): Path<String>,
) -> Response {
    if caller.is_anonymous() {
        return Redirect::to("/login").into_response();
    }
    match kind_of(&entity) {
        Ok(kind) => form_page(&state, &caller, kind, None, "{}", None),
        Err(e) => failure(&state, &caller, e),
    }
}

async fn create(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path(entity): Path<String>,
    Form(form): Form<RecordForm>,
) -> Response {
    let kind = match kind_of(&entity) {
        Ok(kind) => kind,
        Err(e) => return failure(&state, &caller, e),
    };
    let result = form.input().and_then(|input| state.store.create_value(&caller, kind, input));
    saved(&state, &caller, kind, None, &form, result)
}

async fn edit_form(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path((entity, id)): Path<(String, Uuid)>,
) -> Response {
    let result = kind_of(&entity).and_then(|kind| Ok((kind, state.store.get_value(&caller, kind, id)?)));
    match result {
        Ok((kind, record)) => form_page(&state, &caller, kind, Some(id), &editable(&record), None),
        Err(e) => failure(&state, &caller, e),
    }
}

async fn update(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path((entity, id)): Path<(String, Uuid)>,
    Form(form): Form<RecordForm>,
) -> Response {
    let kind = match kind_of(&entity) {
        Ok(kind) => kind,
        Err(e) => return failure(&state, &caller, e),
    };
    let result = form.input().and_then(|input| state.store.update_value(&caller, kind, id, input));
    saved(&state, &caller, kind, Some(id), &form, result)
}

async fn delete(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path((entity, id)): Path<(String, Uuid)>,
) -> Response {
    let result = kind_of(&entity).and_then(|kind| {
        state.store.delete_kind(&caller, kind, id)?;
        Ok(kind)
    });
    match result {
        Ok(kind) => Redirect::to(&format!("/pages/{}", kind.slug())).into_response(),
        Err(e) => failure(&state, &caller, e),
    }
}

async fn transition(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    Path((entity, id, name)): Path<(String, Uuid, String)>,
) -> Response {
    let result = kind_of(&entity).and_then(|kind| {
        let transition: Transition = name.parse().map_err(|_| CampusError::NotFound)?;
        state.store.transition_kind(&caller, kind, id, transition)?;
        Ok(kind)
    });
    match result {
        Ok(kind) => Redirect::to(&format!("/pages/{}/{}", kind.slug(), id)).into_response(),
        Err(e) => failure(&state, &caller, e),
    }
}
