use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::assignment::{AssignmentRequest, ResetScope};
use super::domain::{ContactRecord, SubjectId};
use super::identity::RoleDirectory;
use super::locator::LocatorDirectory;
use super::repository::{FollowStore, StoreError};
use super::service::{FollowServiceError, FollowUpService};

/// Router builder exposing the follow-up HTTP endpoints.
pub fn followup_router<S, L, R>(service: Arc<FollowUpService<S, L, R>>) -> Router
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    Router::new()
        .route("/api/v1/followup/contacts", post(log_contact_handler::<S, L, R>))
        .route(
            "/api/v1/followup/subjects/:subject_id",
            get(subject_status_handler::<S, L, R>),
        )
        .route(
            "/api/v1/followup/assignments",
            post(assign_handler::<S, L, R>),
        )
        .route(
            "/api/v1/followup/assignments/reset",
            post(reset_handler::<S, L, R>),
        )
        .route(
            "/api/v1/followup/assignments/reassign",
            post(reassign_handler::<S, L, R>),
        )
        .route("/api/v1/followup/report", get(report_handler::<S, L, R>))
        .route(
            "/api/v1/followup/export/work-items",
            get(export_handler::<S, L, R>),
        )
        .with_state(service)
}

fn error_response(error: FollowServiceError) -> Response {
    let status = match &error {
        FollowServiceError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
        // Membership faults are provisioning errors; everything else is a
        // collaborator failure. Both surface unchanged.
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn log_contact_handler<S, L, R>(
    State(service): State<Arc<FollowUpService<S, L, R>>>,
    axum::Json(record): axum::Json<ContactRecord>,
) -> Response
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    match service.log_contact(record) {
        Ok(ack) => (StatusCode::ACCEPTED, axum::Json(ack)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn subject_status_handler<S, L, R>(
    State(service): State<Arc<FollowUpService<S, L, R>>>,
    Path(subject_id): Path<String>,
) -> Response
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    let subject = SubjectId::new(subject_id);
    match service.subject_status(&subject) {
        Ok(Some(view)) => (StatusCode::OK, axum::Json(view)).into_response(),
        Ok(None) => {
            // Unknown subjects get a pending view rather than an error; the
            // caller decides whether to enter them into the pool.
            let payload = json!({
                "subject_id": subject.0,
                "in_pool": false,
                "eligibility": "pending",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignBody {
    #[serde(flatten)]
    pub(crate) request: AssignmentRequest,
    #[serde(default)]
    pub(crate) on: Option<NaiveDate>,
}

pub(crate) async fn assign_handler<S, L, R>(
    State(service): State<Arc<FollowUpService<S, L, R>>>,
    axum::Json(body): axum::Json<AssignBody>,
) -> Response
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    let on = body.on.unwrap_or_else(|| Local::now().date_naive());
    match service.assign(body.request, on) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResetBody {
    /// Omit to reset every worker's assignments.
    #[serde(default)]
    pub(crate) worker: Option<String>,
}

pub(crate) async fn reset_handler<S, L, R>(
    State(service): State<Arc<FollowUpService<S, L, R>>>,
    axum::Json(body): axum::Json<ResetBody>,
) -> Response
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    let scope = match body.worker {
        Some(worker) => ResetScope::Worker(worker),
        None => ResetScope::All,
    };
    match service.reset_assignments(scope) {
        Ok(cleared) => (StatusCode::OK, axum::Json(json!({ "cleared": cleared }))).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReassignBody {
    pub(crate) from: String,
    pub(crate) to: String,
    #[serde(default)]
    pub(crate) on: Option<NaiveDate>,
}

pub(crate) async fn reassign_handler<S, L, R>(
    State(service): State<Arc<FollowUpService<S, L, R>>>,
    axum::Json(body): axum::Json<ReassignBody>,
) -> Response
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    let on = body.on.unwrap_or_else(|| Local::now().date_naive());
    match service.reassign(&body.from, &body.to, on) {
        Ok(moved) => (StatusCode::OK, axum::Json(json!({ "moved": moved }))).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn report_handler<S, L, R>(
    State(service): State<Arc<FollowUpService<S, L, R>>>,
    Query(query): Query<ReportQuery>,
) -> Response
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    let today = query.today.unwrap_or_else(|| Local::now().date_naive());
    match service.report(today) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<S, L, R>(
    State(service): State<Arc<FollowUpService<S, L, R>>>,
) -> Response
where
    S: FollowStore + 'static,
    L: LocatorDirectory + 'static,
    R: RoleDirectory + 'static,
{
    match service.export_work_items() {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv")],
            csv,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
