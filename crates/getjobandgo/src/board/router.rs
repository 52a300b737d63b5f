use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicationDraft, ApplicationId, CompanyUpdate, JobDraft, JobId, ProfileId, SignupRequest,
    StudentUpdate,
};
use super::error::BoardError;
use super::identity::{IdentityProvider, Session};
use super::lifecycle::{ApplicationDecision, VerificationDecision};
use super::repository::BoardStore;
use super::service::BoardService;
use super::views::Envelope;

type SharedService<S, I> = State<Arc<BoardService<S, I>>>;

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationRequest {
    pub decision: VerificationDecision,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub decision: ApplicationDecision,
}

/// Router builder exposing every board operation under `/api/v1`.
pub fn board_router<S, I>(service: Arc<BoardService<S, I>>) -> Router
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/auth/signup", post(signup_handler::<S, I>))
        .route("/api/v1/auth/signout", post(signout_handler::<S, I>))
        .route("/api/v1/me", get(me_handler::<S, I>))
        .route(
            "/api/v1/students/:student_id",
            get(get_student_handler::<S, I>).put(update_student_handler::<S, I>),
        )
        .route(
            "/api/v1/students/:student_id/applications",
            get(student_applications_handler::<S, I>),
        )
        .route("/api/v1/companies", get(list_companies_handler::<S, I>))
        .route(
            "/api/v1/companies/:company_id",
            get(get_company_handler::<S, I>).put(update_company_handler::<S, I>),
        )
        .route(
            "/api/v1/companies/:company_id/verification",
            post(review_company_handler::<S, I>),
        )
        .route(
            "/api/v1/companies/:company_id/jobs",
            get(company_jobs_handler::<S, I>),
        )
        .route(
            "/api/v1/jobs",
            get(list_jobs_handler::<S, I>).post(create_job_handler::<S, I>),
        )
        .route(
            "/api/v1/jobs/:job_id",
            get(get_job_handler::<S, I>)
                .put(update_job_handler::<S, I>)
                .delete(delete_job_handler::<S, I>),
        )
        .route("/api/v1/jobs/:job_id/close", post(close_job_handler::<S, I>))
        .route(
            "/api/v1/jobs/:job_id/applications",
            get(job_applications_handler::<S, I>),
        )
        .route(
            "/api/v1/jobs/:job_id/applied",
            get(has_applied_handler::<S, I>),
        )
        .route(
            "/api/v1/applications",
            post(create_application_handler::<S, I>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            post(application_status_handler::<S, I>),
        )
        .with_state(service)
}

/// HTTP status for each error kind.
pub fn status_for(error: &BoardError) -> StatusCode {
    match error {
        BoardError::Unauthorized => StatusCode::UNAUTHORIZED,
        BoardError::Forbidden(_) => StatusCode::FORBIDDEN,
        BoardError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BoardError::NotFound { .. } => StatusCode::NOT_FOUND,
        BoardError::DuplicateApplication { .. }
        | BoardError::InvalidTransition { .. }
        | BoardError::JobClosed(_)
        | BoardError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        BoardError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Unwrap a JSON body, reporting malformed input as a validation error.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, BoardError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| BoardError::validation("body", rejection.body_text()))
}

fn with_session<S, I, T>(
    service: &BoardService<S, I>,
    headers: &HeaderMap,
    operation: impl FnOnce(Option<&Session>) -> Result<T, BoardError>,
) -> Result<T, BoardError>
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let session = service.authenticate(bearer_token(headers))?;
    operation(session.as_ref())
}

fn respond<T: Serialize>(success: StatusCode, result: Result<T, BoardError>) -> Response {
    match result {
        Ok(data) => (success, Json(Envelope::from_result(Ok(data)))).into_response(),
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                error!(error = %err, "board operation failed");
            }
            (status, Json(Envelope::<T>::from_result(Err(&err)))).into_response()
        }
    }
}

pub(crate) async fn signup_handler<S, I>(
    State(service): SharedService<S, I>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::CREATED,
        json_body(payload).and_then(|request| service.signup(request)),
    )
}

pub(crate) async fn signout_handler<S, I>(
    State(service): SharedService<S, I>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let result = service
        .sign_out(bearer_token(&headers))
        .map(|()| json!({ "signed_out": true }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn me_handler<S, I>(
    State(service): SharedService<S, I>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| service.me(session)),
    )
}

pub(crate) async fn get_student_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(student_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ProfileId(student_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| service.get_student(session, &id)),
    )
}

pub(crate) async fn update_student_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(student_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<StudentUpdate>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ProfileId(student_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.update_student(session, &id, &json_body(payload)?)
        }),
    )
}

pub(crate) async fn student_applications_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(student_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ProfileId(student_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.list_student_applications(session, &id)
        }),
    )
}

pub(crate) async fn list_companies_handler<S, I>(
    State(service): SharedService<S, I>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| service.list_companies(session)),
    )
}

pub(crate) async fn get_company_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(company_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ProfileId(company_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| service.get_company(session, &id)),
    )
}

pub(crate) async fn update_company_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(company_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CompanyUpdate>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ProfileId(company_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.update_company(session, &id, &json_body(payload)?)
        }),
    )
}

pub(crate) async fn review_company_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(company_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ProfileId(company_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.review_company(session, &id, json_body(payload)?.decision)
        }),
    )
}

pub(crate) async fn company_jobs_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(company_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ProfileId(company_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.list_company_jobs(session, &id)
        }),
    )
}

pub(crate) async fn list_jobs_handler<S, I>(
    State(service): SharedService<S, I>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| service.list_jobs(session)),
    )
}

pub(crate) async fn create_job_handler<S, I>(
    State(service): SharedService<S, I>,
    headers: HeaderMap,
    payload: Result<Json<JobDraft>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::CREATED,
        with_session(&service, &headers, |session| {
            service.create_job(session, json_body(payload)?)
        }),
    )
}

pub(crate) async fn get_job_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| service.get_job(session, &id)),
    )
}

pub(crate) async fn update_job_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<JobDraft>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.update_job(session, &id, json_body(payload)?)
        }),
    )
}

pub(crate) async fn delete_job_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    let result = with_session(&service, &headers, |session| service.delete_job(session, &id))
        .map(|()| json!({ "id": id }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn close_job_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| service.close_job(session, &id)),
    )
}

pub(crate) async fn job_applications_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.list_job_applications(session, &id)
        }),
    )
}

pub(crate) async fn has_applied_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = JobId(job_id);
    let result = with_session(&service, &headers, |session| service.has_applied(session, &id))
        .map(|applied| json!({ "job_id": id, "applied": applied }));
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_application_handler<S, I>(
    State(service): SharedService<S, I>,
    headers: HeaderMap,
    payload: Result<Json<ApplicationDraft>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    respond(
        StatusCode::CREATED,
        with_session(&service, &headers, |session| {
            service.create_application(session, json_body(payload)?)
        }),
    )
}

pub(crate) async fn application_status_handler<S, I>(
    State(service): SharedService<S, I>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Response
where
    S: BoardStore + 'static,
    I: IdentityProvider + 'static,
{
    let id = ApplicationId(application_id);
    respond(
        StatusCode::OK,
        with_session(&service, &headers, |session| {
            service.set_application_status(session, &id, json_body(payload)?.decision)
        }),
    )
}
