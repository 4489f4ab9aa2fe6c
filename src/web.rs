use std::sync::{Mutex, MutexGuard};

use actix_files::Files;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpRequest, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::{BucketId, BucketCounts, PersonId};
use crate::config::Settings;
use crate::error::AllocationError;
use crate::interaction::{InsertionMarker, ItemBox, ItemState};
use crate::notify::Notification;
use crate::session::Session;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub session: Mutex<Session>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            session: Mutex::new(Session::new(settings)),
        }
    }
}

#[derive(Deserialize)]
pub struct PersonRequest {
    person_id: PersonId,
}

#[derive(Deserialize)]
pub struct DragOverRequest {
    bucket: BucketId,
    pointer_y: f64,
    #[serde(default)]
    layout: Vec<ItemBox>,
}

#[derive(Deserialize)]
pub struct DragLeaveRequest {
    bucket: BucketId,
}

#[derive(Deserialize)]
pub struct DropRequest {
    bucket: Option<BucketId>,
    #[serde(default)]
    pointer_y: f64,
    #[serde(default)]
    layout: Vec<ItemBox>,
}

#[derive(Serialize)]
pub struct ItemView {
    id: PersonId,
    name: String,
    location: String,
    group_size: u32,
    priority: bool,
    state: ItemState,
}

#[derive(Serialize)]
pub struct BucketView {
    id: BucketId,
    label: &'static str,
    #[serde(flatten)]
    counts: BucketCounts,
    items: Vec<ItemView>,
}

#[derive(Serialize)]
pub struct BoardResponse {
    success: bool,
    source_name: Option<String>,
    uploaded_at: Option<String>,
    total_requests: usize,
    total_people: u64,
    buckets: Vec<BucketView>,
    marker: Option<InsertionMarker>,
}

fn lock_session(state: &web::Data<AppState>) -> Result<MutexGuard<'_, Session>> {
    state
        .session
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("session lock poisoned"))
}

fn board_response(session: &Session) -> std::result::Result<BoardResponse, AllocationError> {
    let board = session.board()?;
    let buckets = board
        .buckets()
        .map(|bucket| BucketView {
            id: bucket.id,
            label: bucket.id.label(),
            counts: bucket.counts(),
            items: bucket
                .items
                .iter()
                .map(|p| ItemView {
                    id: p.id,
                    name: p.name.clone(),
                    location: p.location.clone(),
                    group_size: p.group_size,
                    priority: p.priority,
                    state: session.state_of(p.id),
                })
                .collect(),
        })
        .collect();

    Ok(BoardResponse {
        success: true,
        source_name: session.source_name().map(String::from),
        uploaded_at: session.uploaded_at().map(|t| t.to_rfc3339()),
        total_requests: board.total_requests(),
        total_people: board.total_people(),
        buckets,
        marker: session.marker(),
    })
}

fn user_message(e: &AllocationError) -> String {
    match e {
        AllocationError::MissingColumn(_) | AllocationError::NoRows => format!("Error: {e}"),
        other => other.to_string(),
    }
}

fn error_response(e: &AllocationError, settings: &Settings) -> HttpResponse {
    let message = user_message(e);
    let body = serde_json::json!({
        "success": false,
        "error": message,
        "notification": Notification::error(message.clone(), settings.notification_ms),
    });
    match e {
        AllocationError::NoBoard => HttpResponse::NotFound().json(body),
        AllocationError::Io(_) | AllocationError::Excel(_) => {
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn board_or_error(session: &Session) -> HttpResponse {
    match board_response(session) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e, session.settings()),
    }
}

// CSV upload endpoint; replaces the whole board
async fn upload(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let source_name = req
        .headers()
        .get("X-File-Name")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let mut session = lock_session(&state)?;
    let result = session.upload_csv(&body, source_name).map(|_| ());
    match result {
        Ok(()) => {
            info!(bytes = body.len(), "accepted upload");
            Ok(board_or_error(&session))
        }
        Err(e) => Ok(error_response(&e, session.settings())),
    }
}

async fn get_board(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = lock_session(&state)?;
    Ok(board_or_error(&session))
}

async fn select(req: web::Json<PersonRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock_session(&state)?;
    match session.click(req.person_id) {
        Ok(item_state) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "person_id": req.person_id,
            "state": item_state,
        }))),
        Err(e) => Ok(error_response(&e, session.settings())),
    }
}

async fn drag_start(req: web::Json<PersonRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock_session(&state)?;
    match session.drag_start(req.person_id) {
        Ok(payload) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "payload": payload,
        }))),
        Err(e) => Ok(error_response(&e, session.settings())),
    }
}

async fn drag_over(req: web::Json<DragOverRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock_session(&state)?;
    let marker = session.drag_over(req.bucket, req.pointer_y, &req.layout);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "marker": marker,
    })))
}

async fn drag_leave(req: web::Json<DragLeaveRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock_session(&state)?;
    session.drag_leave(req.bucket);
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn drag_end(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock_session(&state)?;
    session.drag_end();
    Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
}

async fn drop_items(req: web::Json<DropRequest>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut session = lock_session(&state)?;
    let result = session.drop_on(req.bucket, req.pointer_y, &req.layout);
    match result {
        Ok(_) => Ok(board_or_error(&session)),
        Err(e) => Ok(error_response(&e, session.settings())),
    }
}

// Workbook download
async fn export(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = lock_session(&state)?;
    let settings = session.settings();
    match session.export() {
        Ok(bytes) => {
            let notification = Notification::success(
                format!("Successfully generated {}!", settings.output_file),
                settings.notification_ms,
            );
            Ok(HttpResponse::Ok()
                .content_type(XLSX_CONTENT_TYPE)
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", settings.output_file),
                ))
                .insert_header(("X-Notification", notification.message))
                .body(bytes))
        }
        Err(e) => Ok(error_response(&e, settings)),
    }
}

async fn client_settings(state: web::Data<AppState>) -> Result<HttpResponse> {
    let session = lock_session(&state)?;
    let settings = session.settings();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "notification_ms": settings.notification_ms,
        "output_file": settings.output_file,
        "taxi_capacity": settings.taxi_capacity,
    })))
}

// HTML page handler
async fn index() -> Result<HttpResponse> {
    let html = include_str!("../templates/index.html");
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .route("/", web::get().to(index))
        .route("/api/settings", web::get().to(client_settings))
        .route("/api/upload", web::post().to(upload))
        .route("/api/board", web::get().to(get_board))
        .route("/api/select", web::post().to(select))
        .route("/api/drag/start", web::post().to(drag_start))
        .route("/api/drag/over", web::post().to(drag_over))
        .route("/api/drag/leave", web::post().to(drag_leave))
        .route("/api/drag/end", web::post().to(drag_end))
        .route("/api/drop", web::post().to(drop_items))
        .route("/api/export", web::get().to(export));
}

pub async fn start_server(settings: Settings) -> std::io::Result<()> {
    let bind = (settings.bind_host.clone(), settings.port);
    let app_state = web::Data::new(AppState::new(settings));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(routes)
    })
    .bind(bind)?
    .run()
    .await
}
