//! HTTP front for the rotation engine: sessions in memory, one JSON snapshot file per session.
//! Run with: cargo run --bin web
//! Env: HOST (default 0.0.0.0), PORT (default 8080), DATA_DIR (default `data`), RUST_LOG.

use actix_web::{
    get, post,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use badminton_queue_web::{
    apply, available_courts, can_create_match, snapshot, summarize, CostInputs, Operation,
    SessionState, SnapshotStore, WriteSlot,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Identifier of one rotation session (one club night).
type SessionId = Uuid;

/// Per-session entry: rotation state, its random source, last activity time (for auto-cleanup),
/// and the version counter feeding its snapshot writes.
struct SessionEntry {
    state: SessionState,
    rng: StdRng,
    last_activity: Instant,
    version: u64,
    slot: WriteSlot,
}

impl SessionEntry {
    fn new(state: SessionState) -> Self {
        Self {
            state,
            rng: StdRng::from_entropy(),
            last_activity: Instant::now(),
            version: 0,
            slot: WriteSlot::default(),
        }
    }

    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}

/// In-memory state: many sessions by ID. Entries are dropped from memory after 12h inactivity.
type AppState = Data<RwLock<HashMap<SessionId, SessionEntry>>>;

/// Inactivity threshold: sessions not accessed for this long are dropped from memory.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

/// Persist in the background; a failed write is logged and never undoes the operation.
fn persist(store: &SnapshotStore, id: SessionId, entry: &mut SessionEntry) {
    let json = match snapshot::to_json(&entry.state) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Could not encode session {}: {}", id, e);
            return;
        }
    };
    let version = entry.next_version();
    let slot = entry.slot.clone();
    let store = store.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = store.save(id, &slot, version, json).await {
            log::warn!("Could not persist session {}: {}", id, e);
        }
    });
}

fn forget(store: &SnapshotStore, id: SessionId, entry: &mut SessionEntry) {
    let version = entry.next_version();
    let slot = entry.slot.clone();
    let store = store.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = store.remove(id, &slot, version).await {
            log::warn!("Could not delete snapshot for session {}: {}", id, e);
        }
    });
}

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSession<'a> {
    id: SessionId,
    state: &'a SessionState,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CourtAvailability {
    available_courts: Vec<badminton_queue_web::CourtId>,
    can_create_match: bool,
}

/// Path segment: session id (e.g. /api/sessions/{id})
#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "badminton-queue-web",
    })
}

/// No icon; answers 204 so browsers stop asking.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new session in Setup (returns it with id; client stores id for subsequent requests).
#[post("/api/sessions")]
async fn api_create_session(state: AppState, store: Data<SnapshotStore>) -> HttpResponse {
    let id = Uuid::new_v4();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = g.entry(id).or_insert_with(|| SessionEntry::new(SessionState::new()));
    persist(&store, id, entry);
    log::info!("Created session {}", id);
    HttpResponse::Ok().json(CreatedSession {
        id,
        state: &entry.state,
    })
}

/// Get a session by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/sessions/{id}")]
async fn api_get_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.state)
        }
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" })),
    }
}

/// Apply one operation. 200 with the new state, or 409 with the reason nothing changed.
#[post("/api/sessions/{id}/operations")]
async fn api_apply_operation(
    state: AppState,
    store: Data<SnapshotStore>,
    path: Path<SessionPath>,
    body: Json<Operation>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" })),
    };
    entry.last_activity = Instant::now();
    let op = body.into_inner();
    let ends_rotation = matches!(op, Operation::EndRotation);
    let name = op.name();
    match apply(&entry.state, op, &mut entry.rng, Utc::now()) {
        Ok(next) => {
            entry.state = next;
            if ends_rotation {
                forget(&store, path.id, entry);
            } else {
                persist(&store, path.id, entry);
            }
            HttpResponse::Ok().json(&entry.state)
        }
        Err(reason) => {
            log::warn!("Session {}: {} ignored: {}", path.id, name, reason);
            HttpResponse::Conflict().json(serde_json::json!({ "error": reason.to_string() }))
        }
    }
}

/// Free courts and whether an automatic match could start now.
#[get("/api/sessions/{id}/available-courts")]
async fn api_available_courts(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" })),
    };
    entry.last_activity = Instant::now();
    HttpResponse::Ok().json(CourtAvailability {
        available_courts: available_courts(&entry.state.matches, &entry.state.courts),
        can_create_match: can_create_match(&entry.state, &mut entry.rng),
    })
}

/// End-of-session cost summary (JSON).
#[get("/api/sessions/{id}/summary")]
async fn api_summary(state: AppState, path: Path<SessionPath>, costs: Query<CostInputs>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get(&path.id) {
        Some(entry) => HttpResponse::Ok().json(summarize(&entry.state, costs.into_inner())),
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" })),
    }
}

/// End-of-session cost summary as a CSV download.
#[get("/api/sessions/{id}/summary.csv")]
async fn api_summary_csv(state: AppState, path: Path<SessionPath>, costs: Query<CostInputs>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" })),
    };
    let mut body = Vec::new();
    match summarize(&entry.state, costs.into_inner()).write_csv(&mut body) {
        Ok(()) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"session-{}.csv\"", path.id),
            ))
            .body(body),
        Err(e) => {
            log::warn!("CSV export failed for session {}: {}", path.id, e);
            HttpResponse::InternalServerError().body("csv error")
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let data_dir = std::env::var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir());
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let store = SnapshotStore::new(data_dir);
    log::info!("Snapshots in {}", store.dir().display());
    let sessions: HashMap<SessionId, SessionEntry> = store
        .load_all()
        .await
        .into_iter()
        .map(|(id, state)| (id, SessionEntry::new(state)))
        .collect();
    let state = Data::new(RwLock::new(sessions));
    let store = Data::new(store);

    // Background task: every 30 minutes, drop sessions inactive for 12+ hours (snapshots stay on disk)
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive session(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(store.clone())
            .service(api_health)
            .service(favicon)
            .service(api_create_session)
            .service(api_get_session)
            .service(api_apply_operation)
            .service(api_available_courts)
            .service(api_summary_csv)
            .service(api_summary)
    })
    .bind(bind)?
    .run()
    .await
}
