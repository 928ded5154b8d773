//! Operator control API for the broadcast overlay: bracket editing, draft actions, score entry.
//! Run with: cargo run --bin web
//! Configured through env: HOST, PORT, AUTO_ADVANCE_MS, SESSION_IDLE_HOURS, RUST_LOG.

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tournament_overlay::{
    logic, session::contains_pick, AppConfig, BroadcastSession, ChoiceType, DraftOrder, GameMatch,
    Ladder, MatchId, Round, Screen, SessionId, Team, TeamColour, TeamId,
};

/// Per-session entry: overlay state + last activity time (for auto-cleanup).
struct SessionEntry {
    session: BroadcastSession,
    last_activity: Instant,
}

/// In-memory state: many overlay sessions by ID. Idle entries are removed periodically.
type AppState = Data<RwLock<HashMap<SessionId, SessionEntry>>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Session plus the change notifications produced by the request.
#[derive(Serialize)]
struct UpdateResponse<'a, E: Serialize> {
    session: &'a BroadcastSession,
    events: Vec<E>,
}

#[derive(Deserialize)]
struct CreateMatchBody {
    id: MatchId,
    team_1: Option<TeamId>,
    team_2: Option<TeamId>,
    round: Option<String>,
    #[serde(default)]
    losers: bool,
}

#[derive(Deserialize)]
struct SetTeamsBody {
    team_1: Option<TeamId>,
    team_2: Option<TeamId>,
}

#[derive(Deserialize)]
struct ProgressionBody {
    /// None detaches the progression.
    target: Option<MatchId>,
    #[serde(default)]
    losers: bool,
}

#[derive(Deserialize)]
struct ScoresBody {
    team_1_score: u32,
    team_2_score: u32,
}

#[derive(Deserialize)]
struct CompletedBody {
    completed: bool,
}

#[derive(Deserialize)]
struct CurrentMatchBody {
    match_id: MatchId,
}

#[derive(Deserialize)]
struct ChoiceBody {
    team: TeamColour,
    kind: ChoiceType,
    slot: String,
}

#[derive(Deserialize)]
struct ScreenBody {
    screen: Screen,
}

/// Path segment: session id (e.g. /api/sessions/{id})
#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

/// Path segments: session id and match id
#[derive(Deserialize)]
struct SessionMatchPath {
    id: SessionId,
    match_id: MatchId,
}

/// Path segments: session id and pool slot
#[derive(Deserialize)]
struct SessionSlotPath {
    id: SessionId,
    slot: String,
}

fn bad_request(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Lock the state, touch the session and run `f` on it (404 if the session is unknown).
fn with_session<F>(state: &AppState, id: SessionId, f: F) -> HttpResponse
where
    F: FnOnce(&mut BroadcastSession) -> HttpResponse,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            f(&mut entry.session)
        }
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" })),
    }
}

fn updated<E: Serialize>(session: &BroadcastSession, events: Vec<E>) -> HttpResponse {
    HttpResponse::Ok().json(UpdateResponse { session, events })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-overlay",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new session with an empty ladder (client stores the id for subsequent requests).
#[post("/api/sessions")]
async fn api_create_session(state: AppState) -> HttpResponse {
    let session = BroadcastSession::new(Ladder::new());
    let id = session.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    log::info!("Created session {}", id);
    let entry = g.entry(id).or_insert(SessionEntry {
        session,
        last_activity: Instant::now(),
    });
    HttpResponse::Ok().json(&entry.session)
}

#[get("/api/sessions/{id}")]
async fn api_get_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| HttpResponse::Ok().json(&*s))
}

#[post("/api/sessions/{id}/teams")]
async fn api_add_team(state: AppState, path: Path<SessionPath>, body: Json<Team>) -> HttpResponse {
    let team = body.into_inner();
    with_session(&state, path.id, |s| match s.ladder.add_team(team) {
        Ok(()) => HttpResponse::Ok().json(&*s),
        Err(e) => bad_request(e),
    })
}

/// Import teams from a CSV body (`acronym,full_name,flag,seed,username,rank,country_rank`).
#[post("/api/sessions/{id}/teams/import")]
async fn api_import_teams(state: AppState, path: Path<SessionPath>, body: String) -> HttpResponse {
    with_session(&state, path.id, |s| {
        match logic::import_teams(&mut s.ladder, body.as_bytes()) {
            Ok(_) => HttpResponse::Ok().json(&*s),
            Err(e) => bad_request(e),
        }
    })
}

#[post("/api/sessions/{id}/rounds")]
async fn api_add_round(state: AppState, path: Path<SessionPath>, body: Json<Round>) -> HttpResponse {
    let round = body.into_inner();
    with_session(&state, path.id, |s| match s.ladder.add_round(round) {
        Ok(()) => HttpResponse::Ok().json(&*s),
        Err(e) => bad_request(e),
    })
}

#[post("/api/sessions/{id}/matches")]
async fn api_add_match(state: AppState, path: Path<SessionPath>, body: Json<CreateMatchBody>) -> HttpResponse {
    let body = body.into_inner();
    let mut game = GameMatch::new(body.id);
    game.team_1 = body.team_1;
    game.team_2 = body.team_2;
    game.round = body.round;
    game.losers = body.losers;
    with_session(&state, path.id, |s| match s.ladder.add_match(game) {
        Ok(()) => HttpResponse::Ok().json(&*s),
        Err(e) => bad_request(e),
    })
}

#[put("/api/sessions/{id}/matches/{match_id}/teams")]
async fn api_set_teams(state: AppState, path: Path<SessionMatchPath>, body: Json<SetTeamsBody>) -> HttpResponse {
    let body = body.into_inner();
    with_session(&state, path.id, |s| {
        match s.set_teams(path.match_id, body.team_1, body.team_2) {
            Ok(()) => HttpResponse::Ok().json(&*s),
            Err(e) => bad_request(e),
        }
    })
}

#[put("/api/sessions/{id}/matches/{match_id}/progression")]
async fn api_set_progression(
    state: AppState,
    path: Path<SessionMatchPath>,
    body: Json<ProgressionBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let result = match body.target {
            Some(target) => s.ladder.set_progression(path.match_id, target, body.losers),
            None => s.ladder.clear_progression(path.match_id, body.losers),
        };
        match result {
            Ok(()) => HttpResponse::Ok().json(&*s),
            Err(e) => bad_request(e),
        }
    })
}

/// Enter scores; completion is re-evaluated and the result propagated downstream.
#[put("/api/sessions/{id}/matches/{match_id}/scores")]
async fn api_set_scores(state: AppState, path: Path<SessionMatchPath>, body: Json<ScoresBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        match s.set_scores(path.match_id, body.team_1_score, body.team_2_score) {
            Ok(events) => updated(s, events),
            Err(e) => bad_request(e),
        }
    })
}

/// Mark a match complete (or not) by hand, e.g. for forfeits.
#[put("/api/sessions/{id}/matches/{match_id}/completed")]
async fn api_set_completed(state: AppState, path: Path<SessionMatchPath>, body: Json<CompletedBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        match s.set_completed(path.match_id, body.completed) {
            Ok(events) => updated(s, events),
            Err(e) => bad_request(e),
        }
    })
}

/// Restart a match: scores back to zero, teams pulled back from downstream.
#[post("/api/sessions/{id}/matches/{match_id}/start")]
async fn api_start_match(state: AppState, path: Path<SessionMatchPath>) -> HttpResponse {
    with_session(&state, path.id, |s| match s.start_match(path.match_id) {
        Ok(events) => updated(s, events),
        Err(e) => bad_request(e),
    })
}

#[put("/api/sessions/{id}/current-match")]
async fn api_set_current_match(
    state: AppState,
    path: Path<SessionPath>,
    body: Json<CurrentMatchBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| match s.set_current_match(body.match_id) {
        Ok(()) => HttpResponse::Ok().json(&*s),
        Err(e) => bad_request(e),
    })
}

/// Seed the draft order for the current match.
#[put("/api/sessions/{id}/draft/order")]
async fn api_set_draft_order(state: AppState, path: Path<SessionPath>, body: Json<DraftOrder>) -> HttpResponse {
    let order = body.into_inner();
    with_session(&state, path.id, |s| match s.configure_draft(order) {
        Ok(events) => updated(s, events),
        Err(e) => bad_request(e),
    })
}

/// Seed the draft order with a coin flip for the first protect.
#[post("/api/sessions/{id}/draft/roll")]
async fn api_roll_draft_order(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let order = DraftOrder::roll(&mut rand::thread_rng());
    with_session(&state, path.id, |s| match s.configure_draft(order) {
        Ok(events) => updated(s, events),
        Err(e) => bad_request(e),
    })
}

#[get("/api/sessions/{id}/draft")]
async fn api_get_draft(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| match s.draft_state() {
        Ok(draft) => HttpResponse::Ok().json(draft),
        Err(e) => bad_request(e),
    })
}

/// Record a protect/ban/pick. A pick schedules the switch to gameplay when enabled.
#[post("/api/sessions/{id}/draft/choices")]
async fn api_record_choice(
    state: AppState,
    config: Data<AppConfig>,
    path: Path<SessionPath>,
    body: Json<ChoiceBody>,
) -> HttpResponse {
    let session_id = path.id;
    let state_timer = state.clone();
    with_session(&state, session_id, |s| {
        let events = match s.record_choice(body.team, body.kind, &body.slot) {
            Ok(events) => events,
            Err(e) => return bad_request(e),
        };
        if let Some(delay) = config.auto_advance {
            if contains_pick(&events) {
                s.schedule_auto_advance(delay, move |generation| async move {
                    let mut g = match state_timer.write() {
                        Ok(guard) => guard,
                        Err(_) => return,
                    };
                    if let Some(entry) = g.get_mut(&session_id) {
                        entry.session.auto_advance_fired(generation);
                    }
                });
            }
        }
        updated(s, events)
    })
}

#[delete("/api/sessions/{id}/draft/choices/{slot}")]
async fn api_undo_choice(state: AppState, path: Path<SessionSlotPath>) -> HttpResponse {
    with_session(&state, path.id, |s| match s.undo_choice(&path.slot) {
        Ok(events) => updated(s, events),
        Err(e) => bad_request(e),
    })
}

#[put("/api/sessions/{id}/screen")]
async fn api_set_screen(state: AppState, path: Path<SessionPath>, body: Json<ScreenBody>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        s.set_screen(body.screen);
        HttpResponse::Ok().json(&*s)
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    match config.auto_advance {
        Some(delay) => log::info!("Auto-advance to gameplay after {:?}", delay),
        None => log::info!("Auto-advance disabled"),
    }

    let state = Data::new(RwLock::new(HashMap::<SessionId, SessionEntry>::new()));
    let idle_timeout = config.session_idle_timeout;
    let config = Data::new(config);

    // Background task: every 30 minutes, remove sessions idle for longer than the timeout
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
            g.retain(|_, entry| entry.last_activity.elapsed() < idle_timeout);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} idle session(s)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(config.clone())
            .service(api_health)
            .service(favicon)
            .service(api_create_session)
            .service(api_get_session)
            .service(api_add_team)
            .service(api_import_teams)
            .service(api_add_round)
            .service(api_add_match)
            .service(api_set_teams)
            .service(api_set_progression)
            .service(api_set_scores)
            .service(api_set_completed)
            .service(api_start_match)
            .service(api_set_current_match)
            .service(api_set_draft_order)
            .service(api_roll_draft_order)
            .service(api_get_draft)
            .service(api_record_choice)
            .service(api_undo_choice)
            .service(api_set_screen)
            .service(Files::new("/static", "static").show_files_listing())
    })
    .bind(bind)?
    .run()
    .await
}
