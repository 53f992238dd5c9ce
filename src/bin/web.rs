//! Single binary web server: tournament engine exposed via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT,
//! RECONCILE_INTERVAL_SECS, INACTIVITY_TIMEOUT_HOURS.

use actix_web::{
    delete, get, post,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use ladder_tournament_web::config::Settings;
use ladder_tournament_web::logic::standings_csv;
use ladder_tournament_web::{
    generate_bracket, reconcile, standings, submit_result, EliminationRules, MatchId, MatchResult,
    MemoryStore, Multiplicity, PlayerId, PlayerStat, PrizeSettings, RoundWithMatches, Tournament,
    TournamentError, TournamentId, TournamentStore,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Per-tournament entry: its own store (one lock per tournament) + last activity time.
struct TournamentEntry {
    store: MemoryStore,
    last_activity: Instant,
}

type SharedEntry = Arc<Mutex<TournamentEntry>>;

/// Registry of tournaments by id. Mutations on one tournament never wait on another.
type AppState = Data<RwLock<HashMap<TournamentId, SharedEntry>>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Serialize)]
struct TournamentSnapshot {
    tournament: Tournament,
    rounds: Vec<RoundWithMatches>,
    stats: Vec<PlayerStat>,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    prizes: PrizeSettings,
    #[serde(default)]
    rules: EliminationRules,
    #[serde(default)]
    multiplicity: Multiplicity,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
}

#[derive(Deserialize, Default)]
struct StartBody {
    #[serde(default)]
    shuffle: bool,
}

#[derive(Deserialize)]
struct MatchResultBody {
    winner: PlayerId,
    #[serde(default)]
    loser: Option<PlayerId>,
    #[serde(default)]
    score: String,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and player id.
#[derive(Deserialize)]
struct TournamentPlayerPath {
    id: TournamentId,
    player_id: PlayerId,
}

/// Path segments: tournament id and match id.
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

fn error_response(e: TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    if e.is_not_found() {
        return HttpResponse::NotFound().json(body);
    }
    match e {
        TournamentError::InvariantViolation(_) | TournamentError::Persistence(_) => {
            log::error!("Engine failure: {}", body["error"]);
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

/// Look up a tournament's entry without holding the registry lock afterwards.
fn find_entry(state: &AppState, id: TournamentId) -> Result<SharedEntry, HttpResponse> {
    let g = state.read().map_err(|_| lock_error())?;
    g.get(&id)
        .cloned()
        .ok_or_else(|| HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })))
}

/// Lock one tournament, refresh its activity time and run `f` against its store.
fn with_store<T, F>(state: &AppState, id: TournamentId, f: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&mut MemoryStore) -> Result<T, TournamentError>,
{
    let entry = match find_entry(state, id) {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let mut entry = match entry.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    entry.last_activity = Instant::now();
    match f(&mut entry.store) {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

fn snapshot(store: &MemoryStore, id: TournamentId) -> Result<TournamentSnapshot, TournamentError> {
    let rounds = store
        .load_rounds(id)?
        .into_iter()
        .map(|r| store.load_round(id, r.id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TournamentSnapshot {
        tournament: store.load_tournament(id)?,
        rounds,
        stats: store.load_all_player_stats(id)?,
    })
}

/// Edit the tournament record (registration-time changes).
fn edit_tournament<F>(store: &mut MemoryStore, id: TournamentId, f: F) -> Result<TournamentSnapshot, TournamentError>
where
    F: FnOnce(&mut Tournament) -> Result<(), TournamentError>,
{
    let mut tournament = store.load_tournament(id)?;
    f(&mut tournament)?;
    store.save_tournament(&tournament)?;
    snapshot(store, id)
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "ladder-tournament-web",
    })
}

/// Create a new tournament in registration (returns it with id).
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let tournament = match Tournament::new(body.name.trim(), body.prizes, body.rules, body.multiplicity) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };
    let id = tournament.id;
    let mut store = MemoryStore::new();
    if let Err(e) = store.save_tournament(&tournament) {
        return error_response(e);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    g.insert(
        id,
        Arc::new(Mutex::new(TournamentEntry {
            store,
            last_activity: Instant::now(),
        })),
    );
    log::info!("Created tournament {} ({})", tournament.name, id);
    HttpResponse::Ok().json(&tournament)
}

/// Full snapshot: tournament, rounds with matches, player stats.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_store(&state, path.id, |store| snapshot(store, path.id))
}

/// Register a paid player (registration only).
#[post("/api/tournaments/{id}/players")]
async fn api_add_player(state: AppState, path: Path<TournamentPath>, body: Json<AddPlayerBody>) -> HttpResponse {
    with_store(&state, path.id, |store| {
        edit_tournament(store, path.id, |t| t.register_player(body.name.trim()).map(|_| ()))
    })
}

/// Remove a registered player (registration only).
#[delete("/api/tournaments/{id}/players/{player_id}")]
async fn api_remove_player(state: AppState, path: Path<TournamentPlayerPath>) -> HttpResponse {
    with_store(&state, path.id, |store| {
        edit_tournament(store, path.id, |t| t.remove_player(path.player_id))
    })
}

/// Generate the round-robin bracket and start round 1.
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(
    state: AppState,
    path: Path<TournamentPath>,
    body: Option<Json<StartBody>>,
) -> HttpResponse {
    let shuffle = body.map(|b| b.shuffle).unwrap_or_default();
    with_store(&state, path.id, |store| {
        generate_bracket(store, path.id, shuffle)?;
        snapshot(store, path.id)
    })
}

/// Submit one match result; advances the round when it was the last pending match.
#[post("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_submit_result(
    state: AppState,
    path: Path<TournamentMatchPath>,
    body: Json<MatchResultBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let result = MatchResult {
        match_id: path.match_id,
        winner: body.winner,
        loser: body.loser,
        score: body.score,
    };
    with_store(&state, path.id, |store| submit_result(store, path.id, &result))
}

/// Run the reconciliation sweep for one tournament now.
#[post("/api/tournaments/{id}/reconcile")]
async fn api_reconcile(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_store(&state, path.id, |store| reconcile(store, path.id))
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    with_store(&state, path.id, |store| {
        let winner = store.load_tournament(path.id)?.winner;
        Ok(standings(&store.load_all_player_stats(path.id)?, winner))
    })
}

#[get("/api/tournaments/{id}/standings.csv")]
async fn api_standings_csv(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let entry = match find_entry(&state, path.id) {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let entry = match entry.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let rows = match entry
        .store
        .load_tournament(path.id)
        .and_then(|t| Ok(standings(&entry.store.load_all_player_stats(path.id)?, t.winner)))
    {
        Ok(rows) => rows,
        Err(e) => return error_response(e),
    };
    match standings_csv(&rows) {
        Ok(csv) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(csv),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// One sweep over every live tournament.
fn reconcile_all(state: &AppState) {
    let entries: Vec<(TournamentId, SharedEntry)> = match state.read() {
        Ok(g) => g.iter().map(|(id, e)| (*id, e.clone())).collect(),
        Err(_) => return,
    };
    for (id, entry) in entries {
        let mut entry = match entry.lock() {
            Ok(guard) => guard,
            Err(_) => continue,
        };
        if let Err(e) = reconcile(&mut entry.store, id) {
            log::error!("Reconciliation failed for tournament {}: {}", id, e);
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env();
    let bind = (settings.host.clone(), settings.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state: AppState = Data::new(RwLock::new(HashMap::new()));

    // Background task: reconcile stats drifted from optimistic client updates
    let state_reconcile = state.clone();
    let reconcile_every = settings.reconcile_interval;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(reconcile_every);
        loop {
            interval.tick().await;
            reconcile_all(&state_reconcile);
        }
    });

    // Background task: every 30 minutes, remove tournaments inactive past the timeout
    let state_cleanup = state.clone();
    let inactivity_timeout = settings.inactivity_timeout;
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| match entry.lock() {
                Ok(e) => e.last_activity.elapsed() < inactivity_timeout,
                Err(_) => false,
            });
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_add_player)
            .service(api_remove_player)
            .service(api_start_tournament)
            .service(api_submit_result)
            .service(api_reconcile)
            .service(api_standings_csv)
            .service(api_standings)
    })
    .bind(bind)?
    .run()
    .await
}
