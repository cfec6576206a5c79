//! Single binary web server: REST API over the tournament engine.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT (see `Config`).

use actix_web::{
    delete, get, patch, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::Utc;
use esports_tournament_web::{
    logic::GateOutcome, Config, Engine, ErrorKind, GameType, GateRegistry, MatchDetailsPatch,
    MatchStatus, MemoryStore, RosterEntry, TournamentError, TournamentStatus,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Engine plus the confirmation gates guarding destructive endpoints.
struct AppContext {
    engine: Engine,
    gates: GateRegistry,
}

type AppState = Data<AppContext>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    game_type: GameType,
    #[serde(default = "default_max_participants")]
    max_participants: u32,
}

fn default_max_participants() -> u32 {
    16
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    display_name: String,
    #[serde(default)]
    roster: Vec<RosterEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBracketBody {
    /// Defaults to the tournament's own game type.
    game_type: Option<GameType>,
}

#[derive(Deserialize)]
struct MatchStatusBody {
    status: MatchStatus,
}

#[derive(Deserialize)]
struct TournamentStatusBody {
    status: TournamentStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinalizeBody {
    score_a: u32,
    score_b: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportBody {
    external_match_id: String,
    map_index: Option<usize>,
}

#[derive(Deserialize)]
struct ParticipantScoreBody {
    kills: u32,
    deaths: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeathmatchFinalizeBody {
    winner_id: Uuid,
    runner_up_id: Uuid,
}

/// Path segment: a document id (e.g. /api/matches/{id})
#[derive(Deserialize)]
struct IdPath {
    id: Uuid,
}

fn error_response(e: TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::Validation => HttpResponse::BadRequest().json(body),
        ErrorKind::NotFound => HttpResponse::NotFound().json(body),
        ErrorKind::External => HttpResponse::BadGateway().json(body),
        ErrorKind::Internal => {
            log::error!("Internal error: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

/// First press answers 202 `armed`; a confirming press within the window runs the action.
fn respond_gated<T: Serialize>(result: Result<GateOutcome<T>, TournamentError>) -> HttpResponse {
    match result {
        Ok(GateOutcome::Armed { expires_at }) => HttpResponse::Accepted()
            .json(serde_json::json!({ "state": "armed", "expiresAt": expires_at })),
        Ok(GateOutcome::Executed(value)) => {
            HttpResponse::Ok().json(serde_json::json!({ "state": "done", "result": value }))
        }
        Err(e) => error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "esports-tournament-web",
    })
}

#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    respond(
        state
            .engine
            .create_tournament(&body.name, body.game_type, body.max_participants)
            .await,
    )
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.engine.get_tournament(path.id).await)
}

/// Admin override of the tournament status.
#[put("/api/tournaments/{id}/status")]
async fn api_set_tournament_status(
    state: AppState,
    path: Path<IdPath>,
    body: Json<TournamentStatusBody>,
) -> HttpResponse {
    respond(state.engine.set_tournament_status(path.id, body.status).await)
}

/// Delete a tournament with its matches and participants (press twice to confirm).
#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let key = format!("delete-tournament:{}", path.id);
    let engine = &state.engine;
    respond_gated(
        state
            .gates
            .run(&key, Utc::now(), || engine.delete_tournament(path.id))
            .await,
    )
}

#[post("/api/tournaments/{id}/participants")]
async fn api_register_participant(state: AppState, path: Path<IdPath>, body: Json<RegisterBody>) -> HttpResponse {
    let body = body.into_inner();
    respond(
        state
            .engine
            .register_participant(path.id, &body.display_name, body.roster)
            .await,
    )
}

#[get("/api/tournaments/{id}/participants")]
async fn api_list_participants(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.engine.list_participants(path.id).await)
}

#[get("/api/tournaments/{id}/matches")]
async fn api_list_matches(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.engine.list_matches(path.id).await)
}

/// Generate the bracket from the tournament's registrations, in registration order.
#[post("/api/tournaments/{id}/bracket")]
async fn api_create_bracket(
    state: AppState,
    path: Path<IdPath>,
    body: Option<Json<CreateBracketBody>>,
) -> HttpResponse {
    let engine = &state.engine;
    let result = async {
        let tournament = engine.get_tournament(path.id).await?;
        let participants = engine.list_participants(path.id).await?;
        let game_type = body
            .as_ref()
            .and_then(|b| b.game_type)
            .unwrap_or(tournament.game_type);
        engine.create_bracket(path.id, &participants, game_type).await
    }
    .await;
    respond(result)
}

/// Delete all matches and reopen the tournament (press twice to confirm).
#[delete("/api/tournaments/{id}/bracket")]
async fn api_reset_bracket(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let key = format!("reset-bracket:{}", path.id);
    let engine = &state.engine;
    respond_gated(
        state
            .gates
            .run(&key, Utc::now(), || engine.reset_bracket(path.id))
            .await,
    )
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.engine.standings(path.id).await)
}

#[get("/api/tournaments/{id}/standings.csv")]
async fn api_standings_csv(state: AppState, path: Path<IdPath>) -> HttpResponse {
    match state.engine.standings_csv(path.id).await {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .body(csv),
        Err(e) => error_response(e),
    }
}

#[post("/api/tournaments/{id}/deathmatch/finalize")]
async fn api_finalize_deathmatch(
    state: AppState,
    path: Path<IdPath>,
    body: Json<DeathmatchFinalizeBody>,
) -> HttpResponse {
    respond(
        state
            .engine
            .finalize_deathmatch(path.id, body.winner_id, body.runner_up_id)
            .await,
    )
}

#[put("/api/matches/{id}/status")]
async fn api_update_match_status(state: AppState, path: Path<IdPath>, body: Json<MatchStatusBody>) -> HttpResponse {
    respond(state.engine.update_match_status(path.id, body.status).await)
}

#[post("/api/matches/{id}/finalize")]
async fn api_finalize_match(state: AppState, path: Path<IdPath>, body: Json<FinalizeBody>) -> HttpResponse {
    respond(
        state
            .engine
            .finalize_match(path.id, body.score_a, body.score_b)
            .await,
    )
}

/// Clear a match's result (press twice to confirm). Does not pull back an advanced winner.
#[post("/api/matches/{id}/reset")]
async fn api_reset_match(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let key = format!("reset-match:{}", path.id);
    let engine = &state.engine;
    respond_gated(
        state
            .gates
            .run(&key, Utc::now(), || engine.reset_match(path.id))
            .await,
    )
}

#[post("/api/matches/{id}/veto")]
async fn api_start_veto(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.engine.start_match_veto(path.id).await)
}

#[patch("/api/matches/{id}")]
async fn api_update_match_details(
    state: AppState,
    path: Path<IdPath>,
    body: Json<MatchDetailsPatch>,
) -> HttpResponse {
    respond(
        state
            .engine
            .update_match_details(path.id, body.into_inner())
            .await,
    )
}

#[get("/api/matches/{id}/stats")]
async fn api_match_stats(state: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(state.engine.parse_player_stats(path.id).await)
}

#[post("/api/matches/{id}/import")]
async fn api_import_match(state: AppState, path: Path<IdPath>, body: Json<ImportBody>) -> HttpResponse {
    match state
        .engine
        .import_match_result(path.id, &body.external_match_id, body.map_index)
        .await
    {
        Ok(summary) => HttpResponse::Ok().json(serde_json::json!({
            "mapIndex": summary.map_index,
            "matched": summary.matched,
            "unmatched": summary.unmatched,
        })),
        Err(e) => error_response(e),
    }
}

#[put("/api/participants/{id}/score")]
async fn api_update_participant_score(
    state: AppState,
    path: Path<IdPath>,
    body: Json<ParticipantScoreBody>,
) -> HttpResponse {
    respond(
        state
            .engine
            .update_participant_score(path.id, body.kills, body.deaths)
            .await,
    )
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    if config.stats_api_url.is_none() {
        log::warn!("STATS_API_URL not set; match imports are disabled");
    }

    let state = Data::new(AppContext {
        engine: Engine::from_config(&config, Arc::new(MemoryStore::new())),
        gates: GateRegistry::new(config.confirm_window),
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_set_tournament_status)
            .service(api_delete_tournament)
            .service(api_register_participant)
            .service(api_list_participants)
            .service(api_list_matches)
            .service(api_create_bracket)
            .service(api_reset_bracket)
            .service(api_standings_csv)
            .service(api_standings)
            .service(api_finalize_deathmatch)
            .service(api_update_match_status)
            .service(api_finalize_match)
            .service(api_reset_match)
            .service(api_start_veto)
            .service(api_update_match_details)
            .service(api_match_stats)
            .service(api_import_match)
            .service(api_update_participant_score)
    })
    .bind(bind)?
    .run()
    .await
}
