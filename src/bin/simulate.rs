use clap::Parser;
use maze_chase_engine::agents::{ghost_agents, pacman_agent, Agent};
use maze_chase_engine::constants::LOSS_PENALTY;
use maze_chase_engine::display::NullDisplay;
use maze_chase_engine::engine::{EngineOptions, GameRules, RoundMode};
use maze_chase_engine::game::{Game, GameOptions};
use maze_chase_engine::ghost_policy::GhostPolicy;
use maze_chase_engine::layout::{Layout, DEFAULT_LAYOUT};
use maze_chase_engine::replay::{record_file_path, GameRecord};
use maze_chase_engine::state::GameState;
use maze_chase_engine::types::{GameOutcome, RuleEvent};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_MAX_MOVES: u64 = 4_000;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Built-in layout name or path to a layout file.
    #[arg(long)]
    layout: Option<String>,
    #[arg(long)]
    ghosts: Option<usize>,
    #[arg(long)]
    games: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// greedy | random
    #[arg(long)]
    pacman: Option<String>,
    /// directional | random
    #[arg(long)]
    ghost_policy: Option<String>,
    #[arg(long)]
    lives: Option<i32>,
    #[arg(long)]
    classic_win: bool,
    #[arg(long)]
    max_moves: Option<u64>,
    #[arg(long)]
    move_timeout_ms: Option<u64>,
    #[arg(long)]
    record_dir: Option<PathBuf>,
    #[arg(long)]
    replay: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    layout: Arc<Layout>,
    ghosts: usize,
    pacman: String,
    ghost_policy: GhostPolicy,
    engine: EngineOptions,
    game: GameOptions,
    seed: u32,
    games: usize,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    scenario: String,
    game: usize,
    seed: u32,
    ghosts: usize,
    pacman: String,
    #[serde(rename = "ghostPolicy")]
    ghost_policy: String,
    outcome: Option<GameOutcome>,
    score: i64,
    lives: i32,
    rounds: u32,
    moves: u64,
    #[serde(rename = "foodEaten")]
    food_eaten: u32,
    #[serde(rename = "capsulesEaten")]
    capsules_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    teleports: u32,
    fallbacks: usize,
    #[serde(rename = "recordPath", skip_serializing_if = "Option::is_none")]
    record_path: Option<String>,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    turn: u64,
    message: String,
}

struct GameRun {
    result: GameResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    game: Game,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: f64,
    #[serde(rename = "winRate")]
    win_rate: f64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    games: Vec<GameResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    game: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    turn: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();

    if let Some(path) = cli.replay.as_ref() {
        let match_id = cli
            .match_id
            .clone()
            .unwrap_or_else(|| default_match_id(0, run_started_at_ms));
        std::process::exit(run_replay(path, &match_id));
    }

    let scenario = match resolve_scenario(&cli) {
        Ok(value) => value,
        Err(message) => {
            let match_id = cli.match_id.clone().unwrap_or_default();
            emit_log(
                "error",
                "invalid_arguments",
                &match_id,
                None,
                None,
                None,
                json!({ "error": message }),
            );
            std::process::exit(2);
        }
    };
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(scenario.seed, run_started_at_ms));
    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut total_anomalies = 0usize;

    for game_index in 0..scenario.games {
        let seed = scenario.seed.wrapping_add(game_index as u32);
        emit_log(
            "info",
            "game_started",
            &match_id,
            Some(game_index),
            Some(seed),
            None,
            json!({
                "scenario": scenario.name,
                "ghosts": scenario.ghosts,
                "pacman": scenario.pacman,
                "ghostPolicy": scenario.ghost_policy.as_str(),
                "lives": scenario.engine.starting_lives,
                "roundMode": scenario.engine.round_mode,
            }),
        );
        let mut run = match run_game(&scenario, game_index, seed) {
            Ok(value) => value,
            Err(message) => {
                emit_log(
                    "error",
                    "game_setup_failed",
                    &match_id,
                    Some(game_index),
                    Some(seed),
                    None,
                    json!({ "error": message }),
                );
                std::process::exit(2);
            }
        };

        for fallback in run.game.fallbacks() {
            emit_log(
                "warn",
                "agent_fallback",
                &match_id,
                Some(game_index),
                Some(seed),
                Some(fallback.turn),
                json!({
                    "agent": fallback.agent,
                    "reason": fallback.reason,
                    "substituted": fallback.substituted,
                }),
            );
        }
        for anomaly in &run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(game_index),
                Some(seed),
                Some(anomaly.turn),
                json!({ "message": anomaly.message }),
            );
        }

        if let Some(dir) = cli.record_dir.as_ref() {
            let record = GameRecord::from_game(&run.game, Some(seed));
            let path = record_file_path(dir, chrono::Utc::now(), run.result.score);
            if let Err(error) = record.save(&path) {
                emit_log(
                    "error",
                    "record_write_failed",
                    &match_id,
                    Some(game_index),
                    Some(seed),
                    None,
                    json!({
                        "path": path.to_string_lossy(),
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
            run.result.record_path = Some(path.to_string_lossy().to_string());
        }

        if !run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += run.anomaly_records.len();

        emit_log(
            "info",
            "game_finished",
            &match_id,
            Some(game_index),
            Some(seed),
            Some(run.result.moves),
            json!({
                "outcome": run.result.outcome,
                "score": run.result.score,
                "rounds": run.result.rounds,
                "anomalyCount": run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&run.result).expect("game result should serialize")
        );
        results.push(run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "gameCount": summary.game_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "winRate": summary.win_rate,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_replay(path: &Path, match_id: &str) -> i32 {
    let record = match GameRecord::load(path) {
        Ok(value) => value,
        Err(error) => {
            emit_log(
                "error",
                "replay_load_failed",
                match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            return 2;
        }
    };

    match record.replay(&mut NullDisplay) {
        Ok(state) => {
            let matches = state.score() == record.final_score;
            emit_log(
                if matches { "info" } else { "warn" },
                "replay_finished",
                match_id,
                None,
                record.seed,
                Some(record.moves.len() as u64),
                json!({
                    "path": path.to_string_lossy(),
                    "recordedScore": record.final_score,
                    "replayedScore": state.score(),
                    "recordedOutcome": record.outcome,
                    "lives": state.lives(),
                    "rounds": state.round(),
                }),
            );
            if matches {
                0
            } else {
                1
            }
        }
        Err(error) => {
            emit_log(
                "warn",
                "replay_diverged",
                match_id,
                None,
                record.seed,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            1
        }
    }
}

fn run_game(scenario: &Scenario, game_index: usize, seed: u32) -> Result<GameRun, String> {
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    let mut game = build_game(scenario, seed)?;

    let initial_food = game.state().num_food();
    let mut food_eaten = 0;
    let mut capsules_eaten = 0;
    let mut ghosts_eaten = 0;
    let mut lives_lost = 0;
    let mut teleports = 0;
    let mut previous_score = game.state().score();

    loop {
        let stepped = game.step();
        let turn = game.num_moves();
        let events = game.drain_events();

        let lost_this_turn = events
            .iter()
            .any(|entry| entry.event == RuleEvent::GameLost);
        for message in collect_state_anomalies(
            game.state(),
            initial_food,
            previous_score,
            lost_this_turn,
        ) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                turn,
                message,
            );
        }
        previous_score = game.state().score();

        for entry in &events {
            match entry.event {
                RuleEvent::FoodEaten { .. } => food_eaten += 1,
                RuleEvent::CapsuleEaten { .. } => capsules_eaten += 1,
                RuleEvent::GhostEaten { .. } => ghosts_eaten += 1,
                RuleEvent::PacmanCaught { .. } => lives_lost += 1,
                RuleEvent::Teleported { .. } => teleports += 1,
                _ => {}
            }
        }

        match stepped {
            Ok(Some(_)) => break,
            Ok(None) => {}
            Err(error) => {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    turn,
                    format!("engine rejected a move: {error}"),
                );
                break;
            }
        }
    }

    let summary = game.summary();
    Ok(GameRun {
        result: GameResultLine {
            scenario: scenario.name.clone(),
            game: game_index,
            seed,
            ghosts: scenario.ghosts,
            pacman: scenario.pacman.clone(),
            ghost_policy: scenario.ghost_policy.as_str().to_string(),
            outcome: summary.outcome,
            score: summary.score,
            lives: summary.lives,
            rounds: summary.rounds,
            moves: summary.moves,
            food_eaten,
            capsules_eaten,
            ghosts_eaten,
            lives_lost,
            teleports,
            fallbacks: summary.fallbacks,
            record_path: None,
            anomalies,
        },
        anomaly_records,
        game,
    })
}

fn build_game(scenario: &Scenario, seed: u32) -> Result<Game, String> {
    let rules = GameRules::new_game(
        Arc::clone(&scenario.layout),
        scenario.ghosts,
        scenario.engine.clone(),
    )
    .map_err(|error| error.to_string())?;
    let pacman: Box<dyn Agent> = pacman_agent(&scenario.pacman, seed)
        .ok_or_else(|| format!("unknown pacman agent: {}", scenario.pacman))?;
    let mut agents = vec![pacman];
    agents.extend(ghost_agents(scenario.ghosts, scenario.ghost_policy, seed));
    Game::new(
        rules,
        agents,
        Box::new(NullDisplay),
        scenario.game.clone(),
        seed,
    )
    .map_err(|error| error.to_string())
}

fn collect_state_anomalies(
    state: &GameState,
    initial_food: usize,
    previous_score: i64,
    lost_this_turn: bool,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let layout = state.layout();

    let pacman_cell = state.pacman_position().nearest_cell();
    if !layout.is_passable_for_pacman(pacman_cell) {
        anomalies.push(format!("pacman inside wall at {pacman_cell:?}"));
    }
    for (offset, ghost) in state.ghost_states().iter().enumerate() {
        let cell = ghost.position().nearest_cell();
        if layout.is_wall(cell) {
            anomalies.push(format!("ghost {} inside wall at {cell:?}", offset + 1));
        }
    }

    if state.lives() < 0 {
        anomalies.push(format!("negative lives: {}", state.lives()));
    }
    if state.num_food() > initial_food {
        anomalies.push(format!(
            "food count grew beyond the layout: {} > {initial_food}",
            state.num_food()
        ));
    }

    let delta = state.score() - previous_score;
    let expected_floor = if lost_this_turn { -LOSS_PENALTY } else { 0 };
    if delta < expected_floor {
        anomalies.push(format!("score dropped by {}", -delta));
    }
    anomalies
}

fn resolve_scenario(cli: &Cli) -> Result<Scenario, String> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| rand::random::<u32>() as u64));
    let name = cli
        .layout
        .clone()
        .unwrap_or_else(|| DEFAULT_LAYOUT.to_string());
    let layout = load_layout(&name)?;

    let ghosts = cli.ghosts.unwrap_or(layout.ghost_starts.len());
    if ghosts > 0 && layout.ghost_starts.is_empty() {
        return Err(format!("layout {name} has no ghost start"));
    }
    let pacman = cli.pacman.clone().unwrap_or_else(|| "greedy".to_string());
    if pacman_agent(&pacman, 0).is_none() {
        return Err(format!("unknown pacman agent: {pacman}"));
    }
    let ghost_policy = match cli.ghost_policy.as_deref() {
        None => GhostPolicy::directional(),
        Some(value) => {
            GhostPolicy::parse(value).ok_or_else(|| format!("unknown ghost policy: {value}"))?
        }
    };

    Ok(Scenario {
        name,
        layout: Arc::new(layout),
        ghosts,
        pacman,
        ghost_policy,
        engine: EngineOptions {
            starting_lives: cli
                .lives
                .unwrap_or(EngineOptions::default().starting_lives)
                .max(1),
            round_mode: if cli.classic_win {
                RoundMode::ClassicWin
            } else {
                RoundMode::Endless
            },
        },
        game: GameOptions {
            max_moves: Some(cli.max_moves.unwrap_or(DEFAULT_MAX_MOVES)),
            move_timeout_ms: cli.move_timeout_ms,
        },
        seed,
        games: cli.games.unwrap_or(1).clamp(1, 10_000),
    })
}

fn load_layout(name: &str) -> Result<Layout, String> {
    if let Some(layout) = Layout::builtin(name) {
        return Ok(layout);
    }
    let text = std::fs::read_to_string(name).map_err(|error| {
        format!(
            "layout {name} is neither built in ({}) nor readable: {error}",
            Layout::builtin_names().join(", ")
        )
    })?;
    Layout::parse(&text).map_err(|error| format!("layout {name} is invalid: {error}"))
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    turn: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        turn,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    games: Vec<GameResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let game_count = games.len();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    for game in &games {
        let key = game.outcome.map(GameOutcome::as_str).unwrap_or("unfinished");
        *outcome_counts.entry(key.to_string()).or_insert(0) += 1;
    }
    let (average_score, win_rate) = if game_count == 0 {
        (0.0, 0.0)
    } else {
        let total: i64 = games.iter().map(|game| game.score).sum();
        let wins = outcome_counts
            .get(GameOutcome::Won.as_str())
            .copied()
            .unwrap_or(0);
        (
            total as f64 / game_count as f64,
            wins as f64 / game_count as f64,
        )
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        game_count,
        anomaly_count,
        average_score,
        win_rate,
        outcome_counts,
        games,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    game: Option<usize>,
    seed: Option<u32>,
    turn: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        game,
        seed,
        turn,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
