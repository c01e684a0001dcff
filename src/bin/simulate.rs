use chrono::{SecondsFormat, Utc};
use clap::Parser;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Value};
use shark_maze::constants::{frame_dt, DEFAULT_FPS, PLAYER_BASE_SPEED, ROBOT_BASE_SPEED};
use shark_maze::engine::utils::manhattan;
use shark_maze::maze::{Maze, TileKind};
use shark_maze::rng::SeededRng;
use shark_maze::robot::chase_direction;
use shark_maze::session::{GameSession, SessionOptions};
use shark_maze::types::{
    Direction, GameOverReason, RobotBehavior, SessionEvent, Snapshot, Vec2,
};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_FRAMES: u64 = 60 * 60 * 3;
// Random detours keep the autopilot from pacing against the same wall.
const AUTOPILOT_WANDER_CHANCE: f64 = 0.05;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    frames: Option<u64>,
    #[arg(long)]
    fps: Option<u32>,
    #[arg(long)]
    maze: Option<PathBuf>,
    /// Robot behaviors assigned to spawn tiles in order, e.g. `patrol,chase,ambush`.
    #[arg(long, value_delimiter = ',')]
    robots: Option<Vec<String>>,
    #[arg(long)]
    player_speed: Option<f32>,
    #[arg(long)]
    robot_speed: Option<f32>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResultLine {
    seed: u32,
    fps: u32,
    frames: u64,
    elapsed_sec: f32,
    reason: String,
    score: u32,
    lives_left: u32,
    collectibles_left: usize,
    pellets_eaten: u32,
    power_pellets_eaten: u32,
    robots_defeated: u32,
    times_caught: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    frame: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    started_at: String,
    finished_at: String,
    maze: String,
    robot_behaviors: Vec<RobotBehavior>,
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    seed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<u64>,
    details: Value,
}

#[derive(Clone, Debug)]
struct RunConfig {
    seed: u32,
    frames: u64,
    fps: u32,
    maze_label: String,
    options: SessionOptions,
}

#[derive(Clone, Debug, Default)]
struct AnomalyLog {
    messages: Vec<String>,
    records: Vec<AnomalyRecord>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn push(&mut self, frame: u64, message: String) {
        self.records.push(AnomalyRecord {
            frame,
            message: message.clone(),
        });
        if self.seen.insert(message.clone()) {
            self.messages.push(message);
        }
    }
}

struct Autopilot {
    rng: SeededRng,
    holding: Option<Direction>,
}

impl Autopilot {
    fn new(seed: u32) -> Self {
        Self {
            rng: SeededRng::new(seed ^ 0x9e37_79b9),
            holding: None,
        }
    }

    fn drive(&mut self, session: &mut GameSession) {
        let desired = self.pick(session);
        if desired == self.holding {
            return;
        }
        if let Some(old) = self.holding {
            session.release(old);
        }
        if let Some(dir) = desired {
            session.press(dir);
        }
        self.holding = desired;
    }

    fn pick(&mut self, session: &GameSession) -> Option<Direction> {
        let maze = session.maze();
        let actor = &session.player().actor;
        if self.rng.random_bool(AUTOPILOT_WANDER_CHANCE) {
            let open = maze.open_directions(actor.current_tile);
            if let Some(dir) = open.choose(&mut self.rng) {
                return Some(*dir);
            }
        }
        let target = nearest_collectible(maze, actor.current_tile)?;
        chase_direction(actor, maze, target)
    }
}

fn nearest_collectible(maze: &Maze, from: Vec2) -> Option<Vec2> {
    maze.tiles_of(TileKind::Pellet)
        .into_iter()
        .chain(maze.tiles_of(TileKind::PowerPellet))
        .min_by_key(|tile| (manhattan(from, *tile), tile.y, tile.x))
}

fn main() {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(|| Utc::now().timestamp_millis() as u32);
    let started_at = now_iso();

    let config = match resolve_config(&cli, seed) {
        Ok(config) => config,
        Err(message) => {
            emit_log("error", "invalid_arguments", seed, None, json!({ "error": message }));
            std::process::exit(2);
        }
    };
    let maze = match load_maze(cli.maze.as_deref()) {
        Ok(maze) => maze,
        Err(message) => {
            emit_log(
                "error",
                "maze_load_failed",
                seed,
                None,
                json!({ "maze": config.maze_label, "error": message }),
            );
            std::process::exit(2);
        }
    };

    emit_log(
        "info",
        "run_started",
        seed,
        None,
        json!({
            "maze": config.maze_label,
            "width": maze.width,
            "height": maze.height,
            "collectibles": maze.collectibles_left(),
            "blockedEdges": maze.blocked_edges().count(),
            "frames": config.frames,
            "fps": config.fps,
            "robots": config.options.robot_behaviors,
        }),
    );

    let mut session = match GameSession::new(maze, config.options.clone(), config.seed) {
        Ok(session) => session,
        Err(error) => {
            emit_log(
                "error",
                "session_start_failed",
                seed,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let (result, anomaly_log) = run(&mut session, &config);
    for anomaly in &anomaly_log.records {
        emit_log(
            "warn",
            "anomaly_detected",
            seed,
            Some(anomaly.frame),
            json!({ "message": anomaly.message }),
        );
    }

    match serde_json::to_string(&result) {
        Ok(line) => println!("{line}"),
        Err(error) => {
            emit_log(
                "error",
                "result_serialize_failed",
                seed,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    }

    let summary = RunSummary {
        started_at,
        finished_at: now_iso(),
        maze: config.maze_label.clone(),
        robot_behaviors: config.options.robot_behaviors.clone(),
        result: result.clone(),
        anomaly_records: anomaly_log.records.clone(),
    };

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                seed,
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
        seed,
        Some(result.frames),
        json!({
            "reason": result.reason,
            "score": result.score,
            "livesLeft": result.lives_left,
            "anomalyCount": anomaly_log.records.len(),
            "summaryOut": summary_out_written,
        }),
    );

    if !result.anomalies.is_empty() {
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli, seed: u32) -> Result<RunConfig, String> {
    let fps = cli.fps.unwrap_or(DEFAULT_FPS).clamp(1, 1000);
    let mut options = SessionOptions {
        player_speed: cli.player_speed.unwrap_or(PLAYER_BASE_SPEED),
        robot_speed: cli.robot_speed.unwrap_or(ROBOT_BASE_SPEED),
        ..SessionOptions::default()
    };
    if let Some(names) = cli.robots.as_ref() {
        options.robot_behaviors = parse_behaviors(names)?;
    }
    for (name, speed) in [
        ("player-speed", options.player_speed),
        ("robot-speed", options.robot_speed),
    ] {
        if !speed.is_finite() || speed < 0.0 {
            return Err(format!("--{name} must be a non-negative number, got {speed}"));
        }
    }

    Ok(RunConfig {
        seed,
        frames: cli.frames.unwrap_or(DEFAULT_FRAMES),
        fps,
        maze_label: cli
            .maze
            .as_ref()
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_else(|| "classic".to_string()),
        options,
    })
}

fn parse_behaviors(names: &[String]) -> Result<Vec<RobotBehavior>, String> {
    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            RobotBehavior::parse(name).ok_or_else(|| format!("unknown robot behavior: {name}"))
        })
        .collect()
}

fn load_maze(path: Option<&Path>) -> Result<Maze, String> {
    let Some(path) = path else {
        return Ok(Maze::classic());
    };
    let text = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    Maze::parse(&text).map_err(|error| error.to_string())
}

fn run(session: &mut GameSession, config: &RunConfig) -> (RunResultLine, AnomalyLog) {
    let dt = frame_dt(config.fps);
    let mut autopilot = Autopilot::new(config.seed);
    let mut anomalies = AnomalyLog::default();
    let mut counters = EventCounters::default();
    let mut previous = session.build_snapshot();

    for _ in 0..config.frames {
        if session.is_ended() {
            break;
        }
        autopilot.drive(session);
        session.tick(dt);
        let snapshot = session.build_snapshot();
        counters.record(&snapshot.events);
        for message in collect_snapshot_anomalies(session.maze(), &previous, &snapshot) {
            anomalies.push(snapshot.frame, message);
        }
        previous = snapshot;
    }

    let result = RunResultLine {
        seed: config.seed,
        fps: config.fps,
        frames: previous.frame,
        elapsed_sec: previous.elapsed_sec,
        reason: game_over_reason_key(previous.game_over),
        score: previous.player.score,
        lives_left: previous.player.lives,
        collectibles_left: previous.collectibles_left,
        pellets_eaten: counters.pellets,
        power_pellets_eaten: counters.power_pellets,
        robots_defeated: counters.robots_defeated,
        times_caught: counters.caught,
        anomalies: anomalies.messages.clone(),
    };
    (result, anomalies)
}

#[derive(Clone, Copy, Debug, Default)]
struct EventCounters {
    pellets: u32,
    power_pellets: u32,
    robots_defeated: u32,
    caught: u32,
}

impl EventCounters {
    fn record(&mut self, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::PelletEaten { .. } => self.pellets += 1,
                SessionEvent::PowerPelletEaten { .. } => self.power_pellets += 1,
                SessionEvent::RobotDefeated { .. } => self.robots_defeated += 1,
                SessionEvent::PlayerCaught { .. } => self.caught += 1,
                _ => {}
            }
        }
    }
}

fn collect_snapshot_anomalies(maze: &Maze, previous: &Snapshot, snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    let player = &snapshot.player;
    if !(0.0..1.0).contains(&player.progress) {
        anomalies.push(format!("player progress out of range: {}", player.progress));
    }
    if !maze.is_walkable(player.tile) || !maze.is_walkable(player.target_tile) {
        anomalies.push(format!(
            "player on a wall: {:?} -> {:?}",
            player.tile, player.target_tile
        ));
    }
    if manhattan(player.tile, player.target_tile) > 1 {
        anomalies.push(format!(
            "player target not adjacent: {:?} -> {:?}",
            player.tile, player.target_tile
        ));
    }

    for robot in &snapshot.robots {
        if !(0.0..1.0).contains(&robot.progress) {
            anomalies.push(format!(
                "robot {} progress out of range: {}",
                robot.id, robot.progress
            ));
        }
        if !maze.is_walkable(robot.tile) || !maze.is_walkable(robot.target_tile) {
            anomalies.push(format!("robot {} on a wall: {:?}", robot.id, robot.tile));
        }
        if manhattan(robot.tile, robot.target_tile) > 1 {
            anomalies.push(format!(
                "robot {} target not adjacent: {:?} -> {:?}",
                robot.id, robot.tile, robot.target_tile
            ));
        }
    }

    if snapshot.collectibles_left > previous.collectibles_left {
        anomalies.push(format!(
            "collectibles grew: {} -> {}",
            previous.collectibles_left, snapshot.collectibles_left
        ));
    }
    if snapshot.player.score < previous.player.score {
        anomalies.push(format!(
            "score went down: {} -> {}",
            previous.player.score, snapshot.player.score
        ));
    }
    if snapshot.player.lives > previous.player.lives {
        anomalies.push(format!(
            "lives went up: {} -> {}",
            previous.player.lives, snapshot.player.lives
        ));
    }
    anomalies
}

fn game_over_reason_key(reason: Option<GameOverReason>) -> String {
    match reason {
        Some(GameOverReason::MazeCleared) => "maze_cleared",
        Some(GameOverReason::Caught) => "caught",
        None => "frame_limit",
    }
    .to_string()
}

fn emit_log(level: &str, event: &str, seed: u32, frame: Option<u64>, details: Value) {
    let log_line = StructuredLogLine {
        timestamp: now_iso(),
        level: level.to_string(),
        event: event.to_string(),
        seed,
        frame,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
