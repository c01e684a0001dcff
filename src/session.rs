use crate::collision::are_colliding;
use crate::constants::{
    MAX_SUBSTEPS_PER_TICK, PELLET_SCORE, PLAYER_BASE_SPEED, POWER_DURATION_SEC,
    POWER_PELLET_SCORE, ROBOT_BASE_SPEED, ROBOT_DEFEAT_SCORE, STARTING_LIVES,
};
use crate::engine::{position, projected_tile};
use crate::maze::{Maze, MazeError, TileKind};
use crate::player::{press_direction, release_direction, step_player, HeldDirections, Player};
use crate::rng::SeededRng;
use crate::robot::{step_robot, Robot};
use crate::types::{
    Direction, GameOverReason, PlayerView, RobotBehavior, RobotView, SessionEvent, Snapshot, Vec2,
};

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub player_speed: f32,
    pub robot_speed: f32,
    pub power_duration_sec: f32,
    pub starting_lives: u32,
    pub robot_behaviors: Vec<RobotBehavior>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_BASE_SPEED,
            robot_speed: ROBOT_BASE_SPEED,
            power_duration_sec: POWER_DURATION_SEC,
            starting_lives: STARTING_LIVES,
            robot_behaviors: vec![
                RobotBehavior::Patrol,
                RobotBehavior::Chase,
                RobotBehavior::Ambush,
            ],
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameSession {
    maze: Maze,
    options: SessionOptions,
    rng: SeededRng,
    player: Player,
    player_start: Vec2,
    robots: Vec<Robot>,
    held: HeldDirections,
    frame: u64,
    elapsed_sec: f32,
    events: Vec<SessionEvent>,
    game_over: Option<GameOverReason>,
}

impl GameSession {
    pub fn new(maze: Maze, options: SessionOptions, seed: u32) -> Result<Self, MazeError> {
        let player_start = maze
            .player_start
            .or_else(|| maze.first_walkable())
            .ok_or(MazeError::Empty)?;
        let mut player = Player::new(player_start);
        player.lives = options.starting_lives;
        let robots = spawn_robots(&maze, &options.robot_behaviors);

        Ok(Self {
            maze,
            options,
            rng: SeededRng::new(seed),
            player,
            player_start,
            robots,
            held: HeldDirections::default(),
            frame: 0,
            elapsed_sec: 0.0,
            events: Vec::new(),
            game_over: None,
        })
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn held(&self) -> &HeldDirections {
        &self.held
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_ended(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_over(&self) -> Option<GameOverReason> {
        self.game_over
    }

    pub fn press(&mut self, dir: Direction) {
        self.player = press_direction(self.player, &mut self.held, dir);
    }

    pub fn release(&mut self, dir: Direction) {
        self.player = release_direction(self.player, &mut self.held, dir);
    }

    pub fn tick(&mut self, dt: f32) {
        if self.game_over.is_some() {
            return;
        }
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.frame += 1;
        self.elapsed_sec += dt;

        let fastest = self.options.player_speed.max(self.options.robot_speed);
        let substeps = substep_count(dt, fastest);
        let slice = dt / substeps as f32;
        for _ in 0..substeps {
            self.advance(slice);
            if self.game_over.is_some() {
                break;
            }
        }
    }

    fn advance(&mut self, dt: f32) {
        self.update_power(dt);
        self.player = step_player(self.player, &self.maze, dt, self.options.player_speed);
        self.apply_pickups();

        let player_tile = self.player.actor.current_tile;
        for robot in &mut self.robots {
            *robot = step_robot(
                *robot,
                &self.maze,
                dt,
                self.options.robot_speed,
                player_tile,
                &mut self.rng,
            );
        }

        self.resolve_collisions();
        if self.game_over.is_none() && self.maze.collectibles_left() == 0 {
            self.end(GameOverReason::MazeCleared);
        }
    }

    pub fn build_snapshot(&mut self) -> Snapshot {
        let actor = &self.player.actor;
        let (px, py) = position(actor);
        Snapshot {
            frame: self.frame,
            elapsed_sec: self.elapsed_sec,
            collectibles_left: self.maze.collectibles_left(),
            player: PlayerView {
                tile: actor.current_tile,
                target_tile: actor.target_tile,
                progress: actor.progress,
                dir: actor.direction,
                next_dir: actor.next_direction,
                x: px,
                y: py,
                lives: self.player.lives,
                score: self.player.score,
                powered_up: self.player.powered_up,
                powerup_timer: self.player.powerup_timer,
            },
            robots: self.robots.iter().map(robot_view).collect(),
            events: std::mem::take(&mut self.events),
            game_over: self.game_over,
        }
    }

    fn update_power(&mut self, dt: f32) {
        if !self.player.powered_up {
            return;
        }
        self.player.powerup_timer -= dt;
        if self.player.powerup_timer <= 0.0 {
            self.player.powerup_timer = 0.0;
            self.player.powered_up = false;
            self.events.push(SessionEvent::PowerExpired);
        }
    }

    fn apply_pickups(&mut self) {
        let tile = projected_tile(&self.player.actor);
        match self.maze.consume(tile) {
            Some(TileKind::Pellet) => {
                self.player.score += PELLET_SCORE;
                self.events.push(SessionEvent::PelletEaten {
                    x: tile.x,
                    y: tile.y,
                });
            }
            Some(TileKind::PowerPellet) => {
                self.player.score += POWER_PELLET_SCORE;
                self.player.powered_up = true;
                self.player.powerup_timer = self.options.power_duration_sec;
                self.events.push(SessionEvent::PowerPelletEaten {
                    x: tile.x,
                    y: tile.y,
                });
            }
            _ => {}
        }
    }

    fn resolve_collisions(&mut self) {
        let mut caught_by = None;
        for robot in &mut self.robots {
            if robot.is_protected || !are_colliding(&self.player.actor, &robot.actor) {
                continue;
            }
            if self.player.powered_up {
                self.player.score += ROBOT_DEFEAT_SCORE;
                robot.return_to_spawn();
                self.events
                    .push(SessionEvent::RobotDefeated { robot_id: robot.id });
            } else {
                caught_by = Some(robot.id);
                break;
            }
        }

        let Some(robot_id) = caught_by else {
            return;
        };
        self.player.lives = self.player.lives.saturating_sub(1);
        self.events.push(SessionEvent::PlayerCaught {
            robot_id,
            lives_left: self.player.lives,
        });
        if self.player.lives == 0 {
            self.end(GameOverReason::Caught);
        } else {
            self.start_round();
        }
    }

    fn start_round(&mut self) {
        self.player.respawn(self.player_start);
        self.player.powered_up = false;
        self.player.powerup_timer = 0.0;
        self.held.clear();
        self.robots = spawn_robots(&self.maze, &self.options.robot_behaviors);
    }

    fn end(&mut self, reason: GameOverReason) {
        self.game_over = Some(reason);
        self.events.push(SessionEvent::GameOver { reason });
    }
}

fn substep_count(dt: f32, speed: f32) -> u32 {
    let tiles = dt * speed;
    if !tiles.is_finite() || tiles <= 1.0 {
        return 1;
    }
    (tiles.ceil() as u32).clamp(1, MAX_SUBSTEPS_PER_TICK)
}

fn spawn_robots(maze: &Maze, behaviors: &[RobotBehavior]) -> Vec<Robot> {
    if behaviors.is_empty() {
        return Vec::new();
    }
    maze.robot_spawns()
        .into_iter()
        .enumerate()
        .map(|(idx, spawn)| Robot::new(idx as u32 + 1, spawn, behaviors[idx % behaviors.len()]))
        .collect()
}

fn robot_view(robot: &Robot) -> RobotView {
    let (x, y) = position(&robot.actor);
    RobotView {
        id: robot.id,
        tile: robot.actor.current_tile,
        target_tile: robot.actor.target_tile,
        progress: robot.actor.progress,
        dir: robot.actor.direction,
        x,
        y,
        behavior: robot.behavior,
        is_protected: robot.is_protected,
    }
}
