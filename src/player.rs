use crate::constants::STARTING_LIVES;
use crate::engine::{self, Actor, DirectionPolicy};
use crate::maze::Maze;
use crate::types::{Direction, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Player {
    pub actor: Actor,
    pub lives: u32,
    pub score: u32,
    pub powered_up: bool,
    pub powerup_timer: f32,
}

impl Player {
    pub fn new(start: Vec2) -> Self {
        Self {
            actor: Actor::at_rest(start, Direction::Right),
            lives: STARTING_LIVES,
            score: 0,
            powered_up: false,
            powerup_timer: 0.0,
        }
    }

    pub fn respawn(&mut self, start: Vec2) {
        self.actor = Actor::at_rest(start, Direction::Right);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BufferedInput;

impl DirectionPolicy for BufferedInput {
    fn choose_direction(&mut self, actor: &Actor, _maze: &Maze) -> Option<Direction> {
        actor.next_direction
    }
}

// Oldest first; the most recent press wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeldDirections {
    order: Vec<Direction>,
}

impl HeldDirections {
    pub fn press(&mut self, dir: Direction) {
        self.order.retain(|held| *held != dir);
        self.order.push(dir);
    }

    pub fn release(&mut self, dir: Direction) {
        self.order.retain(|held| *held != dir);
    }

    pub fn latest(&self) -> Option<Direction> {
        self.order.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

pub fn step_player(player: Player, maze: &Maze, dt: f32, speed: f32) -> Player {
    Player {
        actor: engine::step(player.actor, maze, dt, speed, &mut BufferedInput),
        ..player
    }
}

pub fn press_direction(player: Player, held: &mut HeldDirections, dir: Direction) -> Player {
    held.press(dir);
    let mut actor = player.actor;
    if actor.is_moving() && dir == actor.direction.opposite() {
        actor = engine::reverse(actor);
    }
    actor.next_direction = held.latest();
    Player { actor, ..player }
}

pub fn release_direction(player: Player, held: &mut HeldDirections, dir: Direction) -> Player {
    held.release(dir);
    let mut actor = player.actor;
    actor.next_direction = held.latest();
    Player { actor, ..player }
}
