use crate::constants::MAX_SEGMENTS_PER_STEP;
use crate::maze::Maze;
use crate::types::{Direction, Vec2};

pub mod utils;

use self::utils::sanitize_advance;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Actor {
    pub current_tile: Vec2,
    pub target_tile: Vec2,
    pub progress: f32,
    pub direction: Direction,
    pub next_direction: Option<Direction>,
}

impl Actor {
    pub fn at_rest(tile: Vec2, direction: Direction) -> Self {
        Self {
            current_tile: tile,
            target_tile: tile,
            progress: 0.0,
            direction,
            next_direction: None,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.current_tile != self.target_tile
    }
}

// `None` or a blocked direction means keep going straight.
pub trait DirectionPolicy {
    fn choose_direction(&mut self, actor: &Actor, maze: &Maze) -> Option<Direction>;
}

impl<F> DirectionPolicy for F
where
    F: FnMut(&Actor, &Maze) -> Option<Direction>,
{
    fn choose_direction(&mut self, actor: &Actor, maze: &Maze) -> Option<Direction> {
        self(actor, maze)
    }
}

pub fn step<P>(actor: Actor, maze: &Maze, dt: f32, speed: f32, policy: &mut P) -> Actor
where
    P: DirectionPolicy + ?Sized,
{
    let advance = sanitize_advance(speed, dt);
    let mut next = actor;

    if next.is_moving() {
        next.progress += advance;
        if next.progress < 1.0 {
            return next;
        }
    } else {
        if advance == 0.0 {
            return next;
        }
        if !resolve_boundary(&mut next, maze, policy) {
            return next;
        }
        next.progress = advance;
    }

    let mut segments = 0;
    while next.progress >= 1.0 {
        next.progress -= 1.0;
        next.current_tile = next.target_tile;
        segments += 1;
        if !resolve_boundary(&mut next, maze, policy) {
            break;
        }
        if segments >= MAX_SEGMENTS_PER_STEP {
            next.progress = next.progress.fract();
            break;
        }
    }
    next
}

fn resolve_boundary<P>(actor: &mut Actor, maze: &Maze, policy: &mut P) -> bool
where
    P: DirectionPolicy + ?Sized,
{
    let here = actor.current_tile;

    if let Some(dir) = policy.choose_direction(actor, maze) {
        if maze.can_move(here, dir) {
            actor.direction = dir;
            if actor.next_direction == Some(dir) {
                actor.next_direction = None;
            }
            actor.target_tile = here.neighbor(dir);
            return true;
        }
    }

    if maze.can_move(here, actor.direction) {
        actor.target_tile = here.neighbor(actor.direction);
        return true;
    }

    actor.target_tile = here;
    actor.progress = 0.0;
    false
}

pub fn reverse(actor: Actor) -> Actor {
    let mut next = actor;
    next.direction = actor.direction.opposite();
    next.next_direction = None;

    if !actor.is_moving() {
        return next;
    }
    let inverted = 1.0 - actor.progress;
    if actor.progress <= 0.0 || inverted >= 1.0 {
        // Not measurably off the tile it just left: turn around in place.
        next.target_tile = actor.current_tile;
        next.progress = 0.0;
        return next;
    }

    next.current_tile = actor.target_tile;
    next.target_tile = actor.current_tile;
    next.progress = inverted;
    next
}

pub fn buffer_direction(actor: Actor, dir: Direction) -> Actor {
    Actor {
        next_direction: Some(dir),
        ..actor
    }
}

pub fn position(actor: &Actor) -> (f32, f32) {
    let x = actor.current_tile.x as f32
        + (actor.target_tile.x - actor.current_tile.x) as f32 * actor.progress;
    let y = actor.current_tile.y as f32
        + (actor.target_tile.y - actor.current_tile.y) as f32 * actor.progress;
    (x, y)
}

pub fn projected_tile(actor: &Actor) -> Vec2 {
    let (x, y) = position(actor);
    Vec2::new(x.floor() as i32, y.floor() as i32)
}
