use rand::seq::IndexedRandom;
use rand::Rng;

use crate::constants::{AMBUSH_TRIGGER_RADIUS, SPAWN_PROTECTION_RADIUS};
use crate::engine::utils::manhattan;
use crate::engine::{self, Actor, DirectionPolicy};
use crate::maze::Maze;
use crate::types::{Direction, RobotBehavior, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Robot {
    pub id: u32,
    pub actor: Actor,
    pub behavior: RobotBehavior,
    pub chase_target: Option<Vec2>,
    pub is_protected: bool,
    pub spawn_area: Vec2,
}

impl Robot {
    pub fn new(id: u32, spawn: Vec2, behavior: RobotBehavior) -> Self {
        Self {
            id,
            actor: Actor::at_rest(spawn, Direction::Right),
            behavior,
            chase_target: None,
            is_protected: true,
            spawn_area: spawn,
        }
    }

    pub fn is_protected(&self) -> bool {
        self.is_protected
    }

    pub fn return_to_spawn(&mut self) {
        self.actor = Actor::at_rest(self.spawn_area, Direction::Right);
        self.chase_target = None;
    }

    fn refresh_protection(&mut self) {
        if self.is_protected
            && manhattan(self.actor.current_tile, self.spawn_area) >= SPAWN_PROTECTION_RADIUS
        {
            self.is_protected = false;
        }
    }
}

pub struct RobotPolicy<'a, R: Rng + ?Sized> {
    pub behavior: RobotBehavior,
    pub chase_target: Option<Vec2>,
    pub rng: &'a mut R,
}

impl<R: Rng + ?Sized> DirectionPolicy for RobotPolicy<'_, R> {
    fn choose_direction(&mut self, actor: &Actor, maze: &Maze) -> Option<Direction> {
        match (self.behavior, self.chase_target) {
            (RobotBehavior::Chase, Some(target)) => chase_direction(actor, maze, target),
            (RobotBehavior::Ambush, Some(target))
                if manhattan(actor.current_tile, target) <= AMBUSH_TRIGGER_RADIUS =>
            {
                chase_direction(actor, maze, target)
            }
            _ => patrol_direction(actor, maze, self.rng),
        }
    }
}

pub fn patrol_direction<R: Rng + ?Sized>(
    actor: &Actor,
    maze: &Maze,
    rng: &mut R,
) -> Option<Direction> {
    let here = actor.current_tile;
    let back = actor.direction.opposite();
    let open = maze.open_directions(here);
    let forward: Vec<Direction> = open.iter().copied().filter(|dir| *dir != back).collect();

    if forward.is_empty() {
        return open.contains(&back).then_some(back);
    }
    if !maze.is_intersection(here) && forward.contains(&actor.direction) {
        return Some(actor.direction);
    }
    forward.choose(rng).copied()
}

// Ties go horizontal.
pub fn chase_direction(actor: &Actor, maze: &Maze, target: Vec2) -> Option<Direction> {
    let here = actor.current_tile;
    let dx = target.x - here.x;
    let dy = target.y - here.y;
    if dx == 0 && dy == 0 {
        return None;
    }

    let horizontal = (dx != 0).then_some(if dx > 0 {
        Direction::Right
    } else {
        Direction::Left
    });
    let vertical = (dy != 0).then_some(if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    });
    let (primary, secondary) = if dx.abs() >= dy.abs() {
        (horizontal, vertical)
    } else {
        (vertical, horizontal)
    };

    let back = actor.direction.opposite();
    let fallback = std::iter::once(actor.direction)
        .chain(Direction::ALL.into_iter().filter(|dir| *dir != back))
        .chain(std::iter::once(back));

    primary
        .into_iter()
        .chain(secondary)
        .chain(fallback)
        .find(|dir| maze.can_move(here, *dir))
}

pub fn step_robot<R: Rng + ?Sized>(
    robot: Robot,
    maze: &Maze,
    dt: f32,
    speed: f32,
    player_tile: Vec2,
    rng: &mut R,
) -> Robot {
    let mut next = robot;
    next.chase_target = match robot.behavior {
        RobotBehavior::Patrol => None,
        RobotBehavior::Chase | RobotBehavior::Ambush => Some(player_tile),
    };

    let mut policy = RobotPolicy {
        behavior: next.behavior,
        chase_target: next.chase_target,
        rng,
    };
    next.actor = engine::step(next.actor, maze, dt, speed, &mut policy);
    next.refresh_protection();
    next
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::rng::SeededRng;

    const ROOM: &str = "\
#######
#.....#
#.....#
#.....#
#######
";

    const CORRIDOR: &str = "\
#######
#.....#
#######
";

    fn arriving(from: Vec2, dir: Direction) -> Actor {
        Actor {
            current_tile: from,
            target_tile: from.neighbor(dir),
            progress: 0.5,
            direction: dir,
            next_direction: None,
        }
    }

    fn robot_with(actor: Actor, behavior: RobotBehavior) -> Robot {
        Robot {
            actor,
            ..Robot::new(1, actor.current_tile, behavior)
        }
    }

    #[test]
    fn patrol_reverses_only_at_a_dead_end() {
        let maze = Maze::parse(CORRIDOR).expect("corridor should parse");
        let robot = robot_with(arriving(Vec2::new(4, 1), Direction::Right), RobotBehavior::Patrol);
        let mut rng = SeededRng::new(3);

        let next = step_robot(robot, &maze, 0.5, 1.0, Vec2::new(1, 1), &mut rng);

        assert_eq!(next.actor.current_tile, Vec2::new(5, 1));
        assert_eq!(next.actor.direction, Direction::Left);
        assert_eq!(next.actor.target_tile, Vec2::new(4, 1));
    }

    #[test]
    fn patrol_goes_straight_through_corridors() {
        let maze = Maze::parse(CORRIDOR).expect("corridor should parse");
        let robot = robot_with(arriving(Vec2::new(2, 1), Direction::Right), RobotBehavior::Patrol);
        let mut rng = SeededRng::new(11);

        let next = step_robot(robot, &maze, 0.5, 1.0, Vec2::new(1, 1), &mut rng);

        assert_eq!(next.actor.direction, Direction::Right);
        assert_eq!(next.actor.target_tile, Vec2::new(4, 1));
    }

    #[test]
    fn patrol_never_reverses_at_intersections_and_spreads_choices() {
        let maze = Maze::parse(ROOM).expect("room should parse");
        let actor = Actor::at_rest(Vec2::new(3, 2), Direction::Right);
        let mut seen = HashSet::new();

        for seed in 0..200u32 {
            let mut rng = SeededRng::new(seed);
            let dir = patrol_direction(&actor, &maze, &mut rng).expect("room is open");
            assert_ne!(dir, Direction::Left);
            seen.insert(dir);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn same_seed_repeats_patrol_decisions() {
        let maze = Maze::classic();
        let spawns = maze.robot_spawns();
        let mut a = Robot::new(1, spawns[0], RobotBehavior::Patrol);
        let mut b = a;
        let mut rng_a = SeededRng::new(77);
        let mut rng_b = SeededRng::new(77);
        for _ in 0..600 {
            a = step_robot(a, &maze, 1.0 / 60.0, 3.2, Vec2::new(1, 1), &mut rng_a);
            b = step_robot(b, &maze, 1.0 / 60.0, 3.2, Vec2::new(1, 1), &mut rng_b);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn chase_prefers_the_longer_axis_and_breaks_ties_horizontally() {
        let maze = Maze::parse(ROOM).expect("room should parse");
        let actor = Actor::at_rest(Vec2::new(1, 1), Direction::Right);

        assert_eq!(
            chase_direction(&actor, &maze, Vec2::new(2, 3)),
            Some(Direction::Down)
        );
        assert_eq!(
            chase_direction(&actor, &maze, Vec2::new(5, 2)),
            Some(Direction::Right)
        );
        assert_eq!(
            chase_direction(&actor, &maze, Vec2::new(3, 3)),
            Some(Direction::Right)
        );
        assert_eq!(chase_direction(&actor, &maze, Vec2::new(1, 1)), None);
    }

    #[test]
    fn chase_falls_back_to_the_other_axis_when_blocked() {
        let text = format!("{ROOM}!block 1,1 2,1\n");
        let maze = Maze::parse(&text).expect("room should parse");
        let actor = Actor::at_rest(Vec2::new(1, 1), Direction::Up);

        assert_eq!(
            chase_direction(&actor, &maze, Vec2::new(4, 2)),
            Some(Direction::Down)
        );
    }

    #[test]
    fn ambush_waits_for_the_player_to_come_close() {
        let maze = Maze::parse(ROOM).expect("room should parse");
        let robot = Robot::new(4, Vec2::new(1, 1), RobotBehavior::Ambush);
        let mut rng = SeededRng::new(5);

        let far = step_robot(robot, &maze, 0.1, 1.0, Vec2::new(5, 3), &mut rng);
        assert_eq!(far.actor.direction, Direction::Right);

        let near = step_robot(robot, &maze, 0.1, 1.0, Vec2::new(1, 3), &mut rng);
        assert_eq!(near.actor.direction, Direction::Down);
        assert_eq!(near.behavior, RobotBehavior::Ambush);
        assert_eq!(near.chase_target, Some(Vec2::new(1, 3)));
    }

    #[test]
    fn patrol_robots_carry_no_chase_target() {
        let maze = Maze::parse(ROOM).expect("room should parse");
        let robot = Robot::new(2, Vec2::new(3, 2), RobotBehavior::Patrol);
        let mut rng = SeededRng::new(8);
        let next = step_robot(robot, &maze, 0.1, 1.0, Vec2::new(1, 1), &mut rng);
        assert_eq!(next.chase_target, None);
    }

    #[test]
    fn spawn_protection_drops_at_two_tiles_and_never_returns() {
        let maze = Maze::parse(CORRIDOR).expect("corridor should parse");
        let mut robot = Robot::new(9, Vec2::new(1, 1), RobotBehavior::Chase);
        let mut rng = SeededRng::new(1);
        assert!(robot.is_protected());

        robot = step_robot(robot, &maze, 1.0, 1.0, Vec2::new(5, 1), &mut rng);
        assert_eq!(robot.actor.current_tile, Vec2::new(2, 1));
        assert!(robot.is_protected());

        robot = step_robot(robot, &maze, 1.0, 1.0, Vec2::new(5, 1), &mut rng);
        assert_eq!(robot.actor.current_tile, Vec2::new(3, 1));
        assert!(!robot.is_protected());

        for _ in 0..4 {
            robot = step_robot(robot, &maze, 1.0, 1.0, Vec2::new(1, 1), &mut rng);
            assert!(!robot.is_protected());
        }
        assert_eq!(robot.actor.current_tile, Vec2::new(1, 1));
    }

    #[test]
    fn enclosed_robot_stays_put() {
        let maze = Maze::parse("###\n#R#\n###\n").expect("cell should parse");
        let robot = Robot::new(1, Vec2::new(1, 1), RobotBehavior::Patrol);
        let mut rng = SeededRng::new(1);
        let next = step_robot(robot, &maze, 0.5, 4.0, Vec2::new(1, 1), &mut rng);
        assert_eq!(next.actor, robot.actor);
        assert!(next.is_protected());
    }
}
