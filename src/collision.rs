use crate::engine::Actor;

pub fn are_colliding(a: &Actor, b: &Actor) -> bool {
    a.current_tile == b.current_tile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Vec2};

    fn actor(current: Vec2, target: Vec2, progress: f32, direction: Direction) -> Actor {
        Actor {
            current_tile: current,
            target_tile: target,
            progress,
            direction,
            next_direction: None,
        }
    }

    #[test]
    fn shared_current_tile_collides_regardless_of_target() {
        let a = actor(Vec2::new(3, 3), Vec2::new(4, 3), 0.2, Direction::Right);
        let b = actor(Vec2::new(3, 3), Vec2::new(3, 2), 0.7, Direction::Up);
        assert!(are_colliding(&a, &b));
        assert!(are_colliding(&b, &a));
    }

    #[test]
    fn shared_target_alone_does_not_collide() {
        let a = actor(Vec2::new(2, 3), Vec2::new(3, 3), 0.9, Direction::Right);
        let b = actor(Vec2::new(4, 3), Vec2::new(3, 3), 0.9, Direction::Left);
        assert!(!are_colliding(&a, &b));
    }
}
