use crate::types::Vec2;

pub fn manhattan(a: Vec2, b: Vec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

pub(super) fn sanitize_advance(speed: f32, dt: f32) -> f32 {
    let advance = speed * dt;
    if advance.is_finite() && advance > 0.0 {
        advance
    } else {
        0.0
    }
}
