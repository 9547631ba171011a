#![no_main]
use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;
use alice_softbody::raycast::{point_in_loop, raycast_loop};
use alice_softbody::{Fix128, Vec2Fix};

#[derive(Debug, Arbitrary)]
struct CollisionInput {
    /// Arbitrary loop vertices (possibly degenerate or self-intersecting)
    vertices: Vec<(i16, i16)>,
    /// Query point
    px: i16,
    py: i16,
    /// Ray direction components
    dx: i8,
    dy: i8,
}

// Fuzz ray-vs-loop queries: degenerate loops, zero directions, coincident
// vertices. Must never panic.
fuzz_target!(|input: CollisionInput| {
    let count = input.vertices.len().min(32);
    let positions: Vec<Vec2Fix> = input.vertices[..count]
        .iter()
        .map(|&(x, y)| Vec2Fix::from_int(x as i64, y as i64))
        .collect();
    let shape: Vec<u32> = (0..count as u32).collect();

    let point = Vec2Fix::from_int(input.px as i64, input.py as i64);
    let direction = Vec2Fix::from_int(input.dx as i64, input.dy as i64);

    let _ = raycast_loop(point, direction, &positions, &shape);
    let _ = point_in_loop(point, &positions, &shape);
});
