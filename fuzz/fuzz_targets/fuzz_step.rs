#![no_main]
use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;
use alice_softbody::{soft_polygon, Fix128, PhysicsConfig, PhysicsWorld, Vec2Fix};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Number of bodies to add (capped)
    body_count: u8,
    /// Body centers (i16 to keep values reasonable)
    positions: Vec<(i16, i16)>,
    /// Per-body point mass numerators (> 0)
    masses: Vec<u16>,
    /// Polygon segment counts (clamped by the generator)
    segments: Vec<u8>,
    /// Number of simulation steps (capped)
    step_count: u8,
}

// Fuzz the physics world: add random polygon bodies and step.
// Must never panic regardless of input.
fuzz_target!(|input: FuzzInput| {
    let config = PhysicsConfig::default();
    let mut world = PhysicsWorld::new(config);
    world.gravity = Vec2Fix::from_int(0, -10);

    let body_count = (input.body_count as usize).min(8);
    let dt = Fix128::from_ratio(1, 60);

    for i in 0..body_count {
        let (px, py) = input.positions.get(i).copied().unwrap_or((0, 0));
        let mass_raw = input.masses.get(i).copied().unwrap_or(1);
        let mass = if mass_raw == 0 { 1u16 } else { mass_raw };
        let segments = input.segments.get(i).copied().unwrap_or(6) as usize;

        let body = soft_polygon(
            segments,
            Fix128::from_int(10),
            Vec2Fix::from_int(px as i64, py as i64),
            Fix128::from_ratio(mass as i64, 10),
            Fix128::ZERO,
            Fix128::from_ratio(1, 1000),
        )
        .expect("generator rejects nothing valid");
        world.add_body(body);
    }

    let steps = (input.step_count as usize).min(16);
    for _ in 0..steps {
        world.step(dt);
    }
});
