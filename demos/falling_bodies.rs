//! Falling Soft Bodies Example
//!
//! Drops two soft polygons onto a static platform and prints the scene
//! state once per simulated second.
//!
//! ```bash
//! cargo run --example falling_bodies
//! ```

use alice_softbody::{
    soft_polygon, Fix128, PhysicsConfig, PhysicsWorld, SoftBody, TickSystem, Vec2Fix,
};

fn main() {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());
    world.gravity = Vec2Fix::new(Fix128::ZERO, Fix128::from_int(-10));

    // Static platform: four fixed particles forming a wide box
    let mut platform = SoftBody::new();
    platform
        .particles
        .push(Vec2Fix::from_int(-150, -20), Fix128::ZERO);
    platform
        .particles
        .push(Vec2Fix::from_int(150, -20), Fix128::ZERO);
    platform
        .particles
        .push(Vec2Fix::from_int(150, 0), Fix128::ZERO);
    platform
        .particles
        .push(Vec2Fix::from_int(-150, 0), Fix128::ZERO);
    platform
        .set_collision_shape(vec![0, 1, 2, 3])
        .expect("platform loop is valid");
    world.add_body(platform);

    // Two soft polygons starting at different heights
    let blob_a = world.add_body(
        soft_polygon(
            8,
            Fix128::from_int(15),
            Vec2Fix::from_int(-30, 60),
            Fix128::ONE,
            Fix128::ZERO,
            Fix128::from_ratio(1, 1000),
        )
        .expect("polygon generation succeeds"),
    );
    let blob_b = world.add_body(
        soft_polygon(
            12,
            Fix128::from_int(20),
            Vec2Fix::from_int(25, 120),
            Fix128::ONE,
            Fix128::from_ratio(1, 10_000),
            Fix128::from_ratio(1, 500),
        )
        .expect("polygon generation succeeds"),
    );

    // Pace the simulation as a renderer loop would: feed frame time in,
    // step once per granted tick.
    let mut pacer = TickSystem::new(Fix128::from_int(60));
    let frame_dt = Fix128::from_ratio(1, 60);

    for second in 0..5 {
        for _ in 0..60 {
            pacer.update(frame_dt);
            while pacer.step() {
                world.step(pacer.fixed_dt());
            }
        }

        let a = world.body(blob_a).unwrap().particles.geometry_center();
        let b = world.body(blob_b).unwrap().particles.geometry_center();
        println!(
            "t={}s  blob_a=({:.2}, {:.2})  blob_b=({:.2}, {:.2})",
            second + 1,
            a.x.to_f64(),
            a.y.to_f64(),
            b.x.to_f64(),
            b.y.to_f64(),
        );
    }

    println!("done: both bodies should rest on the platform near y=15..20");
}
