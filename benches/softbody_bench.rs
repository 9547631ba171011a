//! Benchmarks for ALICE-SoftBody
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use alice_softbody::{
    soft_polygon, wheel, Fix128, PhysicsConfig, PhysicsWorld, Vec2Fix, WheelParams,
};

// ============================================================================
// World step benchmarks
// ============================================================================

fn falling_polygon(x: i64, y: i64) -> alice_softbody::SoftBody {
    soft_polygon(
        8,
        Fix128::from_int(10),
        Vec2Fix::from_int(x, y),
        Fix128::ONE,
        Fix128::ZERO,
        Fix128::from_ratio(1, 1000),
    )
    .unwrap()
}

fn bench_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    group.bench_function("single_polygon_60_steps", |b| {
        b.iter(|| {
            let mut world = PhysicsWorld::new(PhysicsConfig::default());
            world.gravity = Vec2Fix::from_int(0, -10);
            let h = world.add_body(falling_polygon(0, 100));

            let dt = Fix128::from_ratio(1, 60);
            for _ in 0..60 {
                world.step(black_box(dt));
            }
            world.body(h).unwrap().particles.positions[0]
        });
    });

    group.bench_function("ten_polygons_60_steps", |b| {
        b.iter(|| {
            let mut world = PhysicsWorld::new(PhysicsConfig::default());
            world.gravity = Vec2Fix::from_int(0, -10);
            let mut last = None;
            for i in 0..10 {
                last = Some(world.add_body(falling_polygon(i * 25, 50 + i * 5)));
            }

            let dt = Fix128::from_ratio(1, 60);
            for _ in 0..60 {
                world.step(black_box(dt));
            }
            world.body(last.unwrap()).unwrap().particles.positions[0]
        });
    });

    group.bench_function("wheel_60_steps", |b| {
        b.iter(|| {
            let mut world = PhysicsWorld::new(PhysicsConfig::default());
            world.gravity = Vec2Fix::from_int(0, -10);
            let h = world.add_body(
                wheel(&WheelParams {
                    radius: Fix128::from_int(50),
                    ..WheelParams::default()
                })
                .unwrap(),
            );

            let dt = Fix128::from_ratio(1, 60);
            for _ in 0..60 {
                world.step(black_box(dt));
            }
            world.body(h).unwrap().particles.positions[0]
        });
    });

    group.finish();
}

// ============================================================================
// Math operation benchmarks
// ============================================================================

fn bench_math_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("math_ops");

    group.bench_function("fix128_mul", |b| {
        let x = Fix128::from_ratio(355, 113);
        let y = Fix128::from_ratio(-7, 3);
        b.iter(|| black_box(x) * black_box(y));
    });

    group.bench_function("fix128_sqrt", |b| {
        let x = Fix128::from_int(12_345);
        b.iter(|| black_box(x).sqrt());
    });

    group.bench_function("fix128_sin_cos", |b| {
        let theta = Fix128::from_ratio(7, 5);
        b.iter(|| black_box(theta).sin_cos());
    });

    group.bench_function("vec2_normalize", |b| {
        let v = Vec2Fix::from_int(3, 4);
        b.iter(|| black_box(v).normalize());
    });

    group.finish();
}

criterion_group!(benches, bench_world_step, bench_math_ops);
criterion_main!(benches);
