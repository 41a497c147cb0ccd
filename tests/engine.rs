use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mandelpool::coord::{Axis, PixelMapping, Point};
use mandelpool::threads::WorkerState;
use mandelpool::{
    escape_time, Action, Engine, EngineConfig, EngineError, Explorer, KernelKind, PixelRect,
    PlaneRect,
};

fn reference_checksum(pixels: &PixelRect, plane: &PlaneRect, cap: u32) -> u64 {
    let mapping = PixelMapping::between(pixels, plane);
    let mut sum = 0u64;
    for y in pixels.top_left.y..pixels.bottom_right.y {
        for x in pixels.top_left.x..pixels.bottom_right.x {
            sum += escape_time(mapping.plane_at(x, y), cap) as u64;
        }
    }
    sum
}

fn checksum(engine: &Engine, pixels: &PixelRect) -> u64 {
    let mut sum = 0u64;
    for y in pixels.top_left.y..pixels.bottom_right.y {
        for x in pixels.top_left.x..pixels.bottom_right.x {
            sum += engine.buffer().get(x as usize, y as usize) as u64;
        }
    }
    sum
}

#[test]
fn eight_pixel_row_on_two_workers() {
    let config = EngineConfig::new(8, 1).with_workers(2);
    let mut engine = Engine::new(&config).unwrap();
    let plane = PlaneRect::new(Axis::new(-2.0, 1.0), Axis::new(0.0, 0.0));
    engine
        .compute_region(engine.full_rect(), plane, 50)
        .unwrap();

    assert_eq!(engine.completed(), 2);
    let at_minus_two = engine.buffer().get(0, 0);
    assert_eq!(at_minus_two, escape_time(mandelpool::complex::cr(-2.0), 50));
    assert!(at_minus_two <= 2);
    assert_eq!(engine.buffer().get(6, 0), 50);
    engine.shutdown();
}

#[test]
fn random_frames_match_reference() {
    let mut rng = StdRng::seed_from_u64(0x6d61_6e64);
    for kernel in [KernelKind::Simd, KernelKind::Scalar] {
        let workers = rng.gen_range(1..=9);
        let config = EngineConfig::new(96, 54)
            .with_workers(workers)
            .with_kernel(kernel);
        let mut engine = Engine::new(&config).unwrap();

        for _ in 0..12 {
            let x0 = rng.gen_range(0..96);
            let y0 = rng.gen_range(0..54);
            let pixels = PixelRect::new(
                Point::new(x0, y0),
                Point::new(rng.gen_range(x0..=96), rng.gen_range(y0..=54)),
            );
            let re = rng.gen_range(-2.0..0.5);
            let im = rng.gen_range(-1.2..1.2);
            let span = rng.gen_range(0.001..3.0);
            let plane = PlaneRect::from_box(re, im, span, span * 0.6);
            let cap = rng.gen_range(0..400);

            engine.compute_region(pixels, plane, cap).unwrap();
            assert_eq!(engine.completed(), workers);
            assert_eq!(
                checksum(&engine, &pixels),
                reference_checksum(&pixels, &plane, cap)
            );
        }
        assert!(engine
            .worker_states()
            .iter()
            .all(|&s| s == WorkerState::Idle));
        engine.shutdown();
    }
}

#[test]
fn buffer_does_not_depend_on_worker_count() {
    let plane = PlaneRect::new(Axis::new(-0.75, -0.73), Axis::new(0.1, 0.12));
    let frame = |workers: usize| {
        let mut engine = Engine::new(&EngineConfig::new(101, 31).with_workers(workers)).unwrap();
        engine
            .compute_region(engine.full_rect(), plane, 500)
            .unwrap();
        engine.buffer().clone()
    };
    let baseline = frame(1);
    for workers in [2, 3, 7, 13] {
        assert_eq!(baseline, frame(workers), "{} workers", workers);
    }
}

#[test]
fn out_of_bounds_rect_is_rejected() {
    let mut engine = Engine::new(&EngineConfig::new(10, 10).with_workers(2)).unwrap();
    let rect = PixelRect::new(Point::new(-1, 0), Point::new(5, 5));
    assert!(matches!(
        engine.compute_frame(rect, 20),
        Err(EngineError::RectOutOfBounds { .. })
    ));
    // the pool is still usable afterwards
    let full = engine.full_rect();
    engine.compute_frame(full, 20).unwrap();
    assert_eq!(engine.completed(), 2);
}

#[test]
fn zero_cap_frame_is_all_zero() {
    let mut engine = Engine::new(&EngineConfig::new(20, 10).with_workers(3)).unwrap();
    let full = engine.full_rect();
    engine.compute_frame(full, 0).unwrap();
    assert!(engine.buffer().as_slice().iter().all(|&n| n == 0));
}

#[test]
fn explorer_session() {
    let config = EngineConfig::new(80, 45).with_workers(4);
    let mut explorer = Explorer::new(&config).unwrap();
    explorer.frame().unwrap();
    let first = explorer.buffer().clone();

    let cursor = Point::new(30.0, 20.0);
    explorer.apply(Action::zoom_in(cursor)).unwrap();
    explorer.apply(Action::PanStart(cursor)).unwrap();
    explorer.apply(Action::PanMove(Point::new(35.0, 22.0))).unwrap();
    explorer.apply(Action::PanEnd).unwrap();
    explorer.apply(Action::RaiseCap).unwrap();
    let stats = explorer.frame().unwrap();
    assert_eq!(stats.iteration_cap, 192);
    assert_ne!(&first, explorer.buffer());

    let pixels = explorer.engine().full_rect();
    let plane = explorer.viewport().plane_rect(&pixels);
    assert_eq!(
        checksum(explorer.engine(), &pixels),
        reference_checksum(&pixels, &plane, 192)
    );
    explorer.shutdown();
}

#[test]
fn shutdown_joins_workers() {
    let mut engine = Engine::new(&EngineConfig::new(16, 16).with_workers(5)).unwrap();
    let full = engine.full_rect();
    engine.compute_frame(full, 30).unwrap();
    assert_eq!(engine.workers(), 5);
    engine.shutdown();
}
