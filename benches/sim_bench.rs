use bhsim2d::utils::{self, Disc};
use bhsim2d::{DVec2, Quad, Quadtree, Simulation, SimulationConfig, Universe};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const WIDTH: f64 = 1.0e6;

fn bench_tree_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_build");
    group.sample_size(20);

    // Build time should grow roughly as N log N.
    for n in [1_000, 10_000, 100_000] {
        let bodies = utils::uniform_square(n, WIDTH, 1.0, 0);
        let quad = Quad::new(0.0, 0.0, WIDTH);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &bodies, |b, bodies| {
            b.iter(|| Quadtree::build(bodies, quad, Quadtree::DEFAULT_MAX_DEPTH).unwrap());
        });
    }

    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut group = c.benchmark_group("simulation_step");
    group.sample_size(10);

    for theta in [0.3, 0.5, 1.0] {
        let disc = Disc {
            center: DVec2::broadcast(WIDTH * 0.5),
            radius: WIDTH * 0.4,
            central_mass: 1.0e6,
            star_mass: 1.0,
        };
        let universe = Universe::new(disc.generate(20_000, 1.0, 0), WIDTH);
        let config = SimulationConfig {
            theta,
            gravitational_constant: 1.0,
            time_step: 0.05,
            ..Default::default()
        };
        let mut sim = Simulation::new(universe, config).unwrap();
        // Warmup
        sim.step().unwrap();

        group.throughput(Throughput::Elements(sim.universe.bodies.len() as u64));
        group.bench_function(BenchmarkId::new("theta", theta), |b| {
            b.iter(|| sim.step().unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree_build, bench_step);
criterion_main!(benches);
