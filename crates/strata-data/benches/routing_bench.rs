use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strata_data::container::Bounded;
use strata_data::prelude::*;
use strata_data::{Binding, Bunch, CachedRouter, Chunk, DirectRouter, StorageRegistry};

#[derive(Component, Debug, Clone, Copy, Default)]
struct Position(f32);

#[derive(Component, Debug, Clone, Copy, Default)]
struct Velocity(f32);

#[derive(Component, Debug, Clone, Copy, Default)]
struct Mass(f32);

#[derive(Component, Debug, Clone, Copy, Default)]
#[component(chunk)]
struct TimeStep(f32);

#[derive(Default)]
struct Integrate {
    position: Binding<Position>,
    velocity: Binding<Velocity>,
    step: Binding<TimeStep>,
    mass: Binding<Mass>,
}

impl Algorithm for Integrate {
    fn requirements<R: Requirements>(&mut self, req: &mut R) -> bool {
        req.require(&mut self.position)
            && req.require(&mut self.velocity)
            && req.optional(&mut self.step)
            && req.optional(&mut self.mass)
    }

    fn execute(&mut self, _node_count: usize) {
        let dt = self.step.get().map_or(1.0, |s| s.0);
        let velocity = self.velocity.as_slice().as_ptr();
        for (i, p) in self.position.as_mut_slice().iter_mut().enumerate() {
            // SAFETY: velocity and position bind distinct buffers of equal length.
            p.0 += unsafe { (*velocity.add(i)).0 } * dt;
        }
    }
}

fn bench_routing(c: &mut Criterion) {
    let mut registry = StorageRegistry::default();
    let structure = registry.structure_of::<(Position, Velocity, TimeStep, Mass)>();

    // Many small chunks make the binding cost visible next to the work.
    let mut chunks: Vec<Chunk> = (0..1_000).map(|_| Chunk::new(structure.clone(), 8)).collect();

    let mut group = c.benchmark_group("Algorithm Routing");

    group.bench_function("Direct router", |b| {
        let mut algorithm = Integrate::default();
        b.iter(|| {
            for chunk in chunks.iter_mut() {
                black_box(DirectRouter.try_run(&mut algorithm, chunk));
            }
        });
    });

    group.bench_function("Cached router", |b| {
        let mut algorithm = Integrate::default();
        let mut router = CachedRouter::<Integrate>::new();
        b.iter(|| {
            for chunk in chunks.iter_mut() {
                black_box(router.try_run(&mut algorithm, chunk));
            }
        });
    });

    group.finish();
}

fn bench_bunch_growth(c: &mut Criterion) {
    let mut registry = StorageRegistry::default();
    let structure = registry.structure_of::<(Position, Velocity, Mass)>();

    c.bench_function("Bunch growth to 10k nodes", |b| {
        b.iter(|| {
            let mut bunch = Bunch::with_capacity(structure.clone(), 1);
            for _ in 0..10_000 {
                black_box(bunch.add_node());
            }
            bunch
        });
    });
}

criterion_group!(benches, bench_routing, bench_bunch_growth);
criterion_main!(benches);
