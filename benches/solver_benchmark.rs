use criterion::{black_box, criterion_group, criterion_main, Criterion};
use manabase_solver::card::LandCatalog;
use manabase_solver::config::SolverConfig;
use manabase_solver::solver::{parse_deck_file, Allocation, ProbabilityEngine, Solver, WeightConfig};

fn benchmark_probability(c: &mut Criterion) {
    let catalog = LandCatalog::from_file("lands.json").expect("Failed to load lands");
    let deck = parse_deck_file("deck.txt").expect("Failed to parse deck");
    let pool = catalog.pool_for(deck.colors(), deck.land_count);
    let solver = Solver::default();
    let allocation: Allocation = solver
        .seed(&deck, &WeightConfig::default(), &pool)
        .expect("Failed to seed");
    let engine = ProbabilityEngine::new(&deck, &SolverConfig::default());
    let requirement = deck.requirements[deck.requirements.len() - 1];

    c.bench_function("probability_of_casting", |b| {
        b.iter(|| engine.probability_of_casting(black_box(&requirement), black_box(&allocation)))
    });
}

fn benchmark_solve(c: &mut Criterion) {
    let catalog = LandCatalog::from_file("lands.json").expect("Failed to load lands");
    let deck = parse_deck_file("deck.txt").expect("Failed to parse deck");
    let pool = catalog.pool_for(deck.colors(), deck.land_count);
    let solver = Solver::default();

    let mut group = c.benchmark_group("solve");
    group.sample_size(10);
    group.bench_function("shipped_deck", |b| {
        b.iter(|| solver.solve(black_box(&deck), black_box(&WeightConfig::default()), black_box(&pool)))
    });
    group.finish();
}

fn benchmark_deck_parsing(c: &mut Criterion) {
    c.bench_function("parse_deck_file", |b| b.iter(|| parse_deck_file(black_box("deck.txt"))));
}

criterion_group!(benches, benchmark_probability, benchmark_solve, benchmark_deck_parsing);
criterion_main!(benches);
