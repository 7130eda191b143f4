use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use slidequiz_core::model::{ChoiceOption, Unit, UnitKind, UnitSet};
use slidequiz_core::prepare::prepare_units;
use slidequiz_core::shuffle::shuffle;

fn bench_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffle");
    let mut rng = StdRng::seed_from_u64(0);

    for n in [4, 32, 1024] {
        let items: Vec<usize> = (0..n).collect();
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| shuffle(black_box(items.clone()), &mut rng))
        });
    }

    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    let units = (0..20)
        .map(|i| Unit {
            id: format!("q{i}"),
            prompt: format!("question {i}"),
            feedback: String::new(),
            kind: UnitKind::SingleSelect {
                options: (0..4)
                    .map(|o| ChoiceOption {
                        text: format!("option {o}"),
                        correct: o == 0,
                        feedback: None,
                    })
                    .collect(),
            },
        })
        .collect();
    let set = UnitSet {
        id: "bench".into(),
        name: "Bench".into(),
        description: String::new(),
        mode: Default::default(),
        expected_units: None,
        policy: Default::default(),
        scoring: Default::default(),
        units,
    };
    let mut rng = StdRng::seed_from_u64(1);

    c.bench_function("prepare_units/20", |b| {
        b.iter(|| prepare_units(black_box(&set), true, &mut rng))
    });
}

criterion_group!(benches, bench_shuffle, bench_prepare);
criterion_main!(benches);
