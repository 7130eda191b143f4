use criterion::{black_box, criterion_group, criterion_main, Criterion};

use slidequiz_core::model::{ChoiceOption, ScenarioOption};
use slidequiz_core::policy::Scoring;
use slidequiz_core::prepare::{PreparedBody, PreparedUnit};
use slidequiz_core::scoring::compute_score;
use slidequiz_core::tracker::{AnswerRecord, ChoiceKey};

fn quiz(n: usize) -> (Vec<PreparedUnit>, AnswerRecord) {
    let units: Vec<_> = (0..n)
        .map(|i| PreparedUnit {
            id: format!("q{i}"),
            prompt: String::new(),
            feedback: String::new(),
            body: PreparedBody::SingleSelect {
                options: (0..4)
                    .map(|o| ChoiceOption {
                        text: format!("option {o}"),
                        correct: o == i % 4,
                        feedback: None,
                    })
                    .collect(),
                correct: i % 4,
            },
        })
        .collect();
    let mut answers = AnswerRecord::default();
    for (i, unit) in units.iter().enumerate() {
        answers.insert(&unit.id, ChoiceKey::Whole, i % 3);
    }
    (units, answers)
}

fn simulation(n: usize) -> (Vec<PreparedUnit>, AnswerRecord, Scoring) {
    let tags = ["synchronous", "reciprocal", "both", "poor"];
    let units: Vec<_> = (0..n)
        .map(|i| PreparedUnit {
            id: format!("s{i}"),
            prompt: String::new(),
            feedback: String::new(),
            body: PreparedBody::Scenario {
                options: tags
                    .iter()
                    .map(|t| ScenarioOption {
                        text: format!("respond {t}"),
                        outcome: t.to_string(),
                        feedback: String::new(),
                    })
                    .collect(),
            },
        })
        .collect();
    let mut answers = AnswerRecord::default();
    for (i, unit) in units.iter().enumerate() {
        answers.insert(&unit.id, ChoiceKey::Whole, i % tags.len());
    }
    let mut scoring = Scoring::default();
    scoring
        .categories
        .insert("synchronous".into(), vec!["synchronous".into()]);
    scoring
        .categories
        .insert("reciprocal".into(), vec!["reciprocal".into()]);
    scoring.categories.insert(
        "both".into(),
        vec!["synchronous".into(), "reciprocal".into()],
    );
    (units, answers, scoring)
}

fn bench_compute_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_score");
    let scoring = Scoring::default();

    for n in [5, 50, 500] {
        let (units, answers) = quiz(n);
        group.bench_function(format!("quiz/{n}"), |b| {
            b.iter(|| compute_score(black_box(&units), black_box(&answers), black_box(&scoring)))
        });
    }

    for n in [6, 60] {
        let (units, answers, scoring) = simulation(n);
        group.bench_function(format!("simulation/{n}"), |b| {
            b.iter(|| compute_score(black_box(&units), black_box(&answers), black_box(&scoring)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute_score);
criterion_main!(benches);
