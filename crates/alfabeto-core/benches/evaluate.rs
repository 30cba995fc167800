use criterion::{black_box, criterion_group, criterion_main, Criterion};

use alfabeto_core::model::{Exercise, ExerciseKind};
use alfabeto_core::normalize::{comparison_key, syllable_fragments};
use alfabeto_core::AnswerEvaluator;

fn exercise(kind: ExerciseKind, prompt: &str) -> Exercise {
    Exercise::new("bench", kind, prompt).unwrap()
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    group.bench_function("comparison_key", |b| {
        b.iter(|| comparison_key(black_box("  eu   gosto de maçã e coração ")))
    });

    group.bench_function("syllable_fragments", |b| {
        b.iter(|| syllable_fragments(black_box("BOR + BO + LE + TA")))
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let evaluator = AnswerEvaluator::with_builtin_tables().unwrap();
    let mut group = c.benchmark_group("evaluate");

    let cases = [
        ("letter_pattern", exercise(ExerciseKind::Letter, "_ACA"), "vaca"),
        ("letter_sequence", exercise(ExerciseKind::Letter, "A, C, E"), "g"),
        ("syllable", exercise(ExerciseKind::Syllable, "CO + RA + ÇÃO"), "coracao"),
        ("question", exercise(ExerciseKind::Word, "O que é uma bola?"), "brinquedo"),
        ("blank", exercise(ExerciseKind::Sentence, "Eu vejo um ___."), "leão"),
        ("fallback", exercise(ExerciseKind::Word, "JANELA"), "janela"),
    ];

    for (name, exercise, answer) in &cases {
        group.bench_function(*name, |b| {
            b.iter(|| evaluator.evaluate(black_box(exercise), black_box(answer)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_evaluate);
criterion_main!(benches);
