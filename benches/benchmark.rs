use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use optimod::{Constraint, Expression, Model, Objective, Variable};

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("sum((2 x_i + 1) for i in [1..10_000])", |b| {
        let variables: Vec<Variable> = (0..10_000)
            .map(|i| Variable::new(format!("x{i}")).lower(0.))
            .collect();
        b.iter(|| {
            let expression: Expression = variables
                .iter()
                .map(|x_i| black_box(2.) * x_i + black_box(1.))
                .sum();
            expression
        })
    });

    c.bench_function("assembling a model with 1_000 rows", |b| {
        let variables: Vec<Variable> = (0..1_000)
            .map(|i| Variable::new(format!("x{i}")).bounds(0., 1.))
            .collect();
        b.iter(|| {
            let mut model = Model::new();
            let objective: Expression = variables.iter().map(|x_i| black_box(1.) * x_i).sum();
            model
                .set_objective(Objective::maximise(objective).unwrap())
                .unwrap();
            for window in variables.windows(2) {
                model
                    .add_constraint(Constraint::new(&window[0] + &window[1]).upper(1.))
                    .unwrap();
            }
            model.num_constraints()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
