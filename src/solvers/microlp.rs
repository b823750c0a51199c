//! A backend that uses [microlp](https://docs.rs/microlp), a pure Rust simplex
//! solver. The only bundled engine that accepts integer and binary variables;
//! it reports no dual values.

use std::panic::catch_unwind;

use fnv::FnvHashMap;
use microlp::{ComparisonOp, LinearExpr};

use crate::model::Model;
use crate::objective::ObjectiveDirection;
use crate::solvers::{Configuration, SolverBackend, SolverError, SolverOutput, Status};
use crate::variable::VariableKind;

/// Values closer than this to a whole number count as integral.
const INTEGRALITY_TOLERANCE: f64 = 1e-7;

/// Bail out instead of cutting forever on a degenerate relaxation.
const MAX_GOMORY_CUTS: usize = 64;

/// The microlp backend. Selected automatically for models with integer
/// variables, or forced with [SolverChoice::Microlp](crate::SolverChoice).
pub struct Microlp;

impl SolverBackend for Microlp {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn supports_integers(&self) -> bool {
        true
    }

    fn supports_duals(&self) -> bool {
        false
    }

    fn solve(&self, model: &Model, config: &Configuration) -> Result<SolverOutput, SolverError> {
        if config.timeout.is_some() {
            log::debug!("microlp has no time limit support, the timeout is ignored");
        }
        let mut problem = microlp::Problem::new(match model.objective().direction() {
            ObjectiveDirection::Maximisation => microlp::OptimizationDirection::Maximize,
            ObjectiveDirection::Minimisation => microlp::OptimizationDirection::Minimize,
        });

        let objective = model.objective().expression();
        let mut columns: Vec<microlp::Variable> = Vec::with_capacity(model.num_variables());
        let mut integers: Vec<microlp::Variable> = Vec::new();
        for variable in model.variables() {
            let weight = objective.coefficient(variable.name());
            let min = variable.lower_bound().unwrap_or(f64::NEG_INFINITY);
            let max = variable.upper_bound().unwrap_or(f64::INFINITY);
            let column = match variable.kind() {
                VariableKind::Binary => {
                    let column = problem.add_binary_var(weight);
                    // bounds narrowed below the default [0, 1] become rows
                    if min > 0. {
                        let mut row = LinearExpr::empty();
                        row.add(column, 1.);
                        problem.add_constraint(row, ComparisonOp::Ge, min);
                    }
                    if max < 1. {
                        let mut row = LinearExpr::empty();
                        row.add(column, 1.);
                        problem.add_constraint(row, ComparisonOp::Le, max);
                    }
                    column
                }
                VariableKind::Integer => {
                    // the engine works on the relaxation, so bounds round inward
                    let (min, max) = (min.ceil(), max.floor());
                    if min > max {
                        return Ok(SolverOutput::no_solution(Status::Infeasible));
                    }
                    let column = problem.add_var(weight, (min, max));
                    integers.push(column);
                    column
                }
                VariableKind::Continuous => problem.add_var(weight, (min, max)),
            };
            columns.push(column);
        }

        let column_of: FnvHashMap<&str, microlp::Variable> = model
            .variables()
            .map(|variable| variable.name())
            .zip(columns.iter().copied())
            .collect();
        for constraint in model.constraints() {
            let build_row = || {
                let mut row = LinearExpr::empty();
                for (name, coefficient) in constraint.expression().terms() {
                    row.add(column_of[name], coefficient);
                }
                row
            };
            // the expression constant moves to the right-hand side
            let offset = constraint.expression().constant();
            match (constraint.lower_bound(), constraint.upper_bound()) {
                (Some(lower), Some(upper)) if lower == upper => {
                    problem.add_constraint(build_row(), ComparisonOp::Eq, lower - offset);
                }
                (lower, upper) => {
                    if let Some(lower) = lower {
                        problem.add_constraint(build_row(), ComparisonOp::Ge, lower - offset);
                    }
                    if let Some(upper) = upper {
                        problem.add_constraint(build_row(), ComparisonOp::Le, upper - offset);
                    }
                    if lower.is_none() && upper.is_none() {
                        log::trace!("constraint {:?} has no bounds, skipped", constraint.name());
                    }
                }
            }
        }

        let mut solution = match problem.solve() {
            Ok(solution) => solution,
            Err(error) => return Ok(SolverOutput::no_solution(engine_status(error)?)),
        };

        // Integer columns whose relaxation value is fractional get gomory cuts
        // until they land on a whole value. The engine panics on cuts it cannot
        // build, which surfaces as an error rather than an abort.
        for &column in &integers {
            let mut cuts = 0;
            while !is_integral(solution[column]) {
                if cuts == MAX_GOMORY_CUTS {
                    return Err(SolverError::Engine(
                        "integrality cuts did not converge".to_owned(),
                    ));
                }
                solution = match catch_unwind(|| solution.add_gomory_cut(column)) {
                    Ok(Ok(solution)) => solution,
                    Ok(Err(error)) => {
                        return Ok(SolverOutput::no_solution(engine_status(error)?))
                    }
                    Err(_) => {
                        return Err(SolverError::Engine(
                            "the engine rejected an integrality cut".to_owned(),
                        ))
                    }
                };
                cuts += 1;
            }
        }

        log::debug!("microlp objective: {}", solution.objective());
        let values = columns.iter().map(|&column| solution[column]).collect();
        Ok(SolverOutput::solved(values, None, None))
    }
}

fn is_integral(value: f64) -> bool {
    (value - value.round()).abs() < INTEGRALITY_TOLERANCE
}

/// Maps the engine's no-solution errors to statuses; internal failures stay errors.
fn engine_status(error: microlp::Error) -> Result<Status, SolverError> {
    match error {
        microlp::Error::Infeasible => Ok(Status::Infeasible),
        microlp::Error::Unbounded => Ok(Status::Unbounded),
        microlp::Error::InternalError(message) => Err(SolverError::Engine(message)),
    }
}
