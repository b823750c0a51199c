//! A backend that uses [clarabel](https://docs.rs/clarabel), a pure Rust
//! interior point solver. Continuous models only; the engine reports dual
//! values, which this adapter maps back to reduced costs and shadow prices.

use clarabel::algebra::CscMatrix;
use clarabel::solver::implementations::default::DefaultSettingsBuilder;
use clarabel::solver::SupportedConeT::{self, *};
use clarabel::solver::{DefaultSolver, IPSolver, SolverStatus};

use crate::constraint::Constraint;
use crate::model::Model;
use crate::objective::ObjectiveDirection;
use crate::solvers::{Configuration, SolverBackend, SolverError, SolverOutput, Status};

/// The clarabel backend. Selected automatically for continuous models, or
/// forced with [SolverChoice::Clarabel](crate::SolverChoice).
pub struct Clarabel;

/// Row indices a single ranged constraint occupies in the conic form.
#[derive(Default, Clone, Copy)]
struct ConstraintRows {
    lower: Option<usize>,
    upper: Option<usize>,
    equality: Option<usize>,
}

impl SolverBackend for Clarabel {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn supports_integers(&self) -> bool {
        false
    }

    fn supports_duals(&self) -> bool {
        true
    }

    fn solve(&self, model: &Model, config: &Configuration) -> Result<SolverOutput, SolverError> {
        if model.has_integer_variables() {
            return Err(SolverError::IntegerUnsupported {
                backend: self.name(),
            });
        }
        let n = model.num_variables();
        let maximise = model.objective().direction() == ObjectiveDirection::Maximisation;
        // clarabel minimises; a maximisation gets its objective negated on the
        // way in and its duals negated on the way out
        let objective_sign = if maximise { -1. } else { 1. };
        let mut objective = vec![0.; n];
        for (name, coefficient) in model.objective().expression().terms() {
            let column = column_index(model, name)?;
            objective[column] = coefficient * objective_sign;
        }

        // Conic form: every finite bound and every constraint side becomes a row
        // `a.x + s = b` with `s` in the nonnegative (inequality) or zero
        // (equality) cone. Variable bounds come first, like the trivial
        // constraints of an LP file.
        let mut matrix = CscMatrixBuilder::new(n);
        let mut rhs: Vec<f64> = Vec::new();
        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
        let mut add_row = |matrix: &mut CscMatrixBuilder,
                           terms: Vec<(usize, f64)>,
                           bound: f64,
                           is_equality: bool| {
            let row = matrix.add_row(terms);
            rhs.push(bound);
            push_cone(&mut cones, is_equality);
            row
        };

        let mut variable_rows: Vec<(Option<usize>, Option<usize>)> = Vec::with_capacity(n);
        for (column, variable) in model.variables().enumerate() {
            let mut rows = (None, None);
            if let Some(lower) = variable.lower_bound().filter(|bound| bound.is_finite()) {
                rows.0 = Some(add_row(&mut matrix, vec![(column, -1.)], -lower, false));
            }
            if let Some(upper) = variable.upper_bound().filter(|bound| bound.is_finite()) {
                rows.1 = Some(add_row(&mut matrix, vec![(column, 1.)], upper, false));
            }
            variable_rows.push(rows);
        }

        let mut constraint_rows: Vec<ConstraintRows> = Vec::with_capacity(model.num_constraints());
        for constraint in model.constraints() {
            let terms = column_terms(model, constraint)?;
            // the expression constant moves to the right-hand side
            let offset = constraint.expression().constant();
            let mut rows = ConstraintRows::default();
            match (constraint.lower_bound(), constraint.upper_bound()) {
                (Some(lower), Some(upper)) if lower == upper => {
                    rows.equality =
                        Some(add_row(&mut matrix, terms, lower - offset, true));
                }
                (lower, upper) => {
                    if let Some(lower) = lower {
                        let negated = terms.iter().map(|&(col, v)| (col, -v)).collect();
                        rows.lower =
                            Some(add_row(&mut matrix, negated, -(lower - offset), false));
                    }
                    if let Some(upper) = upper {
                        rows.upper = Some(add_row(&mut matrix, terms, upper - offset, false));
                    }
                }
            }
            constraint_rows.push(rows);
        }

        let mut settings = DefaultSettingsBuilder::default();
        settings
            .verbose(config.verbosity >= 2)
            .tol_feas(1e-9);
        if let Some(timeout) = config.timeout {
            settings.time_limit(timeout);
        }
        let settings = settings
            .build()
            .map_err(|error| SolverError::Engine(format!("invalid settings: {error:?}")))?;

        let quadratic = CscMatrix::zeros((n, n));
        let constraints = matrix.build();
        let mut solver = DefaultSolver::new(
            &quadratic,
            &objective,
            &constraints,
            &rhs,
            &cones,
            settings,
        )
        .map_err(|error| SolverError::Engine(format!("engine rejected the problem: {error:?}")))?;
        solver.solve();

        match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {
                // Reduced costs and shadow prices follow the textbook sign
                // convention: the rate of change of the objective value per unit
                // increase of the bound. `z >= 0` holds for nonnegative-cone rows,
                // so for a minimisation that rate is `z` on lower-bound rows and
                // `-z` on upper-bound/equality rows; a maximisation flips it.
                let dual_sign = if maximise { -1. } else { 1. };
                let z = &solver.solution.z;
                let reduced_costs = variable_rows
                    .iter()
                    .map(|&(lower, upper)| dual_sign * (z_at(z, lower) - z_at(z, upper)))
                    .collect();
                let row_duals = constraint_rows
                    .iter()
                    .map(|rows| {
                        dual_sign
                            * (z_at(z, rows.lower) - z_at(z, rows.upper) - z_at(z, rows.equality))
                    })
                    .collect();
                Ok(SolverOutput::solved(
                    solver.solution.x.clone(),
                    Some(reduced_costs),
                    Some(row_duals),
                ))
            }
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                Ok(SolverOutput::no_solution(Status::Infeasible))
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                Ok(SolverOutput::no_solution(Status::Unbounded))
            }
            SolverStatus::MaxTime => Ok(SolverOutput::no_solution(Status::TimeLimit)),
            SolverStatus::MaxIterations => {
                Err(SolverError::Engine("maximum iterations reached".to_owned()))
            }
            SolverStatus::Unsolved => Err(SolverError::Engine("the engine did not run".to_owned())),
            SolverStatus::NumericalError => {
                Err(SolverError::Engine("numerical error".to_owned()))
            }
            SolverStatus::InsufficientProgress => {
                Err(SolverError::Engine("insufficient progress".to_owned()))
            }
            SolverStatus::CallbackTerminated => {
                Err(SolverError::Engine("callback terminated".to_owned()))
            }
        }
    }
}

fn column_index(model: &Model, name: &str) -> Result<usize, SolverError> {
    model
        .variable_index(name)
        .ok_or_else(|| SolverError::Engine(format!("unregistered variable {name:?}")))
}

fn column_terms(model: &Model, constraint: &Constraint) -> Result<Vec<(usize, f64)>, SolverError> {
    constraint
        .expression()
        .terms()
        .map(|(name, coefficient)| Ok((column_index(model, name)?, coefficient)))
        .collect()
}

fn z_at(z: &[f64], row: Option<usize>) -> f64 {
    row.map_or(0., |row| z[row])
}

/// Cones mirror the row order. Runs of rows with the same cone type are merged
/// into a single cone of larger dimension.
fn push_cone(cones: &mut Vec<SupportedConeT<f64>>, is_equality: bool) {
    let next = if is_equality {
        ZeroConeT(1)
    } else {
        NonnegativeConeT(1)
    };
    match (cones.last_mut(), next) {
        (Some(ZeroConeT(a)), ZeroConeT(b)) => *a += b,
        (Some(NonnegativeConeT(a)), NonnegativeConeT(b)) => *a += b,
        (_, next) => cones.push(next),
    }
}

/// Builds a [CscMatrix] row by row, buffering per column since the target
/// layout is column-major.
struct CscMatrixBuilder {
    /// Row index of the corresponding element in `nzval`, per column
    rowval: Vec<Vec<usize>>,
    /// Non-zero values, per column
    nzval: Vec<Vec<f64>>,
    n_rows: usize,
    n_cols: usize,
}

impl CscMatrixBuilder {
    fn new(n_cols: usize) -> Self {
        Self {
            rowval: vec![Vec::new(); n_cols],
            nzval: vec![Vec::new(); n_cols],
            n_rows: 0,
            n_cols,
        }
    }

    /// Appends a row and returns its index.
    fn add_row(&mut self, terms: impl IntoIterator<Item = (usize, f64)>) -> usize {
        for (column, value) in terms {
            self.rowval[column].push(self.n_rows);
            self.nzval[column].push(value);
        }
        self.n_rows += 1;
        self.n_rows - 1
    }

    fn build(self) -> CscMatrix {
        let mut colptr = Vec::with_capacity(self.n_cols + 1);
        colptr.push(0);
        for column in &self.rowval {
            colptr.push(colptr.last().copied().unwrap_or(0) + column.len());
        }
        CscMatrix::new(
            self.n_rows,
            self.n_cols,
            colptr,
            self.rowval.into_iter().flatten().collect(),
            self.nzval.into_iter().flatten().collect(),
        )
    }
}
