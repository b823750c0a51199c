//! The pluggable solver backends.
//!
//! All numerical optimization is delegated to external engines; a backend's job
//! is to translate a [Model] into the engine's representation, run it, and map
//! the engine's outcome back to a [Status] and per-column/per-row numbers.
//!
//! Both bundled backends are pure Rust and enabled by default as cargo features:
//! [microlp](https://docs.rs/microlp) (simplex, handles integer variables, no
//! duals) and [clarabel](https://docs.rs/clarabel) (interior point, reports
//! duals, continuous only). [SolverChoice::Auto] picks whichever enabled engine
//! can express the model.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Model;

#[cfg(feature = "clarabel")]
pub mod clarabel;
#[cfg(feature = "microlp")]
pub mod microlp;

/// The outcome of an [optimize](crate::Model::optimize) call.
///
/// Displays as the lowercase status word: `"optimal"`, `"infeasible"`,
/// `"unbounded"`, `"time_limit"`, `"not_solved"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The model has not been solved yet
    #[default]
    NotSolved,
    /// An optimal solution was found
    Optimal,
    /// No assignment satisfies all constraints
    Infeasible,
    /// The objective can be improved without limit
    Unbounded,
    /// The time budget ran out before the engine finished
    TimeLimit,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Status::NotSolved => "not_solved",
            Status::Optimal => "optimal",
            Status::Infeasible => "infeasible",
            Status::Unbounded => "unbounded",
            Status::TimeLimit => "time_limit",
        })
    }
}

/// Which backend [optimize](crate::Model::optimize) dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverChoice {
    /// Pick the first enabled engine that can express the model: models with
    /// integer variables go to microlp, pure LPs go to clarabel (for its duals),
    /// falling back to microlp.
    #[default]
    Auto,
    /// Force the microlp backend.
    Microlp,
    /// Force the clarabel backend.
    Clarabel,
}

/// How a solve should be run: engine selection, output and time budget.
///
/// Part of the model, so cloning or serializing a model carries its
/// configuration along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// 0 (silent, the default) to 3. From 2 on, the engine's own output is shown.
    /// The adapter's diagnostics always go through the `log` facade instead.
    pub verbosity: u8,
    /// Wall-clock budget in seconds. `Some(0.)` reports [Status::TimeLimit]
    /// without consulting the engine; engines without time-limit support ignore
    /// larger budgets.
    pub timeout: Option<f64>,
    /// The backend to dispatch to.
    pub solver: SolverChoice,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            verbosity: 0,
            timeout: None,
            solver: SolverChoice::Auto,
        }
    }
}

/// Represents an error that occurred while dispatching to or running an engine.
///
/// "No solution" outcomes are *not* errors: they come back as a [Status].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// No enabled backend can express this model.
    #[error("no solver backend is available for this model")]
    NoSolverAvailable,
    /// The forced backend is not compiled into this build.
    #[error("the {0} backend is not enabled in this build")]
    BackendDisabled(&'static str),
    /// The forced backend cannot solve models with integer variables.
    #[error("the {backend} backend cannot solve models with integer variables")]
    IntegerUnsupported {
        /// Name of the backend that was forced
        backend: &'static str,
    },
    /// The engine itself failed.
    #[error("solver engine failure: {0}")]
    Engine(String),
}

/// What a backend hands back to the model after a solve. The model turns this
/// into per-object primal/dual values and the objective value.
pub struct SolverOutput {
    pub(crate) status: Status,
    /// One value per column (model variable), in column order. Empty when the
    /// status carries no solution.
    pub(crate) columns: Vec<f64>,
    /// One reduced cost per column, on engines that report duals.
    pub(crate) reduced_costs: Option<Vec<f64>>,
    /// One shadow price per row (model constraint), on engines that report duals.
    pub(crate) row_duals: Option<Vec<f64>>,
}

impl SolverOutput {
    /// An optimal solution with the given column values and optional duals.
    pub fn solved(
        columns: Vec<f64>,
        reduced_costs: Option<Vec<f64>>,
        row_duals: Option<Vec<f64>>,
    ) -> Self {
        SolverOutput {
            status: Status::Optimal,
            columns,
            reduced_costs,
            row_duals,
        }
    }

    /// A no-solution outcome (infeasible, unbounded, time limit).
    pub fn no_solution(status: Status) -> Self {
        SolverOutput {
            status,
            columns: Vec::new(),
            reduced_costs: None,
            row_duals: None,
        }
    }
}

/// A solver backend: translates a [Model] for one engine and runs it.
pub trait SolverBackend {
    /// The backend name, as used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Whether the engine can handle integer and binary variables.
    fn supports_integers(&self) -> bool;

    /// Whether the engine reports dual values (reduced costs, shadow prices).
    fn supports_duals(&self) -> bool;

    /// Solves the model. Must return one column value per model variable, in
    /// column order, when the status carries a solution.
    fn solve(&self, model: &Model, config: &Configuration) -> Result<SolverOutput, SolverError>;
}

#[cfg(feature = "microlp")]
fn microlp_backend() -> Option<Box<dyn SolverBackend>> {
    Some(Box::new(self::microlp::Microlp))
}

#[cfg(not(feature = "microlp"))]
fn microlp_backend() -> Option<Box<dyn SolverBackend>> {
    None
}

#[cfg(feature = "clarabel")]
fn clarabel_backend() -> Option<Box<dyn SolverBackend>> {
    Some(Box::new(self::clarabel::Clarabel))
}

#[cfg(not(feature = "clarabel"))]
fn clarabel_backend() -> Option<Box<dyn SolverBackend>> {
    None
}

pub(crate) fn select_backend(
    choice: SolverChoice,
    has_integers: bool,
) -> Result<Box<dyn SolverBackend>, SolverError> {
    match choice {
        SolverChoice::Microlp => {
            microlp_backend().ok_or(SolverError::BackendDisabled("microlp"))
        }
        SolverChoice::Clarabel => {
            clarabel_backend().ok_or(SolverError::BackendDisabled("clarabel"))
        }
        SolverChoice::Auto => {
            let backend = if has_integers {
                microlp_backend()
            } else {
                clarabel_backend().or_else(microlp_backend)
            };
            backend.ok_or(SolverError::NoSolverAvailable)
        }
    }
}
