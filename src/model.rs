//! The [Model] owns variables, constraints and an objective, keeps the live
//! `name -> column/row index` mapping that backends solve against, and writes
//! solution values back onto the objects after [Model::optimize].

use std::fmt::{Display, Formatter};
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::Constraint;
use crate::expression::Expression;
use crate::objective::Objective;
use crate::solvers::{self, Configuration, SolverError, SolverOutput, Status};
use crate::variable::{BoundError, Variable, VariableKind};

/// An invalid modeling operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A bound assignment or definition was invalid.
    #[error(transparent)]
    Bounds(#[from] BoundError),
    /// The expression contains a product of variables.
    #[error("the expression is not linear")]
    NonLinear,
    /// A variable with this name is already registered.
    #[error("a variable named {0:?} is already in the model")]
    DuplicateVariable(String),
    /// A constraint with this name is already registered.
    #[error("a constraint named {0:?} is already in the model")]
    DuplicateConstraint(String),
    /// The named variable is not registered.
    #[error("no variable named {0:?} in the model")]
    UnknownVariable(String),
    /// The named constraint is not registered.
    #[error("no constraint named {0:?} in the model")]
    UnknownConstraint(String),
}

/// An optimization model: named variables, ranged constraints, one objective.
///
/// Variables and constraints are kept in registration order; their position is
/// the column/row index the solver backends see, observable through
/// [Model::variable_index] and [Model::constraint_index]. Adding a constraint or
/// objective implicitly registers every variable its expression mentions that
/// the model does not know yet.
///
/// ```
/// use optimod::{Constraint, Model, Objective, Variable};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut model = Model::new();
/// let x = Variable::new("x").lower(0.);
/// let y = Variable::new("y").lower(0.);
/// model.set_objective(Objective::maximise(3. * &x + 2. * &y)?)?;
/// model.add_constraint(Constraint::new(&x + &y).upper(4.).named("capacity"))?;
///
/// let status = model.optimize()?;
/// assert_eq!(status.to_string(), "optimal");
/// let objective = model.objective().value().unwrap();
/// assert!((objective - 12.).abs() < 1e-6);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    name: Option<String>,
    variables: IndexMap<String, Variable>,
    constraints: IndexMap<String, Constraint>,
    objective: Objective,
    configuration: Configuration,
    status: Status,
}

impl Model {
    /// Creates an empty model with a zero minimisation objective.
    pub fn new() -> Self {
        Model::default()
    }

    /// Creates an empty named model.
    pub fn named(name: impl Into<String>) -> Self {
        Model {
            name: Some(name.into()),
            ..Model::default()
        }
    }

    /// The model name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The solve configuration. Mutate it through [Model::configuration_mut].
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Mutable access to the solve configuration.
    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    /// The status of the last [Model::optimize] call,
    /// [Status::NotSolved] initially.
    pub fn status(&self) -> Status {
        self.status
    }

    // ---- variables ----

    /// Registers a variable, assigning it the next column index.
    ///
    /// Fails when the definition's bounds are invalid or a variable with the same
    /// name is already registered.
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<usize, ModelError> {
        variable.validate()?;
        if self.variables.contains_key(variable.name()) {
            return Err(ModelError::DuplicateVariable(variable.name().to_owned()));
        }
        variable.clear_solution();
        let name = variable.name().to_owned();
        let (index, _) = self.variables.insert_full(name, variable);
        Ok(index)
    }

    /// The registered variable with this name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Mutable access to a registered variable, for bound updates.
    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    /// The variable at the given column index.
    pub fn variable_at(&self, index: usize) -> Option<&Variable> {
        self.variables.get_index(index).map(|(_, variable)| variable)
    }

    /// The column index of the named variable: the position the solver backends
    /// see it at. Assigned at registration, stable under renames and bound
    /// changes, compacted on removal.
    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.get_index_of(name)
    }

    /// Iterates over the registered variables in column order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// The number of registered variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// True when at least one variable is integer or binary.
    pub fn has_integer_variables(&self) -> bool {
        self.variables
            .values()
            .any(|variable| variable.kind() != VariableKind::Continuous)
    }

    /// Renames a registered variable. The column index is unchanged; every
    /// constraint and objective term referring to it follows the new name.
    pub fn rename_variable(&mut self, old: &str, new: &str) -> Result<(), ModelError> {
        if !self.variables.contains_key(old) {
            return Err(ModelError::UnknownVariable(old.to_owned()));
        }
        if new == old {
            return Ok(());
        }
        if self.variables.contains_key(new) {
            return Err(ModelError::DuplicateVariable(new.to_owned()));
        }
        self.variables = std::mem::take(&mut self.variables)
            .into_iter()
            .map(|(name, mut variable)| {
                if name == old {
                    variable.set_name(new.to_owned());
                    (new.to_owned(), variable)
                } else {
                    (name, variable)
                }
            })
            .collect();
        for constraint in self.constraints.values_mut() {
            constraint.expression_mut().rename_variable(old, new);
        }
        self.objective.expression_mut().rename_variable(old, new);
        Ok(())
    }

    /// Removes a variable, stripping its terms from every constraint and from
    /// the objective. Later columns shift down by one.
    pub fn remove_variable(&mut self, name: &str) -> Result<Variable, ModelError> {
        let variable = self
            .variables
            .shift_remove(name)
            .ok_or_else(|| ModelError::UnknownVariable(name.to_owned()))?;
        for constraint in self.constraints.values_mut() {
            constraint.expression_mut().remove_variable(name);
        }
        self.objective.expression_mut().remove_variable(name);
        Ok(variable)
    }

    // ---- constraints ----

    /// Registers a constraint, assigning it the next row index and a generated
    /// name (`r0`, `r1`, ...) when the builder did not set one.
    ///
    /// Every variable the expression mentions and the model does not know yet is
    /// registered too, in term order, as if added through [Model::add_variable].
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<usize, ModelError> {
        if !constraint.expression().is_affine() {
            return Err(ModelError::NonLinear);
        }
        constraint.validate()?;
        let name = match constraint.name() {
            Some(name) => {
                if self.constraints.contains_key(name) {
                    return Err(ModelError::DuplicateConstraint(name.to_owned()));
                }
                name.to_owned()
            }
            None => self.next_constraint_name(),
        };
        self.register_expression_variables(constraint.expression())?;
        constraint.expression_mut().clear_captured();
        constraint.clear_solution();
        constraint.set_name(name.clone());
        let (index, _) = self.constraints.insert_full(name, constraint);
        Ok(index)
    }

    /// The registered constraint with this name.
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.get(name)
    }

    /// Mutable access to a registered constraint, for bound updates.
    pub fn constraint_mut(&mut self, name: &str) -> Option<&mut Constraint> {
        self.constraints.get_mut(name)
    }

    /// The constraint at the given row index.
    pub fn constraint_at(&self, index: usize) -> Option<&Constraint> {
        self.constraints
            .get_index(index)
            .map(|(_, constraint)| constraint)
    }

    /// The row index of the named constraint.
    pub fn constraint_index(&self, name: &str) -> Option<usize> {
        self.constraints.get_index_of(name)
    }

    /// Iterates over the registered constraints in row order.
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    /// The number of registered constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Renames a registered constraint. The row index is unchanged.
    pub fn rename_constraint(&mut self, old: &str, new: &str) -> Result<(), ModelError> {
        if !self.constraints.contains_key(old) {
            return Err(ModelError::UnknownConstraint(old.to_owned()));
        }
        if new == old {
            return Ok(());
        }
        if self.constraints.contains_key(new) {
            return Err(ModelError::DuplicateConstraint(new.to_owned()));
        }
        self.constraints = std::mem::take(&mut self.constraints)
            .into_iter()
            .map(|(name, mut constraint)| {
                if name == old {
                    constraint.set_name(new.to_owned());
                    (new.to_owned(), constraint)
                } else {
                    (name, constraint)
                }
            })
            .collect();
        Ok(())
    }

    /// Removes a constraint. Later rows shift down by one.
    pub fn remove_constraint(&mut self, name: &str) -> Result<Constraint, ModelError> {
        self.constraints
            .shift_remove(name)
            .ok_or_else(|| ModelError::UnknownConstraint(name.to_owned()))
    }

    /// Merges additional terms into an existing constraint's expression,
    /// registering newly mentioned variables. The row index and the rest of the
    /// constraint are unchanged; the symbolic form grows accordingly.
    pub fn extend_constraint(
        &mut self,
        name: &str,
        terms: impl Into<Expression>,
    ) -> Result<(), ModelError> {
        let terms = terms.into();
        if !terms.is_affine() {
            return Err(ModelError::NonLinear);
        }
        if !self.constraints.contains_key(name) {
            return Err(ModelError::UnknownConstraint(name.to_owned()));
        }
        self.register_expression_variables(&terms)?;
        let constraint = self
            .constraints
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownConstraint(name.to_owned()))?;
        let expression = constraint.expression_mut();
        *expression += terms;
        expression.clear_captured();
        Ok(())
    }

    // ---- objective ----

    /// The current objective.
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Replaces the objective, registering newly mentioned variables. Any cached
    /// objective value is dropped.
    pub fn set_objective(&mut self, mut objective: Objective) -> Result<(), ModelError> {
        self.register_expression_variables(objective.expression())?;
        objective.expression_mut().clear_captured();
        objective.set_value(None);
        self.objective = objective;
        Ok(())
    }

    /// Merges additional terms into the objective expression, registering newly
    /// mentioned variables and dropping the cached objective value.
    pub fn extend_objective(&mut self, terms: impl Into<Expression>) -> Result<(), ModelError> {
        let terms = terms.into();
        if !terms.is_affine() {
            return Err(ModelError::NonLinear);
        }
        self.register_expression_variables(&terms)?;
        let expression = self.objective.expression_mut();
        *expression += terms;
        expression.clear_captured();
        self.objective.set_value(None);
        Ok(())
    }

    // ---- surgical coefficient updates ----

    /// Overwrites the coefficient of a registered variable in a registered
    /// constraint (introducing the term when absent).
    pub fn set_constraint_coefficient(
        &mut self,
        constraint: &str,
        variable: &str,
        coefficient: f64,
    ) -> Result<(), ModelError> {
        if !self.variables.contains_key(variable) {
            return Err(ModelError::UnknownVariable(variable.to_owned()));
        }
        let row = self
            .constraints
            .get_mut(constraint)
            .ok_or_else(|| ModelError::UnknownConstraint(constraint.to_owned()))?;
        row.expression_mut().set_coefficient(variable, coefficient);
        Ok(())
    }

    /// Overwrites the coefficient of a registered variable in the objective
    /// (introducing the term when absent). Drops the cached objective value.
    pub fn set_objective_coefficient(
        &mut self,
        variable: &str,
        coefficient: f64,
    ) -> Result<(), ModelError> {
        if !self.variables.contains_key(variable) {
            return Err(ModelError::UnknownVariable(variable.to_owned()));
        }
        self.objective
            .expression_mut()
            .set_coefficient(variable, coefficient);
        self.objective.set_value(None);
        Ok(())
    }

    // ---- solving ----

    /// Solves the model with the configured backend and writes the solution back
    /// onto the variables, constraints and objective.
    ///
    /// Solver-level outcomes (optimal, infeasible, unbounded, time limit) are
    /// reported as a [Status]; `Err` is reserved for misuse, like forcing a
    /// backend that cannot express the model.
    pub fn optimize(&mut self) -> Result<Status, SolverError> {
        if let Some(timeout) = self.configuration.timeout {
            if timeout <= 0. {
                log::debug!("timeout of {timeout}s leaves no solve budget");
                self.apply(SolverOutput::no_solution(Status::TimeLimit));
                return Ok(self.status);
            }
        }
        if self.variables.is_empty() {
            let feasible = self.constraints.values().all(|constraint| {
                let activity = constraint.expression().constant();
                constraint.lower_bound().map_or(true, |lb| activity >= lb)
                    && constraint.upper_bound().map_or(true, |ub| activity <= ub)
            });
            let output = if feasible {
                SolverOutput::solved(Vec::new(), None, None)
            } else {
                SolverOutput::no_solution(Status::Infeasible)
            };
            self.apply(output);
            return Ok(self.status);
        }
        let config = self.configuration.clone();
        let backend = solvers::select_backend(config.solver, self.has_integer_variables())?;
        log::debug!(
            "solving {} variables / {} constraints with {}",
            self.variables.len(),
            self.constraints.len(),
            backend.name()
        );
        let started = Instant::now();
        let output = backend.solve(self, &config)?;
        log::debug!("{} after {:?}", output.status, started.elapsed());
        self.apply(output);
        Ok(self.status)
    }

    /// The variable primal values from the last solution, keyed by name.
    /// Empty before a successful solve.
    pub fn primal_values(&self) -> IndexMap<String, f64> {
        self.variables
            .iter()
            .filter_map(|(name, variable)| Some((name.clone(), variable.primal()?)))
            .collect()
    }

    /// The variable reduced costs from the last solution, keyed by name.
    /// Empty before a successful solve and on backends without dual support.
    pub fn reduced_costs(&self) -> IndexMap<String, f64> {
        self.variables
            .iter()
            .filter_map(|(name, variable)| Some((name.clone(), variable.dual()?)))
            .collect()
    }

    /// The constraint activities (row primal values) from the last solution,
    /// keyed by name. Empty before a successful solve.
    pub fn constraint_values(&self) -> IndexMap<String, f64> {
        self.constraints
            .iter()
            .filter_map(|(name, constraint)| Some((name.clone(), constraint.primal()?)))
            .collect()
    }

    /// The constraint shadow prices from the last solution, keyed by name.
    /// Empty before a successful solve and on backends without dual support.
    pub fn shadow_prices(&self) -> IndexMap<String, f64> {
        self.constraints
            .iter()
            .filter_map(|(name, constraint)| Some((name.clone(), constraint.dual()?)))
            .collect()
    }

    // ---- internals ----

    /// Registers every variable the expression mentions that the model does not
    /// know yet, following the expression's term order so column indices are
    /// deterministic.
    fn register_expression_variables(&mut self, expression: &Expression) -> Result<(), ModelError> {
        for (name, _) in expression.terms() {
            if self.variables.contains_key(name) {
                continue;
            }
            let definition = expression
                .captured_variable(name)
                .ok_or_else(|| ModelError::UnknownVariable(name.to_owned()))?;
            self.add_variable(definition.clone())?;
        }
        Ok(())
    }

    fn next_constraint_name(&self) -> String {
        let mut index = self.constraints.len();
        loop {
            let name = format!("r{index}");
            if !self.constraints.contains_key(&name) {
                return name;
            }
            index += 1;
        }
    }

    fn apply(&mut self, output: SolverOutput) {
        self.status = output.status;
        if output.status == Status::Optimal && output.columns.len() == self.variables.len() {
            let values: IndexMap<String, f64> = self
                .variables
                .keys()
                .cloned()
                .zip(output.columns.iter().copied())
                .collect();
            for (index, variable) in self.variables.values_mut().enumerate() {
                variable.set_primal(output.columns[index]);
                variable.set_dual(output.reduced_costs.as_ref().map(|costs| costs[index]));
            }
            for (index, constraint) in self.constraints.values_mut().enumerate() {
                let activity = constraint.expression().evaluate(&values);
                constraint.set_primal(activity);
                constraint.set_dual(output.row_duals.as_ref().map(|duals| duals[index]));
            }
            let objective = self.objective.expression().evaluate(&values);
            self.objective.set_value(Some(objective));
        } else {
            for variable in self.variables.values_mut() {
                variable.clear_solution();
            }
            for constraint in self.constraints.values_mut() {
                constraint.clear_solution();
            }
            self.objective.set_value(None);
        }
    }
}

/// Formats the model as an LP-style listing: objective, rows, bounds, and the
/// integrality sections when relevant.
impl Display for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.objective)?;
        if !self.constraints.is_empty() {
            write!(f, "\nsubject to")?;
            for constraint in self.constraints.values() {
                write!(f, "\n{}", constraint)?;
            }
        }
        if !self.variables.is_empty() {
            write!(f, "\nbounds")?;
            for variable in self.variables.values() {
                write!(f, "\n{}", variable)?;
            }
        }
        for (kind, header) in [
            (VariableKind::Integer, "integers"),
            (VariableKind::Binary, "binaries"),
        ] {
            let mut names = self
                .variables
                .values()
                .filter(|variable| variable.kind() == kind)
                .map(Variable::name)
                .peekable();
            if names.peek().is_some() {
                write!(f, "\n{}", header)?;
                for name in names {
                    write!(f, "\n{}", name)?;
                }
            }
        }
        Ok(())
    }
}
