//! The [Objective] couples an expression with an optimization direction.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::model::ModelError;

/// Whether to search for the variable values that give the highest
/// or the lowest value of the objective function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveDirection {
    /// Search for the highest objective value
    Maximisation,
    /// Search for the lowest objective value
    #[default]
    Minimisation,
}

impl Display for ObjectiveDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ObjectiveDirection::Maximisation => "Maximise",
            ObjectiveDirection::Minimisation => "Minimise",
        })
    }
}

/// The function a [Model](crate::Model) optimizes.
///
/// Construction rejects non-linear expressions, since no supported engine can
/// optimize them:
///
/// ```
/// use optimod::{Objective, Variable};
///
/// let x = Variable::new("x");
/// let y = Variable::new("y");
/// let objective = Objective::maximise(0.3 * &x + 0.4 * &y).unwrap();
/// assert_eq!(objective.to_string(), "Maximise\n0.3*x + 0.4*y");
/// assert!(Objective::maximise(&x * &y).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Objective {
    name: Option<String>,
    expression: Expression,
    direction: ObjectiveDirection,
    value: Option<f64>,
}

impl Objective {
    /// Creates an objective, failing with [ModelError::NonLinear] when the
    /// expression contains a product of variables.
    pub fn new(
        expression: impl Into<Expression>,
        direction: ObjectiveDirection,
    ) -> Result<Self, ModelError> {
        let expression = expression.into();
        if !expression.is_affine() {
            return Err(ModelError::NonLinear);
        }
        Ok(Objective {
            name: None,
            expression,
            direction,
            value: None,
        })
    }

    /// Creates a maximisation objective. Fails on non-linear expressions.
    pub fn maximise(expression: impl Into<Expression>) -> Result<Self, ModelError> {
        Objective::new(expression, ObjectiveDirection::Maximisation)
    }

    /// Creates a minimisation objective. Fails on non-linear expressions.
    pub fn minimise(expression: impl Into<Expression>) -> Result<Self, ModelError> {
        Objective::new(expression, ObjectiveDirection::Minimisation)
    }

    /// Names the objective.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The objective name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The objective expression.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// The optimization direction.
    pub fn direction(&self) -> ObjectiveDirection {
        self.direction
    }

    /// The objective value at the last solution, `None` before a solve and after
    /// any change to the objective itself.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub(crate) fn expression_mut(&mut self) -> &mut Expression {
        &mut self.expression
    }

    pub(crate) fn set_value(&mut self, value: Option<f64>) {
        self.value = value;
    }
}

impl Display for Objective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.direction, self.expression)
    }
}
