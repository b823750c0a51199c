//! Constraints define the (in)equalities that must hold in the solution.
//!
//! A [Constraint] is a ranged row: `lower <= expression <= upper`, with either
//! side optional. Both bounds set to the same value makes it an equality row.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::variable::BoundError;

/// A single (in)equality over a linear expression.
///
/// ```
/// use optimod::{Constraint, Variable};
///
/// let x = Variable::new("x");
/// let y = Variable::new("y");
/// let row = Constraint::new(0.3 * &x + 0.4 * &y).lower(-100.).named("test");
/// assert_eq!(row.to_string(), "test: -100 <= 0.3*x + 0.4*y");
/// ```
///
/// The name may be left out: the model assigns one (`r0`, `r1`, ...) at
/// registration. [Constraint::primal] (the row activity) and [Constraint::dual]
/// (the shadow price) are `None` until the owning model has been optimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    name: Option<String>,
    expression: Expression,
    lower: Option<f64>,
    upper: Option<f64>,
    primal: Option<f64>,
    dual: Option<f64>,
}

impl Constraint {
    /// Creates a constraint over the given expression, with no bounds yet.
    pub fn new(expression: impl Into<Expression>) -> Self {
        Constraint {
            name: None,
            expression: expression.into(),
            lower: None,
            upper: None,
            primal: None,
            dual: None,
        }
    }

    /// Sets the lower bound.
    pub fn lower(mut self, bound: f64) -> Self {
        self.lower = Some(bound);
        self
    }

    /// Sets the upper bound.
    pub fn upper(mut self, bound: f64) -> Self {
        self.upper = Some(bound);
        self
    }

    /// Sets both bounds at once.
    pub fn bounds(self, lower: f64, upper: f64) -> Self {
        self.lower(lower).upper(upper)
    }

    /// Makes this an equality constraint: `expression = value`.
    pub fn equals(self, value: f64) -> Self {
        self.bounds(value, value)
    }

    /// Names the constraint.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The constraint name. `None` until the constraint is registered in a model,
    /// which assigns one if the builder did not.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The constrained expression.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// The lower bound, `None` when the row is unbounded below.
    pub fn lower_bound(&self) -> Option<f64> {
        self.lower
    }

    /// The upper bound, `None` when the row is unbounded above.
    pub fn upper_bound(&self) -> Option<f64> {
        self.upper
    }

    /// True when both bounds coincide.
    pub fn is_equality(&self) -> bool {
        matches!((self.lower, self.upper), (Some(l), Some(u)) if l == u)
    }

    /// The row activity (the expression's value) in the last solution, `None`
    /// before a solve.
    pub fn primal(&self) -> Option<f64> {
        self.primal
    }

    /// The shadow price in the last solution: the rate of change of the objective
    /// value per unit shift of the constraint's bounds. `None` before a solve, and
    /// on backends that report no duals.
    pub fn dual(&self) -> Option<f64> {
        self.dual
    }

    /// Assigns a new lower bound, with the same contract as
    /// [Variable::set_lower](crate::Variable::set_lower).
    pub fn set_lower(&mut self, bound: f64) -> Result<(), BoundError> {
        if bound.is_nan() {
            return Err(BoundError::NotANumber);
        }
        if let Some(upper) = self.upper {
            if bound > upper {
                return Err(BoundError::Inverted {
                    lower: bound,
                    upper,
                });
            }
        }
        self.lower = Some(bound);
        Ok(())
    }

    /// Assigns a new upper bound, with the same contract as
    /// [Variable::set_upper](crate::Variable::set_upper).
    pub fn set_upper(&mut self, bound: f64) -> Result<(), BoundError> {
        if bound.is_nan() {
            return Err(BoundError::NotANumber);
        }
        if let Some(lower) = self.lower {
            if lower > bound {
                return Err(BoundError::Inverted {
                    lower,
                    upper: bound,
                });
            }
        }
        self.upper = Some(bound);
        Ok(())
    }

    /// Removes the lower bound.
    pub fn clear_lower(&mut self) {
        self.lower = None;
    }

    /// Removes the upper bound.
    pub fn clear_upper(&mut self) {
        self.upper = None;
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn expression_mut(&mut self) -> &mut Expression {
        &mut self.expression
    }

    pub(crate) fn validate(&self) -> Result<(), BoundError> {
        if self.lower.is_some_and(f64::is_nan) || self.upper.is_some_and(f64::is_nan) {
            return Err(BoundError::NotANumber);
        }
        if let (Some(lower), Some(upper)) = (self.lower, self.upper) {
            if lower > upper {
                return Err(BoundError::Inverted { lower, upper });
            }
        }
        Ok(())
    }

    pub(crate) fn set_primal(&mut self, value: f64) {
        self.primal = Some(value);
    }

    pub(crate) fn set_dual(&mut self, value: Option<f64>) {
        self.dual = value;
    }

    pub(crate) fn clear_solution(&mut self) {
        self.primal = None;
        self.dual = None;
    }
}

/// Constrains the expression from above: `expression <= bound`.
pub fn leq(expression: impl Into<Expression>, bound: f64) -> Constraint {
    Constraint::new(expression).upper(bound)
}

/// Constrains the expression from below: `expression >= bound`.
pub fn geq(expression: impl Into<Expression>, bound: f64) -> Constraint {
    Constraint::new(expression).lower(bound)
}

/// Constrains the expression to a value: `expression = bound`.
pub fn eq(expression: impl Into<Expression>, bound: f64) -> Constraint {
    Constraint::new(expression).equals(bound)
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}: ", name)?;
        }
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) if lower == upper => {
                write!(f, "{} = {}", self.expression, lower)
            }
            (Some(lower), Some(upper)) => {
                write!(f, "{} <= {} <= {}", lower, self.expression, upper)
            }
            (Some(lower), None) => write!(f, "{} <= {}", lower, self.expression),
            (None, Some(upper)) => write!(f, "{} <= {}", self.expression, upper),
            (None, None) => write!(f, "{}", self.expression),
        }
    }
}
