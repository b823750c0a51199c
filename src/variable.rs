//! A [Variable] is the base element used to build [Expression](crate::Expression)s.
//! The goal of the solver is to find optimal values for all variables in a model.
//!
//! Unlike a solver's internal column, a `Variable` is a plain named value: it can be
//! built and inspected on its own, and only becomes a column once registered in a
//! [Model](crate::Model).

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An invalid bound assignment on a [Variable] or [Constraint](crate::Constraint).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BoundError {
    /// The assignment would leave the lower bound above the upper bound.
    #[error("lower bound {lower} is above upper bound {upper}")]
    Inverted {
        /// The offending lower bound
        lower: f64,
        /// The offending upper bound
        upper: f64,
    },
    /// The assigned value is a NaN.
    #[error("bound is not a number")]
    NotANumber,
}

/// The domain of a [Variable].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// A real-valued variable
    #[default]
    Continuous,
    /// A variable restricted to whole values
    Integer,
    /// A variable restricted to 0 or 1
    Binary,
}

impl Display for VariableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            VariableKind::Continuous => "continuous",
            VariableKind::Integer => "integer",
            VariableKind::Binary => "binary",
        })
    }
}

/// A named decision variable with optional bounds.
///
/// Build one with the usual chain of builder methods, then register it in a
/// [Model](crate::Model) (directly, or implicitly by mentioning it in a constraint
/// or objective expression):
///
/// ```
/// use optimod::{Variable, VariableKind};
///
/// let x = Variable::new("x").lower(-83.3).upper(1324422.0);
/// assert_eq!(x.lower_bound(), Some(-83.3));
///
/// let z = Variable::new("z").integer().bounds(3.0, 10.0);
/// assert_eq!(z.kind(), VariableKind::Integer);
/// ```
///
/// A `None` bound means unbounded on that side. [Variable::primal] and
/// [Variable::dual] stay `None` until the owning model has been optimized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    name: String,
    lower: Option<f64>,
    upper: Option<f64>,
    kind: VariableKind,
    primal: Option<f64>,
    dual: Option<f64>,
}

impl Variable {
    /// Creates an unbounded continuous variable with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            lower: None,
            upper: None,
            kind: VariableKind::Continuous,
            primal: None,
            dual: None,
        }
    }

    /// Sets the lower bound. Validation happens when the variable is registered;
    /// see [Variable::set_lower] for the fallible setter.
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

    /// Restricts the variable to whole values.
    pub fn integer(mut self) -> Self {
        self.kind = VariableKind::Integer;
        self
    }

    /// Restricts the variable to 0 or 1. The bounds become `[0, 1]`.
    pub fn binary(mut self) -> Self {
        self.kind = VariableKind::Binary;
        self.lower = Some(0.);
        self.upper = Some(1.);
        self
    }

    /// Sets the variable kind.
    pub fn kinded(self, kind: VariableKind) -> Self {
        match kind {
            VariableKind::Binary => self.binary(),
            kind => {
                let mut var = self;
                var.kind = kind;
                var
            }
        }
    }

    /// The variable name. Registered variables are renamed through
    /// [Model::rename_variable](crate::Model::rename_variable) so the model's
    /// name lookup stays consistent.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lower bound, `None` when unbounded below.
    pub fn lower_bound(&self) -> Option<f64> {
        self.lower
    }

    /// The upper bound, `None` when unbounded above.
    pub fn upper_bound(&self) -> Option<f64> {
        self.upper
    }

    /// The variable kind.
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// The value of this variable in the last solution, `None` before a solve.
    pub fn primal(&self) -> Option<f64> {
        self.primal
    }

    /// The reduced cost of this variable in the last solution: the rate of change
    /// of the objective value per unit shift of the variable's active bound.
    /// `None` before a solve, and on backends that report no duals.
    pub fn dual(&self) -> Option<f64> {
        self.dual
    }

    /// Assigns a new lower bound.
    ///
    /// Fails with [BoundError::Inverted] when the value is above the current upper
    /// bound, and with [BoundError::NotANumber] on NaN.
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

    /// Assigns a new upper bound. Same contract as [Variable::set_lower].
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
        self.name = name;
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

/// Formats the variable the way an LP listing's `bounds` section would.
impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) if lower == upper => {
                write!(f, "{} = {}", self.name, lower)
            }
            (Some(lower), Some(upper)) => write!(f, "{} <= {} <= {}", lower, self.name, upper),
            (Some(lower), None) => write!(f, "{} >= {}", self.name, lower),
            (None, Some(upper)) => write!(f, "{} <= {}", self.name, upper),
            (None, None) => write!(f, "{} free", self.name),
        }
    }
}
