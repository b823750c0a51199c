//! A solver-agnostic modeler for linear and mixed-integer programs: build a
//! [Model] out of named [Variable]s, [Constraint]s and an [Objective], and let a
//! pluggable pure-Rust engine solve it.
//!
//! ```rust
//! use optimod::{Constraint, Model, Objective, Variable};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = Model::new();
//! let chairs = Variable::new("chairs").lower(0.);
//! let tables = Variable::new("tables").lower(0.);
//! model.set_objective(Objective::maximise(70. * &chairs + 50. * &tables)?)?;
//! model.add_constraint(Constraint::new(4. * &chairs + 3. * &tables).upper(240.).named("wood"))?;
//! model.add_constraint(Constraint::new(2. * &chairs + &tables).upper(100.).named("labor"))?;
//!
//! let status = model.optimize()?;
//! assert_eq!(status.to_string(), "optimal");
//! assert!((model.objective().value().unwrap() - 4100.).abs() < 1e-4);
//! assert!((model.variable("chairs").unwrap().primal().unwrap() - 30.).abs() < 1e-4);
//! # Ok(())
//! # }
//! ```
//!
//! The model keeps a live `name -> column/row index` mapping
//! ([Model::variable_index], [Model::constraint_index]): indices are assigned in
//! registration order, survive renames, and newly mentioned variables get their
//! column the moment a constraint or objective introduces them. After
//! [Model::optimize], solution values are readable per object
//! ([Variable::primal], [Constraint::dual], ...) and as whole-model maps
//! ([Model::primal_values], [Model::shadow_prices], ...).
//!
//! All numerical optimization is delegated to the engines behind the
//! [solvers::SolverBackend] seam; see the [solvers] module for what each bundled
//! engine supports.

pub use crate::constraint::Constraint;
pub use crate::expression::Expression;
pub use crate::model::{Model, ModelError};
pub use crate::objective::{Objective, ObjectiveDirection};
pub use crate::solvers::{Configuration, SolverChoice, SolverError, Status};
pub use crate::variable::{BoundError, Variable, VariableKind};

pub mod constraint;
pub mod expression;
pub mod model;
pub mod objective;
pub mod solvers;
pub mod variable;
