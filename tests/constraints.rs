//! Constraint behavior through a full model lifecycle: activities, shadow
//! prices, renaming, bound validation, coefficient surgery.

use float_eq::assert_float_eq;
use optimod::{BoundError, Constraint, Model, ModelError, Objective, Status, Variable};

fn furniture() -> Model {
    let mut model = Model::new();
    let chairs = Variable::new("chairs").lower(0.);
    let tables = Variable::new("tables").lower(0.);
    model
        .set_objective(Objective::maximise(70. * &chairs + 50. * &tables).unwrap())
        .unwrap();
    model
        .add_constraint(
            Constraint::new(4. * &chairs + 3. * &tables)
                .upper(240.)
                .named("wood"),
        )
        .unwrap();
    model
        .add_constraint(
            Constraint::new(2. * &chairs + &tables)
                .upper(100.)
                .named("labor"),
        )
        .unwrap();
    model
}

#[test]
fn primal_is_none_before_solving() {
    let model = furniture();
    for constraint in model.constraints() {
        assert_eq!(constraint.primal(), None);
        assert_eq!(constraint.dual(), None);
    }
}

#[test]
fn activities_after_solving() {
    let mut model = furniture();
    assert_eq!(model.optimize(), Ok(Status::Optimal));
    // both rows bind at the optimum
    assert_float_eq!(
        model.constraint("wood").unwrap().primal().unwrap(),
        240.,
        abs <= 1e-3
    );
    assert_float_eq!(
        model.constraint("labor").unwrap().primal().unwrap(),
        100.,
        abs <= 1e-3
    );
}

#[test]
fn shadow_prices_after_solving() {
    let mut model = furniture();
    assert_eq!(model.optimize(), Ok(Status::Optimal));
    // one more unit of wood is worth 15, one more unit of labor 5
    assert_float_eq!(
        model.constraint("wood").unwrap().dual().unwrap(),
        15.,
        abs <= 1e-3
    );
    assert_float_eq!(
        model.constraint("labor").unwrap().dual().unwrap(),
        5.,
        abs <= 1e-3
    );
}

#[test]
fn change_constraint_name() {
    let mut model = furniture();
    model.rename_constraint("wood", "ketchup").unwrap();
    assert_eq!(model.constraint("wood"), None);
    assert_eq!(model.constraint_index("ketchup"), Some(0));
    let names: Vec<_> = model.constraints().map(|c| c.name().unwrap().to_owned()).collect();
    assert_eq!(names, ["ketchup", "labor"]);
    for (index, name) in names.iter().enumerate() {
        model.rename_constraint(name, &format!("c{index}")).unwrap();
    }
    let names: Vec<_> = model.constraints().map(|c| c.name().unwrap().to_owned()).collect();
    assert_eq!(names, ["c0", "c1"]);
}

#[test]
fn setting_lower_bound_higher_than_upper_bound_raises() {
    let mut model = furniture();
    let error = model
        .constraint_mut("wood")
        .unwrap()
        .set_lower(10_000_000_000.)
        .unwrap_err();
    assert_eq!(
        error,
        BoundError::Inverted {
            lower: 10_000_000_000.,
            upper: 240.,
        }
    );
}

#[test]
fn setting_nan_bound_raises() {
    let mut model = furniture();
    let error = model
        .constraint_mut("wood")
        .unwrap()
        .set_lower(f64::NAN)
        .unwrap_err();
    assert_eq!(error, BoundError::NotANumber);
}

#[test]
fn anonymous_constraints_are_named_at_registration() {
    let mut model = Model::new();
    let x = Variable::new("x").bounds(0., 1.);
    let unnamed = Constraint::new(2. * &x).upper(1.);
    assert_eq!(unnamed.name(), None);
    model.add_constraint(unnamed).unwrap();
    assert_eq!(model.constraint_index("r0"), Some(0));
    assert_eq!(model.constraint("r0").unwrap().to_string(), "r0: 2*x <= 1");
}

#[test]
fn non_linear_constraints_are_refused() {
    let mut model = Model::new();
    let x = Variable::new("x");
    let y = Variable::new("y");
    assert_eq!(
        model.add_constraint(Constraint::new(&x * &y).upper(1.)),
        Err(ModelError::NonLinear)
    );
    // nothing was registered by the failed add
    assert_eq!(model.num_variables(), 0);
}

#[test]
fn coefficient_surgery_changes_the_row() {
    let mut model = furniture();
    model
        .set_constraint_coefficient("labor", "tables", 2.)
        .unwrap();
    assert_eq!(
        model.constraint("labor").unwrap().to_string(),
        "labor: 2*chairs + 2*tables <= 100"
    );
    assert_eq!(
        model.set_constraint_coefficient("labor", "ghost", 1.),
        Err(ModelError::UnknownVariable("ghost".to_owned()))
    );
    // with labor twice as table-hungry, chairs-only production wins
    assert_eq!(model.optimize(), Ok(Status::Optimal));
    assert_float_eq!(model.objective().value().unwrap(), 3500., abs <= 1e-3);
    assert_float_eq!(
        model.variable("chairs").unwrap().primal().unwrap(),
        50.,
        abs <= 1e-3
    );
}

#[test]
fn removing_a_constraint_shifts_row_indices() {
    let mut model = furniture();
    model.remove_constraint("wood").unwrap();
    assert_eq!(model.constraint_index("labor"), Some(0));
    assert_eq!(
        model.remove_constraint("wood"),
        Err(ModelError::UnknownConstraint("wood".to_owned()))
    );
}
