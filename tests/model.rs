//! Whole-model behavior: serialization round-trips, configuration propagation,
//! incremental mutation with live index assignment, result maps.

use float_eq::assert_float_eq;
use optimod::{
    Constraint, Model, ModelError, Objective, SolverChoice, Status, Variable, VariableKind,
};

fn furniture() -> Model {
    let mut model = Model::named("furniture");
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
fn serde_round_trip_reoptimizes_identically() {
    let mut model = furniture();
    model.configuration_mut().verbosity = 1;
    model.configuration_mut().timeout = Some(10.);
    assert_eq!(model.optimize(), Ok(Status::Optimal));
    let value = model.objective().value().unwrap();

    let serialized = serde_json::to_string(&model).unwrap();
    let mut restored: Model = serde_json::from_str(&serialized).unwrap();

    assert_eq!(restored.optimize(), Ok(Status::Optimal));
    assert_float_eq!(restored.objective().value().unwrap(), value, abs <= 1e-6);
    let definitions = |m: &Model| -> Vec<(String, Option<f64>, Option<f64>, VariableKind)> {
        m.variables()
            .map(|v| (v.name().to_owned(), v.lower_bound(), v.upper_bound(), v.kind()))
            .collect()
    };
    assert_eq!(definitions(&restored), definitions(&model));
    let rows = |m: &Model| -> Vec<(String, Option<f64>, Option<f64>)> {
        m.constraints()
            .map(|c| (c.name().unwrap().to_owned(), c.lower_bound(), c.upper_bound()))
            .collect()
    };
    assert_eq!(rows(&restored), rows(&model));
    assert_eq!(restored.name(), Some("furniture"));
    assert_eq!(restored.configuration(), model.configuration());
}

#[test]
fn unbounded_variables_survive_the_round_trip() {
    let mut model = Model::new();
    model.add_variable(Variable::new("free")).unwrap();
    model
        .add_variable(Variable::new("half").lower(0.))
        .unwrap();
    let serialized = serde_json::to_string(&model).unwrap();
    let restored: Model = serde_json::from_str(&serialized).unwrap();
    assert_eq!(restored.variable("free").unwrap().lower_bound(), None);
    assert_eq!(restored.variable("half").unwrap().lower_bound(), Some(0.));
    assert_eq!(restored.variable("half").unwrap().upper_bound(), None);
}

#[test]
fn config_gets_copied_too() {
    let mut model = furniture();
    assert_eq!(model.configuration().verbosity, 0);
    model.configuration_mut().verbosity = 3;
    let model_copy = model.clone();
    assert_eq!(model_copy.configuration().verbosity, 3);
}

#[test]
fn add_variable_with_unruly_name() {
    let mut model = furniture();
    model
        .add_variable(Variable::new("12x!!@#5_3").bounds(-666., 666.))
        .unwrap();
    assert_eq!(
        model.variable("12x!!@#5_3").unwrap().lower_bound(),
        Some(-666.)
    );
    assert_eq!(
        model.variable("12x!!@#5_3").unwrap().upper_bound(),
        Some(666.)
    );
    let serialized = serde_json::to_string(&model).unwrap();
    let restored: Model = serde_json::from_str(&serialized).unwrap();
    assert_eq!(restored.variable_index("12x!!@#5_3"), Some(2));
}

#[test]
fn change_of_constraint_is_reflected_in_the_model() {
    let mut model = Model::new();
    let x = Variable::new("x").bounds(-83.3, 1324422.);
    let y = Variable::new("y").bounds(-181133.3, 12000.);
    let constraint = Constraint::new(0.3 * &x + 0.4 * &y).lower(-100.).named("test");
    let row = model.add_constraint(constraint).unwrap();
    assert_eq!(row, 0);
    assert_eq!(
        model.constraint("test").unwrap().to_string(),
        "test: -100 <= 0.3*x + 0.4*y"
    );

    let z = Variable::new("z").integer().bounds(3., 10.);
    assert_eq!(model.variable_index("z"), None);
    model.extend_constraint("test", 77. * &z).unwrap();
    assert_eq!(model.variable_index("z"), Some(2));
    assert_eq!(
        model.constraint("test").unwrap().to_string(),
        "test: -100 <= 0.3*x + 0.4*y + 77*z"
    );
    assert_eq!(model.constraint_index("test"), Some(0));
    assert_eq!(model.variable("z").unwrap().kind(), VariableKind::Integer);
}

#[test]
fn change_of_objective_is_reflected_in_the_model() {
    let mut model = Model::new();
    let x = Variable::new("x").bounds(0., 10.);
    let y = Variable::new("y").bounds(0., 5.);
    let objective = Objective::maximise(0.3 * &x + 0.4 * &y).unwrap().named("test");
    model.set_objective(objective).unwrap();
    assert_eq!(model.objective().to_string(), "Maximise\n0.3*x + 0.4*y");

    let z = Variable::new("z").integer().bounds(4., 4.);
    model.extend_objective(77. * &z).unwrap();
    assert_eq!(model.objective().to_string(), "Maximise\n0.3*x + 0.4*y + 77*z");
    assert_eq!(model.variable_index("z"), Some(2));

    // the integer variable routes the solve to the MIP-capable engine
    assert_eq!(model.optimize(), Ok(Status::Optimal));
    assert_float_eq!(
        model.objective().value().unwrap(),
        0.3 * 10. + 0.4 * 5. + 77. * 4.,
        abs <= 1e-6
    );
}

#[test]
fn raise_on_non_linear_objective() {
    let model = furniture();
    let v1 = model.variable("chairs").unwrap();
    let v2 = model.variable("tables").unwrap();
    assert!(matches!(
        Objective::maximise(v1 * v2),
        Err(ModelError::NonLinear)
    ));
}

#[test]
fn set_copied_objective() {
    let mut model = furniture();
    let objective_copy = model.objective().clone();
    model.set_objective(objective_copy).unwrap();
    assert_eq!(
        model.objective().to_string(),
        "Maximise\n70*chairs + 50*tables"
    );
}

#[test]
fn initial_objective() {
    let model = Model::new();
    assert_eq!(model.objective().to_string(), "Minimise\n0");
    assert_eq!(
        furniture().objective().to_string(),
        "Maximise\n70*chairs + 50*tables"
    );
}

#[test]
fn timeout_of_zero_reports_time_limit() {
    let mut model = furniture();
    model.configuration_mut().timeout = Some(0.);
    let status = model.optimize().unwrap();
    assert_eq!(status, Status::TimeLimit);
    assert_eq!(status.to_string(), "time_limit");
    assert_eq!(model.status(), Status::TimeLimit);
    for variable in model.variables() {
        assert_eq!(variable.primal(), None);
    }
    // restoring a budget makes the model solvable again
    model.configuration_mut().timeout = Some(10.);
    assert_eq!(model.optimize(), Ok(Status::Optimal));
}

#[test]
fn primal_values_match_variable_attributes() {
    let mut model = furniture();
    assert!(model.primal_values().is_empty());
    model.optimize().unwrap();
    let primals = model.primal_values();
    assert_eq!(primals.len(), 2);
    for (name, value) in &primals {
        assert_eq!(Some(*value), model.variable(name).unwrap().primal());
    }
}

#[test]
fn reduced_costs_match_variable_attributes() {
    let mut model = furniture();
    model.optimize().unwrap();
    let costs = model.reduced_costs();
    assert_eq!(costs.len(), 2);
    for (name, value) in &costs {
        assert_eq!(Some(*value), model.variable(name).unwrap().dual());
    }
}

#[test]
fn constraint_values_match_constraint_attributes() {
    let mut model = furniture();
    model.optimize().unwrap();
    let activities = model.constraint_values();
    assert_eq!(activities.len(), 2);
    for (name, value) in &activities {
        assert_eq!(Some(*value), model.constraint(name).unwrap().primal());
    }
}

#[test]
fn shadow_prices_match_constraint_attributes() {
    let mut model = furniture();
    model.optimize().unwrap();
    let prices = model.shadow_prices();
    assert_eq!(prices.len(), 2);
    for (name, value) in &prices {
        assert_eq!(Some(*value), model.constraint(name).unwrap().dual());
    }
}

#[test]
fn set_objective_coefficient_reoptimizes() {
    let mut model = furniture();
    model.optimize().unwrap();
    model.set_objective_coefficient("chairs", 10.).unwrap();
    // the stale objective value is dropped by the edit
    assert_eq!(model.objective().value(), None);
    assert_eq!(model.optimize(), Ok(Status::Optimal));
    // chairs are barely worth anything now: make tables until labor runs out
    assert_float_eq!(model.objective().value().unwrap(), 4000., abs <= 1e-3);
    assert_float_eq!(
        model.variable("tables").unwrap().primal().unwrap(),
        80.,
        abs <= 1e-3
    );
}

#[test]
fn forcing_a_continuous_only_backend_on_a_mip_fails() {
    let mut model = furniture();
    model
        .add_variable(Variable::new("crates").integer().bounds(0., 3.))
        .unwrap();
    model.configuration_mut().solver = SolverChoice::Clarabel;
    let error = model.optimize().unwrap_err();
    assert_eq!(
        error.to_string(),
        "the clarabel backend cannot solve models with integer variables"
    );
}
