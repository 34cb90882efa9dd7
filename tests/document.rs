use pretty_assertions::assert_eq;
use serde_yaml::Value;
use ymmsl::{
    Category, Component, Configuration, Error, Identifier, Model, Operator, PartialConfiguration,
    Port, Reference, ResourceRequirements, SettingValue,
};

const ISR2D: &str = include_str!("fixtures/isr2d.ymmsl");

fn r(s: &str) -> Reference {
    Reference::parse(s).unwrap()
}

#[test]
fn fixture_loads_as_consistent_configuration() {
    let config = ymmsl::load(ISR2D).unwrap();

    let model = config.model().unwrap();
    assert_eq!(model.name().as_str(), "isr2d");
    assert_eq!(model.components().len(), 5);
    assert_eq!(model.conduits().len(), 6);

    let bf = model.component(&Identifier::new("bf").unwrap()).unwrap();
    assert_eq!(bf.multiplicity(), &[10]);
    assert_eq!(bf.instances().len(), 10);

    let init = model.component(&Identifier::new("init").unwrap()).unwrap();
    assert_eq!(init.ports_for(Operator::OF).count(), 1);

    let settings = config.settings().unwrap();
    assert_eq!(settings.get(&r("t_max")), Some(&SettingValue::Integer(100)));
    assert_eq!(settings.get(&r("smc.max_strain")), Some(&SettingValue::Float(2.0)));
    assert_eq!(
        settings.get(&r("bf.kernel")),
        Some(&SettingValue::matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap())
    );

    let resources = config.resources().unwrap();
    assert_eq!(
        resources[&r("bf2smc")],
        ResourceRequirements::MpiNodes {
            nodes: 2,
            mpi_processes_per_node: 8,
            threads_per_mpi_process: 2
        }
    );
}

#[test]
fn decode_of_encode_is_identity() {
    let config = ymmsl::load(ISR2D).unwrap();
    let text = ymmsl::dump(&config).unwrap();
    assert_eq!(ymmsl::load(&text).unwrap(), config);
}

#[test]
fn encoding_reaches_a_fixed_point() {
    let once = ymmsl::dump(&ymmsl::load_partial(ISR2D).unwrap()).unwrap();
    let twice = ymmsl::dump(&ymmsl::load_partial(&once).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn long_forms_are_shortened() {
    let text = "ymmsl_version: v0.1
model:
  name: m
  components:
    a:
      implementation: x.a
    b:
      implementation: x.b
      multiplicity: [4]
  conduits:
    a.out:
    - b.in
";
    let expected = "ymmsl_version: v0.1
model:
  name: m
  components:
    a: x.a
    b:
      implementation: x.b
      multiplicity: 4
  conduits:
    a.out: b.in
";
    let config = ymmsl::load(text).unwrap();
    assert_eq!(ymmsl::dump(&config).unwrap(), expected);
}

#[test]
fn fan_out_round_trips_as_one_list_entry() {
    let text = "ymmsl_version: v0.1
model:
  name: m
  components:
    a: x.a
    b: x.b
    c: x.c
  conduits:
    a.out: [b.in, c.in]
";
    let config = ymmsl::load(text).unwrap();
    assert_eq!(config.model().unwrap().conduits().len(), 2);

    let tree: Value = serde_yaml::from_str(&ymmsl::dump(&config).unwrap()).unwrap();
    let receivers = tree["model"]["conduits"]["a.out"].as_sequence().unwrap();
    assert_eq!(receivers.len(), 2);
    assert_eq!(receivers[1].as_str(), Some("c.in"));
}

#[test]
fn fan_in_is_a_duplicate_receiver() {
    let text = "ymmsl_version: v0.1
model:
  name: m
  components:
    a: x.a
    b: x.b
    c: x.c
  conduits:
    a.out: c.in
    b.out: c.in
";
    let err = ymmsl::load(text).unwrap_err();
    assert_eq!(err.root(), &Error::DuplicateReceiver("c.in".into()));
    assert_eq!(err.category(), Category::Consistency);
}

#[test]
fn mixed_resource_shapes_are_ambiguous() {
    let text = "ymmsl_version: v0.1
resources:
  macro:
    threads: 4
    mpi_processes: 8
";
    let err = ymmsl::load_partial(text).unwrap_err();
    assert!(matches!(err.root(), Error::AmbiguousResourceShape { .. }));
    assert_eq!(err.category(), Category::Schema);
    assert_eq!(err.path().unwrap().to_string(), "/resources/macro");
}

#[test]
fn identifiers_are_validated() {
    for bad in ["", "1abc", "a-b"] {
        assert!(
            matches!(Identifier::new(bad), Err(Error::InvalidIdentifier { .. })),
            "{bad:?} should be rejected"
        );
    }
    assert_eq!(
        Identifier::new("_internal"),
        Err(Error::ReservedName("_internal".into()))
    );
    assert!(Identifier::new_internal("_internal").is_ok());
    assert!(Identifier::new("a_1").is_ok());
    assert!(Identifier::new("_").is_ok());
}

#[test]
fn reference_text_round_trips() {
    for text in ["a", "a.b", "a.b[2].c", "x[1][2]", "macro.state_out[-1]"] {
        assert_eq!(r(text).to_string(), text);
        assert_eq!(Reference::parse(&r(text).to_string()).unwrap(), r(text));
    }
    let port = r("macro.out");
    assert_eq!(port.last_identifier().unwrap().as_str(), "out");
    assert_eq!(port.without_last(), Some(r("macro")));
}

#[test]
fn matrices_must_be_regular() {
    let ok = ymmsl::load_partial("ymmsl_version: v0.1\nsettings:\n  m: [[1, 2], [3, 4]]\n").unwrap();
    assert_eq!(
        ok.settings.unwrap().get(&r("m")),
        Some(&SettingValue::matrix(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap())
    );

    let err = ymmsl::load_partial("ymmsl_version: v0.1\nsettings:\n  m: [[1, 2], [3]]\n").unwrap_err();
    assert_eq!(
        err.root(),
        &Error::IrregularMatrix {
            row: 1,
            len: 1,
            expected: 2
        }
    );
    assert_eq!(err.path().unwrap().to_string(), "/settings/m");
}

#[test]
fn errors_name_their_location() {
    let text = "ymmsl_version: v0.1
model:
  name: m
  components:
    b:
      implementation: x.b
      multiplicity: [4, -1]
";
    let err = ymmsl::load_partial(text).unwrap_err();
    assert_eq!(
        err.path().unwrap().to_string(),
        "/model/components/b/multiplicity/1"
    );
    assert!(err.to_string().starts_with("at /model/components/b/multiplicity/1: "));
}

#[test]
fn empty_sections_survive_a_round_trip() {
    let config = PartialConfiguration {
        settings: Some(ymmsl::Settings::new()),
        ..Default::default()
    };
    let text = ymmsl::dump(&config).unwrap();
    assert_eq!(ymmsl::load_partial(&text).unwrap(), config);
}

#[test]
fn extreme_shapes_survive_a_round_trip() {
    let id = |s: &str| Identifier::new(s).unwrap();
    let wide = Component::new(id("wide"))
        .with_implementation(r("x.wide"))
        .unwrap()
        .with_multiplicity(vec![u64::MAX, 0])
        .with_ports(vec![Port::vector(id("out"), Operator::OI, u32::MAX)])
        .unwrap();
    let model = Model::new(id("m"), vec![wide], vec![]).unwrap();
    let config = Configuration::new(PartialConfiguration {
        model: Some(model),
        ..Default::default()
    })
    .unwrap();

    let text = ymmsl::dump(&config).unwrap();
    assert_eq!(ymmsl::load(&text).unwrap(), config);
}
