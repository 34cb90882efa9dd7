use pretty_assertions::assert_eq;
use ymmsl::{Category, Identifier, Reference, ResourceRequirements, SettingValue};

const ISR2D: &str = include_str!("fixtures/isr2d.ymmsl");
const EXPERIMENT: &str = include_str!("fixtures/experiment.ymmsl");

fn r(s: &str) -> Reference {
    Reference::parse(s).unwrap()
}

#[test]
fn overlay_settings_win() {
    let base = ymmsl::load("ymmsl_version: v0.1\nsettings:\n  a: 1\n").unwrap();
    let overlay = ymmsl::load_partial("ymmsl_version: v0.1\nsettings:\n  a: 2\n  b: 3\n").unwrap();

    let merged = base.merge(&overlay).unwrap();
    assert_eq!(
        ymmsl::dump(&merged).unwrap(),
        "ymmsl_version: v0.1\nsettings:\n  a: 2\n  b: 3\n"
    );
}

#[test]
fn merge_order_matters() {
    let a = ymmsl::load("ymmsl_version: v0.1\nsettings:\n  x: 1\n").unwrap();
    let b = ymmsl::load("ymmsl_version: v0.1\nsettings:\n  x: 2\n").unwrap();

    let ab = a.merge_configuration(&b).unwrap();
    let ba = b.merge_configuration(&a).unwrap();
    assert_ne!(ab, ba);
    assert_eq!(ab.settings().unwrap().get(&r("x")), Some(&SettingValue::Integer(2)));
}

#[test]
fn experiment_overlays_model_definition() {
    let base = ymmsl::load(ISR2D).unwrap();
    let experiment = ymmsl::load_partial(EXPERIMENT).unwrap();
    let merged = base.merge(&experiment).unwrap();

    let model = merged.model().unwrap();
    let bf = model.component(&Identifier::new("bf").unwrap()).unwrap();
    assert_eq!(bf.multiplicity(), &[20]);
    assert_eq!(bf.implementation(), Some(&r("isr2d.blood_flow")));
    assert_eq!(model.components().len(), 5);
    assert_eq!(model.conduits().len(), 6);

    let settings = merged.settings().unwrap();
    assert_eq!(settings.get(&r("t_max")), Some(&SettingValue::Integer(250)));
    assert_eq!(
        settings.get(&r("bf.velocity")),
        Some(&SettingValue::String("fast".into()))
    );
    // overridden keys keep their place
    let keys: Vec<String> = settings.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys[1], "bf.velocity");
    assert_eq!(keys[2], "t_max");

    let resources = merged.resources().unwrap();
    assert_eq!(resources[&r("bf")], ResourceRequirements::threaded(8).unwrap());
    assert_eq!(resources.len(), 3);

    // untouched sections come from the base
    assert_eq!(merged.implementations(), base.implementations());
    assert_eq!(merged.checkpoints(), base.checkpoints());
}

#[test]
fn models_with_other_names_do_not_merge() {
    let base = ymmsl::load(ISR2D).unwrap();
    let other = ymmsl::load_partial("ymmsl_version: v0.1\nmodel:\n  name: other\n").unwrap();
    let err = base.merge(&other).unwrap_err();
    assert_eq!(err.category(), Category::Merge);
}

#[test]
fn a_model_can_be_split_over_fragments() {
    let wiring = "ymmsl_version: v0.1
model:
  name: m
  conduits:
    macro.out: micro.in
    micro.out: macro.in
";
    let components = "ymmsl_version: v0.1
model:
  name: m
  components:
    macro: isr2d.macro
    micro: isr2d.micro
";
    // on its own the wiring refers to components that do not exist
    assert!(ymmsl::load(wiring).is_err());

    let mut merged = ymmsl::load_partial(wiring).unwrap();
    merged.update(&ymmsl::load_partial(components).unwrap()).unwrap();
    let config = ymmsl::Configuration::new(merged).unwrap();
    assert_eq!(config.model().unwrap().conduits().len(), 2);
    assert_eq!(config.check_runnable().len(), 4);
}

#[test]
fn rewiring_a_receiver_is_rejected() {
    let base = ymmsl::load(ISR2D).unwrap();
    let rewire = ymmsl::load_partial(
        "ymmsl_version: v0.1\nmodel:\n  name: isr2d\n  conduits:\n    smc2bf.out: smc.initial_state\n",
    )
    .unwrap();
    let err = base.merge(&rewire).unwrap_err();
    assert_eq!(
        err.root(),
        &ymmsl::Error::DuplicateReceiver("smc.initial_state".into())
    );
}
