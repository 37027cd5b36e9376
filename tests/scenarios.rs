//! End-to-end scenarios over the public API.
//!
//! Each test builds a small descriptor graph through the builder, constructs
//! instances, and checks the observable behavior of all four derivations
//! together: classification, copying, and equality on the same values.

use std::sync::Arc;

use structwalk::prelude::*;

fn new_engine() -> (Arc<TypeRegistry>, Engine) {
    let registry = Arc::new(TypeRegistry::new().expect("registry"));
    let engine = Engine::new(registry.clone());
    (registry, engine)
}

/// S1: plain integers.
#[test]
fn scenario_int() {
    let (_, engine) = new_engine();

    assert_eq!(engine.mutability(wellknown::I4), Mutability::Immutable);
    assert_eq!(engine.cycles(wellknown::I4), Cycles::No);

    let copied = engine.copy(wellknown::I4, &Value::from_i32(42)).unwrap();
    assert_eq!(copied, Value::from_i32(42));

    assert!(engine.structural_equals(wellknown::I4, &Value::from_i32(1), &Value::from_i32(1)));
    assert!(!engine.structural_equals(wellknown::I4, &Value::from_i32(1), &Value::from_i32(2)));
}

/// S2: array of integers.
#[test]
fn scenario_int_array() {
    let (registry, engine) = new_engine();
    let ints = registry.array_of(wellknown::I4).unwrap();

    assert_eq!(engine.mutability(ints.token), Mutability::Mutable);

    let original = Value::Array(ArrayInstance::with_elements(
        ints.token,
        wellknown::I4,
        vec![Value::from_i32(1), Value::from_i32(2), Value::from_i32(3)],
    ));
    let copy = engine.copy(ints.token, &original).unwrap();

    assert!(!Value::same_instance(&original, &copy));
    let copied = copy.as_array().unwrap();
    assert_eq!(copied.len(), 3);
    for (index, expected) in [1, 2, 3].iter().enumerate() {
        assert_eq!(copied.get(index), Value::from_i32(*expected));
    }

    assert!(engine.is_mutable(ints.token, &original).unwrap());
}

/// S3: a value type with one read-only field.
#[test]
fn scenario_readonly_struct() {
    let (registry, engine) = new_engine();
    let point = TypeBuilder::new(registry)
        .value_type("demo", "OneField")
        .unwrap()
        .init_only_field("x", wellknown::I4)
        .unwrap()
        .ctor(&[("x", wellknown::I4)])
        .unwrap()
        .finish()
        .unwrap();

    assert_eq!(engine.mutability(point.token), Mutability::Immutable);

    let instance = Value::Object(ObjectInstance::with_slots(
        point.token,
        vec![Value::from_i32(7)],
    ));
    let copy = engine.copy(point.token, &instance).unwrap();

    // Identity-preserving for immutable values, and structurally equal
    assert!(Value::same_instance(&instance, &copy));
    assert!(engine.structural_equals(point.token, &instance, &copy));
}

/// S4: a self-referential node with a one-node cycle.
#[test]
fn scenario_self_cycle() {
    let (registry, engine) = new_engine();
    let mut builder = TypeBuilder::new(registry).class("demo", "Node").unwrap();
    let node = builder.token().unwrap();
    builder
        .field("self_ref", node)
        .unwrap()
        .no_arg_ctor()
        .unwrap()
        .finish()
        .unwrap();

    assert_eq!(engine.cycles(node), Cycles::Yes);

    let instance = ObjectInstance::new(node, 1);
    instance.set(0, Value::Object(instance.clone()));
    let original = Value::Object(instance);

    let copy = engine.copy(node, &original).unwrap();
    assert!(!Value::same_instance(&original, &copy));
    let copied = copy.as_object().unwrap();
    assert!(Value::same_instance(&copied.get(0), &copy));
}

/// S5: mutually recursive classes compared structurally.
#[test]
fn scenario_mutually_recursive_equality() {
    let (registry, engine) = new_engine();
    let mut a_builder = TypeBuilder::new(registry.clone()).class("demo", "A").unwrap();
    let mut b_builder = TypeBuilder::new(registry.clone()).class("demo", "B").unwrap();
    let a_token = a_builder.token().unwrap();
    let b_token = b_builder.token().unwrap();
    a_builder
        .field("b", b_token)
        .unwrap()
        .field("leaf", wellknown::I4)
        .unwrap()
        .no_arg_ctor()
        .unwrap()
        .finish()
        .unwrap();
    b_builder
        .field("a", a_token)
        .unwrap()
        .no_arg_ctor()
        .unwrap()
        .finish()
        .unwrap();

    let make_graph = |leaf: i32| {
        let a = ObjectInstance::new(a_token, 2);
        let b = ObjectInstance::new(b_token, 1);
        a.set(0, Value::Object(b.clone()));
        a.set(1, Value::from_i32(leaf));
        b.set(0, Value::Object(a.clone()));
        Value::Object(a)
    };

    // Identical shape: equal
    assert!(engine.structural_equals(a_token, &make_graph(1), &make_graph(1)));
    // One leaf changed: unequal
    assert!(!engine.structural_equals(a_token, &make_graph(1), &make_graph(2)));

    // Non-identical shape: the second graph's B does not point back
    let broken = {
        let a = ObjectInstance::new(a_token, 2);
        let b = ObjectInstance::new(b_token, 1);
        a.set(0, Value::Object(b));
        a.set(1, Value::from_i32(1));
        Value::Object(a)
    };
    assert!(!engine.structural_equals(a_token, &make_graph(1), &broken));
}

/// S6: a sealed class with one read-only polymorphic field; instance-level
/// mutability depends on the runtime payload.
#[test]
fn scenario_residual_mutability() {
    let (registry, engine) = new_engine();
    let holder = TypeBuilder::new(registry.clone())
        .class("demo", "Holder")
        .unwrap()
        .sealed()
        .unwrap()
        .init_only_field("field", wellknown::OBJECT)
        .unwrap()
        .ctor(&[("field", wellknown::OBJECT)])
        .unwrap()
        .finish()
        .unwrap();

    assert_eq!(engine.mutability(holder.token), Mutability::Maybe);

    let with_string = Value::Object(ObjectInstance::with_slots(
        holder.token,
        vec![Value::from_str_value("hello")],
    ));
    assert!(!engine.is_mutable(holder.token, &with_string).unwrap());

    let ints = registry.array_of(wellknown::I4).unwrap();
    let with_array = Value::Object(ObjectInstance::with_slots(
        holder.token,
        vec![Value::Array(ArrayInstance::with_elements(
            ints.token,
            wellknown::I4,
            vec![Value::from_i32(1), Value::from_i32(2), Value::from_i32(3)],
        ))],
    ));
    assert!(engine.is_mutable(holder.token, &with_array).unwrap());
}

/// Copying a diamond: two paths to one shared object yield two paths to one
/// shared copy.
#[test]
fn scenario_sharing() {
    let (registry, engine) = new_engine();
    let ints = registry.array_of(wellknown::I4).unwrap();
    let diamond = TypeBuilder::new(registry)
        .class("demo", "Diamond")
        .unwrap()
        .sealed()
        .unwrap()
        .field("left", ints.token)
        .unwrap()
        .field("right", ints.token)
        .unwrap()
        .no_arg_ctor()
        .unwrap()
        .finish()
        .unwrap();

    let shared = Value::Array(ArrayInstance::with_elements(
        ints.token,
        wellknown::I4,
        vec![Value::from_i32(9)],
    ));
    let instance = Value::Object(ObjectInstance::with_slots(
        diamond.token,
        vec![shared.clone(), shared],
    ));

    let copy = engine.copy(diamond.token, &instance).unwrap();
    let copied = copy.as_object().unwrap();
    assert!(Value::same_instance(&copied.get(0), &copied.get(1)));
    // And the shared copy is a new allocation
    assert!(!Value::same_instance(
        &copied.get(0),
        &instance.as_object().unwrap().get(0)
    ));
}

/// Copying through a base-typed slot dispatches on the runtime subtype.
#[test]
fn scenario_subtype_dispatch() {
    let (registry, engine) = new_engine();
    let animal = TypeBuilder::new(registry.clone())
        .class("demo", "Animal")
        .unwrap()
        .field("age", wellknown::I4)
        .unwrap()
        .no_arg_ctor()
        .unwrap()
        .finish()
        .unwrap();
    let dog = TypeBuilder::new(registry)
        .class("demo", "Dog")
        .unwrap()
        .base(animal.token)
        .unwrap()
        .field("bones", wellknown::I4)
        .unwrap()
        .no_arg_ctor()
        .unwrap()
        .finish()
        .unwrap();

    // Slots: [age, bones], base first
    let instance = Value::Object(ObjectInstance::with_slots(
        dog.token,
        vec![Value::from_i32(4), Value::from_i32(2)],
    ));
    let copy = engine.copy(animal.token, &instance).unwrap();
    let copied = copy.as_object().unwrap();
    assert_eq!(copied.runtime_type(), dog.token);
    assert_eq!(copied.get(0), Value::from_i32(4));
    assert_eq!(copied.get(1), Value::from_i32(2));
}

/// Read-only fields flow through the best-fit constructor; a type whose
/// constructors cannot absorb them fails until an override is installed.
#[test]
fn scenario_overrides() {
    let (registry, engine) = new_engine();
    let stuck = TypeBuilder::new(registry.clone())
        .class("demo", "Stuck")
        .unwrap()
        .sealed()
        .unwrap()
        .init_only_field("data", wellknown::OBJECT)
        .unwrap()
        .finish()
        .unwrap();

    let ints = registry.array_of(wellknown::I4).unwrap();
    let instance = Value::Object(ObjectInstance::with_slots(
        stuck.token,
        vec![Value::Array(ArrayInstance::new(
            ints.token,
            wellknown::I4,
            2,
        ))],
    ));

    match engine.copy(stuck.token, &instance) {
        Err(Error::NoBindableConstructor { type_name, fields }) => {
            assert_eq!(type_name, "demo.Stuck");
            assert!(fields.contains("data"));
        }
        other => panic!("expected NoBindableConstructor, got {other:?}"),
    }

    let token = stuck.token;
    engine.override_copier(
        token,
        Arc::new(move |value, refs| {
            let object = value.as_object().expect("object");
            let copy = ObjectInstance::new(token, 1);
            let out = Value::Object(copy.clone());
            refs.insert(value, out.clone());
            copy.set(0, object.get(0));
            Ok(out)
        }),
    );
    assert!(engine.copy(stuck.token, &instance).is_ok());
}

/// Well-known list shapes copy element-wise and compare structurally.
#[test]
fn scenario_well_known_list() {
    let (registry, engine) = new_engine();
    let list = registry
        .instantiate(wellknown::LIST, &[wellknown::STRING])
        .unwrap();

    let make = |values: &[&str]| {
        Value::Object(ObjectInstance::with_slots(
            list.token,
            values.iter().map(|v| Value::from_str_value(v)).collect(),
        ))
    };

    assert_eq!(engine.mutability(list.token), Mutability::Mutable);

    let original = make(&["a", "b"]);
    let copy = engine.copy(list.token, &original).unwrap();
    assert!(!Value::same_instance(&original, &copy));
    assert!(engine.structural_equals(list.token, &original, &copy));
    assert!(!engine.structural_equals(list.token, &original, &make(&["a", "c"])));
    assert!(!engine.structural_equals(list.token, &original, &make(&["a"])));
}

/// Nullable statics behave like their element for mutability, copy, and
/// equality, with null-aware comparisons.
#[test]
fn scenario_nullable() {
    let (registry, engine) = new_engine();
    let nullable_int = registry.nullable_of(wellknown::I4).unwrap();

    assert_eq!(engine.mutability(nullable_int.token), Mutability::Immutable);

    let copied = engine
        .copy(nullable_int.token, &Value::from_i32(3))
        .unwrap();
    assert_eq!(copied, Value::from_i32(3));
    assert_eq!(
        engine.copy(nullable_int.token, &Value::Null).unwrap(),
        Value::Null
    );

    assert!(engine.structural_equals(nullable_int.token, &Value::Null, &Value::Null));
    assert!(!engine.structural_equals(nullable_int.token, &Value::Null, &Value::from_i32(1)));
}
