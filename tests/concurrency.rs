//! Concurrency stress: derivations and walkers under parallel access.
//!
//! The specialization caches must be publish-safe (racing first requests
//! tolerate duplicate synthesis with one winner) and the per-call
//! bookkeeping must stay call-local. These tests drive the same engine from
//! many threads at once.

use std::sync::Arc;

use structwalk::prelude::*;

const THREADS: usize = 8;
const ROUNDS: usize = 50;

fn new_engine() -> (Arc<TypeRegistry>, Arc<Engine>) {
    let registry = Arc::new(TypeRegistry::new().expect("registry"));
    let engine = Arc::new(Engine::new(registry.clone()));
    (registry, engine)
}

#[test]
fn concurrent_first_derivations_agree() {
    let (registry, engine) = new_engine();
    let mut builder = TypeBuilder::new(registry).class("demo", "Node").unwrap();
    let node = builder.token().unwrap();
    builder
        .init_only_field("next", node)
        .unwrap()
        .init_only_field("tag", wellknown::STRING)
        .unwrap()
        .ctor(&[("tag", wellknown::STRING)])
        .unwrap()
        .finish()
        .unwrap();

    let results: Vec<(Mutability, Cycles)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let engine = engine.clone();
                scope.spawn(move || (engine.mutability(node), engine.cycles(node)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in &results {
        assert_eq!(*result, results[0], "all threads observe one winner");
    }
}

#[test]
fn concurrent_copies_are_independent() {
    let (registry, engine) = new_engine();
    let mut builder = TypeBuilder::new(registry).class("demo", "Cell").unwrap();
    let cell = builder.token().unwrap();
    builder
        .field("next", cell)
        .unwrap()
        .field("v", wellknown::I4)
        .unwrap()
        .no_arg_ctor()
        .unwrap()
        .finish()
        .unwrap();

    // A two-node cycle shared by every thread
    let first = ObjectInstance::new(cell, 2);
    let second = ObjectInstance::new(cell, 2);
    first.set(0, Value::Object(second.clone()));
    first.set(1, Value::from_i32(1));
    second.set(0, Value::Object(first.clone()));
    second.set(1, Value::from_i32(2));
    let original = Value::Object(first);

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            let engine = engine.clone();
            let original = original.clone();
            scope.spawn(move || {
                for _ in 0..ROUNDS {
                    let copy = engine.copy(cell, &original).unwrap();
                    // Each call owns its reference map; every copy closes
                    // its own cycle
                    assert!(!Value::same_instance(&original, &copy));
                    let copied_first = copy.as_object().unwrap();
                    let copied_second = copied_first.get(0);
                    let copied_second = copied_second.as_object().unwrap();
                    assert!(Value::same_instance(&copied_second.get(0), &copy));
                    assert!(engine.structural_equals(cell, &original, &copy));
                }
            });
        }
    });
}

#[test]
fn concurrent_mixed_derivations() {
    let (registry, engine) = new_engine();
    let ints = registry.array_of(wellknown::I4).unwrap();
    let list = registry
        .instantiate(wellknown::LIST, &[wellknown::STRING])
        .unwrap();
    let holder = TypeBuilder::new(registry)
        .class("demo", "Holder")
        .unwrap()
        .sealed()
        .unwrap()
        .init_only_field("payload", wellknown::OBJECT)
        .unwrap()
        .ctor(&[("payload", wellknown::OBJECT)])
        .unwrap()
        .finish()
        .unwrap();

    std::thread::scope(|scope| {
        for thread in 0..THREADS {
            let engine = engine.clone();
            let ints_token = ints.token;
            let list_token = list.token;
            let holder_token = holder.token;
            scope.spawn(move || {
                for round in 0..ROUNDS {
                    match (thread + round) % 3 {
                        0 => {
                            assert_eq!(engine.mutability(ints_token), Mutability::Mutable);
                            assert_eq!(engine.cycles(ints_token), Cycles::No);
                        }
                        1 => {
                            let original = Value::Object(ObjectInstance::with_slots(
                                list_token,
                                vec![Value::from_str_value("x")],
                            ));
                            let copy = engine.copy(list_token, &original).unwrap();
                            assert!(engine.structural_equals(list_token, &original, &copy));
                        }
                        _ => {
                            let instance = Value::Object(ObjectInstance::with_slots(
                                holder_token,
                                vec![Value::from_str_value("frozen")],
                            ));
                            assert!(!engine.is_mutable(holder_token, &instance).unwrap());
                        }
                    }
                }
            });
        }
    });
}

#[test]
fn concurrent_registry_instantiation_dedups() {
    let (registry, _) = new_engine();

    let tokens: Vec<TypeToken> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = registry.clone();
                scope.spawn(move || {
                    registry
                        .instantiate(wellknown::LIST, &[wellknown::I4])
                        .unwrap()
                        .token
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for token in &tokens {
        assert_eq!(*token, tokens[0], "instantiation must deduplicate");
    }
}
