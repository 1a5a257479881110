//! Lifecycle integration tests: spawn/destroy parity, rollback on
//! partial initialization failure, and the fatal initializer contract.

use jsbridge::testing::MockEngine;
use jsbridge::{ResourceLimits, ScriptCache, SpawnError, Vm};
use std::sync::Arc;

#[test]
fn spawn_then_destroy_leaves_nothing_outstanding() {
    let engine = Arc::new(MockEngine::new());

    for (stack_mb, heap_mb) in [(1, 1), (8, 8), (8, 32), (64, 512)] {
        let vm = Vm::spawn(Arc::clone(&engine), ResourceLimits::new(stack_mb, heap_mb)).unwrap();
        assert_eq!(vm.limits().thread_stack_mb, stack_mb);
        assert_eq!(vm.limits().heap_mb, heap_mb);
        vm.destroy();
    }

    assert_eq!(engine.inits(), 4);
    assert_eq!(engine.stops(), 4);
    assert_eq!(engine.live(), 0);
}

#[test]
fn bare_spawn_preloads_nothing() {
    let engine = Arc::new(MockEngine::new());
    let vm = Vm::spawn(Arc::clone(&engine), ResourceLimits::default()).unwrap();

    assert_eq!(engine.defines(), 0);
    vm.destroy();
}

#[test]
fn spawn_with_defaults_loads_the_bootstrap_script() {
    let engine = Arc::new(MockEngine::new());
    let cache = ScriptCache::new();

    let vm = Vm::spawn_with_defaults(Arc::clone(&engine), &cache).unwrap();

    assert_eq!(vm.limits(), &ResourceLimits::default());
    assert_eq!(engine.defines(), 1);
    assert_eq!(cache.len(), 1);
    vm.destroy();
    assert_eq!(engine.live(), 0);
}

#[test]
fn bootstrap_script_is_read_once_across_spawns() {
    let engine = Arc::new(MockEngine::new());
    let cache = ScriptCache::new();

    let a = Vm::spawn_with_defaults(Arc::clone(&engine), &cache).unwrap();
    let b = Vm::spawn_with_defaults(Arc::clone(&engine), &cache).unwrap();

    // One cache entry feeds both instances.
    assert_eq!(cache.len(), 1);
    assert_eq!(engine.defines(), 2);

    a.destroy();
    b.destroy();
}

#[test]
fn engine_init_failure_is_a_recoverable_setup_error() {
    let engine = Arc::new(MockEngine::new());
    engine.fail_init();

    let err = Vm::spawn(Arc::clone(&engine), ResourceLimits::default()).unwrap_err();
    assert!(matches!(err, SpawnError::Init(_)));
    assert!(!err.is_fatal());
    assert_eq!(engine.live(), 0);
}

#[test]
fn bootstrap_failure_releases_the_instance_exactly_once() {
    let engine = Arc::new(MockEngine::new());
    // The shipped shim always mentions JSON.
    engine.fail_define_containing("JSON");
    let cache = ScriptCache::new();

    let err = Vm::spawn_with_defaults(Arc::clone(&engine), &cache).unwrap_err();

    assert!(matches!(err, SpawnError::Bootstrap(_)));
    assert_eq!(engine.inits(), 1);
    assert_eq!(engine.stops(), 1);
    assert_eq!(engine.live(), 0);
}

#[test]
fn initializer_failure_is_fatal_and_releases_the_instance() {
    let engine = Arc::new(MockEngine::new());
    let cache = ScriptCache::new();

    let err = Vm::spawn_with_initializer(
        Arc::clone(&engine),
        &cache,
        ResourceLimits::default(),
        |_vm| Err("embedding misconfigured".into()),
    )
    .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, SpawnError::Fatal { .. }));
    assert_eq!(engine.inits(), 1);
    assert_eq!(engine.stops(), 1);
}

#[test]
fn initializer_runs_against_a_bootstrapped_handle() {
    let engine = Arc::new(MockEngine::new());
    let cache = ScriptCache::new();

    let vm = Vm::spawn_with_initializer(
        Arc::clone(&engine),
        &cache,
        ResourceLimits::new(8, 16),
        |vm| {
            vm.define_labeled("setup.js", "var ready = true;")
                .map_err(Into::into)
        },
    )
    .unwrap();

    // Bootstrap define plus the initializer's define.
    assert_eq!(engine.defines(), 2);
    assert_eq!(vm.limits().heap_mb, 16);
    vm.destroy();
}

#[test]
fn init_script_spawn_defines_the_script() {
    let engine = Arc::new(MockEngine::new());
    let cache = ScriptCache::new();

    let vm = Vm::spawn_with_init_script(
        Arc::clone(&engine),
        &cache,
        ResourceLimits::default(),
        "var configured = 1;",
    )
    .unwrap();

    assert_eq!(engine.defines(), 2);
    vm.destroy();
}

#[test]
fn init_script_failure_is_fatal() {
    let engine = Arc::new(MockEngine::new());
    engine.fail_define_containing("configured");
    let cache = ScriptCache::new();

    let err = Vm::spawn_with_init_script(
        Arc::clone(&engine),
        &cache,
        ResourceLimits::default(),
        "var configured = 1;",
    )
    .unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(engine.live(), 0);
}

#[test]
fn handle_debug_output_shows_limits_only() {
    let engine = Arc::new(MockEngine::new());
    let vm = Vm::spawn(Arc::clone(&engine), ResourceLimits::new(8, 16)).unwrap();

    let printed = format!("{vm:?}");
    assert!(printed.contains("limits"));
    assert!(printed.contains("16"));
    assert!(!printed.contains("instance"));

    vm.destroy();
}

#[test]
fn distinct_handles_are_independent() {
    let engine = Arc::new(MockEngine::new());

    let a = Vm::spawn(Arc::clone(&engine), ResourceLimits::default()).unwrap();
    let b = Vm::spawn(Arc::clone(&engine), ResourceLimits::default()).unwrap();

    a.destroy();
    // b still usable after a is gone.
    assert!(b.define("var alive = true;").is_ok());
    b.destroy();

    assert_eq!(engine.live(), 0);
}
