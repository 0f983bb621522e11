mod common;

use std::sync::Arc;

use composite_forwarder::{
    CacheStats, Composed, Composite, CompositeError, ForwarderOptions, Object, ObjectId, Val,
};

use common::{obj, Echo, Plain, A, B};

fn ids(objects: &[Arc<dyn Object>]) -> Vec<ObjectId> {
    objects.iter().map(ObjectId::of_arc).collect()
}

/// Observable answers for a fixed set of selectors.
fn observe(facade: &Composed<Plain>) -> Vec<(usize, Result<Val, bool>, Result<Val, bool>, bool)> {
    ["foo", "bar", "echo", "baz"]
        .into_iter()
        .map(|selector| {
            let flatten = |r: Result<Val, CompositeError>| r.map_err(|e| e.is_not_recognized());
            (
                facade.component_implementation_count(selector),
                flatten(facade.send(selector, &[Val::S32(7)])),
                flatten(facade.broadcast(selector, &[Val::S32(7)])),
                facade.responds_to_selector_composite(selector),
            )
        })
        .collect()
}

#[test]
fn test_cache_does_not_change_answers() {
    let cached = Composed::new(ForwarderOptions::USE_CACHE, Plain).unwrap();
    let uncached = Composed::new(ForwarderOptions::NONE, Plain).unwrap();

    let a = obj(A::default());
    let b = obj(B::default());
    let echo = obj(Echo);

    let steps: Vec<Box<dyn Fn(&Composed<Plain>)>> = vec![
        Box::new(|_: &Composed<Plain>| {}),
        Box::new(|f: &Composed<Plain>| f.add_component(a.clone())),
        Box::new(|f: &Composed<Plain>| f.add_component(b.clone())),
        Box::new(|f: &Composed<Plain>| f.add_component(echo.clone())),
        Box::new(|f: &Composed<Plain>| f.remove_component(&*a)),
        Box::new(|f: &Composed<Plain>| f.add_component(a.clone())),
        Box::new(|f: &Composed<Plain>| f.remove_component(&*b)),
        Box::new(|f: &Composed<Plain>| f.remove_component(&*echo)),
    ];

    for step in &steps {
        step(&cached);
        step(&uncached);
        // Query twice so the second round is answered from the cache.
        assert_eq!(observe(&cached), observe(&uncached));
        assert_eq!(observe(&cached), observe(&uncached));
    }
    assert!(cached.forwarder().cache_stats().hits > 0);
}

#[test]
fn test_repeated_lookup_hits_cache() {
    let facade = Composed::new(ForwarderOptions::USE_CACHE, Plain).unwrap();
    let a = obj(A::default());
    let b = obj(B::default());
    facade.add_component(a.clone());
    facade.add_component(b.clone());

    let first = facade.components_implementing_selector("foo");
    let second = facade.components_implementing_selector("foo");
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(facade.forwarder().cache_stats(), CacheStats { hits: 1, misses: 1 });
    assert_eq!(facade.forwarder().registry().cache_len(), 1);
}

#[test]
fn test_unknown_selector_is_cached_as_empty() {
    let facade = Composed::new(ForwarderOptions::USE_CACHE, Plain).unwrap();
    let a = obj(A::default());
    facade.add_component(a.clone());

    assert!(facade.send("baz", &[]).unwrap_err().is_not_recognized());
    assert!(facade.send("baz", &[]).unwrap_err().is_not_recognized());
    assert!(facade.forwarder().cache_stats().hits >= 1);
}

#[test]
fn test_membership_change_invalidates() {
    let facade = Composed::new(ForwarderOptions::USE_CACHE, Plain).unwrap();
    let a = obj(A::default());
    let b = obj(B::default());
    facade.add_component(a.clone());

    assert_eq!(facade.component_implementation_count("foo"), 1);
    assert_eq!(facade.forwarder().registry().cache_len(), 1);

    facade.add_component(b.clone());
    assert_eq!(facade.forwarder().registry().cache_len(), 0);
    assert_eq!(facade.component_implementation_count("foo"), 2);
    assert_eq!(facade.broadcast("foo", &[]).unwrap(), Val::S32(2));

    facade.remove_component(&*b);
    assert_eq!(facade.forwarder().registry().cache_len(), 0);
    assert_eq!(facade.component_implementation_count("foo"), 1);
    assert_eq!(facade.broadcast("foo", &[]).unwrap(), Val::S32(1));
}

#[test]
fn test_dropped_responder_makes_entry_stale() {
    let facade = Composed::new(ForwarderOptions::USE_CACHE, Plain).unwrap();
    let a = obj(A::default());
    let b = obj(B::default());
    facade.add_component(a.clone());
    facade.add_component(b.clone());

    assert_eq!(facade.broadcast("foo", &[]).unwrap(), Val::S32(2));
    drop(b);

    // The cached list still names B; it must be recomputed, not served.
    assert_eq!(ids(&facade.components_implementing_selector("foo")), ids(&[a.clone()]));
    assert_eq!(facade.broadcast("foo", &[]).unwrap(), Val::S32(1));
}

#[test]
fn test_uncached_forwarder_never_caches() {
    let facade = Composed::new(ForwarderOptions::NONE, Plain).unwrap();
    let a = obj(A::default());
    facade.add_component(a.clone());

    for _ in 0..3 {
        assert_eq!(facade.send("foo", &[]).unwrap(), Val::S32(1));
    }
    assert_eq!(facade.forwarder().cache_stats(), CacheStats::default());
    assert_eq!(facade.forwarder().registry().cache_len(), 0);
}
