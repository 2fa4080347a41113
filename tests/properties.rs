//! Universal invariants that must hold regardless of specific scenario
//! inputs: lattice laws, trust monotonicity/boundedness, resolver
//! determinism, DY knowledge monotonicity, lockfile round-trips.

use std::collections::BTreeMap;

use skillfortify::dependency::constraints::{SkillConflict, SkillDependency, VersionConstraint};
use skillfortify::dependency::graph::SkillNode;
use skillfortify::lockfile::{Lockfile, SkillSource, compute_integrity, verify_integrity};
use skillfortify::threat::DYSkillAttacker;
use skillfortify::trust::{TrustEngine, TrustSignals};
use skillfortify::{
    AccessLevel, AgentDependencyGraph, Capability, CapabilitySet, DependencyResolver,
    IntegrityStatus,
};

#[test]
fn access_lattice_laws_hold_over_every_pair() {
    use AccessLevel::*;
    let levels = [None, Read, Write, Admin];
    for &a in &levels {
        for &b in &levels {
            assert_eq!(AccessLevel::join(a, b), AccessLevel::join(b, a));
            assert_eq!(AccessLevel::meet(a, b), AccessLevel::meet(b, a));
            assert_eq!(a <= b, AccessLevel::join(a, b) == b);
        }
        assert_eq!(AccessLevel::join(a, AccessLevel::None), a);
        assert_eq!(AccessLevel::join(a, AccessLevel::Admin), AccessLevel::Admin);
    }
}

#[test]
fn capability_set_has_one_entry_per_resource() {
    let set = CapabilitySet::from_list([
        Capability::new("network", AccessLevel::Read),
        Capability::new("network", AccessLevel::Admin),
        Capability::new("network", AccessLevel::Write),
    ]);
    assert_eq!(set.len(), 1);
    assert_eq!(set.get("network"), Some(AccessLevel::Admin));
}

#[test]
fn violations_empty_iff_subset() {
    let inferred = CapabilitySet::from_list([Capability::new("shell", AccessLevel::Write)]);
    let permissive = CapabilitySet::from_list([Capability::new("shell", AccessLevel::Admin)]);
    let restrictive = CapabilitySet::from_list([Capability::new("shell", AccessLevel::Read)]);

    assert_eq!(
        inferred.violations_against(&permissive).is_empty(),
        inferred.is_subset_of(&permissive)
    );
    assert_eq!(
        inferred.violations_against(&restrictive).is_empty(),
        inferred.is_subset_of(&restrictive)
    );
}

#[test]
fn trust_is_monotone_in_every_signal() {
    let engine = TrustEngine::new(None, None).unwrap();
    let low = TrustSignals::new(0.2, 0.2, 0.2, 0.2);
    let high = TrustSignals::new(0.2, 0.2, 0.2, 0.9);
    assert!(high.component_wise_ge(&low));
    assert!(engine.compute_intrinsic(&high).unwrap() >= engine.compute_intrinsic(&low).unwrap());
}

#[test]
fn trust_scores_are_always_bounded() {
    let engine = TrustEngine::new(None, None).unwrap();
    for p in [0.0, 0.3, 0.7, 1.0] {
        let signals = TrustSignals::new(p, p, p, p);
        let score = engine.compute_score("s", "1.0.0", signals, None).unwrap();
        assert!((0.0..=1.0).contains(&score.intrinsic_score));
        assert!((0.0..=1.0).contains(&score.effective_score));
    }
}

#[test]
fn effective_equals_intrinsic_without_dependencies() {
    let engine = TrustEngine::new(None, None).unwrap();
    let signals = TrustSignals::new(0.6, 0.6, 0.6, 0.6);
    let score = engine.compute_score("s", "1.0.0", signals, None).unwrap();
    assert!((score.effective_score - score.intrinsic_score).abs() < 1e-9);
}

#[test]
fn resolver_never_installs_two_versions_of_the_same_skill() {
    let mut graph = AgentDependencyGraph::new();
    graph.add_skill(SkillNode::new("lib", "1.0.0"));
    graph.add_skill(SkillNode::new("lib", "2.0.0"));
    graph.add_skill(SkillNode::new("lib", "3.0.0"));

    let resolver = DependencyResolver::new(&graph);
    let mut requirements = BTreeMap::new();
    requirements.insert("lib".to_string(), VersionConstraint::parse("*").unwrap());
    let resolution = resolver.resolve(&requirements, None).unwrap();

    assert!(resolution.success);
    let lib_versions = resolution
        .installed
        .iter()
        .filter(|(name, _)| name.as_str() == "lib")
        .count();
    assert_eq!(lib_versions, 1);
}

#[test]
fn resolver_never_installs_conflicting_pairs() {
    let mut graph = AgentDependencyGraph::new();
    let mut app = SkillNode::new("app", "1.0.0");
    app.conflicts.push(SkillConflict {
        skill_name: "lib".to_string(),
        constraint: VersionConstraint::parse("2.0.0").unwrap(),
    });
    graph.add_skill(app);
    graph.add_skill(SkillNode::new("lib", "2.0.0"));

    let resolver = DependencyResolver::new(&graph);
    let mut requirements = BTreeMap::new();
    requirements.insert("app".to_string(), VersionConstraint::parse("*").unwrap());
    requirements.insert(
        "lib".to_string(),
        VersionConstraint::parse("2.0.0").unwrap(),
    );
    let resolution = resolver.resolve(&requirements, None).unwrap();
    assert!(!resolution.success);
}

#[test]
fn resolution_is_deterministic() {
    let mut graph = AgentDependencyGraph::new();
    let mut app = SkillNode::new("app", "1.0.0");
    app.dependencies.push(SkillDependency {
        skill_name: "lib".to_string(),
        constraint: VersionConstraint::parse(">=1.0.0").unwrap(),
    });
    graph.add_skill(app);
    graph.add_skill(SkillNode::new("lib", "1.4.0"));

    let resolver = DependencyResolver::new(&graph);
    let mut requirements = BTreeMap::new();
    requirements.insert("app".to_string(), VersionConstraint::parse("*").unwrap());

    let r1 = resolver.resolve(&requirements, None).unwrap();
    let r2 = resolver.resolve(&requirements, None).unwrap();
    assert_eq!(r1, r2);
}

#[test]
fn dy_knowledge_is_monotone_across_every_operation() {
    use skillfortify::threat::{SkillMessage, SupplyChain};

    let mut chain = SupplyChain::example();
    let mut dy = DYSkillAttacker::new();
    let mut last_len = dy.knowledge().len();

    let a = dy.intercept(SkillMessage::new("a", "1.0.0", vec![1], ["network:read".to_string()]));
    assert!(dy.knowledge().len() >= last_len);
    last_len = dy.knowledge().len();

    dy.inject(
        SkillMessage::new("b", "1.0.0", vec![2], []),
        &mut chain,
        "official",
    )
    .unwrap();
    assert!(dy.knowledge().len() >= last_len);
    last_len = dy.knowledge().len();

    dy.synthesize(&[a.clone()], b"extra").unwrap();
    assert!(dy.knowledge().len() >= last_len);
    last_len = dy.knowledge().len();

    dy.decompose(a.clone());
    assert!(dy.knowledge().len() >= last_len);
    last_len = dy.knowledge().len();

    dy.replay(&a, &mut chain, "official").unwrap();
    assert!(dy.knowledge().len() >= last_len);
}

#[test]
fn lockfile_integrity_round_trips_through_json() {
    let mut graph = AgentDependencyGraph::new();
    graph.add_skill(SkillNode::new("app", "1.0.0"));

    let mut installed = BTreeMap::new();
    installed.insert("app".to_string(), "1.0.0".to_string());
    let resolution = skillfortify::Resolution {
        success: true,
        installed,
        conflicts: Vec::new(),
    };

    let mut sources = BTreeMap::new();
    sources.insert(
        ("app".to_string(), "1.0.0".to_string()),
        SkillSource {
            content: "print('hello')".to_string(),
            format: "claude".to_string(),
            source_path: Some("skills/app/SKILL.md".to_string()),
        },
    );

    let lockfile = Lockfile::from_resolution(&resolution, &graph, &sources);
    let json = serde_json::to_string(&lockfile).unwrap();
    let parsed: Lockfile = serde_json::from_str(&json).unwrap();
    assert_eq!(lockfile, parsed);

    let integrity_a = compute_integrity("print('hello')");
    let integrity_b = compute_integrity("print('hello')");
    assert_eq!(integrity_a, integrity_b);
    assert_eq!(
        verify_integrity(&integrity_a, "print('hello')"),
        IntegrityStatus::Match
    );
}
