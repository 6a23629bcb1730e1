//! End-to-end tests for vote-driven quality and regeneration.
//!
//! Core guarantees exercised here:
//! - Reaching the downvote threshold flags a roadmap; one vote short does not.
//! - A flagged roadmap may be regenerated by anyone, a healthy one only by its
//!   owner or an admin.
//! - Regeneration replaces the tree, resets votes, bumps the version and
//!   records history, all in one commit.
//! - A failed regeneration leaves the roadmap untouched.
//! - Permission is re-checked when votes change the roadmap mid-regeneration.
//! - Only one regeneration of a roadmap runs at a time.

use pretty_assertions::assert_eq;
use roadmap_core::prelude::*;
use roadmap_core::{RegenerationError, VoteError};
use roadmap_quality::{QualityError, RegenerationGrant, VoteEffect};
use roadmap_test_utils::{missing_nodes_json, roadmap_json, FailingStore, ScriptedOracle};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const TITLE: &str = "Rust Web Services";

fn engine(config: EngineConfig, oracle: &Arc<ScriptedOracle>, store: Arc<dyn RoadmapStore>) -> RoadmapEngine {
    RoadmapEngine::new(config, store, Arc::clone(oracle) as _).expect("valid config")
}

async fn generated(engine: &RoadmapEngine, owner: UserId) -> GenerationOutcome {
    engine
        .generate(GenerateRequest::new("axum http servers").by(owner).community(true))
        .await
        .unwrap()
}

async fn downvote(engine: &RoadmapEngine, id: RoadmapId, voters: usize) {
    for _ in 0..voters {
        engine.vote(id, UserId::new(), Vote::Down).await.unwrap();
    }
}

/// Tenet: the downvote threshold is inclusive.
///
/// With the default threshold of 100, the 99th downvote leaves the roadmap
/// fresh and the 100th flags it.
#[tokio::test]
async fn hundredth_downvote_flags_roadmap() {
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let engine = engine(EngineConfig::default(), &oracle, Arc::new(MemoryStore::new()));
    let id = generated(&engine, UserId::new()).await.roadmap.id;

    downvote(&engine, id, 99).await;
    let roadmap = engine.store().find_roadmap(id).await.unwrap().unwrap();
    assert!(!roadmap.needs_regeneration);
    assert_eq!(roadmap.quality_score, 0.0);

    let tally = engine.vote(id, UserId::new(), Vote::Down).await.unwrap();
    assert!(tally.needs_regeneration);
    assert_eq!(tally.downvotes, 100);
}

/// Tenet: votes toggle and switch per voter.
#[tokio::test]
async fn votes_toggle_and_switch() {
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let engine = engine(EngineConfig::default(), &oracle, Arc::new(MemoryStore::new()));
    let id = generated(&engine, UserId::new()).await.roadmap.id;
    let voter = UserId::new();

    let cast = engine.vote(id, voter, Vote::Up).await.unwrap();
    assert_eq!(cast.effect, VoteEffect::Cast);
    assert_eq!(cast.quality_score, 100.0);

    let switched = engine.vote(id, voter, Vote::Down).await.unwrap();
    assert_eq!(switched.effect, VoteEffect::Switched);
    assert_eq!((switched.upvotes, switched.downvotes), (0, 1));

    let withdrawn = engine.vote(id, voter, Vote::Down).await.unwrap();
    assert_eq!(withdrawn.effect, VoteEffect::Withdrawn);
    assert_eq!((withdrawn.upvotes, withdrawn.downvotes), (0, 0));

    let missing = RoadmapId::new();
    assert_eq!(
        engine.vote(missing, voter, Vote::Up).await.unwrap_err(),
        VoteError::NotFound(missing)
    );
}

/// Tenet: a flagged roadmap is regenerated in place for any user.
///
/// Title and identity survive; votes, score and flag are reset, the version
/// goes up by one, history records the downvotes that triggered it and the
/// old tree is gone.
#[tokio::test]
async fn flagged_roadmap_is_regenerated_by_anyone() {
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let store = Arc::new(MemoryStore::new());
    let engine = engine(
        EngineConfig::default().with_downvote_threshold(3),
        &oracle,
        Arc::clone(&store) as _,
    );
    let original = generated(&engine, UserId::new()).await;
    let id = original.roadmap.id;
    downvote(&engine, id, 3).await;

    let stranger = Actor::user(UserId::new());
    let report = engine.regenerate(id, &stranger).await.unwrap();

    assert_eq!(report.grant, RegenerationGrant::QualityThreshold { threshold: 3 });
    assert_eq!(report.previous_downvotes, 3);

    let roadmap = store.find_roadmap(id).await.unwrap().unwrap();
    assert_eq!(roadmap.title, TITLE);
    assert_eq!(roadmap.version, original.roadmap.version + 1);
    assert!(roadmap.upvotes.is_empty() && roadmap.downvotes.is_empty());
    assert_eq!(roadmap.quality_score, 0.0);
    assert!(!roadmap.needs_regeneration);
    assert_eq!(roadmap.regeneration_history.len(), 1);
    assert_eq!(roadmap.regeneration_history[0].previous_downvotes, 3);
    assert_eq!(roadmap.updated_by, Some(stranger.id));

    let old: HashSet<_> = original.nodes.iter().map(|n| n.id).collect();
    let nodes = store.find_nodes(id).await.unwrap();
    assert_eq!(nodes.len(), 3);
    assert!(nodes.iter().all(|n| !old.contains(&n.id)));
    assert_eq!(store.find_resources(id).await.unwrap().len(), 3);

    let instructions = oracle.instructions();
    assert_eq!(instructions.len(), 2);
    assert!(instructions[1].contains(&format!("{TITLE} - Learn {TITLE} step by step")));
}

/// Tenet: healthy roadmaps are regenerated only by owner or admin.
#[tokio::test]
async fn healthy_roadmap_requires_owner_or_admin() {
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let engine = engine(EngineConfig::default(), &oracle, Arc::new(MemoryStore::new()));
    let owner = UserId::new();
    let id = generated(&engine, owner).await.roadmap.id;

    let err = engine.regenerate(id, &Actor::user(UserId::new())).await.unwrap_err();
    assert_eq!(err, RegenerationError::NotPermitted(QualityError::NotPermitted));

    let by_owner = engine.regenerate(id, &Actor::user(owner)).await.unwrap();
    assert_eq!(by_owner.grant, RegenerationGrant::Owner);

    let by_admin = engine.regenerate(id, &Actor::admin(UserId::new())).await.unwrap();
    assert_eq!(by_admin.grant, RegenerationGrant::Admin);
    assert_eq!(by_admin.roadmap.version, 3);
    assert_eq!(by_admin.roadmap.regeneration_history.len(), 2);

    let missing = RoadmapId::new();
    assert_eq!(
        engine.regenerate(missing, &Actor::admin(UserId::new())).await.unwrap_err(),
        RegenerationError::NotFound(missing)
    );
}

/// Tenet: invalid oracle output during regeneration changes nothing.
#[tokio::test]
async fn failed_generation_keeps_existing_tree() {
    let oracle = Arc::new(ScriptedOracle::new(missing_nodes_json(TITLE)).then(Ok(roadmap_json(TITLE))));
    let store = Arc::new(MemoryStore::new());
    let engine = engine(EngineConfig::default(), &oracle, Arc::clone(&store) as _);
    let original = generated(&engine, UserId::new()).await;
    let id = original.roadmap.id;

    let err = engine.regenerate(id, &Actor::admin(UserId::new())).await.unwrap_err();

    assert!(matches!(err, RegenerationError::Generation(GenerationError::Validation(_))));
    let roadmap = store.find_roadmap(id).await.unwrap().unwrap();
    assert_eq!(roadmap.version, original.roadmap.version);
    assert!(roadmap.regeneration_history.is_empty());
    let nodes: HashSet<_> = store.find_nodes(id).await.unwrap().iter().map(|n| n.id).collect();
    assert_eq!(nodes, original.nodes.iter().map(|n| n.id).collect());
    assert!(!engine.regeneration().is_active(id));
}

/// Tenet: a failed commit leaves the roadmap exactly as it was.
#[tokio::test]
async fn failed_commit_keeps_existing_tree() {
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let store = Arc::new(FailingStore::new(MemoryStore::new()).fail_commits());
    let engine = engine(EngineConfig::default(), &oracle, Arc::clone(&store) as _);
    let original = generated(&engine, UserId::new()).await;
    let id = original.roadmap.id;

    let err = engine.regenerate(id, &Actor::admin(UserId::new())).await.unwrap_err();

    assert!(matches!(err, RegenerationError::Store(_)));
    let roadmap = store.find_roadmap(id).await.unwrap().unwrap();
    assert_eq!(roadmap.version, 1);
    assert_eq!(store.find_nodes(id).await.unwrap().len(), 3);
    assert!(!engine.regeneration().is_active(id));

    store.heal();
    let report = engine.regenerate(id, &Actor::admin(UserId::new())).await.unwrap();
    assert_eq!(report.roadmap.version, 2);
}

/// Engine over `store` whose oracle answers after `delay`
fn slow_engine(config: EngineConfig, store: Arc<dyn RoadmapStore>, delay: Duration) -> RoadmapEngine {
    let slow = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)).with_delay(delay));
    RoadmapEngine::new(config, store, slow as _).expect("valid config")
}

/// Tenet: a withdrawn downvote revokes a threshold grant mid-flight.
///
/// A stranger starts regenerating a flagged roadmap. While the oracle works,
/// a voter takes their downvote back and the roadmap drops below the
/// threshold. The commit then finds the roadmap changed, and the stranger is
/// no longer allowed to regenerate it.
#[tokio::test]
async fn withdrawn_downvote_revokes_pending_regeneration() {
    let config = EngineConfig::default().with_downvote_threshold(3);
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let engine = engine(config.clone(), &oracle, Arc::new(MemoryStore::new()));
    let original = generated(&engine, UserId::new()).await;
    let id = original.roadmap.id;
    let regretful = UserId::new();
    engine.vote(id, regretful, Vote::Down).await.unwrap();
    downvote(&engine, id, 2).await;

    let slow = slow_engine(config, Arc::clone(engine.store()), Duration::from_millis(100));
    let pending = {
        let slow = slow.clone();
        tokio::spawn(async move { slow.regenerate(id, &Actor::user(UserId::new())).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let tally = engine.vote(id, regretful, Vote::Down).await.unwrap();
    assert!(!tally.needs_regeneration);

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err, RegenerationError::NotPermitted(QualityError::NotPermitted));
    let roadmap = engine.store().find_roadmap(id).await.unwrap().unwrap();
    assert_eq!(roadmap.version, original.roadmap.version);
    assert_eq!(roadmap.downvotes.len(), 2);
    let nodes: HashSet<_> = engine.store().find_nodes(id).await.unwrap().iter().map(|n| n.id).collect();
    assert_eq!(nodes, original.nodes.iter().map(|n| n.id).collect());
}

/// Tenet: an admin regeneration survives concurrent votes.
///
/// The commit retries against the changed roadmap and clears the vote cast
/// in the meantime.
#[tokio::test]
async fn admin_regeneration_retries_after_concurrent_vote() {
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let engine = engine(EngineConfig::default(), &oracle, Arc::new(MemoryStore::new()));
    let id = generated(&engine, UserId::new()).await.roadmap.id;

    let slow = slow_engine(EngineConfig::default(), Arc::clone(engine.store()), Duration::from_millis(100));
    let pending = {
        let slow = slow.clone();
        tokio::spawn(async move { slow.regenerate(id, &Actor::admin(UserId::new())).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    engine.vote(id, UserId::new(), Vote::Up).await.unwrap();

    let report = pending.await.unwrap().unwrap();
    assert_eq!(report.grant, RegenerationGrant::Admin);
    assert_eq!(report.roadmap.version, 2);
    assert!(report.roadmap.upvotes.is_empty());
}

/// Tenet: concurrent regenerations of one roadmap are serialized.
///
/// While the first regeneration waits on a slow oracle, a second request for
/// the same roadmap is refused instead of racing it.
#[tokio::test]
async fn second_concurrent_regeneration_is_rejected() {
    let oracle = Arc::new(ScriptedOracle::new(roadmap_json(TITLE)));
    let engine = engine(EngineConfig::default(), &oracle, Arc::new(MemoryStore::new()));
    let id = generated(&engine, UserId::new()).await.roadmap.id;

    let slow_engine = slow_engine(EngineConfig::default(), Arc::clone(engine.store()), Duration::from_millis(200));

    let first = {
        let slow_engine = slow_engine.clone();
        tokio::spawn(async move { slow_engine.regenerate(id, &Actor::admin(UserId::new())).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(slow_engine.regeneration().is_active(id));

    let second = slow_engine.regenerate(id, &Actor::admin(UserId::new())).await;
    assert_eq!(second.unwrap_err(), RegenerationError::InProgress(id));

    let report = first.await.unwrap().unwrap();
    assert_eq!(report.roadmap.version, 2);
    assert!(!slow_engine.regeneration().is_active(id));
}
