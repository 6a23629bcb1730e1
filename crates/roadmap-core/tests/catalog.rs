//! End-to-end tests for browsing, publishing and maintaining roadmaps.
//!
//! Core guarantees exercised here:
//! - Generated roadmaps stay private until an administrator publishes them.
//! - Detail views rebuild the generated tree and hide unapproved resources.
//! - Owners and administrators may edit or delete; nobody else may.
//! - Hand-written roadmaps land in one transaction, owned by their author.
//! - Node edits bump the version and never reach another roadmap's nodes.
//! - Seeding is idempotent and clearing removes every seeded record.

use pretty_assertions::assert_eq;
use roadmap_core::prelude::*;
use roadmap_core::{
    CatalogError, DetailsEdit, GeneratedNode, GeneratedResource, ListQuery, NewRoadmap, NodeEdit,
};
use roadmap_model::{Importance, NodeId, NodeType, ResourceType};
use roadmap_test_utils::{roadmap_json, ScriptedOracle};
use std::sync::Arc;

fn engine(store: Arc<dyn RoadmapStore>) -> RoadmapEngine {
    let oracle: Arc<ScriptedOracle> = Arc::new(ScriptedOracle::new(roadmap_json("Rust Web Services")));
    RoadmapEngine::new(EngineConfig::default(), store, oracle).expect("default config is valid")
}

/// Tenet: publication is an administrator decision.
#[tokio::test]
async fn generated_roadmap_is_listed_once_published() {
    let engine = engine(Arc::new(MemoryStore::new()));
    let outcome = engine.generate(GenerateRequest::new("axum http servers")).await.unwrap();
    let id = outcome.roadmap.id;
    let catalog = engine.catalog();

    assert_eq!(catalog.list_published(&ListQuery::default()).await.unwrap().total_items, 0);
    let err = catalog
        .set_published(id, &Actor::user(UserId::new()), true)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden(_)));

    let published = catalog.set_published(id, &Actor::admin(UserId::new()), true).await.unwrap();
    assert!(published.is_published && published.published_at.is_some());

    let query = ListQuery {
        search: Some("WEB serv".into()),
        ..ListQuery::default()
    };
    let page = catalog.list_published(&query).await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, id);
}

/// Tenet: the detail tree mirrors the generated structure.
///
/// The milestone's child sits under it and depends on it; the second root
/// stays at the top level.
#[tokio::test]
async fn detail_rebuilds_generated_tree() {
    let engine = engine(Arc::new(MemoryStore::new()));
    let outcome = engine.generate(GenerateRequest::new("axum http servers")).await.unwrap();

    let detail = engine.catalog().detail(outcome.roadmap.id).await.unwrap();

    assert!(detail.tree.orphans.is_empty());
    assert_eq!(detail.tree.placed(), 3);
    let titles: Vec<&str> = detail.tree.roots.iter().map(|r| r.node.title.as_str()).collect();
    assert_eq!(titles, vec!["Foundations", "Going further"]);

    let milestone = &detail.tree.roots[0];
    assert_eq!(milestone.children.len(), 1);
    let child = &milestone.children[0].node;
    assert_eq!(child.title, "First project");
    assert_eq!(child.depth, 1);
    assert_eq!(child.prerequisites, vec![milestone.node.id]);
    assert_eq!(child.dependencies, vec![milestone.node.id]);
    assert_eq!(detail.resources.len(), 3);
}

/// Tenet: unapproved community resources are not shown.
#[tokio::test]
async fn detail_hides_unapproved_resources() {
    let engine = engine(Arc::new(MemoryStore::new()));
    let outcome = engine
        .generate(GenerateRequest::new("axum http servers").by(UserId::new()).community(true))
        .await
        .unwrap();

    let detail = engine.catalog().detail(outcome.roadmap.id).await.unwrap();

    assert_eq!(detail.tree.placed(), 3);
    assert!(detail.resources.is_empty());
}

/// Tenet: only owners and administrators change a roadmap.
#[tokio::test]
async fn owner_edits_and_deletes() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(Arc::clone(&store) as _);
    let owner = UserId::new();
    let outcome = engine
        .generate(GenerateRequest::new("axum http servers").by(owner).community(true))
        .await
        .unwrap();
    let id = outcome.roadmap.id;
    let catalog = engine.catalog();

    let rename = DetailsEdit {
        title: Some("Axum in Production".into()),
        ..DetailsEdit::default()
    };
    let err = catalog
        .edit_details(id, &Actor::user(UserId::new()), rename.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden(_)));

    let blank = DetailsEdit {
        title: Some("  ".into()),
        ..DetailsEdit::default()
    };
    let err = catalog.edit_details(id, &Actor::user(owner), blank).await.unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));

    let edited = catalog.edit_details(id, &Actor::user(owner), rename).await.unwrap();
    assert_eq!(edited.title, "Axum in Production");
    assert_eq!(edited.slug, "axum-in-production");
    assert_eq!(edited.version, 2);
    assert!(edited.search_keywords.contains(&"axum".to_string()));

    let report = catalog.delete(id, &Actor::user(owner)).await.unwrap();
    assert_eq!((report.nodes, report.resources), (3, 3));
    assert!(store.snapshot().roadmaps.is_empty());
    assert!(store.snapshot().nodes.is_empty());
    assert_eq!(catalog.detail(id).await.unwrap_err(), CatalogError::NotFound(id));
}

fn tokio_internals(community: bool) -> NewRoadmap {
    let docs = GeneratedResource {
        title: "Tokio docs".into(),
        url: "https://docs.rs/tokio".into(),
        resource_type: ResourceType::Documentation,
        description: String::new(),
    };
    NewRoadmap {
        title: "Tokio Internals".into(),
        description: "Schedulers and wakers".into(),
        category: Category::Backend,
        tags: vec!["Async".into()],
        community,
        nodes: vec![GeneratedNode::titled("Runtime")
            .with_type(NodeType::Milestone)
            .with_children(vec![
                GeneratedNode::titled("Scheduler").with_resource(docs),
                GeneratedNode::titled("Wakers"),
            ])],
        ..NewRoadmap::default()
    }
}

/// Tenet: a hand-written roadmap is stored whole and owned by its author.
///
/// It is findable by exact title right away, with the full tree.
#[tokio::test]
async fn hand_written_roadmap_is_created_with_its_tree() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(Arc::clone(&store) as _);
    let author = Actor::user(UserId::new());

    let detail = engine
        .catalog()
        .create_with_nodes(&author, tokio_internals(true))
        .await
        .unwrap();

    let roadmap = &detail.roadmap;
    assert_eq!(roadmap.contributor, Some(author.id));
    assert_eq!(roadmap.updated_by, Some(author.id));
    assert!(roadmap.is_community_contributed && !roadmap.is_published);
    assert_eq!((roadmap.version, roadmap.revision), (1, 1));
    assert_eq!(roadmap.tags, vec!["async"]);
    assert_eq!(detail.tree.roots.len(), 1);
    let runtime = &detail.tree.roots[0];
    assert_eq!(runtime.children.len(), 2);
    assert_eq!(runtime.children[1].node.dependencies, vec![runtime.node.id]);
    // community resources wait for approval
    assert!(detail.resources.is_empty());

    let snapshot = store.snapshot();
    assert_eq!((snapshot.roadmaps.len(), snapshot.nodes.len(), snapshot.resources.len()), (1, 3, 1));

    let outcome = engine.generate(GenerateRequest::new("tokio internals")).await.unwrap();
    assert_eq!(outcome.source, OutcomeSource::ExactMatch);
    assert_eq!(outcome.nodes.len(), 3);

    let report = engine.catalog().delete(roadmap.id, &author).await.unwrap();
    assert_eq!((report.nodes, report.resources), (3, 1));
}

/// Tenet: invalid hand-written roadmaps store nothing.
#[tokio::test]
async fn invalid_hand_written_roadmap_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(Arc::clone(&store) as _);
    let author = Actor::user(UserId::new());

    let mut deep = GeneratedNode::titled("leaf");
    for level in 0..12 {
        deep = GeneratedNode::titled(format!("level {level}")).with_children(vec![deep]);
    }
    let too_deep = NewRoadmap {
        nodes: vec![deep],
        ..tokio_internals(false)
    };
    let err = engine.catalog().create_with_nodes(&author, too_deep).await.unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));

    let untitled = NewRoadmap {
        title: "   ".into(),
        ..tokio_internals(false)
    };
    let err = engine.catalog().create_with_nodes(&author, untitled).await.unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));

    assert!(store.snapshot().roadmaps.is_empty());
    assert!(store.snapshot().nodes.is_empty());
}

/// Tenet: node edits are structural updates scoped to one roadmap.
///
/// The owner's edit bumps the version once; edits naming another roadmap's
/// node or an unknown id are reported and leave those nodes alone.
#[tokio::test]
async fn node_edits_bump_version_and_stay_in_their_roadmap() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(Arc::clone(&store) as _);
    let owner = UserId::new();
    let outcome = engine
        .generate(GenerateRequest::new("axum http servers").by(owner).community(true))
        .await
        .unwrap();
    let id = outcome.roadmap.id;
    let foundations = outcome.nodes.iter().find(|n| n.title == "Foundations").unwrap().id;
    let other = engine
        .catalog()
        .create_with_nodes(&Actor::user(UserId::new()), tokio_internals(false))
        .await
        .unwrap();
    let foreign = other.tree.roots[0].node.id;
    let catalog = engine.catalog();

    let edits = vec![
        NodeEdit::new(foundations)
            .with_title("Axum foundations")
            .with_importance(Importance::Low),
        NodeEdit::new(foreign).with_title("Hijacked"),
        NodeEdit::new(NodeId::new()).with_title("Ghost"),
    ];
    let err = catalog
        .update_nodes(id, &Actor::user(UserId::new()), edits.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden(_)));

    let update = catalog.update_nodes(id, &Actor::user(owner), edits).await.unwrap();
    assert_eq!(update.updated, 1);
    assert_eq!(update.unmatched.len(), 2);
    assert!(update.failed.is_empty());
    assert_eq!(update.roadmap.version, 2);
    assert_eq!(update.roadmap.updated_by, Some(owner));

    let edited = update.nodes.iter().find(|n| n.id == foundations).unwrap();
    assert_eq!(edited.title, "Axum foundations");
    assert!(edited.is_optional);
    assert_eq!(edited.updated_by, Some(owner));
    assert_eq!(edited.depth, 0);
    let untouched = store.find_nodes(other.roadmap.id).await.unwrap();
    assert!(untouched.iter().all(|n| n.title != "Hijacked"));

    let blank = vec![NodeEdit::new(foundations).with_title(" ")];
    let err = catalog.update_nodes(id, &Actor::admin(UserId::new()), blank).await.unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));
    assert_eq!(store.find_roadmap(id).await.unwrap().unwrap().version, 2);
}

/// Tenet: seeding twice creates nothing new; clearing removes all seeds.
#[tokio::test]
async fn seeding_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine(Arc::clone(&store) as _);
    let seeder = engine.seeder();

    let first = seeder.seed_popular().await.unwrap();
    let second = seeder.seed_popular().await.unwrap();
    assert_eq!(first.created.len(), 10);
    assert!(second.created.is_empty());
    assert_eq!(second.skipped.len(), 10);

    let popular = engine.catalog().popular(20).await.unwrap();
    assert_eq!(popular.len(), 10);
    assert!(popular.iter().all(|r| r.is_pre_generated && r.quality_score == 100.0));

    let stats = engine.catalog().category_stats().await.unwrap();
    assert_eq!(stats.iter().map(|g| g.count).sum::<usize>(), 10);

    assert_eq!(seeder.clear_pre_generated().await.unwrap(), 10);
    assert!(store.snapshot().roadmaps.is_empty());
}
