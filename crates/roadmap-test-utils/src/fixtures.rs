//! Oracle answers and stores used across test suites

use roadmap_model::Roadmap;
use roadmap_store::{MemoryStore, RoadmapStore};
use serde_json::json;
use std::sync::Arc;

/// Oracle answer with a milestone holding one child, plus a second root:
/// three nodes, one resource each
pub fn three_node_json(title: &str, category: &str) -> String {
    json!({
        "title": title,
        "description": format!("Learn {title} step by step"),
        "category": category,
        "difficulty": "intermediate",
        "nodes": [
            {
                "title": "Foundations",
                "description": "Core ideas",
                "nodeType": "milestone",
                "estimatedDuration": {"value": 2, "unit": "weeks"},
                "importance": "critical",
                "difficulty": "beginner",
                "resources": [
                    {"title": "Official docs", "url": "https://docs.example.com", "resourceType": "documentation"}
                ],
                "children": [
                    {
                        "title": "First project",
                        "description": "Put it together",
                        "nodeType": "project",
                        "importance": "high",
                        "difficulty": "intermediate",
                        "resources": [
                            {"title": "Project ideas", "url": "https://ideas.example.com", "resourceType": "article"}
                        ]
                    }
                ]
            },
            {
                "title": "Going further",
                "description": "Advanced topics",
                "nodeType": "topic",
                "importance": "medium",
                "difficulty": "advanced",
                "resources": [
                    {"title": "Deep dive", "url": "https://video.example.com", "resourceType": "video"}
                ]
            }
        ]
    })
    .to_string()
}

/// Default valid answer
pub fn roadmap_json(title: &str) -> String {
    three_node_json(title, "other")
}

/// Answer lacking the required `nodes` field
pub fn missing_nodes_json(title: &str) -> String {
    json!({
        "title": title,
        "description": "No structure here",
        "category": "other",
        "difficulty": "beginner"
    })
    .to_string()
}

/// Memory store holding `roadmaps`
pub async fn store_with(roadmaps: Vec<Roadmap>) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    for roadmap in roadmaps {
        store.insert_roadmap(roadmap).await.expect("fixture roadmap ids are unique");
    }
    Arc::new(store)
}
