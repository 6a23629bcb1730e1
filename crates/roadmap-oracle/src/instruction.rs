//! Generation instruction
//!
//! The instruction names every closed vocabulary so the oracle can pick valid
//! values, describes the JSON shape expected back and embeds the user request
//! verbatim.

use roadmap_model::{Category, Difficulty, Importance, NodeType, ResourceType};

/// System message sent alongside every instruction
pub const SYSTEM_MESSAGE: &str =
    "You are a helpful assistant that outputs JSON and strictly follows all validation rules.";

const RESPONSE_SHAPE: &str = r#"{
  "title": "Roadmap Title",
  "description": "Roadmap description",
  "category": "one-of-the-categories",
  "difficulty": "one-of-the-difficulties",
  "nodes": [
    {
      "title": "Node title",
      "description": "Node description",
      "nodeType": "one-of-the-node-types",
      "estimatedDuration": { "value": 2, "unit": "hours|days|weeks|months" },
      "importance": "low|medium|high|critical",
      "difficulty": "one-of-the-difficulties",
      "resources": [
        {
          "title": "Resource title",
          "url": "https://example.com",
          "resourceType": "one-of-the-resource-types",
          "description": "Resource description"
        }
      ],
      "children": []
    }
  ]
}"#;

fn bullet(names: &[&str]) -> String {
    names.join(", ")
}

/// Build the instruction for a free-text learning request
#[must_use]
pub fn build_instruction(request: &str) -> String {
    let importance: Vec<&str> = Importance::ALL.iter().map(Importance::as_str).collect();

    format!(
        "You design structured learning roadmaps. Turn the request below into a \
         hierarchical roadmap.\n\
         \n\
         Allowed values (use these exact strings):\n\
         - category: {categories}\n\
         - difficulty: {difficulties}\n\
         - nodeType: {node_types}\n\
         - resourceType: {resource_types}\n\
         - importance: {importance}\n\
         \n\
         Every node needs a title, a one or two sentence description, a nodeType, an \
         estimatedDuration, an importance and a difficulty. Attach resources where \
         useful and nest sub-topics under `children`.\n\
         \n\
         Request: \"{request}\"\n\
         \n\
         Reply with a single JSON object of exactly this shape:\n\
         {shape}\n",
        categories = bullet(&Category::names()),
        difficulties = bullet(&Difficulty::names()),
        node_types = bullet(&NodeType::names()),
        resource_types = bullet(&ResourceType::names()),
        importance = bullet(&importance),
        request = request,
        shape = RESPONSE_SHAPE,
    )
}

/// Strip a surrounding Markdown code fence (```json ... ```) if present
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", ...) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
