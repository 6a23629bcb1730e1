//! Closed vocabularies
//!
//! Category, difficulty, node type, resource type, importance and duration unit are
//! closed sets. Each enum exposes `ALL` (used when instructing the oracle) and a
//! case-insensitive exact parser; lenient normalization with defaults lives in the
//! generation pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error for a value outside a closed vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Vocabulary name
    pub kind: &'static str,
    /// Offending value
    pub value: String,
}

macro_rules! closed_vocab {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            /// Every member, in declaration order
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// Wire representation
            #[inline]
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }

            /// Wire representations of every member
            #[must_use]
            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(Self::as_str).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

closed_vocab!(
    /// Roadmap category
    Category, "category" {
        Frontend => "frontend",
        Backend => "backend",
        Devops => "devops",
        Mobile => "mobile",
        DataScience => "data-science",
        Design => "design",
        ProductManagement => "product-management",
        Cybersecurity => "cybersecurity",
        Cloud => "cloud",
        Blockchain => "blockchain",
        Other => "other",
    }
);

closed_vocab!(
    /// Difficulty, ordered from easiest to hardest
    Difficulty, "difficulty" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
        Expert => "expert",
    }
);

closed_vocab!(
    /// Kind of roadmap node
    NodeType, "node type" {
        Topic => "topic",
        Skill => "skill",
        Milestone => "milestone",
        Project => "project",
        Checkpoint => "checkpoint",
    }
);

closed_vocab!(
    /// Kind of learning resource
    ResourceType, "resource type" {
        Article => "article",
        Video => "video",
        Course => "course",
        Book => "book",
        Documentation => "documentation",
        Podcast => "podcast",
        Cheatsheet => "cheatsheet",
        Tool => "tool",
        Other => "other",
    }
);

closed_vocab!(
    /// How essential a node is to the roadmap
    Importance, "importance" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

closed_vocab!(
    /// Unit of an estimated duration
    DurationUnit, "duration unit" {
        Hours => "hours",
        Days => "days",
        Weeks => "weeks",
        Months => "months",
    }
);

impl Default for Category {
    fn default() -> Self {
        Self::Other
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Beginner
    }
}

impl Default for NodeType {
    fn default() -> Self {
        Self::Topic
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        Self::Other
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self::Medium
    }
}

impl Difficulty {
    /// Numeric rank (beginner = 0)
    #[inline]
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
            Self::Expert => 3,
        }
    }
}

impl PartialOrd for Difficulty {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Difficulty {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}
