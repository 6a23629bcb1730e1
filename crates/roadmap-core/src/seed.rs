//! Popular pre-generated roadmaps

use roadmap_model::{Category, Difficulty, Roadmap};
use roadmap_search::KeywordExtractor;
use roadmap_store::{FindOptions, RoadmapFilter, RoadmapStore, StoreError, Transaction, WriteOp};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Seed definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedRoadmap {
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub difficulty: Difficulty,
    pub tags: &'static [&'static str],
}

pub const POPULAR_ROADMAPS: &[SeedRoadmap] = &[
    SeedRoadmap {
        title: "Frontend Development",
        description: "Complete roadmap to become a frontend developer",
        category: Category::Frontend,
        difficulty: Difficulty::Beginner,
        tags: &["html", "css", "javascript", "react", "vue", "angular"],
    },
    SeedRoadmap {
        title: "Backend Development",
        description: "Master backend development with Node.js, Python, and more",
        category: Category::Backend,
        difficulty: Difficulty::Intermediate,
        tags: &["nodejs", "python", "java", "api", "database"],
    },
    SeedRoadmap {
        title: "Full Stack JavaScript",
        description: "Learn full stack development with JavaScript",
        category: Category::Frontend,
        difficulty: Difficulty::Intermediate,
        tags: &["javascript", "nodejs", "react", "mongodb", "express"],
    },
    SeedRoadmap {
        title: "DevOps Engineer",
        description: "Complete DevOps learning path",
        category: Category::Devops,
        difficulty: Difficulty::Advanced,
        tags: &["docker", "kubernetes", "ci/cd", "aws", "terraform"],
    },
    SeedRoadmap {
        title: "Python Programming",
        description: "Learn Python from basics to advanced",
        category: Category::Backend,
        difficulty: Difficulty::Beginner,
        tags: &["python", "django", "flask", "data-science"],
    },
    SeedRoadmap {
        title: "React Developer",
        description: "Master React.js and its ecosystem",
        category: Category::Frontend,
        difficulty: Difficulty::Intermediate,
        tags: &["react", "redux", "hooks", "nextjs"],
    },
    SeedRoadmap {
        title: "Data Science",
        description: "Complete data science learning path",
        category: Category::DataScience,
        difficulty: Difficulty::Intermediate,
        tags: &["python", "machine-learning", "pandas", "numpy", "tensorflow"],
    },
    SeedRoadmap {
        title: "Mobile App Development",
        description: "Learn to build mobile apps with React Native or Flutter",
        category: Category::Mobile,
        difficulty: Difficulty::Intermediate,
        tags: &["react-native", "flutter", "ios", "android"],
    },
    SeedRoadmap {
        title: "Cloud Computing",
        description: "Master cloud platforms and services",
        category: Category::Cloud,
        difficulty: Difficulty::Advanced,
        tags: &["aws", "azure", "gcp", "serverless"],
    },
    SeedRoadmap {
        title: "Cybersecurity Fundamentals",
        description: "Learn cybersecurity basics and best practices",
        category: Category::Cybersecurity,
        difficulty: Difficulty::Intermediate,
        tags: &["security", "ethical-hacking", "penetration-testing"],
    },
];

/// Outcome of a seeding run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

/// Seeds and clears pre-generated roadmaps
#[derive(Clone)]
pub struct Seeder {
    store: Arc<dyn RoadmapStore>,
    extractor: KeywordExtractor,
}

impl Seeder {
    #[must_use]
    pub fn new(store: Arc<dyn RoadmapStore>, extractor: KeywordExtractor) -> Self {
        Self { store, extractor }
    }

    fn build(&self, seed: &SeedRoadmap) -> Result<Roadmap, StoreError> {
        let mut roadmap = Roadmap::new(seed.title, seed.description)
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .with_category(seed.category)
            .with_difficulty(seed.difficulty)
            .with_tags(seed.tags)
            .with_search_keywords(self.extractor.extract(&format!("{} {}", seed.title, seed.description)))
            .pre_generated();
        roadmap.quality_score = 100.0;
        roadmap.stats.average_rating = 4.5;
        Ok(roadmap)
    }

    /// Insert `seeds` whose title is not already pre-generated
    ///
    /// # Errors
    /// Store failures; roadmaps created before the failure stay
    pub async fn seed(&self, seeds: &[SeedRoadmap]) -> Result<SeedReport, StoreError> {
        let existing = self
            .store
            .find_roadmaps(&RoadmapFilter::all().with_pre_generated(true), FindOptions::default())
            .await?;

        let mut report = SeedReport::default();
        for seed in seeds {
            if existing.iter().any(|r| r.title == seed.title) {
                debug!(title = seed.title, "already seeded");
                report.skipped.push(seed.title.to_string());
                continue;
            }
            self.store.insert_roadmap(self.build(seed)?).await?;
            report.created.push(seed.title.to_string());
        }

        info!(created = report.created.len(), skipped = report.skipped.len(), "seeding finished");
        Ok(report)
    }

    /// Seed [`POPULAR_ROADMAPS`]
    ///
    /// # Errors
    /// Store failures
    pub async fn seed_popular(&self) -> Result<SeedReport, StoreError> {
        self.seed(POPULAR_ROADMAPS).await
    }

    /// Delete every pre-generated roadmap with its nodes and resources
    ///
    /// # Errors
    /// Store failures; nothing is deleted then
    pub async fn clear_pre_generated(&self) -> Result<usize, StoreError> {
        let seeded = self
            .store
            .find_roadmaps(&RoadmapFilter::all().with_pre_generated(true), FindOptions::default())
            .await?;
        if seeded.is_empty() {
            return Ok(0);
        }

        let mut tx = Transaction::new();
        for roadmap in &seeded {
            tx.stage_clear_tree(roadmap.id)
                .stage(WriteOp::DeleteRoadmap(roadmap.id));
        }
        self.store.commit(tx).await?;
        info!(cleared = seeded.len(), "pre-generated roadmaps cleared");
        Ok(seeded.len())
    }
}
