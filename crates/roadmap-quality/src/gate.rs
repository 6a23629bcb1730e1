//! Who may trigger a regeneration, and why

use crate::error::QualityError;
use crate::vote::QualityPolicy;
use roadmap_model::{Actor, Roadmap};
use serde::{Deserialize, Serialize};

/// Grounds on which a regeneration was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationGrant {
    /// Roadmap is flagged by its downvotes
    QualityThreshold { threshold: usize },
    /// Administrator override
    Admin,
    /// Roadmap owner override
    Owner,
}

impl RegenerationGrant {
    /// Text recorded in the regeneration history
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::QualityThreshold { threshold } => {
                format!("Quality threshold reached ({threshold}+ downvotes)")
            }
            Self::Admin => "Forced by administrator".to_string(),
            Self::Owner => "Requested by owner".to_string(),
        }
    }
}

impl QualityPolicy {
    /// Decide whether `actor` may regenerate `roadmap`
    ///
    /// A flagged roadmap may be regenerated by anyone; otherwise only an admin or
    /// the owner may force it.
    ///
    /// # Errors
    /// [`QualityError::NotPermitted`] otherwise
    pub fn authorize_regeneration(
        &self,
        actor: &Actor,
        roadmap: &Roadmap,
    ) -> Result<RegenerationGrant, QualityError> {
        if roadmap.needs_regeneration {
            Ok(RegenerationGrant::QualityThreshold {
                threshold: self.downvote_threshold,
            })
        } else if actor.is_admin() {
            Ok(RegenerationGrant::Admin)
        } else if roadmap.is_owned_by(actor.id) {
            Ok(RegenerationGrant::Owner)
        } else {
            Err(QualityError::NotPermitted)
        }
    }
}
