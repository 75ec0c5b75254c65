//! Core data types shared by training and leakage extraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a training sample (a row of the vertically partitioned dataset).
pub type RowIndex = usize;

/// Prediction, gradient and hessian value type.
pub type Score = f32;

/// Target value type. Class labels are stored as `0.0, 1.0, ...`.
pub type Label = f32;

/// Tree node identifier inside a tree's node arena.
pub type NodeIndex = usize;

/// Party identifier. `-1` denotes "no party" (the omniscient model owner).
pub type PartyId = i32;

/// Party id used to request the omniscient (model owner) viewpoint.
pub const OMNISCIENT_PARTY_ID: PartyId = -1;

/// Training algorithm that produced a tree.
///
/// All four algorithms share one node representation; the tag only decides
/// how rounds are weighted during extraction and which fitter grows trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingAlgorithm {
    /// Plain second-order gradient boosting
    XGBoost,
    /// Gradient boosting with encrypted gradient aggregation
    SecureBoost,
    /// Bagged trees with a Gini split criterion
    RandomForest,
    /// Bagged trees grown with encrypted label statistics
    SecureForest,
}

impl TrainingAlgorithm {
    /// Boosting algorithms chain rounds through a shared running prediction.
    pub fn is_boosting(&self) -> bool {
        matches!(self, TrainingAlgorithm::XGBoost | TrainingAlgorithm::SecureBoost)
    }

    /// Bagging algorithms fit rounds independently of each other.
    pub fn is_bagging(&self) -> bool {
        !self.is_boosting()
    }
}

impl Default for TrainingAlgorithm {
    fn default() -> Self {
        TrainingAlgorithm::XGBoost
    }
}

impl fmt::Display for TrainingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingAlgorithm::XGBoost => write!(f, "xgboost"),
            TrainingAlgorithm::SecureBoost => write!(f, "secureboost"),
            TrainingAlgorithm::RandomForest => write!(f, "randomforest"),
            TrainingAlgorithm::SecureForest => write!(f, "secureforest"),
        }
    }
}

/// Adversary viewpoint used when turning a tree into a leakage graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdversaryPolicy {
    /// The model owner, who observes every real split.
    Omniscient,
    /// One collaborating party that cannot see splits made on other
    /// parties' features.
    RestrictedParty(PartyId),
    /// A collaborator that only observes where splitting stops.
    FreeRider,
}

impl AdversaryPolicy {
    /// Resolve the policy from the classic `(is_freerider, target_party_id)`
    /// parameter pair. The free-rider flag wins over the party id.
    pub fn from_parameters(is_freerider: bool, target_party_id: PartyId) -> Self {
        if is_freerider {
            AdversaryPolicy::FreeRider
        } else if target_party_id == OMNISCIENT_PARTY_ID {
            AdversaryPolicy::Omniscient
        } else {
            AdversaryPolicy::RestrictedParty(target_party_id)
        }
    }
}

impl fmt::Display for AdversaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdversaryPolicy::Omniscient => write!(f, "omniscient"),
            AdversaryPolicy::RestrictedParty(id) => write!(f, "party-{}", id),
            AdversaryPolicy::FreeRider => write!(f, "freerider"),
        }
    }
}
