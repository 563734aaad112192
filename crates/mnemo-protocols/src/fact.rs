//! User fact definitions.
//!
//! A fact is a single statement about a user, scoped to that user's partition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of fact; drives the immutability policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactType {
    Identity,
    Preference,
    Relationship,
    Temporal,
    Context,
}

impl FactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Preference => "preference",
            Self::Relationship => "relationship",
            Self::Temporal => "temporal",
            Self::Context => "context",
        }
    }

    /// Whether facts of this type are immutable unless stated otherwise.
    pub fn is_immutable_by_default(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

impl fmt::Display for FactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "identity" => Ok(Self::Identity),
            "preference" => Ok(Self::Preference),
            "relationship" => Ok(Self::Relationship),
            "temporal" => Ok(Self::Temporal),
            "context" => Ok(Self::Context),
            other => Err(format!("unknown fact type: {}", other)),
        }
    }
}

/// A fact about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFact {
    /// Optional ID (assigned by the store if not provided).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Natural-language statement.
    pub content: String,

    pub fact_type: FactType,

    /// Free-form grouping used for filtering.
    #[serde(default)]
    pub category: String,

    /// Extraction confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Immutable facts are superseded, never updated in place.
    pub is_immutable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    /// `None` means the fact is currently valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    /// Named entities mentioned in the fact.
    #[serde(default)]
    pub entities: Vec<String>,

    #[serde(default)]
    pub source_conversation_id: String,

    /// Partition key.
    pub user_id: String,

    pub created_at: DateTime<Utc>,
}

impl UserFact {
    pub fn new(
        user_id: impl Into<String>,
        content: impl Into<String>,
        fact_type: FactType,
    ) -> Self {
        Self {
            id: None,
            content: content.into(),
            fact_type,
            category: String::new(),
            confidence: 1.0,
            is_immutable: fact_type.is_immutable_by_default(),
            valid_from: None,
            valid_until: None,
            entities: Vec::new(),
            source_conversation_id: String::new(),
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_immutable(mut self, is_immutable: bool) -> Self {
        self.is_immutable = is_immutable;
        self
    }

    pub fn with_validity(
        mut self,
        valid_from: Option<DateTime<Utc>>,
        valid_until: Option<DateTime<Utc>>,
    ) -> Self {
        self.valid_from = valid_from;
        self.valid_until = valid_until;
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_source_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.source_conversation_id = conversation_id.into();
        self
    }

    /// Whether the fact is valid at the given instant.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        let started = self.valid_from.is_none_or(|from| from <= at);
        let not_ended = self.valid_until.is_none_or(|until| until > at);
        started && not_ended
    }
}

/// Query-time filters for facts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactFilters {
    /// Match any of these types (empty = all types).
    #[serde(default)]
    pub fact_types: Vec<FactType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Match facts mentioning any of these entities (empty = no constraint).
    #[serde(default)]
    pub entities: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f32>,

    /// Include facts whose `valid_until` is in the past.
    #[serde(default)]
    pub include_expired: bool,
}

impl FactFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fact_types(mut self, fact_types: Vec<FactType>) -> Self {
        self.fact_types = fact_types;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = Some(min_confidence);
        self
    }

    pub fn include_expired(mut self) -> Self {
        self.include_expired = true;
        self
    }
}

/// A fact returned by a query, with its ranking scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedFact {
    pub fact: UserFact,
    pub semantic_score: f32,
    pub bm25_score: f32,
    /// Final fused score used for ordering.
    pub score: f32,
}

#[cfg(test)]
#[path = "fact_tests.rs"]
mod tests;
