//! Mapping between facts and collection records.
//!
//! The embedding lives only in the collection; the remaining fact fields are
//! flattened into record metadata so collections can filter on them.

use chrono::{DateTime, Utc};
use mnemo_protocols::{CollectionHit, FactType, Metadata, StoreError, UserFact};
use serde_json::{json, Value};

pub const USER_ID: &str = "user_id";
pub const FACT_TYPE: &str = "fact_type";
pub const CATEGORY: &str = "category";
pub const CONFIDENCE: &str = "confidence";
pub const IS_IMMUTABLE: &str = "is_immutable";
pub const VALID_FROM: &str = "valid_from";
pub const VALID_UNTIL: &str = "valid_until";
pub const ENTITIES: &str = "entities";
pub const SOURCE_CONVERSATION_ID: &str = "source_conversation_id";
pub const CREATED_AT: &str = "created_at";

fn timestamp(at: Option<DateTime<Utc>>) -> Value {
    at.map_or(Value::Null, |t| json!(t.timestamp_millis()))
}

/// Flatten a fact into collection metadata.
pub fn to_metadata(fact: &UserFact) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(USER_ID.to_string(), json!(fact.user_id));
    metadata.insert(FACT_TYPE.to_string(), json!(fact.fact_type.as_str()));
    metadata.insert(CATEGORY.to_string(), json!(fact.category));
    metadata.insert(CONFIDENCE.to_string(), json!(fact.confidence));
    metadata.insert(IS_IMMUTABLE.to_string(), json!(fact.is_immutable));
    metadata.insert(VALID_FROM.to_string(), timestamp(fact.valid_from));
    metadata.insert(VALID_UNTIL.to_string(), timestamp(fact.valid_until));
    metadata.insert(ENTITIES.to_string(), json!(fact.entities));
    metadata.insert(
        SOURCE_CONVERSATION_ID.to_string(),
        json!(fact.source_conversation_id),
    );
    metadata.insert(CREATED_AT.to_string(), json!(fact.created_at.timestamp_millis()));
    metadata
}

fn malformed(key: &str) -> StoreError {
    StoreError::Serialization(format!("missing or malformed `{}` in record metadata", key))
}

fn required_str<'a>(metadata: &'a Metadata, key: &str) -> Result<&'a str, StoreError> {
    metadata.get(key).and_then(Value::as_str).ok_or_else(|| malformed(key))
}

fn optional_str(metadata: &Metadata, key: &str) -> Result<String, StoreError> {
    match metadata.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(malformed(key)),
    }
}

fn optional_timestamp(metadata: &Metadata, key: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    match metadata.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| malformed(key)),
    }
}

/// Rebuild a fact from a collection hit.
pub fn from_hit(hit: CollectionHit) -> Result<UserFact, StoreError> {
    let metadata = &hit.metadata;

    let fact_type: FactType = required_str(metadata, FACT_TYPE)?
        .parse()
        .map_err(StoreError::Serialization)?;

    let confidence = metadata
        .get(CONFIDENCE)
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(CONFIDENCE))? as f32;

    let is_immutable = metadata
        .get(IS_IMMUTABLE)
        .and_then(Value::as_bool)
        .ok_or_else(|| malformed(IS_IMMUTABLE))?;

    let entities = match metadata.get(ENTITIES) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| malformed(ENTITIES)))
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(malformed(ENTITIES)),
    };

    let created_at = optional_timestamp(metadata, CREATED_AT)?.ok_or_else(|| malformed(CREATED_AT))?;

    Ok(UserFact {
        user_id: required_str(metadata, USER_ID)?.to_string(),
        fact_type,
        category: optional_str(metadata, CATEGORY)?,
        confidence,
        is_immutable,
        valid_from: optional_timestamp(metadata, VALID_FROM)?,
        valid_until: optional_timestamp(metadata, VALID_UNTIL)?,
        entities,
        source_conversation_id: optional_str(metadata, SOURCE_CONVERSATION_ID)?,
        created_at,
        content: hit.document,
        id: Some(hit.id),
    })
}

/// The partition recorded in a hit's metadata, if any.
pub fn owner(metadata: &Metadata) -> Option<&str> {
    metadata.get(USER_ID).and_then(Value::as_str)
}
