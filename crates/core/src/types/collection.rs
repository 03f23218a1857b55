//! Product collections.

use serde::{Deserialize, Serialize};

use super::id::CollectionId;

/// A curated group of products, e.g. "Gift Sets".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_tolerates_missing_fields() {
        let collection: Collection =
            serde_json::from_str(r#"{"id": "pcol_01", "handle": "gift-sets", "metadata": null}"#)
                .unwrap();
        assert_eq!(collection.id.as_str(), "pcol_01");
        assert_eq!(collection.handle, "gift-sets");
        assert!(collection.title.is_empty());
        assert!(collection.metadata.is_none());
    }
}
