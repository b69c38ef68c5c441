use crate::validation::DocumentId;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value, json};

const POST_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Body written to the backend by an insert. Field order matters for the echoed
/// payload, so `doc` comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub doc: String,
    pub id: String,
    #[serde(rename = "postDate")]
    pub post_date: String,
}

impl StoredDocument {
    /// Stamps the document with the current server-local time.
    pub fn new(id: &DocumentId) -> Self {
        Self::at(id, Local::now().naive_local())
    }

    pub fn at(id: &DocumentId, timestamp: NaiveDateTime) -> Self {
        StoredDocument {
            doc: format!("fcb-{id}"),
            id: id.to_string(),
            post_date: timestamp.format(POST_DATE_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Text,
}

/// Settings and mapping used for every index this service creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
    pub properties: Vec<(&'static str, FieldType)>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        IndexSettings {
            number_of_shards: 2,
            number_of_replicas: 1,
            properties: vec![
                ("id", FieldType::Integer),
                ("doc", FieldType::Text),
                ("postDate", FieldType::Text),
            ],
        }
    }
}

impl IndexSettings {
    /// Request body for the backend's create-index endpoint.
    pub fn request_body(&self) -> Value {
        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, field_type)| ((*name).to_owned(), json!({ "type": field_type })))
            .collect();

        json!({
            "settings": {
                "index": {
                    "number_of_shards": self.number_of_shards,
                    "number_of_replicas": self.number_of_replicas,
                }
            },
            "mappings": {
                "properties": properties,
            }
        })
    }
}
