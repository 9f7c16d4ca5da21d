use serde_json::{Map, Value};

use crate::domain::Crn;

/// Course section as published by the course data service
///
/// Only the fields this service relies on are typed; everything else the
/// course data service sends is kept in `details` and passed through untouched.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Course {
    #[serde(rename = "CRN")]
    pub crn: Crn,
    #[serde(rename = "TITLE")]
    pub title: String,
    #[serde(rename = "STATUS")]
    pub status: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}
