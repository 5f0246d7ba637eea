//! Course catalogue records.

use serde::{Deserialize, Serialize};

use crate::Record;

/// Course level tag, serialized as `"BEGINNER"` / `"ADVANCED"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[default]
    Beginner,
    Advanced,
    /// Any tag this client does not know about.
    ///
    /// The server's string is not kept: an `Unknown` category serializes as `"UNKNOWN"`.
    /// Never put it in a `CourseChanges` sent to the server, or the original tag is overwritten.
    #[serde(other)]
    Unknown,
}

/// A course as served by `GET /api/courses`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[record(id)]
    pub id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub courses_list_icon: String,
    #[serde(default)]
    pub long_description: String,
    #[record(category)]
    pub category: Category,
    #[serde(default)]
    pub lessons_count: u32,
}
