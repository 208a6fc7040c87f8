// Group module
// Labeled row categories of the time table (people, rooms, resources)

use serde::{Deserialize, Serialize};

/// Anything the engine can lay out as a group. Identity is the id.
pub trait TimeTableGroup {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
}

impl Group {
    /// Create a group with a required, non-empty id.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Group id cannot be empty".to_string());
        }

        Ok(Self {
            id,
            title: title.into(),
            subtitle: None,
        })
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

impl TimeTableGroup for Group {
    fn id(&self) -> &str {
        &self.id
    }
}
