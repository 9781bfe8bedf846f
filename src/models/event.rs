use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: u32,
    pub title: String,
    pub description: String,
    /// Free-text date and time as entered by the organizer
    pub date: String,
    /// Attendees across all registrations, guests included
    pub votes: u32,
}

impl Event {
    pub fn new(id: u32, title: String, description: String, date: String) -> Self {
        Self {
            id,
            title,
            description,
            date,
            votes: 0,
        }
    }
}

/// Partial update of an event's descriptive fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.date.is_none()
    }

    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(date) = &self.date {
            event.date = date.clone();
        }
    }
}
