use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EventSlug {
    Mehndi,
    Wedding,
    Reception,
}

impl EventSlug {
    pub const ALL: [EventSlug; 3] = [EventSlug::Mehndi, EventSlug::Wedding, EventSlug::Reception];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventSlug::Mehndi => "mehndi",
            EventSlug::Wedding => "wedding",
            EventSlug::Reception => "reception",
        }
    }
}

impl fmt::Display for EventSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mehndi" => Ok(EventSlug::Mehndi),
            "wedding" => Ok(EventSlug::Wedding),
            "reception" => Ok(EventSlug::Reception),
            other => Err(format!("Unknown event '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "date")]
    pub event_date: Option<String>,
    #[serde(rename = "time")]
    pub event_time: Option<String>,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub dress_code: Option<String>,
    pub map_embed_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(slug: EventSlug, title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            slug: slug.to_string(),
            title,
            description,
            event_date: None,
            event_time: None,
            venue: None,
            address: None,
            dress_code: None,
            map_embed_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_parse_roundtrip() {
        for slug in EventSlug::ALL {
            assert_eq!(slug.as_str().parse::<EventSlug>().unwrap(), slug);
        }
        assert!("haldi".parse::<EventSlug>().is_err());
    }
}
