use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;
use validator::Validate;

/// A pinboard member as seen by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Member {
    /// Unique identifier
    pub id: Uuid,

    /// Owning user account
    pub user_id: Uuid,

    /// Display name
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    /// Job title or role
    #[validate(length(max = 200))]
    pub role: Option<String>,

    /// Company name
    #[validate(length(max = 200))]
    pub company: Option<String>,

    /// Free-text biography
    #[validate(length(max = 5000))]
    pub bio: Option<String>,

    /// Photo location
    pub photo_url: Option<String>,

    /// Pin color tag
    pub pin_color: PinColor,

    /// Visibility; only public members are searchable
    pub visibility: Visibility,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Create a new public member with the given display name
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.into(),
            role: None,
            company: None,
            bio: None,
            photo_url: None,
            pin_color: PinColor::default(),
            visibility: Visibility::Public,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_pin_color(mut self, pin_color: PinColor) -> Self {
        self.pin_color = pin_color;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Whether this member may appear in search results
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Pin color tag, drawn from a fixed palette
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PinColor {
    #[default]
    Cherry,
    Mustard,
    Teal,
    Lavender,
}

/// Member visibility
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}
