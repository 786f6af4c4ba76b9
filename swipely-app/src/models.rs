use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use swipely_datastore::{Record, Value};
use swipely_shared::errors::{AppError, ErrorCode};

// --- Gender ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            other => Err(AppError::new(
                ErrorCode::InvalidGender,
                format!("gender must be MALE or FEMALE, got {other:?}"),
            )),
        }
    }
}

// --- Profile ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub bio: String,
    pub gender: Gender,
    pub looking_for: Gender,
    /// Public URL or storage key of the profile picture.
    pub image: String,
    /// Authentication subject this profile belongs to.
    pub sub: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Id,
    Name,
    Gender,
    LookingFor,
    Sub,
}

impl Record for Profile {
    type Field = ProfileField;
    const KIND: &'static str = "profile";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, field: ProfileField) -> Value {
        match field {
            ProfileField::Id => self.id.into(),
            ProfileField::Name => self.name.clone().into(),
            ProfileField::Gender => self.gender.as_str().into(),
            ProfileField::LookingFor => self.looking_for.as_str().into(),
            ProfileField::Sub => self.sub.clone().into(),
        }
    }
}

/// Editor form contents. Every text field is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ProfileDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "bio is required"))]
    pub bio: String,
    #[validate(length(min = 1, message = "gender is required"))]
    pub gender: String,
    #[validate(length(min = 1, message = "looking_for is required"))]
    pub looking_for: String,
}

impl From<&Profile> for ProfileDraft {
    fn from(p: &Profile) -> Self {
        Self {
            name: p.name.clone(),
            bio: p.bio.clone(),
            gender: p.gender.to_string(),
            looking_for: p.looking_for.to_string(),
        }
    }
}

/// Partial update merged onto a fetched profile snapshot before writing.
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<Gender>,
    pub looking_for: Option<Gender>,
    pub image: Option<String>,
}

impl ProfileChanges {
    pub fn apply_to(self, mut profile: Profile) -> Profile {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(bio) = self.bio {
            profile.bio = bio;
        }
        if let Some(gender) = self.gender {
            profile.gender = gender;
        }
        if let Some(looking_for) = self.looking_for {
            profile.looking_for = looking_for;
        }
        if let Some(image) = self.image {
            profile.image = image;
        }
        profile
    }
}

// --- Match ---

/// Directed swipe intent from `user1_id` to `user2_id`; `is_match` flips to
/// true once the target swipes right back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub is_match: bool,
}

impl MatchRecord {
    pub fn pending(from: Uuid, to: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            user1_id: from,
            user2_id: to,
            is_match: false,
        }
    }

    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.user1_id == profile_id || self.user2_id == profile_id
    }

    /// The other side of the pair, as seen from `profile_id`.
    pub fn counterpart(&self, profile_id: Uuid) -> Uuid {
        if self.user1_id == profile_id {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Id,
    User1Id,
    User2Id,
    IsMatch,
}

impl Record for MatchRecord {
    type Field = MatchField;
    const KIND: &'static str = "match";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, field: MatchField) -> Value {
        match field {
            MatchField::Id => self.id.into(),
            MatchField::User1Id => self.user1_id.into(),
            MatchField::User2Id => self.user2_id.into(),
            MatchField::IsMatch => self.is_match.into(),
        }
    }
}
