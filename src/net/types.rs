//! Wire DTOs for the gateway REST boundary.
//!
//! DESIGN
//! ======
//! Decoding is deliberately lenient where the backend is loose: ids may be
//! strings or integers (or Mongo-style `_id`), numeric profile fields may
//! arrive as numbers, and any role other than `admin` decodes as `Regular`.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Closed set of access roles. Unknown or missing roles are least-privileged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Regular,
    Admin,
}

impl Role {
    /// Map a raw wire role to the enumeration.
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(r) if r.eq_ignore_ascii_case("admin") => Self::Admin,
            _ => Self::Regular,
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_wire(raw.as_ref().and_then(serde_json::Value::as_str)))
    }
}

/// An authenticated user as returned by `/auth/login`, `/auth/register` and `/auth/me`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier; integer ids are stringified.
    #[serde(alias = "_id", deserialize_with = "deserialize_id")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Account handle chosen at registration, if the backend echoes it.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// City used for matching; absent until profile setup.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "isProfileComplete")]
    pub profile_complete: bool,
    /// Upload file name under `/uploads`.
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub budget: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub smoking: Option<String>,
    #[serde(default)]
    pub cleanliness: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_looking_for_roommate: Option<String>,
    #[serde(default)]
    pub has_apartment: Option<String>,
    #[serde(default)]
    pub food_preference: Option<String>,
    #[serde(default)]
    pub sleep_schedule: Option<String>,
    /// Account creation timestamp (ISO 8601) as sent by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Name to show in chrome: display name, then handle, then email.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return &self.name;
        }
        match self.username.as_deref() {
            Some(handle) if !handle.trim().is_empty() => handle,
            _ => &self.email,
        }
    }

    /// Calendar date the account was created, when the backend sends one.
    pub fn joined_on(&self) -> Option<&str> {
        self.created_at.as_deref().and_then(|ts| ts.get(..10)).filter(|d| d.len() == 10)
    }

    /// True once the user has a location and the backend marked the profile complete.
    pub fn has_complete_profile(&self) -> bool {
        self.profile_complete && self.location.as_deref().is_some_and(|l| !l.trim().is_empty())
    }

    /// Merge profile fields from `patch`, leaving absent fields untouched.
    pub fn apply(&mut self, patch: UserPatch) {
        let UserPatch {
            name,
            username,
            email,
            role,
            location,
            profile_complete,
            profile_image,
            budget,
            gender,
            smoking,
            cleanliness,
            bio,
            is_looking_for_roommate,
            has_apartment,
            food_preference,
            sleep_schedule,
        } = patch;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = email {
            self.email = v;
        }
        if let Some(v) = role {
            self.role = v;
        }
        if let Some(v) = profile_complete {
            self.profile_complete = v;
        }
        merge_opt(&mut self.username, username);
        merge_opt(&mut self.location, location);
        merge_opt(&mut self.profile_image, profile_image);
        merge_opt(&mut self.budget, budget);
        merge_opt(&mut self.gender, gender);
        merge_opt(&mut self.smoking, smoking);
        merge_opt(&mut self.cleanliness, cleanliness);
        merge_opt(&mut self.bio, bio);
        merge_opt(&mut self.is_looking_for_roommate, is_looking_for_roommate);
        merge_opt(&mut self.has_apartment, has_apartment);
        merge_opt(&mut self.food_preference, food_preference);
        merge_opt(&mut self.sleep_schedule, sleep_schedule);
    }
}

fn merge_opt(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Partial user record returned by `PUT /user/profile`.
///
/// Identity (`id`) is never patchable.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_role")]
    pub role: Option<Role>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "isProfileComplete")]
    pub profile_complete: Option<bool>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    pub budget: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub smoking: Option<String>,
    #[serde(default)]
    pub cleanliness: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_looking_for_roommate: Option<String>,
    #[serde(default)]
    pub has_apartment: Option<String>,
    #[serde(default)]
    pub food_preference: Option<String>,
    #[serde(default)]
    pub sleep_schedule: Option<String>,
}

impl From<User> for UserPatch {
    /// Every field of a freshly fetched user, minus the immutable id.
    fn from(user: User) -> Self {
        Self {
            name: Some(user.name),
            username: user.username,
            email: Some(user.email),
            role: Some(user.role),
            location: user.location,
            profile_complete: Some(user.profile_complete),
            profile_image: user.profile_image,
            budget: user.budget,
            gender: user.gender,
            smoking: user.smoking,
            cleanliness: user.cleanliness,
            bio: user.bio,
            is_looking_for_roommate: user.is_looking_for_roommate,
            has_apartment: user.has_apartment,
            food_preference: user.food_preference,
            sleep_schedule: user.sleep_schedule,
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Successful credential exchange.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Multipart submission for `PUT /user/profile`.
///
/// Text fields mirror the profile form; the image file only exists in the
/// browser build.
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    /// New password; omitted from the form when empty.
    pub password: String,
    pub location: String,
    pub budget: String,
    pub gender: String,
    pub smoking: String,
    pub cleanliness: String,
    pub bio: String,
    pub is_looking_for_roommate: String,
    pub has_apartment: String,
    pub food_preference: String,
    pub sleep_schedule: String,
    pub remove_image: bool,
    #[cfg(feature = "hydrate")]
    pub image: Option<web_sys::File>,
}

impl ProfileUpdate {
    /// Prefill the form from the current user, with the form's default choices.
    pub fn from_user(user: &User) -> Self {
        fn or(value: Option<&String>, fallback: &str) -> String {
            value.map_or_else(|| fallback.to_owned(), Clone::clone)
        }
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            password: String::new(),
            location: or(user.location.as_ref(), ""),
            budget: or(user.budget.as_ref(), ""),
            gender: or(user.gender.as_ref(), "Male"),
            smoking: or(user.smoking.as_ref(), "non-smoker"),
            cleanliness: or(user.cleanliness.as_ref(), "standard"),
            bio: or(user.bio.as_ref(), ""),
            is_looking_for_roommate: or(user.is_looking_for_roommate.as_ref(), "yes"),
            has_apartment: or(user.has_apartment.as_ref(), "no"),
            food_preference: or(user.food_preference.as_ref(), "any"),
            sleep_schedule: or(user.sleep_schedule.as_ref(), "flexible"),
            remove_image: false,
            #[cfg(feature = "hydrate")]
            image: None,
        }
    }

    /// Check the submission locally before it leaves the browser.
    ///
    /// Location is required for regular users because matching depends on it.
    pub fn validate(&self, role: Role) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("Enter a valid email address.".to_owned());
        }
        if role == Role::Regular && self.location.trim().is_empty() {
            return Err("Location is required to find matches.".to_owned());
        }
        if !self.budget.trim().is_empty() && self.budget.trim().parse::<u64>().is_err() {
            return Err("Budget must be a whole number.".to_owned());
        }
        Ok(())
    }

    /// Text parts of the multipart form, keyed by backend field name.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("name", self.name.trim().to_owned()),
            ("email", self.email.trim().to_owned()),
            ("location", self.location.trim().to_owned()),
            ("budget", self.budget.trim().to_owned()),
            ("gender", self.gender.clone()),
            ("smoking", self.smoking.clone()),
            ("cleanliness", self.cleanliness.clone()),
            ("bio", self.bio.clone()),
            ("isLookingForRoommate", self.is_looking_for_roommate.clone()),
            ("hasApartment", self.has_apartment.clone()),
            ("foodPreference", self.food_preference.clone()),
            ("sleepSchedule", self.sleep_schedule.clone()),
        ];
        if !self.password.is_empty() {
            fields.push(("password", self.password.clone()));
        }
        if self.remove_image {
            fields.push(("removeImage", "true".to_owned()));
        }
        fields
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        _ => Err(D::Error::custom("expected string or integer id")),
    }
}

fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(D::Error::custom("expected string or number")),
    }
}

fn deserialize_opt_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .map(|r| Role::from_wire(Some(r))))
}
