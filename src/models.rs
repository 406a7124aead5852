//! Rows of the `profiles`, `meals` and `food_entries` tables

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Goal used for progress whenever the profile has none (or zero).
pub const DEFAULT_CALORIE_GOAL: u32 = 2500;

/// A user's profile.
///
/// Every field is optional: rows may have nulls, and a local patch applied
/// before the row was fetched produces a partial record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calorie_goal: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_calorie_goal(mut self, goal: u32) -> Self {
        self.calorie_goal = Some(goal);
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Shallow merge: fields set in `patch` overwrite, the rest are kept.
    pub fn merge(&mut self, patch: Profile) {
        if patch.id.is_some() {
            self.id = patch.id;
        }
        if patch.username.is_some() {
            self.username = patch.username;
        }
        if patch.calorie_goal.is_some() {
            self.calorie_goal = patch.calorie_goal;
        }
        if patch.avatar_url.is_some() {
            self.avatar_url = patch.avatar_url;
        }
        if patch.updated_at.is_some() {
            self.updated_at = patch.updated_at;
        }
    }
}

/// Daily goal for an optional profile, falling back to [`DEFAULT_CALORIE_GOAL`].
pub fn calorie_goal(profile: Option<&Profile>) -> u32 {
    profile
        .and_then(|p| p.calorie_goal)
        .filter(|goal| *goal > 0)
        .unwrap_or(DEFAULT_CALORIE_GOAL)
}

/// A named group of food entries, e.g. "Breakfast".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// One logged food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_id: Uuid,
    pub name: String,
    pub calories: u32,
    pub entry_date: NaiveDate,
}

/// Insert payload for `food_entries`; the id is assigned by the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFoodEntry {
    pub meal_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub calories: u32,
    pub entry_date: NaiveDate,
}

/// A food and its calorie count, before it is logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
    pub name: String,
    pub calories: u32,
}

impl Food {
    pub fn new(name: impl Into<String>, calories: u32) -> Self {
        Self {
            name: name.into(),
            calories,
        }
    }
}
