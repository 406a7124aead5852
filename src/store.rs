//! Identity-scoped cache of the signed-in user's profile, meals and today's
//! food entries.
//!
//! The store owns three collections and a loading flag. It is hydrated from
//! the [`RemoteStore`] when an identity becomes present and emptied when it
//! becomes absent. Totals are derived on every read and never stored.
//!
//! Hydration is best effort: the three fetches run concurrently and each
//! result is applied on its own. A failed fetch is logged and leaves its
//! collection as it was. Every write is tagged with the session epoch it was
//! issued in, so results that settle after a logout or identity switch are
//! dropped instead of leaking into the next session.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::IdentityProvider;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::models::{self, Food, FoodEntry, Meal, NewFoodEntry, Profile};
use crate::postgrest::Filter;
use crate::remote::RemoteStore;

/// Today's intake against the goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySummary {
    pub consumed: u64,
    pub goal: u32,
    /// `consumed / goal * 100`, not capped at 100
    pub progress_percent: f64,
}

impl DailySummary {
    pub fn new(consumed: u64, goal: u32) -> Self {
        let progress_percent = if goal > 0 {
            consumed as f64 / f64::from(goal) * 100.0
        } else {
            0.0
        };
        Self {
            consumed,
            goal,
            progress_percent,
        }
    }
}

/// A meal with the calories logged against it today.
#[derive(Debug, Clone, PartialEq)]
pub struct MealSummary {
    pub meal: Meal,
    pub calories: u64,
}

#[derive(Debug)]
struct Tables {
    profiles: String,
    meals: String,
    food_entries: String,
}

impl From<&ClientOptions> for Tables {
    fn from(options: &ClientOptions) -> Self {
        Self {
            profiles: options.profiles_table.clone(),
            meals: options.meals_table.clone(),
            food_entries: options.food_entries_table.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    user_id: Option<Uuid>,
    epoch: u64,
    meals: Vec<Meal>,
    food_entries: Vec<FoodEntry>,
    profile: Option<Profile>,
    loading: bool,
}

impl State {
    fn reset(&mut self) {
        self.meals.clear();
        self.food_entries.clear();
        self.profile = None;
        self.loading = false;
    }
}

fn sum_calories<'a>(entries: impl Iterator<Item = &'a FoodEntry>) -> u64 {
    entries.map(|entry| u64::from(entry.calories)).sum()
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}

/// Handle to the session data. Clones share the same state.
#[derive(Clone)]
pub struct SessionStore {
    remote: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    tables: Arc<Tables>,
    state: Arc<RwLock<State>>,
}

impl SessionStore {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            clock: Arc::new(SystemClock),
            tables: Arc::new(Tables::from(&ClientOptions::default())),
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use the table names from `options`
    pub fn with_options(mut self, options: &ClientOptions) -> Self {
        self.tables = Arc::new(Tables::from(options));
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `update` only if no session change happened since `epoch`.
    fn apply(&self, epoch: u64, update: impl FnOnce(&mut State)) -> bool {
        let mut state = self.write();
        if state.epoch != epoch {
            debug!(
                epoch,
                current = state.epoch,
                "discarding result from a previous session"
            );
            return false;
        }
        update(&mut state);
        true
    }

    /// Identity the store is currently scoped to
    pub fn user_id(&self) -> Option<Uuid> {
        self.read().user_id
    }

    pub fn meals(&self) -> Vec<Meal> {
        self.read().meals.clone()
    }

    /// Entries for today, in fetch order followed by entries added since.
    pub fn food_entries(&self) -> Vec<FoodEntry> {
        self.read().food_entries.clone()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.read().profile.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn total_calories(&self) -> u64 {
        sum_calories(self.read().food_entries.iter())
    }

    pub fn meal_calories(&self, meal_id: Uuid) -> u64 {
        sum_calories(
            self.read()
                .food_entries
                .iter()
                .filter(|entry| entry.meal_id == meal_id),
        )
    }

    /// The profile's goal, or the default when it has none
    pub fn calorie_goal(&self) -> u32 {
        models::calorie_goal(self.read().profile.as_ref())
    }

    pub fn daily_summary(&self) -> DailySummary {
        let state = self.read();
        DailySummary::new(
            sum_calories(state.food_entries.iter()),
            models::calorie_goal(state.profile.as_ref()),
        )
    }

    /// Every loaded meal with its calorie subtotal, in fetch order
    pub fn meal_summaries(&self) -> Vec<MealSummary> {
        let state = self.read();
        state
            .meals
            .iter()
            .map(|meal| MealSummary {
                meal: meal.clone(),
                calories: sum_calories(
                    state
                        .food_entries
                        .iter()
                        .filter(|entry| entry.meal_id == meal.id),
                ),
            })
            .collect()
    }

    /// Hydrate the store for `user_id`.
    ///
    /// Never fails: each fetch error is logged and leaves that collection
    /// unchanged. Switching to a different identity first empties the store.
    pub async fn refresh(&self, user_id: Uuid) {
        let epoch = self.begin_refresh(user_id);
        self.hydrate(epoch, user_id).await;
    }

    /// Scope the store to `user_id` and mark it loading; returns the epoch
    /// the following fetches must be applied under.
    fn begin_refresh(&self, user_id: Uuid) -> u64 {
        let mut state = self.write();
        if state.user_id != Some(user_id) {
            state.epoch += 1;
            state.user_id = Some(user_id);
            state.reset();
        }
        state.loading = true;
        state.epoch
    }

    async fn hydrate(&self, epoch: u64, user_id: Uuid) {
        let today = self.clock.today();
        tokio::join!(
            self.fetch_profile(epoch, user_id),
            self.fetch_meals(epoch, user_id),
            self.fetch_food_entries(epoch, user_id, today),
        );

        if self.apply(epoch, |state| state.loading = false) {
            debug!(%user_id, "session data hydrated");
        }
    }

    async fn fetch_profile(&self, epoch: u64, user_id: Uuid) {
        let filter = Filter::new().eq("id", user_id);
        let result = match self.remote.select_one(&self.tables.profiles, &filter).await {
            Err(e) if e.is_not_found() => Ok(None),
            other => other.and_then(|row| {
                row.map(serde_json::from_value::<Profile>)
                    .transpose()
                    .map_err(Error::from)
            }),
        };

        match result {
            Ok(profile) => {
                self.apply(epoch, |state| state.profile = profile);
            }
            Err(e) => error!(error = %e, %user_id, "Error fetching profile"),
        }
    }

    async fn fetch_meals(&self, epoch: u64, user_id: Uuid) {
        let filter = Filter::new().eq("user_id", user_id);
        match self.fetch_rows::<Meal>(&self.tables.meals, &filter).await {
            Ok(meals) => {
                self.apply(epoch, |state| state.meals = meals);
            }
            Err(e) => error!(error = %e, %user_id, "Error fetching meals"),
        }
    }

    async fn fetch_food_entries(&self, epoch: u64, user_id: Uuid, today: chrono::NaiveDate) {
        let filter = Filter::new()
            .eq("user_id", user_id)
            .eq("entry_date", today);
        match self
            .fetch_rows::<FoodEntry>(&self.tables.food_entries, &filter)
            .await
        {
            Ok(entries) => {
                self.apply(epoch, |state| state.food_entries = entries);
            }
            Err(e) => error!(error = %e, %user_id, "Error fetching food entries"),
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, table: &str, filter: &Filter) -> Result<Vec<T>> {
        let rows = self.remote.select_many(table, filter).await?;
        decode_rows(rows)
    }

    /// Empty the store synchronously. Fetches still in flight are discarded
    /// when they settle.
    pub fn clear(&self) {
        let mut state = self.write();
        state.epoch += 1;
        state.user_id = None;
        state.reset();
    }

    /// Log `food` against `meal_id` for today.
    ///
    /// The meal is not checked against the loaded meals. On success the rows
    /// the server reports as inserted are appended to the food entries and
    /// returned.
    pub async fn add_food_entry(&self, meal_id: Uuid, food: &Food) -> Result<Vec<FoodEntry>> {
        let (user_id, epoch) = {
            let state = self.read();
            (state.user_id.ok_or(Error::NoSession)?, state.epoch)
        };

        let entry = NewFoodEntry {
            meal_id,
            user_id,
            name: food.name.clone(),
            calories: food.calories,
            entry_date: self.clock.today(),
        };

        match self.insert_entry(&entry).await {
            Ok(entries) => {
                self.apply(epoch, |state| {
                    state.food_entries.extend(entries.iter().cloned())
                });
                info!(%meal_id, name = %entry.name, calories = entry.calories, "food entry added");
                Ok(entries)
            }
            Err(e) => {
                error!(error = %e, %meal_id, "Error adding food entry");
                Err(e)
            }
        }
    }

    async fn insert_entry(&self, entry: &NewFoodEntry) -> Result<Vec<FoodEntry>> {
        let rows = serde_json::to_value([entry])?;
        let inserted = self.remote.insert(&self.tables.food_entries, rows).await?;
        decode_rows(inserted)
    }

    /// Merge `patch` into the cached profile without writing anywhere.
    ///
    /// For callers that already persisted the change. With no cached profile
    /// the result holds only the patched fields.
    pub fn patch_profile_locally(&self, patch: Profile) -> Result<Profile> {
        let mut state = self.write();
        if state.user_id.is_none() {
            return Err(Error::NoSession);
        }
        let profile = state.profile.get_or_insert_with(Profile::default);
        profile.merge(patch);
        Ok(profile.clone())
    }

    /// Creating meals is not supported yet.
    pub async fn create_meal(&self, name: &str, _icon: &str) -> Result<Meal> {
        Err(Error::NotImplemented(format!("creating meal '{}'", name)))
    }

    /// Follow `provider`: hydrate when an identity appears, clear when it goes.
    ///
    /// The store is scoped to the new identity before the fetches are spawned,
    /// so a logout handled before they first run still discards them.
    /// Fetches run on their own tasks so a logout is applied even while one
    /// is outstanding. The returned task ends when the provider is
    /// dropped.
    pub fn bind<P: IdentityProvider + ?Sized>(&self, provider: &P) -> JoinHandle<()> {
        let mut rx = provider.subscribe();
        let store = self.clone();

        tokio::spawn(async move {
            let mut current: Option<Uuid> = None;
            loop {
                let next = rx.borrow_and_update().identity.as_ref().map(|i| i.id);
                if next != current {
                    if current.is_some() {
                        info!("identity changed, clearing session data");
                        store.clear();
                    }
                    current = next;
                    if let Some(user_id) = next {
                        info!(%user_id, "identity present, hydrating session data");
                        let epoch = store.begin_refresh(user_id);
                        let store = store.clone();
                        tokio::spawn(async move { store.hydrate(epoch, user_id).await });
                    }
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
