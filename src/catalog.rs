//! Built-in food list and the pending selection for a meal

use futures_util::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Food, Meal};
use crate::store::SessionStore;

/// Searchable list of foods with known calorie counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    foods: Vec<Food>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            Food::new("Apple", 95),
            Food::new("Banana", 105),
            Food::new("Chicken Breast (100g)", 165),
            Food::new("White Rice (cup)", 205),
            Food::new("Boiled Egg", 78),
            Food::new("Green Salad", 15),
            Food::new("Whole Wheat Bread (slice)", 80),
        ])
    }
}

impl Catalog {
    pub fn new(foods: Vec<Food>) -> Self {
        Self { foods }
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    /// Case-insensitive substring match, in catalog order. A blank query
    /// matches nothing.
    pub fn search(&self, query: &str) -> Vec<&Food> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.foods
            .iter()
            .filter(|food| food.name.to_lowercase().contains(&query))
            .collect()
    }

    /// Exact name lookup, ignoring case
    pub fn find(&self, name: &str) -> Option<&Food> {
        self.foods
            .iter()
            .find(|food| food.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Outcome of [`Selection::save`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub failed: usize,
    /// Calories of the entries that were saved
    pub calories: u64,
}

/// Foods picked for one meal but not logged yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    meal_id: Option<Uuid>,
    foods: Vec<Food>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target a specific meal instead of the first loaded one
    pub fn for_meal(mut self, meal_id: Uuid) -> Self {
        self.meal_id = Some(meal_id);
        self
    }

    pub fn meal_id(&self) -> Option<Uuid> {
        self.meal_id
    }

    pub fn add(&mut self, food: Food) {
        self.foods.push(food);
    }

    /// Remove the food at `index`; out of range is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<Food> {
        (index < self.foods.len()).then(|| self.foods.remove(index))
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn total_calories(&self) -> u64 {
        self.foods.iter().map(|f| u64::from(f.calories)).sum()
    }

    /// Name of the targeted meal, `"Meal"` when it is not loaded.
    pub fn meal_name<'a>(&self, meals: &'a [Meal]) -> &'a str {
        self.resolve_meal(meals)
            .and_then(|id| meals.iter().find(|m| m.id == id))
            .map(|m| m.name.as_str())
            .unwrap_or("Meal")
    }

    fn resolve_meal(&self, meals: &[Meal]) -> Option<Uuid> {
        self.meal_id.or_else(|| meals.first().map(|m| m.id))
    }

    /// Log every selected food against the target meal, concurrently.
    ///
    /// Saved foods leave the selection; failed ones stay for a retry.
    pub async fn save(&mut self, store: &SessionStore) -> Result<SaveReport> {
        let meal_id = self
            .resolve_meal(&store.meals())
            .ok_or_else(|| Error::invalid_input("no meal selected"))?;

        let results = join_all(
            self.foods
                .iter()
                .map(|food| store.add_food_entry(meal_id, food)),
        )
        .await;

        let mut report = SaveReport::default();
        let mut remaining = Vec::new();
        for (food, result) in self.foods.drain(..).zip(results) {
            match result {
                Ok(_) => {
                    report.saved += 1;
                    report.calories += u64::from(food.calories);
                }
                Err(_) => {
                    report.failed += 1;
                    remaining.push(food);
                }
            }
        }
        self.foods = remaining;

        if report.failed > 0 {
            warn!(%meal_id, saved = report.saved, failed = report.failed, "some foods were not saved");
        } else {
            info!(%meal_id, saved = report.saved, calories = report.calories, "selection saved");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{clock, FakeRemote};
    use std::sync::Arc;

    #[test]
    fn search_is_case_insensitive_and_ordered() {
        let catalog = Catalog::default();
        let names: Vec<_> = catalog.search("e").iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Apple",
                "Chicken Breast (100g)",
                "White Rice (cup)",
                "Boiled Egg",
                "Green Salad",
                "Whole Wheat Bread (slice)"
            ]
        );
        assert_eq!(catalog.search("BAN")[0].calories, 105);
        assert!(catalog.search("   ").is_empty());
        assert!(catalog.search("pizza").is_empty());
    }

    #[test]
    fn find_matches_whole_name() {
        let catalog = Catalog::default();
        assert_eq!(catalog.find("boiled egg").map(|f| f.calories), Some(78));
        assert!(catalog.find("egg").is_none());
    }

    #[test]
    fn selection_totals_follow_edits() {
        let mut selection = Selection::new();
        selection.add(Food::new("Apple", 95));
        selection.add(Food::new("Banana", 105));
        selection.add(Food::new("Apple", 95));
        assert_eq!(selection.total_calories(), 295);

        assert_eq!(selection.remove(1).map(|f| f.name), Some("Banana".to_string()));
        assert!(selection.remove(9).is_none());
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.total_calories(), 190);
    }

    #[tokio::test]
    async fn save_defaults_to_first_meal() {
        let (user, meal) = (Uuid::new_v4(), Uuid::new_v4());
        let store = SessionStore::new(Arc::new(FakeRemote::seeded(user, meal))).with_clock(clock());
        store.refresh(user).await;
        let before = store.total_calories();

        let mut selection = Selection::new();
        selection.add(Food::new("Apple", 95));
        selection.add(Food::new("Boiled Egg", 78));
        assert_eq!(selection.meal_name(&store.meals()), "Breakfast");

        let report = selection.save(&store).await.unwrap();

        assert_eq!(
            report,
            SaveReport {
                saved: 2,
                failed: 0,
                calories: 173
            }
        );
        assert!(selection.is_empty());
        assert_eq!(store.meal_calories(meal), before + 173);
    }

    #[tokio::test]
    async fn save_keeps_failed_foods() {
        let (user, meal) = (Uuid::new_v4(), Uuid::new_v4());
        let remote = Arc::new(FakeRemote::seeded(user, meal));
        let store = SessionStore::new(remote.clone()).with_clock(clock());
        store.refresh(user).await;
        remote.fail("food_entries", true);

        let mut selection = Selection::new().for_meal(meal);
        selection.add(Food::new("Apple", 95));

        let report = selection.save(&store).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.saved, 0);
        assert_eq!(selection.len(), 1);
    }

    #[tokio::test]
    async fn save_without_meal_is_rejected() {
        let store = SessionStore::new(Arc::new(FakeRemote::default())).with_clock(clock());
        store.refresh(Uuid::new_v4()).await;

        let mut selection = Selection::new();
        selection.add(Food::new("Apple", 95));

        assert!(matches!(
            selection.save(&store).await,
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(selection.len(), 1);
    }
}
