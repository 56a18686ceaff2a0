use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;
use crate::models::expense::{Expense, ExpenseCategory, MileageEntry};
use crate::storage::{load_json, save_json, KeyValueStore, CUSTOM_CATEGORIES_KEY};

/// Calendar month, written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for YearMonth {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::BadRequest(format!("invalid month {raw:?}, expected YYYY-MM"));
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        Ok(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

pub fn total_expenses<'a>(expenses: impl IntoIterator<Item = &'a Expense>, month: YearMonth) -> f64 {
    expenses
        .into_iter()
        .filter(|e| month.contains(e.date))
        .map(|e| e.amount)
        .sum()
}

pub fn total_mileage<'a>(entries: impl IntoIterator<Item = &'a MileageEntry>, month: YearMonth) -> f64 {
    entries
        .into_iter()
        .filter(|m| month.contains(m.date))
        .map(|m| m.distance)
        .sum()
}

pub fn expenses_by_category<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    category: &ExpenseCategory,
    month: YearMonth,
) -> f64 {
    expenses
        .into_iter()
        .filter(|e| &e.category == category && month.contains(e.date))
        .map(|e| e.amount)
        .sum()
}

/// Totals per category label for one month.
pub fn category_totals<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    month: YearMonth,
) -> BTreeMap<String, f64> {
    expenses
        .into_iter()
        .filter(|e| month.contains(e.date))
        .fold(BTreeMap::new(), |mut totals, e| {
            *totals.entry(e.category.label().to_string()).or_insert(0.0) += e.amount;
            totals
        })
}

pub fn custom_categories(store: &dyn KeyValueStore) -> Result<Vec<String>, AppError> {
    Ok(load_json(store, CUSTOM_CATEGORIES_KEY)?.unwrap_or_default())
}

/// Adds a user-defined category label. Built-in labels and duplicates are
/// ignored. Returns the full custom list.
pub fn add_custom_category(store: &dyn KeyValueStore, label: &str) -> Result<Vec<String>, AppError> {
    let category = ExpenseCategory::from_label(label);
    let ExpenseCategory::Custom(label) = category else {
        return custom_categories(store);
    };
    if label.is_empty() {
        return Err(AppError::BadRequest("category cannot be empty".to_string()));
    }

    let mut categories = custom_categories(store)?;
    if !categories.contains(&label) {
        categories.push(label);
        save_json(store, CUSTOM_CATEGORIES_KEY, &categories)?;
    }
    Ok(categories)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::{
        add_custom_category, category_totals, expenses_by_category, total_expenses, total_mileage,
        YearMonth,
    };
    use crate::error::AppError;
    use crate::models::expense::{Expense, ExpenseCategory, MileageEntry};
    use crate::storage::MemoryStore;

    pub(crate) fn expense(date: (i32, u32, u32), category: ExpenseCategory, amount: f64) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            category,
            amount,
            miles: None,
            notes: None,
            job_id: None,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn trip(date: (i32, u32, u32), distance: f64, purpose: &str) -> MileageEntry {
        MileageEntry {
            id: Uuid::new_v4(),
            job_id: None,
            distance,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            purpose: Some(purpose.to_string()),
            job_related: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn year_month_parses_and_displays() {
        let month: YearMonth = "2025-06".parse().unwrap();
        assert_eq!(month, YearMonth { year: 2025, month: 6 });
        assert_eq!(month.to_string(), "2025-06");

        assert!(matches!("2025-13".parse::<YearMonth>(), Err(AppError::BadRequest(_))));
        assert!("June".parse::<YearMonth>().is_err());
    }

    #[test]
    fn monthly_totals_skip_other_months() {
        let june = YearMonth { year: 2025, month: 6 };
        let expenses = vec![
            expense((2025, 6, 1), ExpenseCategory::Fuel, 40.0),
            expense((2025, 6, 30), ExpenseCategory::Tolls, 5.5),
            expense((2025, 7, 1), ExpenseCategory::Fuel, 99.0),
        ];
        let mileage = vec![trip((2025, 6, 3), 120.0, "rides"), trip((2025, 5, 31), 7.0, "rides")];

        assert_eq!(total_expenses(&expenses, june), 45.5);
        assert_eq!(total_mileage(&mileage, june), 120.0);
        assert_eq!(expenses_by_category(&expenses, &ExpenseCategory::Fuel, june), 40.0);
    }

    #[test]
    fn category_totals_group_by_label() {
        let june = YearMonth { year: 2025, month: 6 };
        let expenses = vec![
            expense((2025, 6, 1), ExpenseCategory::Fuel, 40.0),
            expense((2025, 6, 2), ExpenseCategory::Fuel, 10.0),
            expense((2025, 6, 2), ExpenseCategory::Custom("dash cam".to_string()), 80.0),
        ];

        let totals = category_totals(&expenses, june);
        assert_eq!(totals.get("fuel"), Some(&50.0));
        assert_eq!(totals.get("dash cam"), Some(&80.0));
    }

    #[test]
    fn custom_categories_are_deduplicated() {
        let store = MemoryStore::new();
        add_custom_category(&store, "dash cam").unwrap();
        add_custom_category(&store, "dash cam").unwrap();
        let categories = add_custom_category(&store, "fuel").unwrap();

        assert_eq!(categories, vec!["dash cam".to_string()]);
        assert!(matches!(add_custom_category(&store, "  "), Err(AppError::BadRequest(_))));
    }
}
