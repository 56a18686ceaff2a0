use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExpenseCategory {
    Fuel,
    Tolls,
    Maintenance,
    CarWash,
    Parking,
    Insurance,
    Registration,
    Repairs,
    Tires,
    OilChange,
    CarPayment,
    CleaningSupplies,
    PhoneBill,
    SnacksDrinks,
    Other,
    Custom(String),
}

const BUILT_IN: [(ExpenseCategory, &str); 15] = [
    (ExpenseCategory::Fuel, "fuel"),
    (ExpenseCategory::Tolls, "tolls"),
    (ExpenseCategory::Maintenance, "maintenance"),
    (ExpenseCategory::CarWash, "car_wash"),
    (ExpenseCategory::Parking, "parking"),
    (ExpenseCategory::Insurance, "insurance"),
    (ExpenseCategory::Registration, "registration"),
    (ExpenseCategory::Repairs, "repairs"),
    (ExpenseCategory::Tires, "tires"),
    (ExpenseCategory::OilChange, "oil_change"),
    (ExpenseCategory::CarPayment, "car_payment"),
    (ExpenseCategory::CleaningSupplies, "cleaning_supplies"),
    (ExpenseCategory::PhoneBill, "phone_bill"),
    (ExpenseCategory::SnacksDrinks, "snacks_drinks"),
    (ExpenseCategory::Other, "other"),
];

impl ExpenseCategory {
    pub fn label(&self) -> &str {
        match self {
            ExpenseCategory::Custom(label) => label,
            built_in => BUILT_IN
                .iter()
                .find(|(category, _)| category == built_in)
                .map(|(_, label)| *label)
                .unwrap_or("other"),
        }
    }

    /// Built-in labels map to their variant; anything else is `Custom`.
    pub fn from_label(raw: &str) -> Self {
        let label = raw.trim();
        BUILT_IN
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(label))
            .map(|(category, _)| category.clone())
            .unwrap_or_else(|| ExpenseCategory::Custom(label.to_string()))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ExpenseCategory::Custom(_))
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ExpenseCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ExpenseCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ExpenseCategory::from_label(&raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub miles: Option<f64>,
    pub notes: Option<String>,
    pub job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MileageEntry {
    pub id: Uuid,
    pub job_id: Option<Uuid>,
    pub distance: f64,
    pub date: NaiveDate,
    pub purpose: Option<String>,
    pub job_related: bool,
    pub created_at: DateTime<Utc>,
}
