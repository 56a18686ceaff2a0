use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::engine::revenue::{mileage_deduction, STANDARD_MILEAGE_RATE};
use crate::error::AppError;
use crate::models::expense::{Expense, MileageEntry};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

/// Inclusive date range of `period` around `today`. Weeks start on Sunday.
pub fn date_range(period: Period, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    match period {
        Period::Daily => (today, today),
        Period::Weekly => {
            let start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
            (start, start + Duration::days(6))
        }
        Period::Monthly => {
            let start = today.with_day(1).unwrap_or(today);
            let next = if today.month() == 12 {
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
            };
            let end = next.and_then(|d| d.pred_opt()).unwrap_or(today);
            (start, end)
        }
        Period::Yearly => {
            let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
            let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
            (start, end)
        }
    }
}

fn section(rows: &[Vec<String>]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(row)
            .map_err(|err| AppError::Internal(format!("failed to write csv row: {err}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::Internal(format!("failed to flush csv: {err}")))?;
    String::from_utf8(bytes).map_err(|err| AppError::Internal(format!("csv is not valid utf8: {err}")))
}

fn row<const N: usize>(fields: [String; N]) -> Vec<String> {
    fields.into()
}

/// Renders the expense and mileage log for `period` as a sectioned CSV
/// report. Entries outside the period are left out.
pub fn generate_tax_csv(
    expenses: &[Expense],
    mileage: &[MileageEntry],
    period: Period,
    today: NaiveDate,
) -> Result<String, AppError> {
    let (start, end) = date_range(period, today);
    let in_range = |date: NaiveDate| date >= start && date <= end;

    let mut expenses: Vec<&Expense> = expenses.iter().filter(|e| in_range(e.date)).collect();
    expenses.sort_by_key(|e| e.date);
    let mut mileage: Vec<&MileageEntry> = mileage.iter().filter(|m| in_range(m.date)).collect();
    mileage.sort_by_key(|m| m.date);

    let total_expenses: f64 = expenses.iter().map(|e| e.amount).sum();
    let total_miles: f64 = mileage.iter().map(|m| m.distance).sum();
    let deduction = mileage_deduction(total_miles);

    let title = section(&[row([format!(
        "Tax Export Report ({} - {})",
        start.format("%b %-d, %Y"),
        end.format("%b %-d, %Y")
    )])])?;

    let mut expense_rows = vec![
        row(["EXPENSES".to_string()]),
        row([
            "Date".to_string(),
            "Category".to_string(),
            "Amount".to_string(),
            "Notes".to_string(),
        ]),
    ];
    expense_rows.extend(expenses.iter().map(|e| {
        row([
            e.date.format("%m/%d/%Y").to_string(),
            e.category.label().to_string(),
            format!("{:.2}", e.amount),
            e.notes.clone().unwrap_or_default(),
        ])
    }));

    let mut mileage_rows = vec![
        row(["MILEAGE LOG".to_string()]),
        row([
            "Date".to_string(),
            "Distance (miles)".to_string(),
            "Purpose".to_string(),
        ]),
    ];
    mileage_rows.extend(mileage.iter().map(|m| {
        row([
            m.date.format("%m/%d/%Y").to_string(),
            format!("{:.1}", m.distance),
            m.purpose.clone().unwrap_or_default(),
        ])
    }));

    let mileage_totals = [
        row(["Total Miles".to_string(), format!("{total_miles:.1}")]),
        row([
            format!("Estimated Deduction (@ ${STANDARD_MILEAGE_RATE:.2}/mi)"),
            format!("${deduction:.2}"),
        ]),
    ];

    let summary = [
        row(["SUMMARY".to_string()]),
        row(["Total Expenses".to_string(), format!("${total_expenses:.2}")]),
        row(["Total Business Miles".to_string(), format!("{total_miles:.1}")]),
        row(["Estimated Mileage Deduction".to_string(), format!("${deduction:.2}")]),
        row([
            "Total Estimated Deductions".to_string(),
            format!("${:.2}", total_expenses + deduction),
        ]),
    ];

    let parts = [
        title,
        section(&expense_rows)?,
        section(&[row(["Total Expenses".to_string(), format!("${total_expenses:.2}")])])?,
        section(&mileage_rows)?,
        section(&mileage_totals)?,
        section(&summary)?,
        "Note: This is an estimate and not professional tax advice. Consult a tax professional.\n"
            .to_string(),
    ];

    Ok(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{date_range, generate_tax_csv, Period};
    use crate::engine::expenses::tests::{expense, trip};
    use crate::models::expense::ExpenseCategory;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ranges_cover_the_expected_days() {
        let wednesday = day(2025, 6, 4);
        assert_eq!(date_range(Period::Daily, wednesday), (wednesday, wednesday));
        assert_eq!(date_range(Period::Weekly, wednesday), (day(2025, 6, 1), day(2025, 6, 7)));
        assert_eq!(date_range(Period::Monthly, wednesday), (day(2025, 6, 1), day(2025, 6, 30)));
        assert_eq!(date_range(Period::Yearly, wednesday), (day(2025, 1, 1), day(2025, 12, 31)));
        assert_eq!(
            date_range(Period::Monthly, day(2025, 12, 15)),
            (day(2025, 12, 1), day(2025, 12, 31))
        );
    }

    #[test]
    fn report_lists_entries_and_totals() {
        let mut fuel = expense((2025, 6, 2), ExpenseCategory::Fuel, 40.0);
        fuel.notes = Some("Shell, I-95".to_string());
        let expenses = vec![
            fuel,
            expense((2025, 6, 3), ExpenseCategory::Tolls, 5.5),
            expense((2025, 5, 30), ExpenseCategory::Fuel, 99.0),
        ];
        let mileage = vec![trip((2025, 6, 2), 100.0, "airport runs")];

        let csv = generate_tax_csv(&expenses, &mileage, Period::Monthly, day(2025, 6, 15)).unwrap();

        assert!(csv.starts_with("\"Tax Export Report (Jun 1, 2025 - Jun 30, 2025)\"\n"));
        assert!(csv.contains("EXPENSES\nDate,Category,Amount,Notes\n"));
        assert!(csv.contains("06/02/2025,fuel,40.00,\"Shell, I-95\"\n"));
        assert!(csv.contains("06/03/2025,tolls,5.50,\n"));
        assert!(!csv.contains("99.00"));
        assert!(csv.contains("Total Expenses,$45.50\n"));
        assert!(csv.contains("06/02/2025,100.0,airport runs\n"));
        assert!(csv.contains("Estimated Deduction (@ $0.67/mi),$67.00\n"));
        assert!(csv.contains("Total Estimated Deductions,$112.50\n"));
        assert!(csv.ends_with("Consult a tax professional.\n"));
    }
}
