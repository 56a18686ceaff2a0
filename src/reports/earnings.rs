use serde::Serialize;

use crate::engine::revenue::mileage_deduction;
use crate::models::expense::{Expense, MileageEntry};
use crate::models::job::{Job, JobStatus};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EarningsSummary {
    pub rides_completed: usize,
    pub gross_earnings: f64,
    pub app_share: f64,
    pub driver_share: f64,
    pub expenses_total: f64,
    pub miles_total: f64,
    pub mileage_deduction: f64,
    /// Driver share minus expenses.
    pub net_earnings: f64,
}

/// Lifetime totals over completed jobs, all expenses and all mileage.
pub fn summarize<'a>(
    jobs: impl IntoIterator<Item = &'a Job>,
    expenses: impl IntoIterator<Item = &'a Expense>,
    mileage: impl IntoIterator<Item = &'a MileageEntry>,
) -> EarningsSummary {
    let mut summary = jobs
        .into_iter()
        .filter(|job| job.status == JobStatus::Completed)
        .fold(EarningsSummary::default(), |mut acc, job| {
            acc.rides_completed += 1;
            acc.gross_earnings += job.gross_fare;
            acc.app_share += job.app_share;
            acc.driver_share += job.driver_share;
            acc
        });

    summary.expenses_total = expenses.into_iter().map(|e| e.amount).sum();
    summary.miles_total = mileage.into_iter().map(|m| m.distance).sum();
    summary.mileage_deduction = mileage_deduction(summary.miles_total);
    summary.net_earnings = summary.driver_share - summary.expenses_total;
    summary
}
