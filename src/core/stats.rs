//! Dashboard statistics.
//!
//! Simple reducers over the store's collections. Callers are expected to
//! refresh statuses before computing these so the counts reflect "now".

use crate::core::{
    member::Member,
    plan::{Plan, PlanType},
    status::MemberStatus,
};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    /// Number of members on record
    pub total_members: usize,
    /// Members with more than two weeks left
    pub active_members: usize,
    /// Members ending within two weeks
    pub expiring_members: usize,
    /// Members whose plan has ended
    pub expired_members: usize,
    /// Estimated monthly income from active members
    pub monthly_revenue: f64,
    /// Plans open for enrollment
    pub active_plans: usize,
    /// All plans in the catalog
    pub total_plans: usize,
}

impl DashboardStats {
    /// Computes the dashboard numbers from the current collections.
    #[must_use]
    pub fn compute(members: &[Member], plans: &[Plan]) -> Self {
        let count = |status: MemberStatus| members.iter().filter(|m| m.status == status).count();

        Self {
            total_members: members.len(),
            active_members: count(MemberStatus::Active),
            expiring_members: count(MemberStatus::ExpiringSoon),
            expired_members: count(MemberStatus::Expired),
            monthly_revenue: estimated_monthly_revenue(members),
            active_plans: plans.iter().filter(|p| p.is_active).count(),
            total_plans: plans.len(),
        }
    }
}

/// Sum of the monthly rate of every active member's enrolled plan.
///
/// Quarterly prices count a third per month and yearly prices a twelfth.
/// Members that are expiring soon or expired do not contribute.
#[must_use]
pub fn estimated_monthly_revenue(members: &[Member]) -> f64 {
    members
        .iter()
        .filter(|m| m.status == MemberStatus::Active)
        .map(|m| m.plan.plan_type.monthly_rate(m.plan.price))
        .sum()
}

/// Number of members enrolled per plan type, in `PlanType::ALL` order.
#[must_use]
pub fn plan_distribution(members: &[Member]) -> Vec<(PlanType, usize)> {
    PlanType::ALL
        .iter()
        .map(|&t| (t, members.iter().filter(|m| m.plan.plan_type == t).count()))
        .collect()
}

/// Totals shown on the plan catalog page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCatalogSummary {
    /// Plans open for enrollment
    pub active_plans: usize,
    /// Sum of active plan prices
    pub total_active_price: f64,
    /// Sum of active plans' monthly equivalents
    pub monthly_equivalent: f64,
}

impl PlanCatalogSummary {
    /// Summarizes the active part of the catalog.
    #[must_use]
    pub fn compute(plans: &[Plan]) -> Self {
        let active = || plans.iter().filter(|p| p.is_active);
        Self {
            active_plans: active().count(),
            total_active_price: active().map(|p| p.price).sum(),
            monthly_equivalent: active().map(Plan::monthly_rate).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::plan::default_catalog;
    use crate::core::store::RecordStore;
    use crate::test_utils::{sample_member, ts};
    use chrono::Duration;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn store() -> RecordStore {
        let now = ts(2024, 5, 1);
        let mut store = RecordStore::with_plans(default_catalog());

        let monthly = sample_member("m1", "Monthly Active", now, now + Duration::days(30));
        let mut quarterly =
            sample_member("m2", "Quarterly Active", now, now + Duration::days(90));
        quarterly.plan.plan_type = PlanType::Quarterly;
        quarterly.plan.price = 120.0;
        let mut yearly = sample_member("m3", "Yearly Active", now, now + Duration::days(365));
        yearly.plan.plan_type = PlanType::Yearly;
        yearly.plan.price = 360.0;
        let soon = sample_member("m4", "Monthly Soon", now, now + Duration::days(3));
        let gone = sample_member(
            "m5",
            "Monthly Gone",
            now - Duration::days(40),
            now - Duration::days(10),
        );

        for m in [monthly, quarterly, yearly, soon, gone] {
            store.add_member(m, now).unwrap();
        }
        store
    }

    #[test]
    fn test_dashboard_counts() {
        let store = store();
        let stats = DashboardStats::compute(store.members(), store.plans());
        assert_eq!(stats.total_members, 5);
        assert_eq!(stats.active_members, 3);
        assert_eq!(stats.expiring_members, 1);
        assert_eq!(stats.expired_members, 1);
        assert_eq!(stats.active_plans, 3);
        assert_eq!(stats.total_plans, 3);
    }

    #[test]
    fn test_revenue_counts_only_active_members() {
        let store = store();
        // 49.99 + 120/3 + 360/12
        assert!(close(
            estimated_monthly_revenue(store.members()),
            49.99 + 40.0 + 30.0
        ));
    }

    #[test]
    fn test_empty_collections() {
        let stats = DashboardStats::compute(&[], &[]);
        assert_eq!(stats.total_members, 0);
        assert!(close(stats.monthly_revenue, 0.0));
        assert!(plan_distribution(&[]).iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_plan_distribution() {
        let store = store();
        assert_eq!(
            plan_distribution(store.members()),
            vec![
                (PlanType::Monthly, 3),
                (PlanType::Quarterly, 1),
                (PlanType::Yearly, 1)
            ]
        );
    }

    #[test]
    fn test_catalog_summary_skips_inactive_plans() {
        let mut plans = default_catalog();
        plans[1].is_active = false;
        let summary = PlanCatalogSummary::compute(&plans);
        assert_eq!(summary.active_plans, 2);
        assert!(close(summary.total_active_price, 49.99 + 399.99));
        assert!(close(summary.monthly_equivalent, 49.99 + 399.99 / 12.0));
    }
}
