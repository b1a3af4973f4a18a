//! Risk scoring, explainability and driver ranking tests.

use churn_core::{
    config::DriverConfig,
    customer::{Contract, CustomerRecord, InternetService},
    drivers::{rank_drivers, SegmentRule},
    explain::explain,
    generator::generate_customers,
    scoring::{clamp_total, rank_by_risk, risk_factors, score, FactorCategory, RiskFactor, MAX_RISK_SCORE},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(
    contract: Contract,
    internet: InternetService,
    tenure: u32,
    monthly: f64,
    senior: bool,
) -> CustomerRecord {
    CustomerRecord {
        id: format!("{contract:?}-{internet:?}-{tenure}-{monthly}-{senior}"),
        contract,
        internet_service: internet,
        is_senior: senior,
        tenure_months: tenure,
        monthly_charge: monthly,
        churned: false,
    }
}

fn plain(id: usize, tenure: u32, churned: bool) -> CustomerRecord {
    CustomerRecord {
        id: format!("p-{id}"),
        contract: Contract::OneYear,
        internet_service: InternetService::Dsl,
        is_senior: false,
        tenure_months: tenure,
        monthly_charge: 60.0,
        churned,
    }
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Month-to-month, fiber, tenure 2, $95, not senior: 35+26+14+14+0.
#[test]
fn reference_customer_scores_89() {
    let c = customer(Contract::MonthToMonth, InternetService::Fiber, 2, 95.0, false);
    assert_eq!(score(&c), 89);
}

#[test]
fn score_bounds_match_factor_table() {
    let worst = customer(Contract::MonthToMonth, InternetService::Fiber, 1, 119.0, true);
    let best = customer(Contract::TwoYear, InternetService::None, 72, 18.0, false);
    assert_eq!(score(&worst), 94);
    assert_eq!(score(&best), 6, "minimum achievable score is the two-year contract alone");
}

/// Bracket edges: tenure brackets are inclusive ascending, charge
/// thresholds are checked high to low.
#[test]
fn bracket_edges() {
    let at = |tenure, monthly| {
        score(&customer(Contract::TwoYear, InternetService::None, tenure, monthly, false)) - 6
    };
    assert_eq!(at(3, 20.0), 26);
    assert_eq!(at(4, 20.0), 18);
    assert_eq!(at(6, 20.0), 18);
    assert_eq!(at(12, 20.0), 10);
    assert_eq!(at(24, 20.0), 6);
    assert_eq!(at(25, 20.0), 0);
    assert_eq!(at(30, 69.99), 0);
    assert_eq!(at(30, 70.0), 7);
    assert_eq!(at(30, 89.99), 7);
    assert_eq!(at(30, 90.0), 14);
}

/// Moving any single factor toward higher risk never lowers the score.
#[test]
fn score_is_monotone_per_factor() {
    let base = customer(Contract::TwoYear, InternetService::None, 40, 50.0, false);
    let s = score(&base);

    let riskier = [
        CustomerRecord { contract: Contract::OneYear, ..base.clone() },
        CustomerRecord { contract: Contract::MonthToMonth, ..base.clone() },
        CustomerRecord { internet_service: InternetService::Dsl, ..base.clone() },
        CustomerRecord { internet_service: InternetService::Fiber, ..base.clone() },
        CustomerRecord { tenure_months: 20, ..base.clone() },
        CustomerRecord { tenure_months: 2, ..base.clone() },
        CustomerRecord { monthly_charge: 75.0, ..base.clone() },
        CustomerRecord { monthly_charge: 100.0, ..base.clone() },
        CustomerRecord { is_senior: true, ..base.clone() },
    ];
    for r in &riskier {
        assert!(score(r) > s, "{} scored {} ≤ base {s}", r.id, score(r));
    }
}

/// Raw points above 100 clamp to 100; below that the sum passes through.
#[test]
fn total_clamps_at_one_hundred() {
    let factor = |category: FactorCategory, points: u32| RiskFactor {
        category,
        label: format!("{points} pts"),
        points,
    };

    let over = [factor(FactorCategory::Contract, 80), factor(FactorCategory::Tenure, 50)];
    assert_eq!(clamp_total(&over), MAX_RISK_SCORE);
    assert_eq!(MAX_RISK_SCORE, 100);

    let exact = [factor(FactorCategory::Contract, 60), factor(FactorCategory::Tenure, 40)];
    assert_eq!(clamp_total(&exact), 100);

    let under = [factor(FactorCategory::Contract, 35), factor(FactorCategory::Senior, 5)];
    assert_eq!(clamp_total(&under), 40);
}

// ── Explainability ───────────────────────────────────────────────────────────

/// explain().total must equal score() for every record.
#[test]
fn explanation_total_equals_score() {
    for c in generate_customers(1000, 2024) {
        let e = explain(&c);
        assert_eq!(e.total, score(&c), "explanation diverged for {}", c.id);
        assert_eq!(e.factors.len(), 5, "all categories reported, zeros included");
        let sum: u32 = e.factors.iter().map(|f| f.points).sum();
        assert_eq!(sum, e.total, "factor points sum to the total for {}", c.id);
    }
}

/// Factors sort by points descending; ties keep category order.
#[test]
fn explanation_orders_factors() {
    let c = customer(Contract::MonthToMonth, InternetService::Fiber, 2, 95.0, false);
    let e = explain(&c);

    let points: Vec<u32> = e.factors.iter().map(|f| f.points).collect();
    assert_eq!(points, vec![35, 26, 14, 14, 0]);

    // Internet and charge tie at 14: internet comes first.
    assert_eq!(e.factors[2].category, FactorCategory::Internet);
    assert_eq!(e.factors[3].category, FactorCategory::Charge);
    assert_eq!(e.factors[4].label, "Not a senior citizen");

    let visible: Vec<&str> = e.visible_factors().map(|f| f.label.as_str()).collect();
    assert_eq!(
        visible,
        vec!["Month-to-month contract", "Tenure 0–3 months", "Fiber optic", "Monthly ≥ $90"]
    );
}

#[test]
fn zero_point_factors_are_kept() {
    let c = customer(Contract::TwoYear, InternetService::None, 40, 30.0, false);
    let e = explain(&c);
    let zeros = e.factors.iter().filter(|f| f.points == 0).count();
    assert_eq!(zeros, 4, "tenure, internet, charge and senior all contribute 0");
    assert_eq!(e.factors[0].label, "Two year contract");
    assert_eq!(e.visible_factors().count(), 1);

    let categories: Vec<FactorCategory> = risk_factors(&c).iter().map(|f| f.category).collect();
    assert_eq!(
        categories,
        vec![
            FactorCategory::Contract,
            FactorCategory::Tenure,
            FactorCategory::Internet,
            FactorCategory::Charge,
            FactorCategory::Senior,
        ]
    );
}

// ── Risk table ───────────────────────────────────────────────────────────────

#[test]
fn risk_table_sorted_limited_and_flagged() {
    let rows = generate_customers(600, 5);
    let table = rank_by_risk(&rows, 65, 80);

    assert_eq!(table.len(), 80);
    for pair in table.windows(2) {
        assert!(pair[0].score >= pair[1].score, "risk table not sorted descending");
    }
    for row in &table {
        assert_eq!(row.at_risk, row.score >= 65);
        assert_eq!(row.score, score(&row.customer));
    }
}

// ── Drivers ──────────────────────────────────────────────────────────────────

/// "Tenure ≤ 6" with n=45 at 40% churn against a 20% baseline has lift 2.
#[test]
fn short_tenure_lift_is_two() {
    let mut rows = Vec::new();
    for i in 0..45 {
        rows.push(plain(i, 3, i < 18));
    }
    for i in 45..180 {
        rows.push(plain(i, 30, i < 45 + 18));
    }

    let drivers = rank_drivers(&rows, &DriverConfig::default());
    assert_eq!(drivers.len(), 1, "only the tenure segment is large enough");
    let d = &drivers[0];
    assert_eq!(d.rule, SegmentRule::ShortTenure);
    assert_eq!(d.name, "Tenure ≤ 6");
    assert_eq!(d.n, 45);
    assert!((d.rate - 40.0).abs() < 1e-9);
    assert!((d.lift - 2.0).abs() < 1e-9, "lift {}", d.lift);
}

/// Segments below 40 customers are never reported; output is lift-descending.
#[test]
fn drivers_respect_size_floor_and_order() {
    for seed in [1u64, 7, 99, 71313] {
        let rows = generate_customers(300, seed);
        let drivers = rank_drivers(&rows, &DriverConfig::default());
        assert!(drivers.len() <= 5);
        for d in &drivers {
            assert!(d.n >= 40, "seed {seed}: segment {} has n={}", d.name, d.n);
        }
        for pair in drivers.windows(2) {
            assert!(pair[0].lift >= pair[1].lift, "seed {seed}: drivers not sorted by lift");
        }
    }
}

/// Equal lift: larger n first, then declaration order.
#[test]
fn driver_ties_break_on_size_then_declaration() {
    // All short tenure; half fiber. Both halves churn at 20%.
    let mut rows = Vec::new();
    for i in 0..100 {
        let mut r = plain(i, 3, i % 5 == 0);
        if i % 2 == 0 {
            r.internet_service = InternetService::Fiber;
        }
        rows.push(r);
    }
    let drivers = rank_drivers(&rows, &DriverConfig::default());
    let rules: Vec<SegmentRule> = drivers.iter().map(|d| d.rule).collect();
    assert_eq!(rules, vec![SegmentRule::ShortTenure, SegmentRule::FiberOptic]);

    // Same n and same lift: declaration order decides.
    let mut rows = Vec::new();
    for i in 0..50 {
        let mut r = plain(i, 30, i < 10);
        r.contract = Contract::MonthToMonth;
        r.internet_service = InternetService::Fiber;
        rows.push(r);
    }
    let drivers = rank_drivers(&rows, &DriverConfig::default());
    let rules: Vec<SegmentRule> = drivers.iter().map(|d| d.rule).collect();
    assert_eq!(rules, vec![SegmentRule::MonthToMonth, SegmentRule::FiberOptic]);
}

/// A churn-free subset floors the baseline instead of dividing by zero.
#[test]
fn zero_baseline_does_not_divide_by_zero() {
    let rows: Vec<CustomerRecord> = (0..60).map(|i| plain(i, 2, false)).collect();
    let drivers = rank_drivers(&rows, &DriverConfig::default());
    assert_eq!(drivers.len(), 1);
    assert!(drivers[0].lift.is_finite());
    assert_eq!(drivers[0].lift, 0.0);
}
