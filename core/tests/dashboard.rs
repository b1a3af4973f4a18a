//! Dashboard session tests: commands, recompute consistency, offload.

use churn_core::{
    aggregate::{cohort_breakdown, kpi_summary},
    command::DashboardCommand,
    config::{AnalyticsConfig, DriverConfig},
    customer::{Contract, InternetService},
    dashboard::ChurnDashboard,
    error::AnalyticsError,
    filter::{filter, FilterCriteria, Selection},
    scoring::score,
};
use std::time::Duration;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn session() -> ChurnDashboard {
    ChurnDashboard::demo(AnalyticsConfig::default_test())
}

fn m2m_short() -> FilterCriteria {
    FilterCriteria {
        contract:         Selection::Only(Contract::MonthToMonth),
        internet_service: Selection::All,
        tenure_min:       0,
        tenure_max:       12,
    }
}

// ── Recompute ────────────────────────────────────────────────────────────────

/// Every panel in one view is computed from the same filtered subset.
#[test]
fn recompute_panels_share_one_subset() {
    let mut dash = session();
    dash.set_filters(m2m_short());
    let view = dash.recompute().unwrap();

    let subset = filter(dash.data(), &m2m_short());
    assert!(!subset.is_empty(), "fixture must leave customers after filtering");

    let kpis = view.kpis.expect("inline KPIs are always present without a worker");
    assert_eq!(kpis, kpi_summary(&subset));
    assert_eq!(view.kpi_seq, None);
    assert_eq!(view.pending_seq, None);
    assert_eq!(view.cohorts, cohort_breakdown(&subset));
    assert_eq!(view.filters, m2m_short());

    for row in &view.risk_table {
        assert!(m2m_short().matches(&row.customer), "{} leaked past the filter", row.customer.id);
        assert_eq!(row.score, score(&row.customer));
    }
    assert!(view.risk_table.len() <= dash.config.risk.limit);
    assert!((view.roi.current - kpis.churn).abs() < 1e-9, "what-if reads the same subset");
}

/// Filtering down to nothing is a valid, fully-populated view.
#[test]
fn empty_subset_recomputes_cleanly() {
    let mut dash = session();
    dash.set_filters(FilterCriteria { tenure_min: 50, tenure_max: 10, ..FilterCriteria::default() });
    let view = dash.recompute().unwrap();

    let kpis = view.kpis.unwrap();
    assert_eq!(kpis.count, 0);
    assert_eq!(kpis.churn, 0.0);
    assert!(view.drivers.is_empty());
    assert!(view.risk_table.is_empty());
    assert_eq!(view.roi.roi, None);
}

// ── Commands ─────────────────────────────────────────────────────────────────

#[test]
fn commands_update_session_state() {
    let mut dash = session();

    dash.apply(DashboardCommand::SetFilters { filters: m2m_short() }).unwrap();
    dash.apply(DashboardCommand::SetRiskCutoff { cutoff: 80 }).unwrap();
    dash.apply(DashboardCommand::SetWhatIf {
        pct_to_one_year:     20.0,
        pct_to_two_year:     5.0,
        cost_per_conversion: 50.0,
    })
    .unwrap();

    let view = dash.recompute().unwrap();
    assert_eq!(view.risk_cutoff, 80);
    assert_eq!(view.what_if.pct_to_one_year, 20.0);
    assert_eq!(view.what_if.cost_per_conversion, 50.0);
    for row in &view.risk_table {
        assert_eq!(row.at_risk, row.score >= 80);
    }

    dash.apply(DashboardCommand::Reset).unwrap();
    let view = dash.recompute().unwrap();
    assert_eq!(view.filters, FilterCriteria::default());
    assert_eq!(view.risk_cutoff, dash.config.risk.cutoff);
    assert_eq!(view.what_if.pct_to_one_year, dash.config.what_if.default_pct_to_one_year);
}

/// Selecting a customer attaches their explanation to every recompute.
#[test]
fn selection_drives_explanation() {
    let mut dash = session();
    let id = dash.data()[0].id.clone();

    dash.apply(DashboardCommand::SelectCustomer { customer_id: id.clone() }).unwrap();
    assert_eq!(dash.selected(), Some(id.as_str()));

    let view = dash.recompute().unwrap();
    let explanation = view.explanation.expect("selected customer must be explained");
    assert_eq!(explanation.customer_id, id);
    assert_eq!(explanation.total, score(&dash.data()[0]));

    dash.apply(DashboardCommand::ClearSelection).unwrap();
    assert!(dash.recompute().unwrap().explanation.is_none());
}

#[test]
fn selecting_unknown_customer_fails() {
    let mut dash = session();
    let err = dash
        .apply(DashboardCommand::SelectCustomer { customer_id: "nope".into() })
        .unwrap_err();
    match err {
        AnalyticsError::CustomerNotFound { id } => assert_eq!(id, "nope"),
        other => panic!("expected CustomerNotFound, got {other:?}"),
    }
    assert_eq!(dash.selected(), None, "a failed select must not change the selection");
}

/// Regenerating replaces the data and drops a selection that no longer
/// refers to it.
#[test]
fn regenerate_clears_selection() {
    let mut dash = session();
    let before = dash.data().to_vec();
    let id = before[0].id.clone();
    dash.select(&id).unwrap();

    dash.apply(DashboardCommand::RegenerateDemo { seed: Some(7) }).unwrap();
    assert_eq!(dash.selected(), None);
    assert_eq!(dash.data().len(), before.len());
    assert_ne!(dash.data(), before.as_slice(), "new seed, new dataset");
}

/// Commands arrive as JSON tagged by "cmd".
#[test]
fn command_wire_format() {
    let cmd: DashboardCommand = serde_json::from_str(
        r#"{"cmd":"set_filters","filters":{"contract":"All","internet":"Fiber optic","tMin":0,"tMax":6}}"#,
    )
    .unwrap();
    match cmd {
        DashboardCommand::SetFilters { filters } => {
            assert_eq!(filters.contract, Selection::All);
            assert_eq!(filters.internet_service, Selection::Only(InternetService::Fiber));
            assert_eq!(filters.tenure_max, 6);
        }
        other => panic!("unexpected command {other:?}"),
    }

    let regen: DashboardCommand = serde_json::from_str(r#"{"cmd":"regenerate_demo"}"#).unwrap();
    assert!(matches!(regen, DashboardCommand::RegenerateDemo { seed: None }));
}

// ── Offload ──────────────────────────────────────────────────────────────────

/// With a worker attached, KPIs settle to the same numbers the inline
/// path computes.
#[test]
fn offloaded_kpis_settle_to_inline_values() {
    let mut dash = session().with_offload().unwrap();
    dash.set_filters(m2m_short());

    let view = dash.recompute().unwrap();
    assert_eq!(view.pending_seq, Some(1));

    let settled = dash
        .settle_kpis(Duration::from_secs(5))
        .unwrap()
        .expect("worker timed out");
    let expected = kpi_summary(&filter(dash.data(), &m2m_short()));
    assert_eq!(settled.count, expected.count);
    assert!((settled.churn - expected.churn).abs() < 1e-9);
    assert!((settled.avg_monthly - expected.avg_monthly).abs() < 1e-9);

    // A second recompute issues a newer request.
    dash.set_filters(FilterCriteria::default());
    assert_eq!(dash.recompute().unwrap().pending_seq, Some(2));
}

/// A view's KPIs always carry the seq of the request they answer, so
/// KPIs from an older filter are never passed off as the new one's.
#[test]
fn view_kpis_are_tagged_with_the_request_they_answer() {
    let mut dash = session().with_offload().unwrap();
    dash.set_filters(m2m_short());
    dash.recompute().unwrap();
    dash.settle_kpis(Duration::from_secs(5)).unwrap().expect("worker timed out");

    dash.set_filters(FilterCriteria::default());
    let view = dash.recompute().unwrap();
    assert_eq!(view.pending_seq, Some(2));

    let kpis = view.kpis.expect("first request was already answered");
    let answered_filters = match view.kpi_seq {
        Some(1) => m2m_short(),
        Some(2) => FilterCriteria::default(),
        other => panic!("unexpected kpi_seq {other:?}"),
    };
    let expected = kpi_summary(&filter(dash.data(), &answered_filters));
    assert_eq!(kpis.count, expected.count, "KPIs must match the filters of seq {:?}", view.kpi_seq);
    assert!((kpis.churn - expected.churn).abs() < 1e-9);
}

// ── Config ───────────────────────────────────────────────────────────────────

/// A config file may override any subset of fields.
#[test]
fn partial_config_keeps_defaults() {
    let path = std::env::temp_dir().join(format!("churn-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"risk":{"cutoff":70},"dataset":{"size":250}}"#).unwrap();

    let config = AnalyticsConfig::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.risk.cutoff, 70);
    assert_eq!(config.risk.limit, 80, "unset field keeps its default");
    assert_eq!(config.dataset.size, 250);
    assert_eq!(config.dataset.seed, 71313);
    assert_eq!(config.drivers, DriverConfig::default());

    let dash = ChurnDashboard::demo(config);
    assert_eq!(dash.data().len(), 250);
}
