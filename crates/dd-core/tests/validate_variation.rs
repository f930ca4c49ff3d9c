//! Candidate variation validation against fixture parents

use dd_core::{CoreError, ValidationOutcome};
use dd_params::{address, Leaf, StatRecord};
use dd_test_utils::{patch, validator, years, InMemoryFetcher, REFERENCE_PATH};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn fixtures() -> Arc<InMemoryFetcher> {
    Arc::new(InMemoryFetcher::with_fixtures())
}

#[tokio::test]
async fn plain_override_accepted() {
    let mut candidate = patch(
        json!({"technologies": {"nuclear": {"first_cost": {"value": 4000.0, "statistic": ""}}}}),
        json!({}),
    );
    let outcome = validator(fixtures())
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();
    assert_eq!(outcome, ValidationOutcome::accepted());
    assert_eq!(outcome.status_code(), 200);
}

#[tokio::test]
async fn bare_number_rewritten_as_stat_record() {
    let mut candidate = patch(
        json!({"technologies": {"solarpvutil": {"first_cost": 950.0}}}),
        json!({}),
    );
    let outcome = validator(fixtures())
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();

    assert!(outcome.valid);
    assert_eq!(
        address::get_leaf(&candidate.scenario_vars, "technologies.solarpvutil.first_cost"),
        Some(&Leaf::Stat(StatRecord::plain(950.0)))
    );
}

#[tokio::test]
async fn unknown_path_rejected_before_fetching() {
    let fetcher = fixtures();
    let mut candidate = patch(
        json!({"technologies": {"solarpvutil": {"first_kost": 950.0}}}),
        json!({}),
    );
    let outcome = validator(Arc::clone(&fetcher))
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ValidationOutcome::rejected("technologies.solarpvutil.first_kost: does not exist in schema")
    );
    assert_eq!(outcome.status_code(), 422);
    assert_eq!(fetcher.fetches(), 0);
}

#[tokio::test]
async fn switching_basis_checks_inherited_fields() {
    let mut candidate = patch(
        json!({"technologies": {"nuclear": {"adoption_basis": "Logistic S-Curve"}}}),
        json!({}),
    );
    let outcome = validator(fixtures())
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ValidationOutcome::rejected("adoption_s_curve_market_share missing")
    );
}

#[tokio::test]
async fn enumerated_value_checked_after_merge() {
    let mut candidate = patch(
        json!({"technologies": {"windonshore": {"adoption_prognostication_growth": "Extreme"}}}),
        json!({}),
    );
    let outcome = validator(fixtures())
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();
    assert_eq!(
        outcome.reason.as_deref(),
        Some("adoption_prognostication_growth must be one of [Low, Medium, High], got Extreme")
    );
}

#[tokio::test]
async fn overridden_field_warns() {
    let mut candidate = patch(
        json!({"technologies": {"solarpvutil": {"adoption_custom_name": "Aggressive"}}}),
        json!({}),
    );
    let outcome = validator(fixtures())
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ValidationOutcome::accepted_with(vec![
            "adoption_custom_name will be overridden by Linear adoption basis".to_string()
        ])
    );
}

#[tokio::test]
async fn custom_reference_requires_name() {
    let mut candidate = patch(
        json!({}),
        json!({"technologies": {"windonshore": {"adoption_basis": "Custom"}}}),
    );
    let outcome = validator(fixtures())
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();
    assert_eq!(outcome, ValidationOutcome::rejected("adoption_custom_name missing"));
}

#[tokio::test]
async fn displaced_baseline_skips_rule_check() {
    let mut candidate = patch(
        json!({"technologies": {"fossilfuelelectricity": {"adoption_basis": "Whatever"}}}),
        json!({}),
    );
    let outcome = validator(fixtures())
        .validate_variation(&mut candidate, years())
        .await
        .unwrap();
    assert!(outcome.valid);
}

#[tokio::test]
async fn missing_parent_is_client_error() {
    let fetcher = fixtures();
    fetcher.remove(REFERENCE_PATH);
    let mut candidate = patch(
        json!({"technologies": {"nuclear": {"npv_discount_rate": 0.05}}}),
        json!({}),
    );
    let err = validator(fetcher)
        .validate_variation(&mut candidate, years())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { what: "Reference", .. }));
    assert_eq!(err.status_code(), 400);
}
