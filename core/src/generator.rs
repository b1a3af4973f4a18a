//! Synthetic customer generation for demos and test fixtures.
//!
//! Not part of the analytics contract: the engine treats any collection
//! the same way. This generator only has to be reproducible and produce
//! churn that correlates with the scored factors.

use crate::{
    customer::{
        Contract, CustomerCollection, CustomerRecord, InternetService, MONTHLY_CHARGE_MAX,
        MONTHLY_CHARGE_MIN, TENURE_MAX_MONTHS, TENURE_MIN_MONTHS,
    },
    rng::DatasetRng,
};

const CONTRACT_WEIGHTS: [f64; 3] = [0.56, 0.24, 0.20];
const INTERNET_WEIGHTS: [f64; 3] = [0.48, 0.38, 0.14];
const SENIOR_SHARE: f64 = 0.16;
/// Exponent applied to a uniform roll; >1 skews tenure toward new customers.
const TENURE_SKEW: f64 = 1.8;
const CHARGE_NOISE: f64 = 9.0;
const CHURN_PROBABILITY_FLOOR: f64 = 0.02;
const CHURN_PROBABILITY_CAP: f64 = 0.65;

/// Latent churn probability. Deliberately shaped like the risk score so
/// that lift and scoring have something to find.
fn churn_probability(
    contract: Contract,
    internet: InternetService,
    tenure: u32,
    monthly: f64,
    senior: bool,
) -> f64 {
    let mut p: f64 = 0.10;
    p += match contract {
        Contract::MonthToMonth => 0.18,
        Contract::OneYear      => 0.06,
        Contract::TwoYear      => 0.02,
    };
    p += match internet {
        InternetService::Fiber => 0.08,
        InternetService::Dsl   => 0.03,
        InternetService::None  => 0.0,
    };
    p += match tenure {
        0..=3  => 0.16,
        4..=6  => 0.10,
        7..=12 => 0.06,
        _      => 0.0,
    };
    if monthly >= 90.0 {
        p += 0.06;
    }
    if senior {
        p += 0.03;
    }
    p.clamp(CHURN_PROBABILITY_FLOOR, CHURN_PROBABILITY_CAP)
}

fn base_charge(contract: Contract, internet: InternetService, senior: bool) -> f64 {
    let mut base = match internet {
        InternetService::Fiber => 92.0,
        InternetService::Dsl   => 62.0,
        InternetService::None  => 28.0,
    };
    base += match contract {
        Contract::MonthToMonth => 6.0,
        Contract::OneYear      => 0.0,
        Contract::TwoYear      => -4.0,
    };
    if senior {
        base += 2.0;
    }
    base
}

fn generate_customer(index: usize, rng: &mut DatasetRng) -> CustomerRecord {
    let contract = rng.pick_weighted(&Contract::ALL, &CONTRACT_WEIGHTS);
    let internet = rng.pick_weighted(&InternetService::ALL, &INTERNET_WEIGHTS);
    let senior = rng.chance(SENIOR_SHARE);

    let tenure = (rng.next_f64().powf(TENURE_SKEW) * TENURE_MAX_MONTHS as f64).round() as u32;
    let tenure = tenure.clamp(TENURE_MIN_MONTHS, TENURE_MAX_MONTHS);

    let noise = rng.uniform(-CHARGE_NOISE, CHARGE_NOISE);
    let monthly = (base_charge(contract, internet, senior) + noise)
        .clamp(MONTHLY_CHARGE_MIN, MONTHLY_CHARGE_MAX);
    // Cents precision, as billed.
    let monthly = (monthly * 100.0).round() / 100.0;

    let churned = rng.chance(churn_probability(contract, internet, tenure, monthly, senior));

    let suffix = 1000 + rng.next_u64_below(9000);
    CustomerRecord {
        id: format!("{:04}-{suffix}", index + 1),
        contract,
        internet_service: internet,
        is_senior: senior,
        tenure_months: tenure,
        monthly_charge: monthly,
        churned,
    }
}

/// Generate `n` customers from `seed`. Same seed, same collection.
pub fn generate_customers(n: usize, seed: u64) -> CustomerCollection {
    let mut rng = DatasetRng::new(seed);
    let customers: CustomerCollection = (0..n).map(|i| generate_customer(i, &mut rng)).collect();
    log::info!("generator: generated {} customers (seed={seed})", customers.len());
    customers
}
