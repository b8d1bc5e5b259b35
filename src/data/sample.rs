//! Synthetic HouseTS-shaped panel generation.
//!
//! Each metro gets a starting price/income level and its own growth rates;
//! monthly observations then follow those trends with lognormal noise. A small
//! share of income and rent cells is written as zero so the null handling of
//! the pipeline is exercised.

use chrono::NaiveDate;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::Serialize;
use tracing::debug;

use crate::error::AppError;

/// Metro names used before falling back to numbered ones.
const METRO_NAMES: [&str; 30] = [
    "Atlanta, GA",
    "Austin, TX",
    "Baltimore, MD",
    "Boise, ID",
    "Boston, MA",
    "Charlotte, NC",
    "Chicago, IL",
    "Cleveland, OH",
    "Dallas, TX",
    "Denver, CO",
    "Detroit, MI",
    "Houston, TX",
    "Indianapolis, IN",
    "Kansas City, MO",
    "Las Vegas, NV",
    "Los Angeles, CA",
    "Miami, FL",
    "Minneapolis, MN",
    "Nashville, TN",
    "New York, NY",
    "Orlando, FL",
    "Philadelphia, PA",
    "Phoenix, AZ",
    "Pittsburgh, PA",
    "Portland, OR",
    "Sacramento, CA",
    "San Diego, CA",
    "San Francisco, CA",
    "Seattle, WA",
    "St. Louis, MO",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    pub metros: usize,
    pub start_year: i32,
    pub end_year: i32,
    pub seed: u64,
    /// Probability that an income (or, independently, rent) cell is zero.
    pub zero_prob: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            metros: 25,
            start_year: 2012,
            end_year: 2023,
            seed: 42,
            zero_prob: 0.01,
        }
    }
}

/// One row of the synthetic CSV, with the HouseTS column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub date: NaiveDate,
    pub city_full: String,
    pub median_sale_price: f64,
    #[serde(rename = "Median Rent")]
    pub median_rent: f64,
    #[serde(rename = "Per Capita Income")]
    pub per_capita_income: f64,
    pub inventory: f64,
    pub median_dom: f64,
    pub avg_sale_to_list: f64,
}

#[derive(Debug, Clone)]
struct MetroProfile {
    name: String,
    price: f64,
    income: f64,
    rent: f64,
    price_growth: f64,
    income_growth: f64,
    rent_growth: f64,
    inventory: f64,
    dom: f64,
}

/// Generate the panel: metros in name order, each with consecutive month-end dates.
pub fn generate_panel(config: &SampleConfig) -> Result<Vec<SampleRow>, AppError> {
    if config.metros == 0 {
        return Err(AppError::new(2, "Metro count must be > 0."));
    }
    if config.end_year < config.start_year {
        return Err(AppError::new(
            2,
            format!("Invalid year range: {}..{}.", config.start_year, config.end_year),
        ));
    }
    if !(0.0..=1.0).contains(&config.zero_prob) {
        return Err(AppError::new(2, "Zero probability must be within [0, 1]."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::<f64>::new(0.0, 0.015).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let growth_noise = Normal::<f64>::new(0.0, 0.015).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let profiles: Vec<MetroProfile> = (0..config.metros)
        .map(|i| metro_profile(&mut rng, &growth_noise, metro_name(i)))
        .collect();

    let dates = month_ends(config.start_year, config.end_year)?;
    let mut rows = Vec::with_capacity(profiles.len() * dates.len());

    for profile in &profiles {
        for (t, &date) in dates.iter().enumerate() {
            let years = t as f64 / 12.0;
            let price = profile.price * (1.0 + profile.price_growth).powf(years) * noise.sample(&mut rng).exp();
            let income = profile.income * (1.0 + profile.income_growth).powf(years) * noise.sample(&mut rng).exp();
            let rent = profile.rent * (1.0 + profile.rent_growth).powf(years) * noise.sample(&mut rng).exp();

            // Seasonal tightness: faster sales and less stock in spring.
            let season = ((t % 12) as f64 / 12.0 * std::f64::consts::TAU).cos();
            let dom = (profile.dom * (1.0 + 0.2 * season) + rng.gen_range(-3.0..=3.0)).max(5.0);
            let inventory = (profile.inventory * (1.0 + 0.1 * season) * noise.sample(&mut rng).exp()).round();
            let sale_to_list = (0.985 - 0.01 * season + rng.gen_range(-0.005..=0.005)).clamp(0.9, 1.1);

            let per_capita_income = if rng.gen_bool(config.zero_prob) { 0.0 } else { income.round() };
            let median_rent = if rng.gen_bool(config.zero_prob) { 0.0 } else { rent.round() };

            rows.push(SampleRow {
                date,
                city_full: profile.name.clone(),
                median_sale_price: (price / 100.0).round() * 100.0,
                median_rent,
                per_capita_income,
                inventory,
                median_dom: dom.round(),
                avg_sale_to_list: (sale_to_list * 1000.0).round() / 1000.0,
            });
        }
    }

    debug!(rows = rows.len(), metros = profiles.len(), months = dates.len(), "generated sample panel");
    Ok(rows)
}

fn metro_name(i: usize) -> String {
    METRO_NAMES
        .get(i)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Metro {:03}", i + 1))
}

fn metro_profile(rng: &mut StdRng, growth_noise: &Normal<f64>, name: String) -> MetroProfile {
    let income = rng.gen_range(24_000.0..=62_000.0);
    // Starting PTI spread across the bands, from affordable to severe.
    let pti = rng.gen_range(2.2..=7.5);
    let price = pti * income * crate::domain::HOUSEHOLD_SIZE;
    // Annual rent around a quarter of household income.
    let rent = income * crate::domain::HOUSEHOLD_SIZE * rng.gen_range(0.18..=0.32) / 12.0;

    MetroProfile {
        name,
        price,
        income,
        rent,
        price_growth: 0.055 + growth_noise.sample(rng),
        income_growth: 0.025 + growth_noise.sample(rng) / 3.0,
        rent_growth: 0.03 + growth_noise.sample(rng) / 3.0,
        inventory: rng.gen_range(800.0..=25_000.0),
        dom: rng.gen_range(20.0..=70.0),
    }
}

/// Last day of every month from January of `start` to December of `end`.
fn month_ends(start: i32, end: i32) -> Result<Vec<NaiveDate>, AppError> {
    let mut out = Vec::new();
    for year in start..=end {
        for month in 1..=12u32 {
            let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
            let date = NaiveDate::from_ymd_opt(ny, nm, 1)
                .and_then(|d| d.pred_opt())
                .ok_or_else(|| AppError::new(2, format!("Year out of range: {year}.")))?;
            out.push(date);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_pipeline;
    use crate::domain::TableFormat;
    use crate::io::{parse_raw_table, write_table};

    fn small() -> SampleConfig {
        SampleConfig {
            metros: 3,
            start_year: 2012,
            end_year: 2014,
            seed: 7,
            zero_prob: 0.0,
        }
    }

    #[test]
    fn same_seed_same_panel() {
        let a = generate_panel(&small()).unwrap();
        let b = generate_panel(&small()).unwrap();
        assert_eq!(a, b);

        let mut other = small();
        other.seed = 8;
        assert_ne!(a, generate_panel(&other).unwrap());
    }

    #[test]
    fn one_row_per_metro_month() {
        let rows = generate_panel(&small()).unwrap();
        assert_eq!(rows.len(), 3 * 36);
        assert_eq!(rows[0].city_full, "Atlanta, GA");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2012, 1, 31).unwrap());
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2012, 2, 29).unwrap());
        assert_eq!(rows[35].date, NaiveDate::from_ymd_opt(2014, 12, 31).unwrap());
        assert!(rows.iter().all(|r| r.median_sale_price > 0.0 && r.per_capita_income > 0.0));
    }

    #[test]
    fn names_fall_back_to_numbers() {
        assert_eq!(metro_name(0), "Atlanta, GA");
        assert_eq!(metro_name(30), "Metro 031");
    }

    #[test]
    fn zero_probability_one_zeroes_income_and_rent() {
        let mut config = small();
        config.zero_prob = 1.0;
        let rows = generate_panel(&config).unwrap();
        assert!(rows.iter().all(|r| r.per_capita_income == 0.0 && r.median_rent == 0.0));
    }

    #[test]
    fn rejects_bad_config() {
        let mut config = small();
        config.metros = 0;
        assert!(generate_panel(&config).is_err());

        let mut config = small();
        config.end_year = 2011;
        assert!(generate_panel(&config).is_err());

        let mut config = small();
        config.zero_prob = 1.5;
        assert!(generate_panel(&config).is_err());
    }

    #[test]
    fn panel_runs_through_pipeline() {
        let rows = generate_panel(&small()).unwrap();
        let mut buf = Vec::new();
        write_table(&mut buf, &rows, TableFormat::Csv).unwrap();

        let raw = parse_raw_table(buf.as_slice()).unwrap();
        let out = run_pipeline(&raw).unwrap();

        assert_eq!(out.enriched.len(), 3 * 36);
        assert_eq!(out.summary.len(), 3 * 3);
        assert_eq!(out.metro_count(), 3);
        let composite = out.composite.unwrap();
        assert_eq!(composite.len(), 36);
        assert_eq!(composite[0].price_index, Some(100.0));
        assert!(out.summary.iter().all(|r| r.affordability_rating.is_some()));
    }

    #[test]
    fn zero_cells_become_nulls() {
        let mut config = small();
        config.zero_prob = 1.0;
        let rows = generate_panel(&config).unwrap();
        let mut buf = Vec::new();
        write_table(&mut buf, &rows, TableFormat::Csv).unwrap();

        let raw = parse_raw_table(buf.as_slice()).unwrap();
        let out = run_pipeline(&raw).unwrap();

        assert!(out.enriched.iter().all(|o| o.price_to_income.is_none() && o.rent_to_income.is_none()));
        assert!(out.summary.is_empty());
        assert!(out.composite.is_err());
    }
}
