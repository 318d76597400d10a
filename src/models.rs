use std::collections::HashSet;

use jiff::{Span, civil::Date};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    countries,
    entities::movie::Status,
    error::{AppError, AppResult},
    pagination::PageLinks,
};

const MAX_DAYS_AHEAD: i64 = 365;

#[derive(Clone, Debug, Deserialize)]
pub struct MovieCreate {
    pub name: String,
    pub release_date: Date,
    pub score: f64,
    #[serde(default)]
    pub overview: String,
    pub status: Status,
    pub budget: Decimal,
    pub revenue: f64,
    pub country: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl MovieCreate {
    /// Checks field ranges and returns the payload in canonical form.
    pub fn validate(self, today: Date) -> AppResult<Self> {
        Ok(Self {
            name: check_name(&self.name)?,
            release_date: check_release_date(self.release_date, today)?,
            score: check_score(self.score)?,
            overview: self.overview,
            status: self.status,
            budget: check_budget(self.budget)?,
            revenue: check_revenue(self.revenue)?,
            country: countries::normalize_code(&self.country).ok_or_else(|| {
                AppError::validation("country must be a 3-letter code")
            })?,
            genres: check_names("genres", self.genres)?,
            actors: check_names("actors", self.actors)?,
            languages: check_names("languages", self.languages)?,
        })
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieUpdate {
    pub name: Option<String>,
    pub release_date: Option<Date>,
    pub score: Option<f64>,
    pub overview: Option<String>,
    pub status: Option<Status>,
    pub budget: Option<Decimal>,
    pub revenue: Option<f64>,
}

impl MovieUpdate {
    pub fn validate(self, today: Date) -> AppResult<Self> {
        Ok(Self {
            name: self.name.as_deref().map(check_name).transpose()?,
            release_date: self.release_date.map(|d| check_release_date(d, today)).transpose()?,
            score: self.score.map(check_score).transpose()?,
            overview: self.overview,
            status: self.status,
            budget: self.budget.map(check_budget).transpose()?,
            revenue: self.revenue.map(check_revenue).transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.release_date.is_none()
            && self.score.is_none()
            && self.overview.is_none()
            && self.status.is_none()
            && self.budget.is_none()
            && self.revenue.is_none()
    }
}

fn check_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    Ok(name.to_string())
}

fn check_release_date(date: Date, today: Date) -> AppResult<Date> {
    let limit = today + Span::new().days(MAX_DAYS_AHEAD);
    if date > limit {
        return Err(AppError::validation(format!(
            "release_date must not be more than {MAX_DAYS_AHEAD} days in the future"
        )));
    }
    Ok(date)
}

fn check_score(score: f64) -> AppResult<f64> {
    if !(0.0..=100.0).contains(&score) {
        return Err(AppError::validation("score must be between 0 and 100"));
    }
    Ok(score)
}

fn check_budget(budget: Decimal) -> AppResult<Decimal> {
    if budget.is_sign_negative() && !budget.is_zero() {
        return Err(AppError::validation("budget must not be negative"));
    }
    Ok(budget.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn check_revenue(revenue: f64) -> AppResult<f64> {
    if !revenue.is_finite() || revenue < 0.0 {
        return Err(AppError::validation("revenue must not be negative"));
    }
    Ok(revenue)
}

fn check_names(field: &str, names: Vec<String>) -> AppResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation(format!("{field} must not contain empty names")));
        }
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountryOut {
    pub code: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReferenceOut {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieDetail {
    pub id: i32,
    pub name: String,
    pub release_date: Date,
    pub score: f64,
    pub overview: String,
    pub status: Status,
    pub budget: Decimal,
    pub revenue: f64,
    pub country: CountryOut,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub languages: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub name: String,
    pub release_date: Date,
    pub score: f64,
    pub status: Status,
    pub country: String,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub languages: Vec<String>,
}

impl From<MovieDetail> for MovieSummary {
    fn from(m: MovieDetail) -> Self {
        Self {
            id: m.id,
            name: m.name,
            release_date: m.release_date,
            score: m.score,
            status: m.status,
            country: m.country.code,
            genres: m.genres,
            actors: m.actors,
            languages: m.languages,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MoviePage {
    pub items: Vec<MovieSummary>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    #[serde(flatten)]
    pub links: PageLinks,
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rust_decimal_macros::dec;

    use super::*;

    fn payload() -> MovieCreate {
        MovieCreate {
            name: "  Casablanca ".into(),
            release_date: date(1942, 11, 26),
            score: 85.0,
            overview: "Of all the gin joints...".into(),
            status: Status::Released,
            budget: dec!(950000.005),
            revenue: 3_700_000.0,
            country: "usa".into(),
            genres: vec!["Drama".into(), " Romance".into(), "Drama".into()],
            actors: vec!["Humphrey Bogart".into()],
            languages: vec![],
        }
    }

    #[test]
    fn create_payload_is_normalized() {
        let m = payload().validate(date(2026, 1, 1)).unwrap();
        assert_eq!(m.name, "Casablanca");
        assert_eq!(m.country, "USA");
        assert_eq!(m.genres, ["Drama", "Romance"]);
        assert_eq!(m.budget, dec!(950000.01));
    }

    #[test]
    fn out_of_range_fields_are_rejected() {
        let today = date(2026, 1, 1);
        let cases = [
            MovieCreate { score: 101.0, ..payload() },
            MovieCreate { score: -0.5, ..payload() },
            MovieCreate { score: f64::NAN, ..payload() },
            MovieCreate { budget: dec!(-1), ..payload() },
            MovieCreate { revenue: -1.0, ..payload() },
            MovieCreate { country: "US".into(), ..payload() },
            MovieCreate { name: "   ".into(), ..payload() },
            MovieCreate { genres: vec!["".into()], ..payload() },
            MovieCreate { release_date: date(2027, 1, 2), ..payload() },
        ];
        for case in cases {
            assert!(matches!(case.validate(today), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn score_bounds_are_inclusive() {
        let today = date(2026, 1, 1);
        assert!(MovieCreate { score: 0.0, ..payload() }.validate(today).is_ok());
        assert!(MovieCreate { score: 100.0, ..payload() }.validate(today).is_ok());
        let upd = MovieUpdate { score: Some(100.0), ..Default::default() };
        assert!(upd.validate(today).is_ok());
    }

    #[test]
    fn release_date_up_to_a_year_ahead() {
        let today = date(2026, 1, 1);
        let edge = MovieCreate { release_date: date(2027, 1, 1), ..payload() };
        assert!(edge.validate(today).is_ok());
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        let today = date(2026, 1, 1);
        assert!(MovieUpdate::default().validate(today).unwrap().is_empty());
        let bad = MovieUpdate { revenue: Some(-5.0), ..Default::default() };
        assert!(matches!(bad.validate(today), Err(AppError::Validation(_))));
    }

    #[test]
    fn create_payload_from_json() {
        let json = r#"{
            "name": "Heat",
            "release_date": "1995-12-15",
            "score": 82,
            "overview": "",
            "status": "Released",
            "budget": 60000000,
            "revenue": 187436818,
            "country": "USA",
            "genres": ["Crime"],
            "actors": ["Al Pacino", "Robert De Niro"],
            "languages": ["English", "Spanish"]
        }"#;
        let m: MovieCreate = serde_json::from_str(json).unwrap();
        assert_eq!(m.release_date, date(1995, 12, 15));
        assert_eq!(m.status, Status::Released);
        assert_eq!(m.budget, dec!(60000000));
    }
}
