//! Composite fundamental score.
//!
//! Each ratio maps to points through an ordered band table. Tables are listed
//! best band first and the first band that matches wins, so ROE = 20% lands
//! in the >15% band and never falls through to a lower one.

use crate::metrics::DerivedRatios;
use crate::models::RawFundamentals;
use serde::Serialize;

pub const MAX_SCORE: u8 = 100;

// ── Band tables ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Band {
    /// value > bound
    Above(f64, u8),
    /// value < bound
    Below(f64, u8),
}

impl Band {
    fn matches(self, value: f64) -> bool {
        match self {
            Band::Above(bound, _) => value > bound,
            Band::Below(bound, _) => value < bound,
        }
    }

    fn points(self) -> u8 {
        match self {
            Band::Above(_, p) | Band::Below(_, p) => p,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BandTable {
    pub bands: &'static [Band],
    /// Values at or below zero score nothing (a negative P/E means losses).
    pub positive_only: bool,
}

impl BandTable {
    pub fn contribution(&self, value: f64) -> u8 {
        if !value.is_finite() || (self.positive_only && value <= 0.0) {
            return 0;
        }
        self.bands
            .iter()
            .find(|b| b.matches(value))
            .map(|b| b.points())
            .unwrap_or(0)
    }

    pub fn max_points(&self) -> u8 {
        self.bands.iter().map(|b| b.points()).max().unwrap_or(0)
    }
}

/// Return on equity, as a fraction.
pub const ROE_TABLE: BandTable = BandTable {
    bands: &[Band::Above(0.15, 30), Band::Above(0.10, 20), Band::Above(0.05, 10)],
    positive_only: false,
};

pub const PBV_TABLE: BandTable = BandTable {
    bands: &[Band::Below(1.0, 25), Band::Below(2.0, 15), Band::Below(3.0, 5)],
    positive_only: false,
};

pub const PER_TABLE: BandTable = BandTable {
    bands: &[Band::Below(15.0, 25), Band::Below(25.0, 15), Band::Below(40.0, 5)],
    positive_only: true,
};

pub const DEBT_TO_EQUITY_TABLE: BandTable = BandTable {
    bands: &[Band::Below(1.0, 20), Band::Below(2.0, 10)],
    positive_only: false,
};

// ── Score ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Strong,
    Fair,
    Weak,
}

impl Rating {
    pub fn from_total(total: u8) -> Self {
        match total {
            75.. => Rating::Strong,
            50..=74 => Rating::Fair,
            _ => Rating::Weak,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Strong => "Strong fundamentals",
            Rating::Fair => "Fair fundamentals",
            Rating::Weak => "Weak fundamentals",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub profitability: u8,
    pub valuation: u8,
    pub earnings_multiple: u8,
    pub leverage: u8,
    pub total: u8,
    pub rating: Rating,
}

pub fn score(ratios: &DerivedRatios) -> ScoreBreakdown {
    let profitability = ROE_TABLE.contribution(ratios.return_on_equity);
    let valuation = PBV_TABLE.contribution(ratios.price_to_book);
    let earnings_multiple = PER_TABLE.contribution(ratios.trailing_pe);
    let leverage = DEBT_TO_EQUITY_TABLE.contribution(ratios.debt_to_equity);

    let sum = u16::from(profitability)
        + u16::from(valuation)
        + u16::from(earnings_multiple)
        + u16::from(leverage);
    let total = sum.min(u16::from(MAX_SCORE)) as u8;

    ScoreBreakdown {
        profitability,
        valuation,
        earnings_multiple,
        leverage,
        total,
        rating: Rating::from_total(total),
    }
}

pub fn score_fundamentals(f: &RawFundamentals) -> ScoreBreakdown {
    score(&DerivedRatios::from_fundamentals(f))
}

// ── Comparison ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    FirstSuperior,
    SecondSuperior,
    Tie,
}

impl Outcome {
    pub fn between(first: u8, second: u8) -> Self {
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Outcome::FirstSuperior,
            std::cmp::Ordering::Less => Outcome::SecondSuperior,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTicker {
    pub symbol: String,
    pub ratios: DerivedRatios,
    pub score: ScoreBreakdown,
}

impl ScoredTicker {
    pub fn from_fundamentals(f: &RawFundamentals) -> Self {
        let ratios = DerivedRatios::from_fundamentals(f);
        Self {
            symbol: f.symbol.clone(),
            ratios,
            score: score(&ratios),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub first: ScoredTicker,
    pub second: ScoredTicker,
    pub outcome: Outcome,
}

impl Comparison {
    pub fn verdict(&self) -> String {
        let (a, b) = (self.first.score.total, self.second.score.total);
        match self.outcome {
            Outcome::FirstSuperior => format!("{} superior ({} vs {})", self.first.symbol, a, b),
            Outcome::SecondSuperior => format!("{} superior ({} vs {})", self.second.symbol, b, a),
            Outcome::Tie => format!("Tie ({} vs {})", a, b),
        }
    }
}

pub fn compare(first: &RawFundamentals, second: &RawFundamentals) -> Comparison {
    let first = ScoredTicker::from_fundamentals(first);
    let second = ScoredTicker::from_fundamentals(second);
    let outcome = Outcome::between(first.score.total, second.score.total);
    Comparison {
        first,
        second,
        outcome,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;

    fn ratios(roe: f64, pbv: f64, per: f64, de: f64) -> DerivedRatios {
        DerivedRatios {
            return_on_equity: roe,
            price_to_book: pbv,
            trailing_pe: per,
            debt_to_equity: de,
            net_margin: None,
        }
    }

    #[test]
    fn test_perfect_score() {
        let s = score(&ratios(0.20, 0.8, 12.0, 0.5));
        assert_eq!(
            (s.profitability, s.valuation, s.earnings_multiple, s.leverage),
            (30, 25, 25, 20)
        );
        assert_eq!(s.total, 100);
        assert_eq!(s.rating, Rating::Strong);
    }

    #[test]
    fn test_zero_score() {
        let s = score(&ratios(0.03, 3.5, 50.0, 2.5));
        assert_eq!(s.total, 0);
        assert_eq!(s.rating, Rating::Weak);
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        assert_eq!(ROE_TABLE.contribution(0.15), 20);
        assert_eq!(ROE_TABLE.contribution(0.10), 10);
        assert_eq!(ROE_TABLE.contribution(0.05), 0);
        assert_eq!(PBV_TABLE.contribution(1.0), 15);
        assert_eq!(PBV_TABLE.contribution(3.0), 0);
        assert_eq!(PER_TABLE.contribution(15.0), 15);
        assert_eq!(PER_TABLE.contribution(40.0), 0);
        assert_eq!(DEBT_TO_EQUITY_TABLE.contribution(2.0), 0);
    }

    #[test]
    fn test_non_positive_per_scores_nothing() {
        assert_eq!(PER_TABLE.contribution(0.0), 0);
        assert_eq!(PER_TABLE.contribution(-8.0), 0);
        assert_eq!(PER_TABLE.contribution(0.1), 25);
    }

    #[test]
    fn test_roe_contribution_monotonic() {
        let mut prev = 0u8;
        for i in 0..=400 {
            let roe = i as f64 / 1000.0;
            let pts = ROE_TABLE.contribution(roe);
            assert!(pts >= prev, "ROE {} dropped from {} to {}", roe, prev, pts);
            prev = pts;
        }
        assert_eq!(prev, 30);
    }

    #[test]
    fn test_score_always_bounded() {
        let samples = [-1e9, -5.0, -0.5, 0.0, 0.049, 0.1, 0.5, 0.99, 1.0, 1.5, 2.0, 14.9, 24.0, 39.0, 1e9, f64::NAN];
        for &roe in &samples {
            for &pbv in &samples {
                for &per in &samples {
                    for &de in &samples {
                        let s = score(&ratios(roe, pbv, per, de));
                        assert!(s.total <= MAX_SCORE);
                        let sum = s.profitability + s.valuation + s.earnings_multiple + s.leverage;
                        assert_eq!(u16::from(s.total), u16::from(sum).min(100));
                    }
                }
            }
        }
    }

    #[test]
    fn test_max_points_sum_to_max_score() {
        let sum: u16 = [ROE_TABLE, PBV_TABLE, PER_TABLE, DEBT_TO_EQUITY_TABLE]
            .iter()
            .map(|t| u16::from(t.max_points()))
            .sum();
        assert_eq!(sum, u16::from(MAX_SCORE));
    }

    #[test]
    fn test_missing_fields_score_as_zero_inputs() {
        // Everything absent: ROE 0, PBV 0 (<1), PER 0 (no points), D/E 0 (<1)
        let s = score_fundamentals(&RawFundamentals::new("EMPTY.JK"));
        assert_eq!(s.profitability, 0);
        assert_eq!(s.valuation, 25);
        assert_eq!(s.earnings_multiple, 0);
        assert_eq!(s.leverage, 20);
        assert_eq!(s.total, 45);
    }

    #[test]
    fn test_compare_outcomes() {
        assert_eq!(Outcome::between(70, 55), Outcome::FirstSuperior);
        assert_eq!(Outcome::between(55, 70), Outcome::SecondSuperior);
        assert_eq!(Outcome::between(60, 60), Outcome::Tie);
    }

    #[test]
    fn test_compare_fundamentals() {
        // 30 + 15 + 15 + 10 = 70
        let a = RawFundamentals::new("BBCA.JK")
            .with(Metric::ReturnOnEquity, 0.2)
            .with(Metric::PriceToBook, 1.5)
            .with(Metric::TrailingPe, 20.0)
            .with(Metric::DebtToEquity, 1.5);
        // 20 + 5 + 5 + 20 = 50
        let b = RawFundamentals::new("BBRI.JK")
            .with(Metric::ReturnOnEquity, 0.12)
            .with(Metric::PriceToBook, 2.5)
            .with(Metric::TrailingPe, 30.0)
            .with(Metric::DebtToEquity, 0.5);

        let c = compare(&a, &b);
        assert_eq!(c.first.score.total, 70);
        assert_eq!(c.second.score.total, 50);
        assert_eq!(c.outcome, Outcome::FirstSuperior);
        assert_eq!(c.verdict(), "BBCA.JK superior (70 vs 50)");

        let tie = compare(&a, &a);
        assert_eq!(tie.outcome, Outcome::Tie);
        assert_eq!(tie.verdict(), "Tie (70 vs 70)");
    }
}
