// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Seeded sample portfolios and advisor replies for offline runs.

use crate::{ChartImage, ChartKind, PortfolioSnapshot, RowRecord, Totals};
use serde_json::{Map, json};
use std::collections::BTreeMap;

/// A 1x1 transparent PNG, base64-encoded. Stands in for every chart.
pub const SAMPLE_CHART_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub const EQUITY_KIND: &str = "EQUITY";
pub const FUND_KIND: &str = "MF";

const EQUITIES: [&str; 12] = [
    "INFY",
    "TCS",
    "HDFCBANK",
    "RELIANCE",
    "ITC",
    "WIPRO",
    "SBIN",
    "ASIANPAINT",
    "LT",
    "BAJFINANCE",
    "MARUTI",
    "SUNPHARMA",
];

const FUNDS: [&str; 6] = [
    "PARAG PARIKH FLEXI CAP FUND",
    "AXIS BLUECHIP FUND",
    "MIRAE ASSET LARGE CAP FUND",
    "SBI SMALL CAP FUND",
    "HDFC INDEX NIFTY 50 FUND",
    "KOTAK EMERGING EQUITY FUND",
];

const REPLIES: [&str; 4] = [
    "## Overview\nYour portfolio is **up** overall, led by large-cap equity.\n\n* Equity is the dominant allocation\n* Mutual funds add diversification",
    "### Risk exposure\nConcentration is **moderate**.\n\n+ Top three holdings make up a large share\n+ Consider adding debt funds to cushion drawdowns",
    "**Suggestions**\n\n* Rebalance towards index funds\n* Trim positions with persistent losses\n* Review expense ratios on active funds",
    "Performance looks steady. Keep SIPs running and revisit the allocation every quarter.",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn int_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + self.next_u64() % (max - min + 1)
    }
}

/// Seeded generator for holdings and advisor replies. The same seed always
/// produces the same portfolio.
#[derive(Debug, Clone)]
pub struct DemoPortfolio {
    rng: DeterministicRng,
}

impl DemoPortfolio {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// One holding with derived invested, value and P&L columns filled in.
    pub fn holding(&mut self) -> RowRecord {
        let fund = self.rng.int_n(3) == 0;
        let (instrument, kind) = if fund {
            (FUNDS[self.rng.int_n(FUNDS.len())], FUND_KIND)
        } else {
            (EQUITIES[self.rng.int_n(EQUITIES.len())], EQUITY_KIND)
        };

        let qty = self.rng.int_range(1, 250) as f64;
        let avg_cost = self.rng.int_range(5_000, 450_000) as f64 / 100.0;
        let drift = self.rng.int_range(70, 140) as f64 / 100.0;
        let ltp = round2(avg_cost * drift);
        let invested = round2(qty * avg_cost);
        let current_value = round2(qty * ltp);
        let pnl = round2(current_value - invested);

        RowRecord {
            instrument: instrument.to_owned(),
            qty: Some(qty),
            avg_cost: Some(avg_cost),
            ltp: Some(ltp),
            invested: Some(invested),
            current_value: Some(current_value),
            pnl: Some(pnl),
            pnl_percent: Some(round2(pnl / invested * 100.0)),
            kind: Some(kind.to_owned()),
        }
    }

    pub fn holdings(&mut self, count: usize) -> Vec<RowRecord> {
        (0..count).map(|_| self.holding()).collect()
    }

    /// A snapshot shaped like a successful analysis of `count` holdings.
    /// `received_at` is left unset.
    pub fn snapshot(&mut self, count: usize) -> PortfolioSnapshot {
        let rows = self.holdings(count);
        aggregate_rows(rows)
    }

    pub fn advisor_reply(&mut self) -> String {
        REPLIES[self.rng.int_n(REPLIES.len())].to_owned()
    }
}

/// Aggregates rows the way the analysis service does: totals over every
/// row, holdings keyed by upper-cased instrument, one chart per non-empty
/// category.
pub fn aggregate_rows(rows: Vec<RowRecord>) -> PortfolioSnapshot {
    let invested = rows.iter().filter_map(|row| row.invested).sum::<f64>();
    let current_value = rows.iter().filter_map(|row| row.current_value).sum::<f64>();
    let total_pnl = current_value - invested;
    let totals = (!rows.is_empty()).then(|| Totals {
        total_investment: Some(round2(invested)),
        current_value: Some(round2(current_value)),
        total_pnl: Some(round2(total_pnl)),
        pnl_percent: (invested > 0.0).then(|| round2(total_pnl / invested * 100.0)),
    });

    let mut holdings = Map::new();
    for row in &rows {
        let value = row.invested.unwrap_or_default();
        let entry = holdings
            .entry(row.instrument.to_uppercase())
            .or_insert_with(|| json!(0.0));
        *entry = json!(round2(entry.as_f64().unwrap_or_default() + value));
    }

    let mut charts = BTreeMap::new();
    if !rows.is_empty() {
        charts.insert(ChartKind::Total, ChartImage::new(SAMPLE_CHART_PNG_BASE64));
    }
    if rows.iter().any(|row| row.kind.as_deref() == Some(EQUITY_KIND)) {
        charts.insert(ChartKind::Equity, ChartImage::new(SAMPLE_CHART_PNG_BASE64));
    }
    if rows.iter().any(|row| row.kind.as_deref() == Some(FUND_KIND)) {
        charts.insert(
            ChartKind::MutualFund,
            ChartImage::new(SAMPLE_CHART_PNG_BASE64),
        );
    }

    PortfolioSnapshot {
        table_rows: rows,
        charts,
        totals,
        holdings,
        received_at: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
