// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use folio_app::demo::{DemoPortfolio, aggregate_rows};
use folio_app::{PortfolioSnapshot, RowRecord};
use serde_json::{Map, Value, json};
use std::fmt::Write as _;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::macros::datetime;

pub use folio_app::demo::{
    EQUITY_KIND, FUND_KIND, SAMPLE_CHART_PNG_BASE64 as TINY_PNG_BASE64,
};

/// Seeded generator for holdings, snapshots and service payloads. The same
/// seed always produces the same portfolio, stamped with a fixed receive time.
#[derive(Debug, Clone)]
pub struct PortfolioFaker {
    demo: DemoPortfolio,
}

impl PortfolioFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            demo: DemoPortfolio::new(seed),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.demo.int_n(n)
    }

    pub fn holding(&mut self) -> RowRecord {
        self.demo.holding()
    }

    pub fn holdings(&mut self, count: usize) -> Vec<RowRecord> {
        self.demo.holdings(count)
    }

    pub fn snapshot(&mut self, count: usize) -> PortfolioSnapshot {
        let rows = self.holdings(count);
        snapshot_from_rows(rows)
    }

    /// Body of a successful `/api/upload` response, using the service's own
    /// column names.
    pub fn upload_body(&mut self, count: usize) -> Value {
        let rows = self.holdings(count);
        let snapshot = snapshot_from_rows(rows.clone());
        let charts = snapshot
            .charts
            .iter()
            .map(|(kind, image)| (kind.key().to_owned(), json!(image.as_base64())))
            .collect::<Map<String, Value>>();

        json!({
            "success": true,
            "table_data": rows.iter().map(wire_row).collect::<Vec<Value>>(),
            "pie_charts": charts,
            "totals": snapshot.totals,
            "holdings": snapshot.holdings,
        })
    }

    /// Holdings export in the broker CSV layout the service accepts.
    pub fn holdings_csv(&mut self, count: usize) -> String {
        let mut out = String::from("Instrument,Qty.,Avg. cost,LTP,Type\n");
        for row in self.holdings(count) {
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                row.instrument,
                row.qty.unwrap_or_default(),
                row.avg_cost.unwrap_or_default(),
                row.ltp.unwrap_or_default(),
                row.kind.as_deref().unwrap_or(EQUITY_KIND),
            );
        }
        out
    }

    pub fn advisor_reply(&mut self) -> String {
        self.demo.advisor_reply()
    }
}

pub fn snapshot_from_rows(rows: Vec<RowRecord>) -> PortfolioSnapshot {
    PortfolioSnapshot {
        received_at: Some(fixture_received_at()),
        ..aggregate_rows(rows)
    }
}

pub fn wire_row(row: &RowRecord) -> Value {
    json!({
        "instrument": row.instrument,
        "qty": row.qty,
        "avg cost": row.avg_cost,
        "ltp": row.ltp,
        "invested": row.invested,
        "current_value": row.current_value,
        "pnl": row.pnl,
        "pnl_percent": row.pnl_percent,
        "type": row.kind,
    })
}

/// Writes a generated holdings CSV into a fresh temp dir.
pub fn temp_holdings_file(seed: u64, count: usize) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("holdings.csv");
    let csv = PortfolioFaker::new(seed).holdings_csv(count);
    std::fs::write(&path, csv).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}

pub fn fixture_received_at() -> OffsetDateTime {
    datetime!(2026-01-15 09:30:00 UTC)
}

#[cfg(test)]
mod tests {
    use super::{
        PortfolioFaker, TINY_PNG_BASE64, fixture_received_at, snapshot_from_rows,
        temp_holdings_file,
    };
    use folio_app::demo::DemoPortfolio;

    #[test]
    fn faker_matches_demo_generator_for_same_seed() {
        let mut faker = PortfolioFaker::new(42);
        let mut demo = DemoPortfolio::new(42);
        assert_eq!(faker.holdings(5), demo.holdings(5));
    }

    #[test]
    fn snapshots_carry_fixed_receive_time() {
        let snapshot = PortfolioFaker::new(3).snapshot(4);
        assert_eq!(snapshot.received_at, Some(fixture_received_at()));
        assert_eq!(
            snapshot_from_rows(Vec::new()).received_at,
            Some(fixture_received_at())
        );
    }

    #[test]
    fn upload_body_uses_service_column_names() {
        let body = PortfolioFaker::new(11).upload_body(3);
        assert_eq!(body["success"], true);
        let first = &body["table_data"][0];
        assert!(first.get("avg cost").is_some());
        assert!(first.get("type").is_some());
        assert_eq!(body["pie_charts"]["total"], TINY_PNG_BASE64);
    }

    #[test]
    fn csv_has_header_and_one_line_per_holding() {
        let csv = PortfolioFaker::new(5).holdings_csv(4);
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "Instrument,Qty.,Avg. cost,LTP,Type");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn temp_holdings_file_is_written() {
        let (_dir, path) = temp_holdings_file(9, 2).expect("temp file");
        let contents = std::fs::read_to_string(&path).expect("read back");
        assert!(contents.starts_with("Instrument,"));
    }
}
