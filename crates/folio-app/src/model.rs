// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::error::ChartError;

pub const PORTFOLIO_FILE_EXTENSION: &str = "csv";

pub const SUGGESTED_QUESTIONS: [&str; 3] = [
    "Analyze my portfolio performance",
    "What is my risk exposure?",
    "Suggest improvements for my portfolio",
];

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatVisibility {
    #[default]
    Hidden,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChartKind {
    Total,
    Equity,
    MutualFund,
}

impl ChartKind {
    pub const ALL: [Self; 3] = [Self::Total, Self::Equity, Self::MutualFund];

    /// Key used in the service's `pie_charts` object.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Equity => "equity",
            Self::MutualFund => "mf",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "total" => Some(Self::Total),
            "equity" => Some(Self::Equity),
            "mf" => Some(Self::MutualFund),
            _ => None,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Total => "Total Allocation",
            Self::Equity => "Equity Holdings",
            Self::MutualFund => "Mutual Funds",
        }
    }
}

/// Base64-encoded PNG as delivered by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    encoded: String,
}

impl ChartImage {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }

    pub fn as_base64(&self) -> &str {
        &self.encoded
    }

    pub fn decode_png(&self) -> Result<Vec<u8>, ChartError> {
        let bytes = STANDARD.decode(self.encoded.trim())?;
        if !bytes.starts_with(&PNG_SIGNATURE) {
            return Err(ChartError::NotPng);
        }
        Ok(bytes)
    }
}

/// One holding row of the analyzed portfolio. Numbers are optional because
/// the service sends `null` for values it could not compute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowRecord {
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(default, alias = "avg cost")]
    pub avg_cost: Option<f64>,
    #[serde(default)]
    pub ltp: Option<f64>,
    #[serde(default)]
    pub invested: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub pnl: Option<f64>,
    #[serde(default)]
    pub pnl_percent: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default)]
    pub total_investment: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub total_pnl: Option<f64>,
    #[serde(default)]
    pub pnl_percent: Option<f64>,
}

impl Totals {
    /// Current value minus invested amount, used to colour the current value.
    pub fn value_change(&self) -> Option<f64> {
        Some(self.current_value? - self.total_investment?)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioSnapshot {
    pub table_rows: Vec<RowRecord>,
    pub charts: BTreeMap<ChartKind, ChartImage>,
    pub totals: Option<Totals>,
    pub holdings: Map<String, Value>,
    pub received_at: Option<OffsetDateTime>,
}

impl PortfolioSnapshot {
    pub fn is_empty(&self) -> bool {
        self.table_rows.is_empty()
            && self.charts.is_empty()
            && self.totals.is_none()
            && self.holdings.is_empty()
    }

    pub fn context(&self) -> PortfolioContext {
        PortfolioContext {
            totals: self.totals,
            holdings: self.holdings.clone(),
        }
    }
}

/// Portfolio data attached to every chat request.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PortfolioContext {
    pub totals: Option<Totals>,
    pub holdings: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatSender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub sender: ChatSender,
    #[serde(rename = "message")]
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: ChatSender::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: ChatSender::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub chat_history: Vec<ChatTurn>,
    pub portfolio_data: PortfolioContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

/// Extension filter applied to candidate portfolio files.
pub fn is_portfolio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PORTFOLIO_FILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::{
        ChartImage, ChartKind, ChatSender, ChatTurn, RowRecord, SelectedFile, Theme, Totals,
        is_portfolio_file,
    };
    use crate::error::ChartError;
    use std::path::Path;

    #[test]
    fn row_accepts_service_column_names_and_nulls() {
        let row: RowRecord = serde_json::from_str(
            r#"{"instrument":"INFY","qty":10,"avg cost":1400.5,"ltp":1500,"invested":14005.0,
                "current_value":15000.0,"pnl":995.0,"pnl_percent":null,"type":"EQUITY","extra":1}"#,
        )
        .expect("row should decode");
        assert_eq!(row.instrument, "INFY");
        assert_eq!(row.qty, Some(10.0));
        assert_eq!(row.avg_cost, Some(1400.5));
        assert_eq!(row.pnl_percent, None);
        assert_eq!(row.kind.as_deref(), Some("EQUITY"));
    }

    #[test]
    fn chat_turn_uses_service_wire_shape() {
        let encoded = serde_json::to_value(vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")])
            .expect("turns should encode");
        assert_eq!(
            encoded,
            serde_json::json!([
                {"sender": "user", "message": "hi"},
                {"sender": "ai", "message": "hello"},
            ])
        );

        let decoded: ChatTurn =
            serde_json::from_str(r#"{"sender":"assistant","message":"x"}"#).expect("alias");
        assert_eq!(decoded.sender, ChatSender::Assistant);
    }

    #[test]
    fn chart_kind_keys_round_trip() {
        for kind in ChartKind::ALL {
            assert_eq!(ChartKind::parse(kind.key()), Some(kind));
        }
        assert_eq!(ChartKind::parse("bonds"), None);
    }

    #[test]
    fn chart_decode_checks_png_signature() {
        let png = ChartImage::new("iVBORw0KGgoAAAANSUhEUg==");
        let bytes = png.decode_png().expect("png header should decode");
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

        let text = ChartImage::new("aGVsbG8=");
        assert!(matches!(text.decode_png(), Err(ChartError::NotPng)));

        let garbage = ChartImage::new("not base64!");
        assert!(matches!(garbage.decode_png(), Err(ChartError::Base64(_))));
    }

    #[test]
    fn theme_toggles_between_identifiers() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
        assert_eq!(Theme::parse(Theme::Light.as_str()), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
    }

    #[test]
    fn totals_value_change_requires_both_sides() {
        let totals = Totals {
            total_investment: Some(100.0),
            current_value: Some(90.0),
            ..Totals::default()
        };
        assert_eq!(totals.value_change(), Some(-10.0));
        assert_eq!(Totals::default().value_change(), None);
    }

    #[test]
    fn portfolio_file_filter_is_case_insensitive() {
        assert!(is_portfolio_file(Path::new("holdings.csv")));
        assert!(is_portfolio_file(Path::new("/tmp/HOLDINGS.CSV")));
        assert!(!is_portfolio_file(Path::new("holdings.xlsx")));
        assert!(!is_portfolio_file(Path::new("csv")));
    }

    #[test]
    fn selected_file_takes_display_name_from_path() {
        let file = SelectedFile::from_path("/data/exports/holdings.csv");
        assert_eq!(file.name, "holdings.csv");
    }
}
