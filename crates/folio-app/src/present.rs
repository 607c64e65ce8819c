// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Display derivations over the snapshot and transcript. Everything here is
//! a pure function of its input.

pub const CURRENCY_SYMBOL: &str = "₹";
pub const PLACEHOLDER: &str = "N/A";
pub const BULLET: char = '•';

/// Formats an amount the way the en-IN locale renders INR: lakh grouping and
/// exactly two fraction digits. Missing or non-finite values render as
/// [`PLACEHOLDER`].
pub fn format_currency(value: Option<f64>) -> String {
    let Some(value) = value.filter(|value| value.is_finite()) else {
        return PLACEHOLDER.to_owned();
    };

    let rounded = format!("{:.2}", value.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if value < 0.0 && rounded != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{sign}{CURRENCY_SYMBOL}{}.{fraction}", group_lakh(whole))
}

pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|value| value.is_finite()) {
        Some(value) => format!("{value:.2}%"),
        None => PLACEHOLDER.to_owned(),
    }
}

pub fn format_quantity(value: Option<f64>) -> String {
    match value.filter(|value| value.is_finite()) {
        Some(value) if value.fract() == 0.0 => format!("{value:.0}"),
        Some(value) => format!("{value:.4}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_owned(),
        None => PLACEHOLDER.to_owned(),
    }
}

fn group_lakh(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlClass {
    Positive,
    Negative,
    Neutral,
    /// No value to classify. Rendered like `Neutral`.
    Unknown,
}

impl PnlClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

pub fn classify_pnl(value: Option<f64>) -> PnlClass {
    match value {
        None => PnlClass::Unknown,
        Some(value) if value.is_nan() => PnlClass::Unknown,
        Some(value) if value > 0.0 => PnlClass::Positive,
        Some(value) if value < 0.0 => PnlClass::Negative,
        Some(_) => PnlClass::Neutral,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBlock {
    Paragraph(String),
    List(Vec<String>),
}

/// Strips markdown emphasis and heading markers from an assistant reply and
/// splits it into paragraphs and bullet lists.
///
/// Running the cleaner over [`visible_text`] of its own output yields the
/// same blocks.
pub fn clean_message(raw: &str) -> Vec<MessageBlock> {
    let lines = raw
        .lines()
        .map(clean_line)
        .collect::<Vec<String>>();

    lines
        .split(|line| line.is_empty())
        .filter_map(block_from_lines)
        .collect()
}

pub fn visible_text(blocks: &[MessageBlock]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            MessageBlock::Paragraph(text) => text.clone(),
            MessageBlock::List(items) => items
                .iter()
                .map(|item| format!("{BULLET} {item}"))
                .collect::<Vec<String>>()
                .join("\n"),
        })
        .collect::<Vec<String>>()
        .join("\n\n")
}

fn clean_line(line: &str) -> String {
    let unbolded = strip_bold(line);
    let text = strip_heading(unbolded.trim());
    normalize_bullet(text)
}

fn strip_bold(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push_str(&after_open[..close]);
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);
    out
}

fn strip_heading(line: &str) -> &str {
    let mut text = line;
    // "# # Risk" and "## **## Overview**" both reduce to the bare title.
    while let Some(rest) = text.strip_prefix('#') {
        text = rest.trim_start_matches('#').trim_start();
    }
    text
}

fn normalize_bullet(line: &str) -> String {
    let is_bullet = line.starts_with('+') || (line.starts_with('*') && !line.starts_with("**"));
    if is_bullet {
        format!("{BULLET} {}", line[1..].trim_start())
    } else {
        line.to_owned()
    }
}

fn block_from_lines(lines: &[String]) -> Option<MessageBlock> {
    let first = lines.first()?;
    if first.starts_with(BULLET) {
        let items = lines
            .iter()
            .map(|line| line.strip_prefix(BULLET).unwrap_or(line.as_str()).trim().to_owned())
            .filter(|item| !item.is_empty())
            .collect::<Vec<String>>();
        if items.is_empty() {
            return None;
        }
        return Some(MessageBlock::List(items));
    }

    Some(MessageBlock::Paragraph(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::{
        MessageBlock, PLACEHOLDER, PnlClass, classify_pnl, clean_message, format_currency,
        format_percent, format_quantity, visible_text,
    };

    #[test]
    fn currency_uses_two_fraction_digits_and_symbol() {
        assert_eq!(format_currency(Some(1234.5)), "₹1,234.50");
        assert_eq!(format_currency(Some(0.0)), "₹0.00");
        assert_eq!(format_currency(Some(999.999)), "₹1,000.00");
        assert_eq!(format_currency(Some(-42.1)), "-₹42.10");
    }

    #[test]
    fn currency_groups_by_lakh_and_crore() {
        assert_eq!(format_currency(Some(123_456.0)), "₹1,23,456.00");
        assert_eq!(format_currency(Some(1_234_567.891)), "₹12,34,567.89");
        assert_eq!(format_currency(Some(123_456_789.0)), "₹12,34,56,789.00");
    }

    #[test]
    fn currency_placeholder_for_missing_and_nan() {
        assert_eq!(format_currency(None), PLACEHOLDER);
        assert_eq!(format_currency(Some(f64::NAN)), PLACEHOLDER);
        assert_eq!(format_currency(Some(f64::INFINITY)), PLACEHOLDER);
    }

    #[test]
    fn percent_and_quantity_formatting() {
        assert_eq!(format_percent(Some(12.5)), "12.50%");
        assert_eq!(format_percent(None), PLACEHOLDER);
        assert_eq!(format_quantity(Some(10.0)), "10");
        assert_eq!(format_quantity(Some(2.5)), "2.5");
        assert_eq!(format_quantity(None), PLACEHOLDER);
    }

    #[test]
    fn pnl_classification_uses_strict_sign() {
        assert_eq!(classify_pnl(Some(0.01)), PnlClass::Positive);
        assert_eq!(classify_pnl(Some(-0.01)), PnlClass::Negative);
        assert_eq!(classify_pnl(Some(0.0)), PnlClass::Neutral);
        assert_eq!(classify_pnl(Some(-0.0)), PnlClass::Neutral);
        assert_eq!(classify_pnl(None), PnlClass::Unknown);
        assert_eq!(classify_pnl(Some(f64::NAN)), PnlClass::Unknown);
    }

    #[test]
    fn cleaner_splits_plain_paragraph_and_list() {
        let blocks = clean_message("**Hello** \n\n* one\n* two");
        assert_eq!(
            blocks,
            vec![
                MessageBlock::Paragraph("Hello".to_owned()),
                MessageBlock::List(vec!["one".to_owned(), "two".to_owned()]),
            ]
        );
    }

    #[test]
    fn cleaner_is_idempotent_on_visible_text() {
        let inputs = [
            "**Hello** \n\n* one\n* two",
            "## Summary\nYour **equity** share is high.\n\n+ Trim **INFY**\n+ Add debt funds",
            "***odd*** markers ** left open\n\n# \n\n*\n\n* # heading-ish item",
            "Intro line\n* not a list because intro comes first\n\n\n\n  * indented bullet",
            "# # Risk",
            "## **## Overview**\n\n#### ## # Deep",
        ];
        for input in inputs {
            let first = clean_message(input);
            let text = visible_text(&first);
            let second = clean_message(&text);
            assert_eq!(first, second, "input {input:?}");
            assert_eq!(visible_text(&second), text, "input {input:?}");
        }
    }

    #[test]
    fn cleaner_strips_repeated_heading_markers() {
        assert_eq!(
            clean_message("# # Risk"),
            vec![MessageBlock::Paragraph("Risk".to_owned())]
        );
        assert_eq!(
            clean_message("## **## Overview**"),
            vec![MessageBlock::Paragraph("Overview".to_owned())]
        );
    }

    #[test]
    fn cleaner_strips_headings_and_plus_bullets() {
        let blocks = clean_message("### Risk\n\n+ Concentration in IT\n+ Low debt allocation");
        assert_eq!(
            blocks,
            vec![
                MessageBlock::Paragraph("Risk".to_owned()),
                MessageBlock::List(vec![
                    "Concentration in IT".to_owned(),
                    "Low debt allocation".to_owned(),
                ]),
            ]
        );
    }

    #[test]
    fn cleaner_drops_empty_paragraphs_and_items() {
        assert!(clean_message("").is_empty());
        assert!(clean_message("\n\n   \n\n#\n*").is_empty());
        assert_eq!(
            clean_message("*\n* kept"),
            vec![MessageBlock::List(vec!["kept".to_owned()])]
        );
    }

    #[test]
    fn paragraph_with_inline_bullets_stays_plain() {
        let blocks = clean_message("Consider:\n* rebalancing\n* SIPs");
        assert_eq!(
            blocks,
            vec![MessageBlock::Paragraph(
                "Consider:\n• rebalancing\n• SIPs".to_owned()
            )]
        );
    }
}
