//! Fund statistics derived from the scraped `funds`, `fundCounts` and
//! `melonNetworkHistories` lists.

use std::fmt::Write;

use scrape_core::ScrapeView;
use serde_json::Value;

/// Token amounts on the network carry 18 decimals.
const WEI_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FundReport {
    pub counts: Option<FundCounts>,
    pub eth_aum: Option<String>,
    pub usd_aum: Option<String>,
    pub funds: Vec<FundRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundCounts {
    pub active: u64,
    pub not_active: u64,
}

impl FundCounts {
    pub fn total(&self) -> u64 {
        self.active.saturating_add(self.not_active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundRow {
    pub id: String,
    pub name: String,
    pub version_name: String,
}

impl FundReport {
    /// Builds the report from whichever settled views carry the relevant lists.
    pub fn from_views<'a>(
        views: impl IntoIterator<Item = &'a ScrapeView> + Clone,
        usd_rate: Option<f64>,
    ) -> Self {
        let counts = fund_counts(list(views.clone(), "fundCounts"));
        let eth_aum = assets_under_management(list(views.clone(), "melonNetworkHistories"));
        let usd_aum = match (&eth_aum, usd_rate) {
            (Some(eth), Some(rate)) => eth
                .parse::<f64>()
                .ok()
                .map(|eth| format_thousands(&format!("{:.0}", eth * rate))),
            _ => None,
        };
        let funds = list(views, "funds").iter().map(fund_row).collect();
        Self {
            counts,
            eth_aum,
            usd_aum,
            funds,
        }
    }
}

fn list<'a>(views: impl IntoIterator<Item = &'a ScrapeView>, field: &str) -> &'a [Value] {
    views
        .into_iter()
        .map(|view| view.data.items(field))
        .find(|items| !items.is_empty())
        .unwrap_or(&[])
}

/// Counts from the most recent `fundCounts` entry.
pub fn fund_counts(entries: &[Value]) -> Option<FundCounts> {
    let last = entries.last()?;
    Some(FundCounts {
        active: as_u64(last.get("active")?)?,
        not_active: as_u64(last.get("nonActive")?)?,
    })
}

/// Latest valid gross asset value of the network, in whole ETH.
pub fn assets_under_management(histories: &[Value]) -> Option<String> {
    let last = histories
        .iter()
        .filter(|entry| entry.get("validGav").is_some_and(is_truthy))
        .last()?;
    let gav = match last.get("gav")? {
        Value::String(raw) => raw.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    format_big_number(&gav, WEI_DECIMALS, 0)
}

fn fund_row(fund: &Value) -> FundRow {
    let text = |value: Option<&Value>| value.and_then(Value::as_str).unwrap_or_default().to_string();
    FundRow {
        id: text(fund.get("id")),
        name: text(fund.get("name")),
        version_name: hex_to_string(&text(fund.pointer("/version/name"))),
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(raw) => raw.trim().parse().ok(),
        Value::Number(number) => number.as_u64(),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Scales an integer amount down by `decimals` and rounds half-up to
/// `fraction_digits`. `None` for non-integer input or on overflow.
pub fn format_big_number(raw: &str, decimals: u32, fraction_digits: u32) -> Option<String> {
    let value: u128 = raw.trim().parse().ok()?;
    let scale = 10u128.checked_pow(decimals)?;
    let fraction_scale = 10u128.checked_pow(fraction_digits)?;

    let mut whole = value / scale;
    let scaled_rem = (value % scale).checked_mul(fraction_scale)?;
    let mut fraction = scaled_rem / scale;
    if (scaled_rem % scale) * 2 >= scale {
        fraction += 1;
        if fraction == fraction_scale {
            fraction = 0;
            whole += 1;
        }
    }

    if fraction_digits == 0 {
        Some(whole.to_string())
    } else {
        Some(format!(
            "{whole}.{fraction:0width$}",
            width = fraction_digits as usize
        ))
    }
}

/// Decodes a `0x`-prefixed hex string into text, dropping NUL padding.
pub fn hex_to_string(hex: &str) -> String {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    let bytes: Vec<u8> = digits
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
        .filter(|byte| *byte != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Inserts `,` between groups of three integer digits.
pub fn format_thousands(value: &str) -> String {
    let (sign, rest) = match value.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", value),
    };
    let (integer, fraction) = match rest.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn render(report: &FundReport) -> String {
    let mut out = String::new();

    match report.counts {
        Some(counts) => {
            let _ = writeln!(
                out,
                "Number of funds: {} ({} active, {} not active)",
                counts.total(),
                counts.active,
                counts.not_active
            );
        }
        None => out.push_str("Number of funds: unavailable\n"),
    }

    match (&report.eth_aum, &report.usd_aum) {
        (Some(eth), Some(usd)) => {
            let _ = writeln!(out, "Total assets under management: {eth} ETH ({usd} USD)");
        }
        (Some(eth), None) => {
            let _ = writeln!(out, "Total assets under management: {eth} ETH");
        }
        _ => out.push_str("Total assets under management: unavailable\n"),
    }

    if !report.funds.is_empty() {
        let _ = writeln!(out, "\n{:<44} {:<32} VERSION", "ID", "NAME");
        for fund in &report.funds {
            let _ = writeln!(
                out,
                "{:<44} {:<32} {}",
                fund.id, fund.name, fund.version_name
            );
        }
    }
    out
}
