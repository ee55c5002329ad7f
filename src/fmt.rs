use serde::{Deserialize, Serialize};

/// How amounts are rendered. Passed explicitly to every formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyFormat {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Place the symbol after the number (`1,234.56 €`).
    #[serde(default)]
    pub symbol_after: bool,
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

fn default_symbol() -> String {
    "$".to_string()
}

fn default_decimals() -> usize {
    2
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            symbol_after: false,
            decimals: default_decimals(),
        }
    }
}

/// Format an amount with thousands separators: $1,234.56
pub fn money(val: f64, fmt: &MoneyFormat) -> String {
    let fixed = format!("{:.*}", fmt.decimals, val.abs());
    // -0.001 rounds to 0.00 and should print without a sign
    let negative = val < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let (int_part, dec_part) = match fixed.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (fixed.as_str(), None),
    };

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let mut number: String = with_commas.chars().rev().collect();
    if let Some(d) = dec_part {
        number.push('.');
        number.push_str(d);
    }

    let sign = if negative { "-" } else { "" };
    if fmt.symbol_after {
        format!("{sign}{number} {}", fmt.symbol)
    } else {
        format!("{sign}{}{number}", fmt.symbol)
    }
}

pub fn percent(val: f64) -> String {
    format!("{val:.1}%")
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
