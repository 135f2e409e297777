//! Locale-aware number and money formatting
//!
//! Every amount printed on a screen or a rendered document goes through this
//! module so that statements, quotations and notifications agree on grouping
//! and rounding. Displayed amounts are rounded half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::CoreError;
use crate::money::Money;

/// How the integer part of a number is grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStyle {
    /// 12,34,567 (last three digits, then pairs)
    Indian,
    /// 1,234,567
    Thousands,
}

/// Separators and grouping for one locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLocale {
    pub grouping: GroupingStyle,
    pub group_separator: char,
    pub decimal_separator: char,
}

impl NumberLocale {
    pub const fn en_in() -> Self {
        Self {
            grouping: GroupingStyle::Indian,
            group_separator: ',',
            decimal_separator: '.',
        }
    }

    pub const fn en_us() -> Self {
        Self {
            grouping: GroupingStyle::Thousands,
            group_separator: ',',
            decimal_separator: '.',
        }
    }

    /// Continental European style: 1.234.567,89
    pub const fn continental() -> Self {
        Self {
            grouping: GroupingStyle::Thousands,
            group_separator: '.',
            decimal_separator: ',',
        }
    }

    /// Resolves the number conventions for a language identifier
    pub fn from_langid(langid: &LanguageIdentifier) -> Self {
        let region = langid.region.as_ref().map(|r| r.as_str());
        if region == Some("IN") {
            return Self::en_in();
        }
        match langid.language.as_str() {
            "de" | "es" | "fr" | "it" | "pt" | "nl" => Self::continental(),
            _ => Self::en_us(),
        }
    }

    /// Parses a BCP-47 tag such as `en-IN`
    pub fn from_tag(tag: &str) -> Result<Self, CoreError> {
        let langid: LanguageIdentifier = tag
            .parse()
            .map_err(|_| CoreError::Configuration(format!("Invalid locale tag: {}", tag)))?;
        Ok(Self::from_langid(&langid))
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self::en_in()
    }
}

/// Rounds half away from zero to `dp` decimal places
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a decimal with grouping, rounding to exactly `dp` places
pub fn format_decimal(value: Decimal, dp: u32, locale: &NumberLocale) -> String {
    let rounded = round_half_up(value, dp);
    let negative = rounded < Decimal::ZERO;
    let plain = format!("{:.dp$}", rounded.abs(), dp = dp as usize);

    let (integer, fraction) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut out = String::with_capacity(plain.len() + plain.len() / 2 + 1);
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(integer, locale));
    if let Some(fraction) = fraction {
        out.push(locale.decimal_separator);
        out.push_str(fraction);
    }
    out
}

/// Formats money with its currency symbol and minor-unit precision
pub fn format_money(money: &Money, locale: &NumberLocale) -> String {
    let body = format_decimal(money.amount(), money.currency().decimal_places(), locale);
    match body.strip_prefix('-') {
        Some(rest) => format!("-{}{}", money.currency().symbol(), rest),
        None => format!("{}{}", money.currency().symbol(), body),
    }
}

/// Formats a percentage without trailing zeros (e.g. `18%`, `2.5%`)
pub fn format_percent(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

fn group_digits(digits: &str, locale: &NumberLocale) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(len - 3);
    let head_groups: Vec<&str> = match locale.grouping {
        GroupingStyle::Thousands => chunk_from_right(head, 3),
        GroupingStyle::Indian => chunk_from_right(head, 2),
    };

    let sep = locale.group_separator.to_string();
    let mut out = head_groups.join(&sep);
    out.push(locale.group_separator);
    out.push_str(tail);
    out
}

fn chunk_from_right(digits: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut end = digits.len();
    while end > 0 {
        let start = end.saturating_sub(size);
        chunks.push(&digits[start..end]);
        end = start;
    }
    chunks.reverse();
    chunks
}
