//! Quotation line items
//!
//! `amount` is private and always equals `quantity * rate`. Only the quantity
//! and rate setters recompute it; changing the tax rate leaves it alone.
//! Inputs are rounded half up to the four places the store keeps, so a
//! reloaded line prices exactly like the one that was saved.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{round_half_up, LineItemId, QuotationId};

use crate::error::QuotationError;

/// Tax rate given to new lines unless configured otherwise
pub const DEFAULT_TAX_RATE_PERCENT: Decimal = dec!(18);

/// One priced row on a quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationLineItem {
    pub id: LineItemId,
    pub quotation_id: QuotationId,
    description: String,
    quantity: Decimal,
    rate: Decimal,
    tax_rate_percent: Decimal,
    amount: Decimal,
    pub display_order: u32,
    /// Free-form commentary, unrelated to tax
    pub notes: Option<String>,
}

/// Decimal places kept for quantity, rate and tax rate, matching the stored columns
pub const LINE_DECIMAL_PLACES: u32 = 4;

/// Largest value a `NUMERIC(19, 4)` column holds
pub const MAX_LINE_VALUE: Decimal = dec!(999999999999999.9999);

fn check_quantity(quantity: Decimal) -> Result<Decimal, QuotationError> {
    let quantity = round_half_up(quantity, LINE_DECIMAL_PLACES);
    if quantity < Decimal::ZERO {
        return Err(QuotationError::validation("Quantity cannot be negative"));
    }
    if quantity > MAX_LINE_VALUE {
        return Err(QuotationError::validation("Quantity is out of range"));
    }
    Ok(quantity)
}

fn check_rate(rate: Decimal) -> Result<Decimal, QuotationError> {
    let rate = round_half_up(rate, LINE_DECIMAL_PLACES);
    if rate < Decimal::ZERO {
        return Err(QuotationError::validation("Rate cannot be negative"));
    }
    if rate > MAX_LINE_VALUE {
        return Err(QuotationError::validation("Rate is out of range"));
    }
    Ok(rate)
}

fn check_tax_rate(tax_rate_percent: Decimal) -> Result<Decimal, QuotationError> {
    let tax_rate_percent = round_half_up(tax_rate_percent, LINE_DECIMAL_PLACES);
    if tax_rate_percent < Decimal::ZERO || tax_rate_percent > Decimal::ONE_HUNDRED {
        return Err(QuotationError::validation(format!(
            "Tax rate {}% must be between 0 and 100",
            tax_rate_percent.normalize()
        )));
    }
    Ok(tax_rate_percent)
}

/// `quantity * rate`, refused when it would not fit the amount column
fn line_amount(quantity: Decimal, rate: Decimal) -> Result<Decimal, QuotationError> {
    quantity
        .checked_mul(rate)
        .filter(|amount| *amount <= MAX_LINE_VALUE)
        .ok_or_else(|| QuotationError::validation("Line amount is out of range"))
}

impl QuotationLineItem {
    pub fn new(
        quotation_id: QuotationId,
        description: impl Into<String>,
        quantity: Decimal,
        rate: Decimal,
        tax_rate_percent: Decimal,
    ) -> Result<Self, QuotationError> {
        let quantity = check_quantity(quantity)?;
        let rate = check_rate(rate)?;
        let tax_rate_percent = check_tax_rate(tax_rate_percent)?;
        let amount = line_amount(quantity, rate)?;
        Ok(Self {
            id: LineItemId::new_v7(),
            quotation_id,
            description: description.into(),
            quantity,
            rate,
            tax_rate_percent,
            amount,
            display_order: 0,
            notes: None,
        })
    }

    /// A new editing row: quantity 1, rate 0, amount 0
    pub fn blank(quotation_id: QuotationId, tax_rate_percent: Decimal) -> Result<Self, QuotationError> {
        Self::new(quotation_id, String::new(), Decimal::ONE, Decimal::ZERO, tax_rate_percent)
    }

    /// Rebuilds a stored row; the amount is recomputed, not trusted
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: LineItemId,
        quotation_id: QuotationId,
        description: String,
        quantity: Decimal,
        rate: Decimal,
        tax_rate_percent: Decimal,
        display_order: u32,
        notes: Option<String>,
    ) -> Result<Self, QuotationError> {
        let mut item = Self::new(quotation_id, description, quantity, rate, tax_rate_percent)?;
        item.id = id;
        item.display_order = display_order;
        item.notes = notes;
        Ok(item)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn tax_rate_percent(&self) -> Decimal {
        self.tax_rate_percent
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_quantity(&mut self, quantity: Decimal) -> Result<(), QuotationError> {
        let quantity = check_quantity(quantity)?;
        self.amount = line_amount(quantity, self.rate)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn set_rate(&mut self, rate: Decimal) -> Result<(), QuotationError> {
        let rate = check_rate(rate)?;
        self.amount = line_amount(self.quantity, rate)?;
        self.rate = rate;
        Ok(())
    }

    pub fn set_tax_rate(&mut self, tax_rate_percent: Decimal) -> Result<(), QuotationError> {
        self.tax_rate_percent = check_tax_rate(tax_rate_percent)?;
        Ok(())
    }

    pub fn with_order(mut self, display_order: u32) -> Self {
        self.display_order = display_order;
        self
    }
}
