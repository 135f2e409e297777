//! Core Kernel - Foundational types for the billing core
//!
//! This crate provides the building blocks shared by the tenancy, quotation
//! and document crates:
//! - Money types with precise decimal arithmetic
//! - Locale-aware number formatting for every printed amount
//! - Calendar-month helpers and the business clock
//! - Strongly-typed identifiers
//! - The port error type and marker traits for adapters

pub mod money;
pub mod format;
pub mod calendar;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError, Rate};
pub use format::{NumberLocale, GroupingStyle, format_decimal, format_money, format_percent, round_half_up};
pub use calendar::{
    BillingMonth, CalendarError, BusinessClock, SystemClock, FixedClock, start_of_month, end_of_month,
    MonthRange, clamp_day, days_in_month, months_between_inclusive,
};
pub use identifiers::{
    TenancyId, PaymentEntryId, PropertyId, ClientId, QuotationId, LineItemId, IdParseError,
};
pub use ports::{PortError, DomainPort, OperationMetadata};
pub use error::CoreError;
