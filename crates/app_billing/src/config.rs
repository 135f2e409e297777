//! Billing configuration
//!
//! Values come from `BILLING_*` environment variables (a `.env` file is
//! loaded first when present) and fall back to the defaults below. The raw
//! strings are parsed once into [`BillingSettings`], which is what the
//! orchestrator holds.

use rust_decimal::Decimal;
use serde::Deserialize;

use core_kernel::{Currency, NumberLocale, SystemClock};
use domain_documents::{IssuerDetails, PageBudget, TaxLayout};
use domain_quotation::DEFAULT_TAX_RATE_PERCENT;
use domain_tenancy::{MonthlyLogPolicy, DEFAULT_DUE_SOON_WINDOW_DAYS, DEFAULT_LOOK_AHEAD_MONTHS};
use infra_db::DatabaseConfig;

use crate::error::AppError;

const ENV_PREFIX: &str = "BILLING";

/// Longest look-ahead the payment calendar accepts
pub const MAX_LOOK_AHEAD_MONTHS: u32 = 120;

/// Most table rows a configured page may hold
pub const MAX_ROWS_PER_PAGE: u32 = 1_000;

/// Billing configuration as read from the environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// ISO currency code for new quotations
    pub currency: String,
    /// BCP-47 tag selecting digit grouping and separators
    pub locale: String,
    pub default_tax_rate_percent: Decimal,
    pub due_soon_window_days: i64,
    pub calendar_look_ahead_months: u32,
    /// Whether "log monthly payment" also refreshes cached status fields
    pub monthly_log_updates_status: bool,
    /// `itemized` or `consolidated`
    pub tax_layout: String,
    /// Table rows per continuation page; the A4 budget when unset
    pub rows_per_page: Option<u32>,
    pub company_name: String,
    pub company_address: Option<String>,
    pub company_phone: Option<String>,
    pub company_email: Option<String>,
    pub company_tax_id: Option<String>,
    /// IANA zone used to decide what "today" is
    pub timezone: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            locale: "en-IN".to_string(),
            default_tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
            due_soon_window_days: DEFAULT_DUE_SOON_WINDOW_DAYS,
            calendar_look_ahead_months: DEFAULT_LOOK_AHEAD_MONTHS,
            monthly_log_updates_status: false,
            tax_layout: TaxLayout::Itemized.as_str().to_string(),
            rows_per_page: None,
            company_name: "Estate Office".to_string(),
            company_address: None,
            company_phone: None,
            company_email: None,
            company_tax_id: None,
            timezone: "Asia/Kolkata".to_string(),
            database_url: "postgres://localhost/billing".to_string(),
            database_max_connections: 5,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl BillingConfig {
    /// Loads configuration from the environment
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from any `config` source, over the defaults
    pub fn from_source<S>(source: S) -> Result<Self, AppError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Rejects out-of-range and unparseable values
    pub fn validate(&self) -> Result<(), AppError> {
        self.settings().map(|_| ())
    }

    /// Parses and range-checks every field
    pub fn settings(&self) -> Result<BillingSettings, AppError> {
        if self.default_tax_rate_percent < Decimal::ZERO || self.default_tax_rate_percent > Decimal::ONE_HUNDRED {
            return Err(AppError::invalid_config(format!(
                "default_tax_rate_percent must be between 0 and 100, got {}",
                self.default_tax_rate_percent
            )));
        }
        if self.due_soon_window_days < 0 {
            return Err(AppError::invalid_config(format!(
                "due_soon_window_days must not be negative, got {}",
                self.due_soon_window_days
            )));
        }
        if self.calendar_look_ahead_months > MAX_LOOK_AHEAD_MONTHS {
            return Err(AppError::invalid_config(format!(
                "calendar_look_ahead_months must be at most {}, got {}",
                MAX_LOOK_AHEAD_MONTHS, self.calendar_look_ahead_months
            )));
        }
        match self.rows_per_page {
            Some(0) => return Err(AppError::invalid_config("rows_per_page must be positive")),
            Some(rows) if rows > MAX_ROWS_PER_PAGE => {
                return Err(AppError::invalid_config(format!(
                    "rows_per_page must be at most {}, got {}",
                    MAX_ROWS_PER_PAGE, rows
                )))
            }
            _ => {}
        }
        if self.company_name.trim().is_empty() {
            return Err(AppError::invalid_config("company_name must not be empty"));
        }

        let currency: Currency = self
            .currency
            .parse()
            .map_err(|e| AppError::invalid_config(format!("currency: {}", e)))?;
        let locale = NumberLocale::from_tag(&self.locale)
            .map_err(|e| AppError::invalid_config(format!("locale: {}", e)))?;
        let tax_layout: TaxLayout = self
            .tax_layout
            .parse()
            .map_err(|e| AppError::invalid_config(format!("tax_layout: {}", e)))?;
        let page_budget = self.page_budget();
        page_budget
            .validate()
            .map_err(|e| AppError::invalid_config(format!("rows_per_page: {}", e)))?;

        Ok(BillingSettings {
            currency,
            locale,
            default_tax_rate: self.default_tax_rate_percent,
            due_soon_window_days: self.due_soon_window_days,
            calendar_look_ahead_months: self.calendar_look_ahead_months,
            monthly_log_policy: MonthlyLogPolicy::from_flag(self.monthly_log_updates_status),
            tax_layout,
            page_budget,
            issuer: self.issuer(),
        })
    }

    pub fn clock(&self) -> Result<SystemClock, AppError> {
        SystemClock::from_name(&self.timezone)
            .map_err(|e| AppError::invalid_config(format!("timezone: {}", e)))
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url).max_connections(self.database_max_connections)
    }

    fn page_budget(&self) -> PageBudget {
        self.rows_per_page
            .map(PageBudget::with_rows_per_page)
            .unwrap_or_default()
    }

    fn issuer(&self) -> IssuerDetails {
        IssuerDetails {
            name: self.company_name.clone(),
            address: self.company_address.clone(),
            phone: self.company_phone.clone(),
            email: self.company_email.clone(),
            tax_id: self.company_tax_id.clone(),
        }
    }
}

/// Validated billing settings
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub currency: Currency,
    pub locale: NumberLocale,
    pub default_tax_rate: Decimal,
    pub due_soon_window_days: i64,
    pub calendar_look_ahead_months: u32,
    pub monthly_log_policy: MonthlyLogPolicy,
    pub tax_layout: TaxLayout,
    pub page_budget: PageBudget,
    pub issuer: IssuerDetails,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            currency: Currency::INR,
            locale: NumberLocale::en_in(),
            default_tax_rate: DEFAULT_TAX_RATE_PERCENT,
            due_soon_window_days: DEFAULT_DUE_SOON_WINDOW_DAYS,
            calendar_look_ahead_months: DEFAULT_LOOK_AHEAD_MONTHS,
            monthly_log_policy: MonthlyLogPolicy::LedgerOnly,
            tax_layout: TaxLayout::Itemized,
            page_budget: PageBudget::default(),
            issuer: IssuerDetails::new("Estate Office"),
        }
    }
}
