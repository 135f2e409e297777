//! Quotation documents and their status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClientId, Currency, QuotationId};

use crate::error::QuotationError;
use crate::tax::{QuotationTotals, TotalsSnapshot};

/// Status of a quotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
    Expired,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Draft => "draft",
            QuotationStatus::Sent => "sent",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Rejected => "rejected",
            QuotationStatus::Expired => "expired",
        }
    }

    /// Allowed moves: draft to sent or expired; sent to accepted, rejected or expired
    pub fn can_transition_to(&self, next: QuotationStatus) -> bool {
        use QuotationStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Draft, Expired) | (Sent, Accepted) | (Sent, Rejected) | (Sent, Expired)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuotationStatus::Accepted | QuotationStatus::Rejected | QuotationStatus::Expired
        )
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotationStatus {
    type Err = QuotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(QuotationStatus::Draft),
            "sent" => Ok(QuotationStatus::Sent),
            "accepted" => Ok(QuotationStatus::Accepted),
            "rejected" => Ok(QuotationStatus::Rejected),
            "expired" => Ok(QuotationStatus::Expired),
            other => Err(QuotationError::validation(format!("Unknown quotation status '{}'", other))),
        }
    }
}

/// A quotation with its totals snapshot
///
/// `totals` is written at save time from the tax engine and is not
/// recomputed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationDocument {
    pub id: QuotationId,
    /// Assigned by the sequence on first save
    pub quotation_number: Option<String>,
    pub client_id: Option<ClientId>,
    pub status: QuotationStatus,
    pub quotation_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub currency: Currency,
    pub totals: TotalsSnapshot,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuotationDocument {
    pub fn new(currency: Currency, quotation_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: QuotationId::new_v7(),
            quotation_number: None,
            client_id: None,
            status: QuotationStatus::Draft,
            quotation_date,
            valid_until: None,
            currency,
            totals: TotalsSnapshot::zero(currency),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn for_client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.quotation_number.is_some()
    }

    /// Number for display; unsaved drafts show "DRAFT"
    pub fn display_number(&self) -> &str {
        self.quotation_number.as_deref().unwrap_or("DRAFT")
    }

    pub fn apply_totals(&mut self, totals: &QuotationTotals) {
        self.totals = totals.snapshot();
        self.updated_at = Utc::now();
    }

    pub fn transition_to(&mut self, next: QuotationStatus) -> Result<(), QuotationError> {
        if !self.status.can_transition_to(next) {
            return Err(QuotationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> QuotationDocument {
        QuotationDocument::new(Currency::INR, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap())
    }

    #[test]
    fn test_new_document_is_unnumbered_draft() {
        let d = doc();
        assert_eq!(d.status, QuotationStatus::Draft);
        assert_eq!(d.display_number(), "DRAFT");
        assert!(d.totals.total.is_zero());
    }

    #[test]
    fn test_allowed_transitions() {
        let mut d = doc();
        d.transition_to(QuotationStatus::Sent).unwrap();
        d.transition_to(QuotationStatus::Accepted).unwrap();
        assert!(d.status.is_terminal());
    }

    #[test]
    fn test_rejected_transitions() {
        let mut d = doc();
        let err = d.transition_to(QuotationStatus::Accepted).unwrap_err();
        assert!(matches!(
            err,
            QuotationError::InvalidTransition {
                from: QuotationStatus::Draft,
                to: QuotationStatus::Accepted
            }
        ));
        assert_eq!(d.status, QuotationStatus::Draft);

        d.transition_to(QuotationStatus::Expired).unwrap();
        assert!(d.transition_to(QuotationStatus::Sent).is_err());
    }

    #[test]
    fn test_status_parses_from_store_value() {
        assert_eq!("sent".parse::<QuotationStatus>().unwrap(), QuotationStatus::Sent);
        assert!("void".parse::<QuotationStatus>().is_err());
    }

    #[test]
    fn test_document_json_uses_store_values() {
        let json = serde_json::to_value(doc()).unwrap();
        assert_eq!(json["status"], "draft");
        assert!(json["quotation_number"].is_null());
    }
}
