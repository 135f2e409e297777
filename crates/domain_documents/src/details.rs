//! Party details printed on documents

use serde::{Deserialize, Serialize};

/// The business issuing the document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssuerDetails {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// GSTIN or other tax registration
    pub tax_id: Option<String>,
}

impl IssuerDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn contact_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .address
            .iter()
            .flat_map(|a| a.lines().map(str::to_string))
            .collect();
        if let Some(ref phone) = self.phone {
            lines.push(format!("Phone: {}", phone));
        }
        if let Some(ref email) = self.email {
            lines.push(format!("Email: {}", email));
        }
        if let Some(ref tax_id) = self.tax_id {
            lines.push(format!("GSTIN: {}", tax_id));
        }
        lines
    }
}

/// The recipient of a quotation or statement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientDetails {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

impl ClientDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .address
            .iter()
            .flat_map(|a| a.lines().map(str::to_string))
            .collect();
        lines.extend(self.phone.iter().cloned());
        lines.extend(self.email.iter().cloned());
        if let Some(ref tax_id) = self.tax_id {
            lines.push(format!("GSTIN: {}", tax_id));
        }
        lines
    }
}

/// Lowercase ASCII file stem with runs of other characters collapsed to '-'
pub fn file_stem(parts: &[&str]) -> String {
    let joined = parts.join("-");
    let mut stem = String::with_capacity(joined.len());
    for c in joined.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    stem.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(&["Quotation", "QT-00042"]), "quotation-qt-00042");
        assert_eq!(file_stem(&["Flat 4B / Tower C", "2025-03"]), "flat-4b-tower-c-2025-03");
    }

    #[test]
    fn test_issuer_contact_lines() {
        let issuer = IssuerDetails {
            address: Some("12 MG Road\nBengaluru".into()),
            tax_id: Some("29ABCDE1234F1Z5".into()),
            ..IssuerDetails::new("Acme Realty")
        };
        assert_eq!(
            issuer.contact_lines(),
            vec!["12 MG Road", "Bengaluru", "GSTIN: 29ABCDE1234F1Z5"]
        );
    }
}
