//! Billing documents exporter
//!
//! Renders a rent statement or a stored quotation straight from the database
//! and writes it to a file.
//!
//! # Usage
//!
//! ```bash
//! billing-docs statement <tenancy-id> <tenant-name> <property-label> [--format text|json] [--out DIR]
//! billing-docs quotation <quotation-id> <client-name> [--format text|json] [--out DIR]
//! ```
//!
//! # Environment Variables
//!
//! * `BILLING_DATABASE_URL` - PostgreSQL connection string
//! * `BILLING_LOCALE` - Number formatting locale (default: en-IN)
//! * `BILLING_TAX_LAYOUT` - `itemized` or `consolidated` (default: itemized)
//! * `BILLING_COMPANY_NAME` - Issuer printed on every document
//! * `BILLING_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `BILLING_LOG_JSON` - `true` for JSON log lines

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};

use app_billing::{init_tracing, AppError, BillingConfig, Notifier, ReconciliationOrchestrator};
use core_kernel::{OperationMetadata, QuotationId, TenancyId};
use domain_documents::{ClientDetails, DocumentSink, ExportedDocument, JsonSink, TextSink};
use infra_db::{create_pool, run_migrations, PostgresQuotationStore, PostgresTenancyLedger};

#[derive(Debug)]
enum Target {
    Statement {
        tenancy_id: TenancyId,
        tenant: String,
        property_label: String,
    },
    Quotation {
        quotation_id: QuotationId,
        client: String,
    },
}

#[derive(Debug)]
struct Command {
    target: Target,
    json: bool,
    out_dir: PathBuf,
}

const USAGE: &str = "usage: billing-docs statement <tenancy-id> <tenant-name> <property-label> [--format text|json] [--out DIR]\n       billing-docs quotation <quotation-id> <client-name> [--format text|json] [--out DIR]";

fn parse_args(args: Vec<String>) -> anyhow::Result<Command> {
    let mut positional = Vec::new();
    let mut json = false;
    let mut out_dir = PathBuf::from(".");

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" => match iter.next().as_deref() {
                Some("json") => json = true,
                Some("text") => json = false,
                other => bail!("unknown format {:?}\n{}", other, USAGE),
            },
            "--out" => {
                out_dir = iter.next().map(PathBuf::from).context(USAGE)?;
            }
            _ => positional.push(arg),
        }
    }

    let target = match positional.as_slice() {
        [kind, id, tenant, property] if kind == "statement" => Target::Statement {
            tenancy_id: id.parse().with_context(|| format!("invalid tenancy id '{}'", id))?,
            tenant: tenant.clone(),
            property_label: property.clone(),
        },
        [kind, id, client] if kind == "quotation" => Target::Quotation {
            quotation_id: id.parse().with_context(|| format!("invalid quotation id '{}'", id))?,
            client: client.clone(),
        },
        _ => bail!(USAGE),
    };

    Ok(Command { target, json, out_dir })
}

async fn run(config: BillingConfig, command: Command) -> Result<ExportedDocument, AppError> {
    let settings = config.settings()?;
    let clock = config.clock()?;

    let pool = create_pool(config.database()).await?;
    run_migrations(&pool).await?;

    let quotations = Arc::new(PostgresQuotationStore::new(pool.clone()));
    let sink: Arc<dyn DocumentSink> = if command.json {
        Arc::new(JsonSink { pretty: true })
    } else {
        Arc::new(TextSink::default())
    };
    let orchestrator = ReconciliationOrchestrator::new(
        Arc::new(PostgresTenancyLedger::new(pool)),
        quotations.clone(),
        quotations,
        Arc::new(clock),
        settings,
        sink,
    );
    let metadata = Some(OperationMetadata::generated().initiated_by("billing-docs"));

    match command.target {
        Target::Statement {
            tenancy_id,
            tenant,
            property_label,
        } => {
            orchestrator
                .export_lease_statement(tenancy_id, &ClientDetails::new(tenant), &property_label, metadata)
                .await
        }
        Target::Quotation { quotation_id, client } => {
            orchestrator
                .export_quotation(quotation_id, &ClientDetails::new(client), metadata)
                .await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BillingConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level, config.log_json)?;

    let command = parse_args(std::env::args().skip(1).collect())?;
    let out_dir = command.out_dir.clone();
    let locale = config.locale.clone();

    let exported = match run(config, command).await {
        Ok(exported) => exported,
        Err(e) => {
            tracing::error!(error = %e, "billing-docs failed");
            let notifier = Notifier::new(&locale)?;
            eprintln!("{}", e.notification(&notifier));
            return Err(e.into());
        }
    };

    let path = out_dir.join(&exported.file_name);
    tokio::fs::write(&path, &exported.bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), content_type = %exported.content_type, "Document written");
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parses_statement() {
        let id = TenancyId::new();
        let command = parse_args(args(&[
            "statement",
            &id.to_string(),
            "R. Sharma",
            "Flat 4B",
            "--format",
            "json",
            "--out",
            "/tmp",
        ]))
        .unwrap();
        assert!(command.json);
        assert_eq!(command.out_dir, PathBuf::from("/tmp"));
        match command.target {
            Target::Statement { tenancy_id, property_label, .. } => {
                assert_eq!(tenancy_id, id);
                assert_eq!(property_label, "Flat 4B");
            }
            other => panic!("expected statement, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(parse_args(args(&["quotation", "not-a-uuid", "Acme"])).is_err());
        assert!(parse_args(args(&["invoice"])).is_err());
        assert!(parse_args(args(&["quotation", &QuotationId::new().to_string(), "Acme", "--format", "pdf"])).is_err());
    }
}
