//! End-to-end tests against PostgreSQL
//!
//! Each test starts its own container. Run with `cargo test -- --ignored`.

use std::sync::Arc;

use rust_decimal_macros::dec;

use app_billing::{AppError, BillingSettings, ReconciliationOrchestrator};
use core_kernel::FixedClock;
use domain_documents::TextSink;
use domain_quotation::QuotationStatus;
use domain_tenancy::{PaymentStatus, RecordPaymentRequest, TenancyError, TenancyLedgerPort};
use infra_db::{DatabasePool, PostgresQuotationStore, PostgresTenancyLedger};
use test_utils::{
    assert_inr, db_test, DateFixtures, PartyFixtures, QuotationBuilder, TenancyBuilder, TenancyFixtures,
};

fn orchestrator(pool: &DatabasePool) -> (ReconciliationOrchestrator, Arc<PostgresTenancyLedger>) {
    let ledger = Arc::new(PostgresTenancyLedger::new(pool.clone()));
    let store = Arc::new(PostgresQuotationStore::new(pool.clone()));
    let orchestrator = ReconciliationOrchestrator::new(
        ledger.clone(),
        store.clone(),
        store,
        Arc::new(FixedClock(DateFixtures::mid_lease_today())),
        BillingSettings {
            issuer: PartyFixtures::issuer(),
            ..Default::default()
        },
        Arc::new(TextSink::default()),
    );
    (orchestrator, ledger)
}

async fn payment_updates_ledger_and_status(pool: DatabasePool) {
    let (orchestrator, ledger) = orchestrator(&pool);
    let tenancy = TenancyBuilder::new().with_payment_status(PaymentStatus::Overdue).build();
    ledger.save_tenancy(&tenancy, None).await.unwrap();

    let (entry, updated) = orchestrator
        .record_payment(
            RecordPaymentRequest::new(tenancy.id, dec!(20000), DateFixtures::march_payment()).with_method("NEFT"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(updated.payment_status, PaymentStatus::Current);
    let stored = ledger.get_tenancy(tenancy.id, None).await.unwrap();
    assert_eq!(stored.last_payment_date, Some(DateFixtures::march_payment()));
    let entries = ledger.list_entries(tenancy.id, None).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, entry.id);
    assert_inr(&entries[0].amount, dec!(20000));
}

db_test!(test_payment_updates_ledger_and_status, payment_updates_ledger_and_status);

async fn monthly_log_refuses_second_entry(pool: DatabasePool) {
    let (orchestrator, ledger) = orchestrator(&pool);
    let tenancy = TenancyFixtures::standard_lease();
    ledger.save_tenancy(&tenancy, None).await.unwrap();

    orchestrator.log_current_month(tenancy.id, None).await.unwrap();
    let err = orchestrator.log_current_month(tenancy.id, None).await.unwrap_err();

    assert!(matches!(err, AppError::Tenancy(TenancyError::AlreadyLogged { .. })));
    assert_eq!(ledger.list_entries(tenancy.id, None).await.unwrap().len(), 1);
}

db_test!(test_monthly_log_refuses_second_entry, monthly_log_refuses_second_entry);

async fn quotation_numbers_follow_the_sequence(pool: DatabasePool) {
    let (orchestrator, _) = orchestrator(&pool);

    let mut first = QuotationBuilder::new()
        .line("Site visit", dec!(2), dec!(500), dec!(18))
        .line("Valuation report", dec!(1), dec!(1000), dec!(12))
        .build_draft();
    let saved = orchestrator
        .save_and_export(&mut first, &PartyFixtures::client(), None)
        .await
        .unwrap();
    assert_eq!(saved.document.quotation_number.as_deref(), Some("QT-00001"));
    assert_inr(&saved.document.totals.total, dec!(2300));

    let mut second = QuotationBuilder::new()
        .line("Inspection", dec!(1), dec!(750), dec!(18))
        .build_draft();
    let next = orchestrator.save_quotation(&mut second, None).await.unwrap();
    assert_eq!(next.quotation_number.as_deref(), Some("QT-00002"));

    let reloaded = orchestrator.load_draft(saved.document.id, None).await.unwrap();
    let descriptions: Vec<&str> = reloaded.lines().iter().map(|l| l.description()).collect();
    assert_eq!(descriptions, vec!["Site visit", "Valuation report"]);

    let sent = orchestrator
        .transition_quotation(saved.document.id, QuotationStatus::Sent, None)
        .await
        .unwrap();
    assert_eq!(sent.status, QuotationStatus::Sent);
}

db_test!(test_quotation_numbers_follow_the_sequence, quotation_numbers_follow_the_sequence);
