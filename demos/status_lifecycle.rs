//! Payment status lifecycle example: manual updates and the daily batch

use chrono::NaiveDate;
use reconcile_core::utils::MemoryStorage;
use reconcile_core::{
    BillingMonth, BillingSummary, PaymentStatus, PaymentStatusManager, PaymentStatusScheduler,
    TransitionDetails, UpdatedBy,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔄 Reconcile Core - Payment Status Lifecycle Example\n");

    let storage = MemoryStorage::new();
    let payment_date = NaiveDate::from_ymd_opt(2025, 2, 27).unwrap();
    storage.insert_summary(BillingSummary::new(
        "sum-2025-01".to_string(),
        "card-1".to_string(),
        "エポスカード".to_string(),
        BillingMonth::new(2025, 1)?,
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        payment_date,
        21000,
        vec![],
    )?);

    // 1. Start tracking: the initial record is PENDING
    let manager = PaymentStatusManager::new(storage.clone());
    let initial = manager.initialize("sum-2025-01").await?;
    println!("1. Tracking started");
    println!("   status: {}", initial.status);
    println!(
        "   allowed next: {:?}\n",
        initial.status.allowed_transitions()
    );

    // 2. The nightly batch three days ahead of the payment date
    let scheduler = PaymentStatusScheduler::new(storage.clone(), storage.clone());
    let run_morning = NaiveDate::from_ymd_opt(2025, 2, 24)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap();
    let report = scheduler.run_daily(run_morning).await?;
    println!("2. Daily batch on {}", run_morning.date());
    println!(
        "   pending->processing: {}/{} advanced",
        report.pending_to_processing.success_count, report.pending_to_processing.total_candidates
    );

    let current = manager.current("sum-2025-01").await?.expect("tracked");
    println!("   status: {}\n", current.status);

    // 3. An operator disputes the charge, then resolves it by hand
    println!("3. Manual flow");
    let disputed = manager
        .update_status(
            "sum-2025-01",
            PaymentStatus::Disputed,
            UpdatedBy::User,
            TransitionDetails::with_reason("amount differs from receipt"),
        )
        .await?;
    println!("   status: {}", disputed.status);

    let resolved = manager
        .update_status(
            "sum-2025-01",
            PaymentStatus::ManualConfirmed,
            UpdatedBy::User,
            TransitionDetails {
                reason: Some("issuer corrected the bill".to_string()),
                notes: Some("difference refunded next cycle".to_string()),
                reconciliation_id: None,
            },
        )
        .await?;
    println!("   status: {} (terminal: {})\n", resolved.status, resolved.status.is_terminal());

    // 4. Replay the full history
    println!("4. History");
    let history = manager.history("sum-2025-01").await?;
    for record in history.records() {
        println!(
            "   {} {:>17} -> {:<17} by {:?} {}",
            record.updated_at,
            record
                .previous_status
                .map(|status| status.to_string())
                .unwrap_or_else(|| "(start)".to_string()),
            record.status.to_string(),
            record.updated_by,
            record.reason.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
