//! Basic reconciliation usage example

use chrono::NaiveDate;
use reconcile_core::utils::MemoryStorage;
use reconcile_core::{
    BankTransaction, BillingCycle, BillingMonth, BillingSummary, ReconciliationEngine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("💳 Reconcile Core - Basic Reconciliation Example\n");

    let storage = MemoryStorage::new();

    // 1. Derive the billing period from the card's cycle configuration
    println!("📅 Deriving the billing period...");
    let cycle = BillingCycle::new(31, 27);
    let billing_month = BillingMonth::new(2025, 1)?;
    let closing_date = cycle.closing_date(billing_month);
    let payment_date = cycle.payment_date(closing_date);
    println!("  ✓ Billing month: {}", billing_month);
    println!("  ✓ Closing date:  {}", closing_date);
    println!("  ✓ Payment date:  {}\n", payment_date);

    // 2. Seed the upstream billing summary
    let summary = BillingSummary::new(
        "sum-2025-01".to_string(),
        "card-1".to_string(),
        "楽天カード".to_string(),
        billing_month,
        closing_date,
        payment_date,
        54320,
        vec!["t1".to_string(), "t2".to_string()],
    )?;
    println!(
        "🧾 Billing summary for {}: {} yen due on {}",
        summary.card_name, summary.net_payment_amount, summary.payment_date
    );
    storage.insert_summary(summary);

    // 3. Seed the observed bank transactions
    println!("\n🏦 Observed bank transactions:");
    let transactions = vec![
        BankTransaction::new(
            "bank-1".to_string(),
            NaiveDate::from_ymd_opt(2025, 2, 27).unwrap(),
            54320,
            "ラクテンカード サービス".to_string(),
        )?,
        BankTransaction::new(
            "bank-2".to_string(),
            NaiveDate::from_ymd_opt(2025, 2, 25).unwrap(),
            8800,
            "デンキダイ".to_string(),
        )?,
    ];
    for tx in transactions {
        println!("  - {} {:>8} yen  {}", tx.date, tx.amount, tx.description);
        storage.insert_transaction(tx);
    }

    // 4. Run the reconciliation after the payment date has passed
    println!("\n🔍 Running reconciliation...");
    let engine = ReconciliationEngine::new(storage.clone(), storage.clone(), storage.clone());
    let now = NaiveDate::from_ymd_opt(2025, 3, 3)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let aggregate = engine.reconcile("card-1", &billing_month, now).await?;

    println!("  ✓ Status:     {}", aggregate.status);
    for result in &aggregate.results {
        println!("  ✓ Confidence: {}", result.confidence);
        if let Some(bank_transaction_id) = &result.bank_transaction_id {
            println!("  ✓ Matched:    {}", bank_transaction_id);
        }
        if let Some(discrepancy) = &result.discrepancy {
            println!("  ✗ Reason:     {}", discrepancy.reason);
        }
    }
    println!(
        "  ✓ Tallies:    {} total / {} matched / {} partial / {} unmatched",
        aggregate.summary.total,
        aggregate.summary.matched,
        aggregate.summary.partial,
        aggregate.summary.unmatched
    );

    Ok(())
}
