//! Invoice totals and creation.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use uuid::Uuid;

use crate::business::activity::log_activity;
use crate::db::{
    CreateInvoiceItemParams, CreateInvoiceParams, Database, EntityType, InvoiceItemRecord,
    InvoiceRecord, InvoiceStatus,
};
use crate::error::DatabaseError;

/// A line as entered on the invoice form.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceDraft {
    pub invoice_number: String,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `None` when the product does not fit in a `Decimal`.
pub fn line_amount(quantity: Decimal, unit_price: Decimal) -> Option<Decimal> {
    quantity.checked_mul(unit_price).map(round2)
}

/// `tax_rate` is a percentage. `None` on overflow.
pub fn compute_totals(amounts: &[Decimal], tax_rate: Decimal) -> Option<InvoiceTotals> {
    let subtotal = amounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(*amount))?;
    let tax = round2(subtotal.checked_mul(tax_rate)? / Decimal::ONE_HUNDRED);
    Some(InvoiceTotals {
        subtotal,
        tax,
        total: subtotal.checked_add(tax)?,
    })
}

/// Validate a draft and produce store params with computed amounts.
pub fn build_invoice(
    draft: &InvoiceDraft,
) -> Result<(CreateInvoiceParams, Vec<CreateInvoiceItemParams>), String> {
    let invoice_number = draft.invoice_number.trim();
    if invoice_number.is_empty() {
        return Err("Invoice number is required".to_string());
    }
    if draft.tax_rate < Decimal::ZERO || draft.tax_rate > Decimal::ONE_HUNDRED {
        return Err("Tax rate must be between 0 and 100".to_string());
    }
    if let (Some(issue), Some(due)) = (draft.issue_date, draft.due_date)
        && due < issue
    {
        return Err("Due date cannot be before the issue date".to_string());
    }

    let mut items = Vec::with_capacity(draft.items.len());
    for (idx, item) in draft.items.iter().enumerate() {
        let description = item.description.trim();
        if description.is_empty() {
            return Err(format!("Line {} needs a description", idx + 1));
        }
        if item.quantity < Decimal::ZERO || item.unit_price < Decimal::ZERO {
            return Err(format!(
                "Line {} cannot have a negative quantity or price",
                idx + 1
            ));
        }
        let amount = line_amount(item.quantity, item.unit_price)
            .ok_or_else(|| format!("Line {} amount is too large", idx + 1))?;
        items.push(CreateInvoiceItemParams {
            description: description.to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            amount,
            sort_order: i32::try_from(idx).unwrap_or(i32::MAX),
        });
    }

    let amounts: Vec<Decimal> = items.iter().map(|item| item.amount).collect();
    let totals = compute_totals(&amounts, draft.tax_rate)
        .ok_or_else(|| "Invoice total is too large".to_string())?;

    Ok((
        CreateInvoiceParams {
            client_id: draft.client_id,
            project_id: draft.project_id,
            invoice_number: invoice_number.to_string(),
            status: InvoiceStatus::Draft,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            subtotal: totals.subtotal,
            tax_rate: draft.tax_rate,
            tax: totals.tax,
            total: totals.total,
            notes: draft.notes.clone(),
            terms: draft.terms.clone(),
        },
        items,
    ))
}

/// Persist a validated draft and log it on the timeline.
pub async fn create_invoice(
    db: &dyn Database,
    user_id: &str,
    invoice: &CreateInvoiceParams,
    items: &[CreateInvoiceItemParams],
) -> Result<(InvoiceRecord, Vec<InvoiceItemRecord>), DatabaseError> {
    let (record, items) = db.create_invoice(user_id, invoice, items).await?;
    log_activity(
        db,
        user_id,
        EntityType::Invoice,
        Some(record.id.to_string()),
        "created",
        format!("Invoice {} created", record.invoice_number),
    )
    .await;
    Ok((record, items))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    #[cfg(feature = "libsql")]
    use crate::db::libsql::test_support::setup_backend;

    fn draft(items: Vec<LineItemInput>, tax_rate: Decimal) -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: " INV-2026-001 ".to_string(),
            client_id: None,
            project_id: None,
            issue_date: None,
            due_date: None,
            tax_rate,
            notes: None,
            terms: None,
            items,
        }
    }

    fn line(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn totals_round_each_line_then_tax() {
        let (invoice, items) = build_invoice(&draft(
            vec![
                line("Design", dec!(3.5), dec!(80)),
                line("Hosting", dec!(1), dec!(19.999)),
            ],
            dec!(8.25),
        ))
        .expect("valid draft");

        assert_eq!(items[0].amount, dec!(280.00));
        assert_eq!(items[1].amount, dec!(20.00));
        assert_eq!(invoice.subtotal, dec!(300.00));
        assert_eq!(invoice.tax, dec!(24.75));
        assert_eq!(invoice.total, dec!(324.75));
        assert_eq!(invoice.invoice_number, "INV-2026-001");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(items[1].sort_order, 1);
    }

    #[test]
    fn empty_invoice_totals_zero() {
        let totals = compute_totals(&[], dec!(20));
        assert_eq!(
            totals,
            Some(InvoiceTotals {
                subtotal: Decimal::ZERO,
                tax: Decimal::ZERO,
                total: Decimal::ZERO,
            })
        );
    }

    #[test]
    fn oversized_amounts_are_rejected_not_panicking() {
        let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
        let err = build_invoice(&draft(vec![line("Retainer", huge, huge)], dec!(0)))
            .expect_err("product overflows");
        assert_eq!(err, "Line 1 amount is too large");

        let err = build_invoice(&draft(
            vec![
                line("Phase 1", Decimal::MAX, dec!(1)),
                line("Phase 2", Decimal::MAX, dec!(1)),
            ],
            dec!(0),
        ))
        .expect_err("subtotal overflows");
        assert_eq!(err, "Invoice total is too large");

        assert_eq!(compute_totals(&[Decimal::MAX], dec!(50)), None);
    }

    #[test]
    fn rejects_bad_drafts() {
        let mut bad = draft(vec![], dec!(5));
        bad.invoice_number = "  ".to_string();
        assert!(build_invoice(&bad).is_err());

        assert!(build_invoice(&draft(vec![], dec!(100.01))).is_err());
        assert!(build_invoice(&draft(vec![], dec!(-1))).is_err());
        assert!(build_invoice(&draft(vec![line("Refund", dec!(-1), dec!(10))], dec!(0))).is_err());
        assert!(build_invoice(&draft(vec![line("", dec!(1), dec!(10))], dec!(0))).is_err());

        let mut backwards = draft(vec![], dec!(0));
        backwards.issue_date = NaiveDate::from_ymd_opt(2026, 2, 1);
        backwards.due_date = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(build_invoice(&backwards).is_err());
    }

    #[cfg(feature = "libsql")]
    #[tokio::test]
    async fn create_invoice_persists_and_logs() {
        let fixture = setup_backend().await;
        let db: &dyn Database = &fixture.backend;
        let (params, items) =
            build_invoice(&draft(vec![line("Audit", dec!(2), dec!(150))], dec!(10)))
                .expect("valid");

        let (record, saved_items) = create_invoice(db, "u1", &params, &items)
            .await
            .expect("create");
        assert_eq!(record.total, dec!(330.00));
        assert_eq!(saved_items.len(), 1);

        let timeline = db.list_activities("u1", 5).await.expect("activities");
        assert_eq!(timeline[0].description, "Invoice INV-2026-001 created");
    }
}
