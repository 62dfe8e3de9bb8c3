//! Financial summaries over invoices.
//!
//! Always computed from the invoices handed in; nothing here is cached.
//! Drafts are excluded from every figure.

use serde::{Deserialize, Serialize};

use inkworks_accounting::ProfitRecognition;
use inkworks_core::{Amount, AmountSum, SignedAmountSum};
use inkworks_parties::CustomerId;

use crate::invoice::{Invoice, InvoiceId, InvoiceStatus};

/// Profit split for one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceProfit {
    pub invoice_id: InvoiceId,
    pub number: Option<String>,
    pub status: InvoiceStatus,
    pub total_amount: Amount,
    pub amount_paid: Amount,
    #[serde(flatten)]
    pub recognition: ProfitRecognition,
}

impl InvoiceProfit {
    pub fn of(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.id_typed(),
            number: invoice.number().map(str::to_string),
            status: invoice.status(),
            total_amount: invoice.total_amount(),
            amount_paid: invoice.amount_paid(),
            recognition: invoice.profit(),
        }
    }
}

/// Sums are widened so any number of maximal invoices adds up exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub invoice_count: u64,
    pub revenue: AmountSum,
    pub collected: AmountSum,
    pub outstanding: AmountSum,
    pub total_profit: SignedAmountSum,
    pub recognized_profit: SignedAmountSum,
    pub pending_profit: SignedAmountSum,
    pub paid_count: u64,
    pub partially_paid_count: u64,
    pub unpaid_count: u64,
}

impl FinancialSummary {
    pub fn compute<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Self {
        invoices
            .into_iter()
            .filter(|i| i.is_created() && !i.is_draft())
            .fold(Self::default(), |mut acc, invoice| {
                let profit = invoice.profit();
                acc.invoice_count += 1;
                acc.revenue += AmountSum::from(invoice.total_amount());
                acc.collected += AmountSum::from(invoice.amount_paid());
                acc.outstanding += AmountSum::from(invoice.balance());
                acc.total_profit += SignedAmountSum::from(profit.invoice_profit);
                acc.recognized_profit += SignedAmountSum::from(profit.recognized_profit);
                acc.pending_profit += SignedAmountSum::from(profit.pending_profit);
                match invoice.status() {
                    InvoiceStatus::Paid => acc.paid_count += 1,
                    InvoiceStatus::PartiallyPaid => acc.partially_paid_count += 1,
                    InvoiceStatus::Unpaid => acc.unpaid_count += 1,
                    InvoiceStatus::Draft => {}
                }
                acc
            })
    }
}

/// The summary restricted to one customer, with per-invoice lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStatement {
    pub customer_id: CustomerId,
    pub summary: FinancialSummary,
    pub invoices: Vec<InvoiceProfit>,
}

impl CustomerStatement {
    pub fn compute<'a>(
        customer_id: CustomerId,
        invoices: impl IntoIterator<Item = &'a Invoice>,
    ) -> Self {
        let mine: Vec<&Invoice> = invoices
            .into_iter()
            .filter(|i| i.customer_id() == Some(customer_id) && !i.is_draft())
            .collect();

        Self {
            customer_id,
            summary: FinancialSummary::compute(mine.iter().copied()),
            invoices: mine.into_iter().map(InvoiceProfit::of).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use inkworks_accounting::Discount;
    use inkworks_core::UserId;
    use inkworks_events::execute;
    use inkworks_inventory::StockSnapshot;

    use crate::invoice::{
        ActivateInvoice, ApplyPayment, CreateDraftInvoice, DEFAULT_DRAFT_PREFIX, InvoiceCommand,
        PaymentDetails,
    };
    use crate::item::ItemInput;
    use crate::payment::PaymentId;

    fn invoice(customer_id: CustomerId, price: u64, cost: u64, number: Option<&str>) -> Invoice {
        let invoice_id = InvoiceId::generate();
        let mut inv = Invoice::empty(invoice_id);
        execute(
            &mut inv,
            &InvoiceCommand::CreateDraftInvoice(CreateDraftInvoice {
                invoice_id,
                customer_id,
                order_id: None,
                items: vec![ItemInput::unit("Job", 1, price).with_cost(cost)],
                tax_amount: 0,
                draft_prefix: DEFAULT_DRAFT_PREFIX.to_string(),
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
        if let Some(number) = number {
            execute(
                &mut inv,
                &InvoiceCommand::ActivateInvoice(ActivateInvoice {
                    invoice_id,
                    number: number.to_string(),
                    stock: StockSnapshot::default(),
                    occurred_at: Utc::now(),
                }),
            )
            .unwrap();
        }
        inv
    }

    fn pay(inv: &mut Invoice, amount: u64) {
        let invoice_id = inv.id_typed();
        let customer_id = inv.customer_id().unwrap();
        execute(
            inv,
            &InvoiceCommand::ApplyPayment(ApplyPayment {
                invoice_id,
                customer_id,
                payment_id: PaymentId::generate(),
                amount_received: amount,
                discount: Discount::none(),
                details: PaymentDetails {
                    payment_method: "transfer".to_string(),
                    reference_number: "T-1".to_string(),
                    notes: None,
                    recorded_by: UserId::new(),
                },
                occurred_at: Utc::now(),
            }),
        )
        .unwrap();
    }

    #[test]
    fn summary_excludes_drafts_and_counts_statuses() {
        let c = CustomerId::generate();
        let mut paid = invoice(c, 1_000, 600, Some("INV-1"));
        pay(&mut paid, 1_000);
        let mut partial = invoice(c, 2_000, 1_000, Some("INV-2"));
        pay(&mut partial, 500);
        let unpaid = invoice(c, 400, 100, Some("INV-3"));
        let draft = invoice(c, 9_999, 0, None);

        let s = FinancialSummary::compute([&paid, &partial, &unpaid, &draft]);

        assert_eq!(s.invoice_count, 3);
        assert_eq!(s.revenue, 3_400);
        assert_eq!(s.collected, 1_500);
        assert_eq!(s.outstanding, 1_900);
        assert_eq!(s.total_profit, 400 + 1_000 + 300);
        // 400 fully + 1000 x 0.25 + 0
        assert_eq!(s.recognized_profit, 650);
        assert_eq!(s.pending_profit, 1_050);
        assert_eq!((s.paid_count, s.partially_paid_count, s.unpaid_count), (1, 1, 1));
    }

    #[test]
    fn revenue_beyond_a_single_amount_still_adds_up() {
        let c = CustomerId::generate();
        let big = Amount::MAX / 2 + 1;
        let mut a = invoice(c, big, 1, Some("BIG-1"));
        pay(&mut a, big);
        let b = invoice(c, big, 1, Some("BIG-2"));

        let s = FinancialSummary::compute([&a, &b]);

        assert_eq!(s.revenue, AmountSum::from(big) * 2);
        assert!(s.revenue > AmountSum::from(Amount::MAX));
        assert_eq!(s.collected, AmountSum::from(big));
        assert_eq!(s.outstanding, AmountSum::from(big));
        assert_eq!(s.total_profit, SignedAmountSum::from(i64::MAX) * 2);
        assert_eq!(s.recognized_profit, SignedAmountSum::from(i64::MAX));
    }

    #[test]
    fn empty_input_gives_zero_summary() {
        assert_eq!(FinancialSummary::compute(Vec::<&Invoice>::new()), FinancialSummary::default());
    }

    #[test]
    fn statement_only_covers_one_customer() {
        let alice = CustomerId::generate();
        let bob = CustomerId::generate();
        let mut a = invoice(alice, 1_000, 0, Some("A-1"));
        pay(&mut a, 400);
        let b = invoice(bob, 5_000, 0, Some("B-1"));
        let a_draft = invoice(alice, 700, 0, None);

        let st = CustomerStatement::compute(alice, [&a, &b, &a_draft]);

        assert_eq!(st.customer_id, alice);
        assert_eq!(st.summary.invoice_count, 1);
        assert_eq!(st.summary.outstanding, 600);
        assert_eq!(st.invoices.len(), 1);
        assert_eq!(st.invoices[0].recognition.recognized_profit, 400);
    }
}
