//! Invoices and payments.

use std::sync::atomic::Ordering;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::NewActivity;
use crate::store::{round_cents, MemStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Check,
    BankTransfer,
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub job_id: i64,
    pub invoice_number: String,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
    pub total: f64,
    pub paid: bool,
    pub paid_date: Option<DateTime<Utc>>,
    pub paid_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub job_id: i64,
    pub invoice_number: Option<String>,
    pub subtotal: f64,
    pub tax: Option<f64>,
    pub discount: Option<f64>,
    pub total: Option<f64>,
}

/// Money fields only. The paid state is driven exclusively by payments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub discount: Option<f64>,
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceFilters {
    pub job_id: Option<i64>,
    pub paid: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub invoice_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub transaction_id: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    pub invoice_id: i64,
    pub amount: f64,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Marks the invoice paid once the cumulative payment sum covers the total.
/// Flips at most once; an already-paid invoice is never touched again, so
/// later payments can neither reduce `paid_amount` nor unset the flag.
pub(crate) fn settle_invoice(invoice: &mut Invoice, paid_sum: f64, when: DateTime<Utc>) -> bool {
    if invoice.paid || paid_sum < invoice.total {
        return false;
    }
    invoice.paid = true;
    invoice.paid_date = Some(when);
    invoice.paid_amount = Some(paid_sum);
    true
}

impl MemStore {
    pub async fn create_invoice(&self, data: CreateInvoice) -> Result<Invoice, StoreError> {
        let job = self
            .jobs
            .get(data.job_id)
            .await
            .ok_or(StoreError::MissingRef { entity: "job", id: data.job_id })?;

        let tax = data
            .tax
            .unwrap_or_else(|| round_cents(data.subtotal * self.config.tax_rate_percent / 100.0));
        let discount = data.discount.unwrap_or(0.0);
        let total = data
            .total
            .unwrap_or_else(|| round_cents(data.subtotal + tax - discount));
        let invoice_number = data
            .invoice_number
            .unwrap_or_else(|| self.next_invoice_number());

        let invoice = self
            .invoices
            .insert(|id| Invoice {
                id,
                job_id: job.id,
                invoice_number: invoice_number.clone(),
                subtotal: data.subtotal,
                tax,
                discount,
                total,
                paid: false,
                paid_date: None,
                paid_amount: None,
                created_at: Utc::now(),
            })
            .await;

        self.record_activity(
            NewActivity::new(
                "invoice_created",
                format!(
                    "Invoice {} issued for job #{} (${:.2})",
                    invoice.invoice_number, job.id, invoice.total
                ),
            )
            .customer(job.customer_id)
            .job(job.id)
            .invoice(invoice.id),
        )
        .await;

        Ok(invoice)
    }

    pub async fn get_invoice(&self, id: i64) -> Option<Invoice> {
        self.invoices.get(id).await
    }

    pub async fn update_invoice(&self, id: i64, update: InvoiceUpdate) -> Option<Invoice> {
        self.invoices
            .modify(id, |invoice| {
                if let Some(subtotal) = update.subtotal {
                    invoice.subtotal = subtotal;
                }
                if let Some(tax) = update.tax {
                    invoice.tax = tax;
                }
                if let Some(discount) = update.discount {
                    invoice.discount = discount;
                }
                if let Some(total) = update.total {
                    invoice.total = total;
                }
            })
            .await
    }

    pub async fn list_invoices(&self, filters: InvoiceFilters) -> Vec<Invoice> {
        self.invoices
            .all()
            .await
            .into_iter()
            .filter(|i| filters.job_id.is_none_or(|id| i.job_id == id))
            .filter(|i| filters.paid.is_none_or(|paid| i.paid == paid))
            .collect()
    }

    /// The data model allows several invoices per job; business flows treat
    /// the first as the job's invoice.
    pub async fn invoices_for_job(&self, job_id: i64) -> Vec<Invoice> {
        self.list_invoices(InvoiceFilters { job_id: Some(job_id), paid: None })
            .await
    }

    pub async fn record_payment(&self, data: CreatePayment) -> Result<Payment, StoreError> {
        let invoice = self
            .invoices
            .get(data.invoice_id)
            .await
            .ok_or(StoreError::MissingRef { entity: "invoice", id: data.invoice_id })?;

        let date = data.date.unwrap_or_else(Utc::now);
        let transaction_id = data
            .transaction_id
            .unwrap_or_else(|| format!("txn_{}", Uuid::new_v4()));

        let payment = self
            .payments
            .insert(|id| Payment {
                id,
                invoice_id: invoice.id,
                amount: data.amount,
                method: data.method.clone(),
                transaction_id: transaction_id.clone(),
                date,
            })
            .await;

        let paid_sum: f64 = self
            .payments_for_invoice(invoice.id)
            .await
            .iter()
            .map(|p| p.amount)
            .sum();
        let settled = self
            .invoices
            .modify(invoice.id, |invoice| {
                settle_invoice(invoice, paid_sum, date);
            })
            .await;
        if settled.as_ref().is_some_and(|i| i.paid && !invoice.paid) {
            log::info!("invoice {} settled at ${:.2}", invoice.invoice_number, paid_sum);
        }

        let customer_id = self.jobs.get(invoice.job_id).await.map(|j| j.customer_id);
        let mut entry = NewActivity::new(
            "payment_received",
            format!(
                "Payment of ${:.2} received for {}",
                payment.amount, invoice.invoice_number
            ),
        )
        .job(invoice.job_id)
        .invoice(invoice.id);
        if let Some(customer_id) = customer_id {
            entry = entry.customer(customer_id);
        }
        self.record_activity(entry).await;

        Ok(payment)
    }

    pub async fn payments_for_invoice(&self, invoice_id: i64) -> Vec<Payment> {
        self.payments
            .all()
            .await
            .into_iter()
            .filter(|p| p.invoice_id == invoice_id)
            .collect()
    }

    fn next_invoice_number(&self) -> String {
        let n = self.invoice_numbers.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        format!(
            "{}-{}{:02}-{:05}",
            self.config.invoice_prefix,
            now.year(),
            now.month(),
            n
        )
    }
}
