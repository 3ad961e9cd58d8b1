//! End-to-end booking flow: customer, vehicle, job, invoice, payment,
//! and the reports that read them back.

use chrono::{DateTime, Utc};
use detailops::billing::{CreateInvoice, CreatePayment, PaymentMethod};
use detailops::catalog::CreateService;
use detailops::customers::{CreateCustomer, CreateVehicle};
use detailops::jobs::{CreateJob, JobServiceInput, JobStatus, JobUpdate};
use detailops::memberships::{BillingCycle, CreateMembershipPlan, CreateSubscription};
use detailops::MemStore;

fn parse(ts: &str) -> DateTime<Utc> {
    ts.parse().expect("timestamp literal")
}

#[tokio::test]
async fn test_booking_to_paid_invoice_to_reports() {
    let store = MemStore::default();
    let start = parse("2026-07-01T00:00:00Z");
    let end = parse("2026-07-31T23:59:59Z");

    let customer = store
        .create_customer(CreateCustomer {
            full_name: "Dana Fox".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            tags: None,
            notes: None,
        })
        .await;

    let vehicle = store
        .create_vehicle(CreateVehicle {
            customer_id: customer.id,
            make: "Subaru".to_string(),
            model: "Outback".to_string(),
            year: 2023,
            color: Some("green".to_string()),
            license_plate: None,
            vin: None,
        })
        .await;

    let service = store
        .create_service(CreateService {
            name: "Full Detail".to_string(),
            description: None,
            price: 100.0,
            duration_minutes: 120,
            active: None,
            color: None,
        })
        .await;

    let job = store
        .create_job(CreateJob {
            customer_id: customer.id,
            vehicle_id: vehicle.id,
            technician_id: None,
            scheduled_start: parse("2026-07-12T10:00:00Z"),
            scheduled_end: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            notes: None,
            services: vec![JobServiceInput {
                service_id: service.id,
                quantity: 2,
                price: None,
            }],
        })
        .await
        .expect("job creation");
    store
        .update_job(
            job.id,
            JobUpdate {
                status: Some(JobStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .expect("job exists");

    // 200 subtotal + 8.25% default tax.
    let invoice = store
        .create_invoice(CreateInvoice {
            job_id: job.id,
            invoice_number: None,
            subtotal: 200.0,
            tax: None,
            discount: None,
            total: None,
        })
        .await
        .expect("invoice creation");
    assert_eq!(invoice.total, 216.5);

    store
        .record_payment(CreatePayment {
            invoice_id: invoice.id,
            amount: 216.5,
            method: PaymentMethod::Card,
            transaction_id: None,
            date: None,
        })
        .await
        .expect("payment");

    let invoice = store.get_invoice(invoice.id).await.expect("invoice exists");
    assert!(invoice.paid);
    assert_eq!(invoice.paid_amount, Some(216.5));

    let stats = store.revenue_stats(start, end).await;
    assert_eq!(stats.total_revenue, 216.5);
    assert_eq!(stats.jobs_completed, 1);
    assert_eq!(stats.new_customers, 1);
    assert_eq!(stats.avg_job_value, 216.5);

    let top = store.top_services(start, end, 5).await;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].service_id, service.id);
    assert_eq!(top[0].revenue, 200.0);
    assert_eq!(top[0].count, 2);

    // The same flow left a readable trail in the feed.
    let feed = store.recent_activities(10).await;
    let kinds: Vec<&str> = feed.iter().map(|a| a.kind.as_str()).collect();
    for expected in [
        "payment_received",
        "invoice_created",
        "job_completed",
        "job_created",
        "customer_created",
    ] {
        assert!(kinds.contains(&expected), "missing {expected} in {kinds:?}");
    }
}

#[tokio::test]
async fn test_membership_switch_keeps_single_active_subscription() {
    let store = MemStore::default();
    let customer = store
        .create_customer(CreateCustomer {
            full_name: "Sam Hill".to_string(),
            email: None,
            phone: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            tags: None,
            notes: None,
        })
        .await;
    let silver = store
        .create_membership_plan(CreateMembershipPlan {
            name: "Silver".to_string(),
            monthly_price: 29.0,
            annual_price: 290.0,
            features: None,
            active: None,
        })
        .await;
    let gold = store
        .create_membership_plan(CreateMembershipPlan {
            name: "Gold".to_string(),
            monthly_price: 49.0,
            annual_price: 490.0,
            features: None,
            active: None,
        })
        .await;

    for plan_id in [silver.id, gold.id] {
        store
            .create_subscription(CreateSubscription {
                customer_id: customer.id,
                plan_id,
                billing_cycle: BillingCycle::Monthly,
                stripe_customer_id: None,
                stripe_subscription_id: None,
            })
            .await
            .expect("subscription");
    }

    let active = store
        .active_subscription(customer.id)
        .await
        .expect("one active subscription");
    assert_eq!(active.plan_id, gold.id);

    assert!(!store.delete_membership_plan(silver.id).await);
}
