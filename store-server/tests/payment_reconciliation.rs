//! Payment ledger / order ledger reconciliation.

use surrealdb::engine::local::{Db, Mem};
use surrealdb::{RecordId, Surreal};

use store_server::db;
use store_server::db::models::{
    Category, Payment, PaymentMethod, PaymentRecordStatus, PaymentStatusUpdate, PaymentType,
    Product, ShippingAddress, Variant,
};
use store_server::db::repository::{CategoryRepository, PaymentRepository, ProductRepository};
use store_server::orders::{
    OrderService, OrderStatus, PaymentStatus, PlaceOrderItem, PlaceOrderRequest,
};

async fn test_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.expect("open mem db");
    db.use_ns("test").use_db("test").await.expect("select ns");
    db::apply_schema(&db).await.expect("apply schema");
    db
}

async fn seed_order(db: &Surreal<Db>, total: f64) -> store_server::db::models::Order {
    let category = CategoryRepository::new(db.clone())
        .create(Category {
            id: None,
            name: format!("cat-{}", total),
            slug: format!("cat-{}", total),
            description: String::new(),
            parent: None,
            is_active: true,
            created_at: 0,
        })
        .await
        .expect("create category");

    let product = ProductRepository::new(db.clone())
        .create(Product {
            id: None,
            name: format!("Product {}", total),
            slug: format!("product-{}", total),
            brand: String::new(),
            category: category.id.expect("category id"),
            base_price: total,
            description: String::new(),
            thumbnail: None,
            variants: vec![Variant {
                size: "M".into(),
                color: "Red".into(),
                sku: format!("SKU-{}", total),
                price: total,
                stock: 10,
            }],
            is_active: true,
            rev: 0,
            created_at: 0,
        })
        .await
        .expect("create product");

    let service = OrderService::new(db.clone());
    service
        .place(
            Some(RecordId::from_table_key("user", "alice")),
            &PlaceOrderRequest {
                items: vec![PlaceOrderItem {
                    product_id: product.id.as_ref().unwrap().to_string(),
                    sku: format!("SKU-{}", total),
                    quantity: 1,
                }],
                shipping_address: ShippingAddress {
                    name: "Alice".into(),
                    phone: "0900000001".into(),
                    ..Default::default()
                },
                payment_method: PaymentMethod::BankTransfer,
                note: None,
            },
        )
        .await
        .expect("place order")
}

fn payment_for(order: &store_server::db::models::Order) -> Payment {
    Payment {
        id: None,
        order: order.id.clone().expect("order id"),
        amount: order.total_amount,
        method: PaymentMethod::BankTransfer,
        payment_type: PaymentType::Income,
        status: PaymentRecordStatus::Pending,
        transaction_id: None,
        paid_at: None,
        refunded_at: None,
        note: None,
        created_by: None,
        created_at: 0,
    }
}

#[tokio::test]
async fn completed_payment_marks_order_paid_and_confirmed() {
    let db = test_db().await;
    let order = seed_order(&db, 100_000.0).await;
    let repo = PaymentRepository::new(db.clone());
    let service = OrderService::new(db.clone());

    let payment = repo.create(payment_for(&order)).await.expect("create payment");

    let updated = repo
        .update_status(
            &payment.id.as_ref().unwrap().to_string(),
            PaymentStatusUpdate {
                status: PaymentRecordStatus::Completed,
                transaction_id: Some("TX-123".into()),
                note: None,
            },
        )
        .await
        .expect("update payment");
    assert_eq!(updated.status, PaymentRecordStatus::Completed);
    assert!(updated.paid_at.is_some());
    assert_eq!(updated.transaction_id.as_deref(), Some("TX-123"));

    let synced = service
        .apply_payment_status(&updated)
        .await
        .expect("reconcile")
        .expect("order updated");
    assert_eq!(synced.payment_status, PaymentStatus::Paid);
    assert_eq!(synced.order_status, OrderStatus::Confirmed);
}

#[tokio::test]
async fn completed_payment_leaves_later_statuses_alone() {
    let db = test_db().await;
    let order = seed_order(&db, 80_000.0).await;
    let order_id = order.id.as_ref().unwrap().to_string();
    let repo = PaymentRepository::new(db.clone());
    let service = OrderService::new(db.clone());

    // The order has already moved past pending
    for status in [OrderStatus::Confirmed, OrderStatus::Shipping] {
        service
            .update_status(
                &order_id,
                &store_server::orders::StatusUpdateRequest {
                    order_status: Some(status),
                    payment_status: None,
                },
            )
            .await
            .expect("transition");
    }

    let payment = repo.create(payment_for(&order)).await.expect("create payment");
    let updated = repo
        .update_status(
            &payment.id.as_ref().unwrap().to_string(),
            PaymentStatusUpdate {
                status: PaymentRecordStatus::Completed,
                transaction_id: None,
                note: None,
            },
        )
        .await
        .expect("update payment");

    let synced = service
        .apply_payment_status(&updated)
        .await
        .expect("reconcile")
        .expect("order updated");

    // paid, but the fulfillment status is untouched
    assert_eq!(synced.payment_status, PaymentStatus::Paid);
    assert_eq!(synced.order_status, OrderStatus::Shipping);
}

#[tokio::test]
async fn failed_payment_marks_order_failed_without_stock_effect() {
    let db = test_db().await;
    let order = seed_order(&db, 60_000.0).await;
    let repo = PaymentRepository::new(db.clone());
    let service = OrderService::new(db.clone());

    let payment = repo.create(payment_for(&order)).await.expect("create payment");
    let updated = repo
        .update_status(
            &payment.id.as_ref().unwrap().to_string(),
            PaymentStatusUpdate {
                status: PaymentRecordStatus::Failed,
                transaction_id: None,
                note: Some("card declined".into()),
            },
        )
        .await
        .expect("update payment");

    let synced = service
        .apply_payment_status(&updated)
        .await
        .expect("reconcile")
        .expect("order updated");
    assert_eq!(synced.payment_status, PaymentStatus::Failed);
    assert_eq!(synced.order_status, OrderStatus::Pending);
}

#[tokio::test]
async fn pending_payment_update_is_a_noop_for_the_order() {
    let db = test_db().await;
    let order = seed_order(&db, 40_000.0).await;
    let repo = PaymentRepository::new(db.clone());
    let service = OrderService::new(db.clone());

    let payment = repo.create(payment_for(&order)).await.expect("create payment");
    let result = service
        .apply_payment_status(&payment)
        .await
        .expect("reconcile");
    assert!(result.is_none());
}
