//! Order placement and reconciliation flows against an in-memory database.

use surrealdb::engine::local::{Db, Mem};
use surrealdb::{RecordId, Surreal};

use store_server::db;
use store_server::db::models::{
    Category, PaymentMethod, Product, ShippingAddress, Variant,
};
use store_server::db::repository::order::OrderFilter;
use store_server::db::repository::{CategoryRepository, OrderRepository, ProductRepository};
use store_server::orders::{
    Actor, OrderError, OrderService, OrderStatus, PaymentStatus, PlaceOrderItem,
    PlaceOrderRequest, StatusUpdateRequest,
};

async fn test_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.expect("open mem db");
    db.use_ns("test").use_db("test").await.expect("select ns");
    db::apply_schema(&db).await.expect("apply schema");
    db
}

async fn seed_product(db: &Surreal<Db>, name: &str, variants: Vec<(&str, f64, i64)>) -> Product {
    let category_repo = CategoryRepository::new(db.clone());
    let category = category_repo
        .create(Category {
            id: None,
            name: format!("{} category", name),
            slug: format!("{}-category", name.to_lowercase().replace(' ', "-")),
            description: String::new(),
            parent: None,
            is_active: true,
            created_at: 0,
        })
        .await
        .expect("create category");

    let product_repo = ProductRepository::new(db.clone());
    product_repo
        .create(Product {
            id: None,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            brand: String::new(),
            category: category.id.expect("category id"),
            base_price: variants.first().map(|v| v.1).unwrap_or(0.0),
            description: String::new(),
            thumbnail: None,
            variants: variants
                .into_iter()
                .map(|(sku, price, stock)| Variant {
                    size: "M".to_string(),
                    color: "Red".to_string(),
                    sku: sku.to_string(),
                    price,
                    stock,
                })
                .collect(),
            is_active: true,
            rev: 0,
            created_at: 0,
        })
        .await
        .expect("create product")
}

fn address() -> ShippingAddress {
    ShippingAddress {
        name: "Alice".to_string(),
        phone: "0900000001".to_string(),
        address: Some("1 Main St".to_string()),
        ..Default::default()
    }
}

fn request_for(product: &Product, sku: &str, quantity: i64) -> PlaceOrderRequest {
    PlaceOrderRequest {
        items: vec![PlaceOrderItem {
            product_id: product.id.as_ref().expect("product id").to_string(),
            sku: sku.to_string(),
            quantity,
        }],
        shipping_address: address(),
        payment_method: PaymentMethod::Cod,
        note: None,
    }
}

fn customer(name: &str) -> RecordId {
    RecordId::from_table_key("user", name)
}

fn actor(name: &str) -> Actor {
    Actor {
        id: customer(name).to_string(),
        is_admin: false,
    }
}

async fn stock_of(db: &Surreal<Db>, product: &Product, sku: &str) -> i64 {
    let repo = ProductRepository::new(db.clone());
    let fresh = repo
        .find_by_id(&product.id.as_ref().expect("product id").to_string())
        .await
        .expect("reload product")
        .expect("product exists");
    fresh
        .variant_by_sku(sku)
        .map(|v| v.stock)
        .expect("variant exists")
}

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
async fn place_order_snapshots_price_and_decrements_stock() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 2)]).await;
    let service = OrderService::new(db.clone());

    let order = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 2))
        .await
        .expect("placement succeeds");

    assert!(order.order_code.starts_with("ORD"));
    assert_eq!(order.total_amount, 200_000.0);
    assert_eq!(order.order_status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].price, 100_000.0);
    assert_eq!(order.items[0].variant.price, 100_000.0);
    assert_eq!(order.items[0].variant.sku, "RED-M");

    assert_eq!(stock_of(&db, &product, "RED-M").await, 0);
}

#[tokio::test]
async fn price_snapshot_survives_catalog_repricing() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 5)]).await;
    let service = OrderService::new(db.clone());

    let order = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 1))
        .await
        .expect("placement succeeds");

    // Reprice the variant after the sale
    let repo = ProductRepository::new(db.clone());
    let id = product.id.as_ref().unwrap().to_string();
    repo.update(
        &id,
        store_server::db::models::ProductUpdate {
            name: None,
            slug: None,
            brand: None,
            category: None,
            base_price: None,
            description: None,
            thumbnail: None,
            variants: Some(vec![store_server::db::models::VariantInput {
                size: "M".into(),
                color: "Red".into(),
                sku: "RED-M".into(),
                price: 150_000.0,
                stock: 4,
            }]),
            is_active: None,
        },
    )
    .await
    .expect("reprice");

    let order_repo = OrderRepository::new(db.clone());
    let stored = order_repo
        .find_by_id(&order.id.as_ref().unwrap().to_string())
        .await
        .expect("load order")
        .expect("order exists");

    // The ledger keeps the price at the moment of placement
    assert_eq!(stored.items[0].price, 100_000.0);
    assert_eq!(stored.total_amount, 100_000.0);
}

#[tokio::test]
async fn multi_line_order_totals_and_decrements_each_variant() {
    let db = test_db().await;
    let product = seed_product(
        &db,
        "Shirt",
        vec![("RED-M", 100_000.0, 2), ("BLUE-L", 59_000.0, 1)],
    )
    .await;
    let service = OrderService::new(db.clone());

    let product_id = product.id.as_ref().unwrap().to_string();
    let req = PlaceOrderRequest {
        items: vec![
            PlaceOrderItem {
                product_id: product_id.clone(),
                sku: "RED-M".into(),
                quantity: 2,
            },
            PlaceOrderItem {
                product_id,
                sku: "BLUE-L".into(),
                quantity: 1,
            },
        ],
        shipping_address: address(),
        payment_method: PaymentMethod::Cod,
        note: None,
    };

    let order = service
        .place(Some(customer("alice")), &req)
        .await
        .expect("placement succeeds");

    assert_eq!(order.total_amount, 259_000.0);
    assert_eq!(stock_of(&db, &product, "RED-M").await, 0);
    assert_eq!(stock_of(&db, &product, "BLUE-L").await, 0);
}

#[tokio::test]
async fn insufficient_stock_fails_and_cancel_restores() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 2)]).await;
    let service = OrderService::new(db.clone());

    let first = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 2))
        .await
        .expect("first placement succeeds");
    assert_eq!(stock_of(&db, &product, "RED-M").await, 0);

    // Second order wants one more unit than remains
    let err = service
        .place(Some(customer("bob")), &request_for(&product, "RED-M", 1))
        .await
        .expect_err("second placement must fail");
    assert!(matches!(err, OrderError::InsufficientStock { .. }));

    // Cancelling the first order restores the original stock exactly
    let cancelled = service
        .cancel(&first.id.as_ref().unwrap().to_string(), &actor("alice"))
        .await
        .expect("cancel succeeds");
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&db, &product, "RED-M").await, 2);
}

#[tokio::test]
async fn unknown_sku_is_all_or_nothing() {
    let db = test_db().await;
    let product = seed_product(
        &db,
        "Shirt",
        vec![("RED-M", 100_000.0, 5), ("BLUE-L", 59_000.0, 3)],
    )
    .await;
    let service = OrderService::new(db.clone());

    let product_id = product.id.as_ref().unwrap().to_string();
    let req = PlaceOrderRequest {
        items: vec![
            PlaceOrderItem {
                product_id: product_id.clone(),
                sku: "RED-M".into(),
                quantity: 1,
            },
            PlaceOrderItem {
                product_id,
                sku: "NO-SUCH-SKU".into(),
                quantity: 1,
            },
        ],
        shipping_address: address(),
        payment_method: PaymentMethod::Cod,
        note: None,
    };

    let err = service
        .place(Some(customer("alice")), &req)
        .await
        .expect_err("placement must fail");
    assert!(matches!(err, OrderError::VariantNotFound { .. }));

    // Nothing was decremented, nothing was persisted
    assert_eq!(stock_of(&db, &product, "RED-M").await, 5);
    assert_eq!(stock_of(&db, &product, "BLUE-L").await, 3);

    let repo = OrderRepository::new(db.clone());
    let (orders, total) = repo
        .find_page(&OrderFilter::default(), 1, 10)
        .await
        .expect("list orders");
    assert!(orders.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 2)]).await;
    let service = OrderService::new(db.clone());

    // Empty cart
    let empty = PlaceOrderRequest {
        items: vec![],
        shipping_address: address(),
        payment_method: PaymentMethod::Cod,
        note: None,
    };
    assert!(matches!(
        service.place(Some(customer("alice")), &empty).await,
        Err(OrderError::InvalidRequest(_))
    ));

    // Missing phone
    let mut no_phone = request_for(&product, "RED-M", 1);
    no_phone.shipping_address.phone = String::new();
    assert!(matches!(
        service.place(Some(customer("alice")), &no_phone).await,
        Err(OrderError::InvalidRequest(_))
    ));

    // Zero quantity
    let zero_qty = request_for(&product, "RED-M", 0);
    assert!(matches!(
        service.place(Some(customer("alice")), &zero_qty).await,
        Err(OrderError::InvalidRequest(_))
    ));

    // Inactive product cannot be purchased
    let repo = ProductRepository::new(db.clone());
    repo.soft_delete(&product.id.as_ref().unwrap().to_string())
        .await
        .expect("soft delete");
    assert!(matches!(
        service
            .place(Some(customer("alice")), &request_for(&product, "RED-M", 1))
            .await,
        Err(OrderError::ProductNotFound(_))
    ));
}

// ============================================================================
// Cancellation guards
// ============================================================================

#[tokio::test]
async fn cancel_requires_ownership() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 2)]).await;
    let service = OrderService::new(db.clone());

    let order = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 1))
        .await
        .expect("placement succeeds");

    let err = service
        .cancel(&order.id.as_ref().unwrap().to_string(), &actor("bob"))
        .await
        .expect_err("stranger cannot cancel");
    assert!(matches!(err, OrderError::Forbidden(_)));

    // Stock untouched by the failed attempt
    assert_eq!(stock_of(&db, &product, "RED-M").await, 1);
}

#[tokio::test]
async fn cancel_rejected_after_shipping() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 2)]).await;
    let service = OrderService::new(db.clone());

    let order = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 1))
        .await
        .expect("placement succeeds");
    let order_id = order.id.as_ref().unwrap().to_string();

    for status in [OrderStatus::Confirmed, OrderStatus::Shipping] {
        service
            .update_status(
                &order_id,
                &StatusUpdateRequest {
                    order_status: Some(status),
                    payment_status: None,
                },
            )
            .await
            .expect("admin transition");
    }

    let err = service
        .cancel(&order_id, &actor("alice"))
        .await
        .expect_err("cannot self-service cancel a shipping order");
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    assert_eq!(stock_of(&db, &product, "RED-M").await, 1);
}

#[tokio::test]
async fn double_cancel_does_not_double_restore() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 2)]).await;
    let service = OrderService::new(db.clone());

    let order = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 2))
        .await
        .expect("placement succeeds");
    let order_id = order.id.as_ref().unwrap().to_string();

    service
        .cancel(&order_id, &actor("alice"))
        .await
        .expect("first cancel succeeds");
    assert_eq!(stock_of(&db, &product, "RED-M").await, 2);

    // Customer retry
    let err = service
        .cancel(&order_id, &actor("alice"))
        .await
        .expect_err("second cancel must fail");
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    // Admin retry goes through the same state machine
    let err = service
        .update_status(
            &order_id,
            &StatusUpdateRequest {
                order_status: Some(OrderStatus::Cancelled),
                payment_status: None,
            },
        )
        .await
        .expect_err("admin re-cancel must fail");
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    // Restored exactly once
    assert_eq!(stock_of(&db, &product, "RED-M").await, 2);
}

// ============================================================================
// Admin status updates
// ============================================================================

#[tokio::test]
async fn admin_transitions_stamp_timestamps_and_follow_the_table() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 2)]).await;
    let service = OrderService::new(db.clone());

    let order = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 1))
        .await
        .expect("placement succeeds");
    let order_id = order.id.as_ref().unwrap().to_string();

    let confirmed = service
        .update_status(
            &order_id,
            &StatusUpdateRequest {
                order_status: Some(OrderStatus::Confirmed),
                payment_status: Some(PaymentStatus::Paid),
            },
        )
        .await
        .expect("confirm");
    assert_eq!(confirmed.order_status, OrderStatus::Confirmed);
    assert_eq!(confirmed.payment_status, PaymentStatus::Paid);

    let shipping = service
        .update_status(
            &order_id,
            &StatusUpdateRequest {
                order_status: Some(OrderStatus::Shipping),
                payment_status: None,
            },
        )
        .await
        .expect("ship");
    assert!(shipping.shipped_at.is_some());
    assert!(shipping.delivered_at.is_none());

    let delivered = service
        .update_status(
            &order_id,
            &StatusUpdateRequest {
                order_status: Some(OrderStatus::Delivered),
                payment_status: None,
            },
        )
        .await
        .expect("deliver");
    assert!(delivered.delivered_at.is_some());

    // Delivered is terminal, even for admins
    let err = service
        .update_status(
            &order_id,
            &StatusUpdateRequest {
                order_status: Some(OrderStatus::Cancelled),
                payment_status: None,
            },
        )
        .await
        .expect_err("delivered orders cannot be cancelled");
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    // Backwards transitions rejected
    let err = service
        .update_status(
            &order_id,
            &StatusUpdateRequest {
                order_status: Some(OrderStatus::Shipping),
                payment_status: None,
            },
        )
        .await
        .expect_err("no backwards transition");
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn admin_cancellation_restores_stock() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 3)]).await;
    let service = OrderService::new(db.clone());

    let order = service
        .place(Some(customer("alice")), &request_for(&product, "RED-M", 3))
        .await
        .expect("placement succeeds");
    assert_eq!(stock_of(&db, &product, "RED-M").await, 0);

    let cancelled = service
        .update_status(
            &order.id.as_ref().unwrap().to_string(),
            &StatusUpdateRequest {
                order_status: Some(OrderStatus::Cancelled),
                payment_status: None,
            },
        )
        .await
        .expect("admin cancel");
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&db, &product, "RED-M").await, 3);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn concurrent_placement_never_oversells() {
    let db = test_db().await;
    let product = seed_product(&db, "Shirt", vec![("RED-M", 100_000.0, 1)]).await;
    let service = OrderService::new(db.clone());

    let s1 = service.clone();
    let s2 = service.clone();
    let r1 = request_for(&product, "RED-M", 1);
    let r2 = request_for(&product, "RED-M", 1);

    let (a, b) = tokio::join!(
        tokio::spawn(async move { s1.place(Some(customer("alice")), &r1).await }),
        tokio::spawn(async move { s2.place(Some(customer("bob")), &r2).await }),
    );
    let a = a.expect("task a");
    let b = b.expect("task b");

    // Exactly one placement wins the last unit
    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one of two racing orders must succeed");

    let loser = if a.is_ok() { b } else { a };
    match loser.expect_err("loser must fail") {
        OrderError::InsufficientStock { .. } | OrderError::Conflict(_) => {}
        other => panic!("unexpected loser error: {other:?}"),
    }

    // Stock never goes negative
    assert_eq!(stock_of(&db, &product, "RED-M").await, 0);
}
