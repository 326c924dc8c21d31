//! Order, login code and location behavior against a real database.
//!
//! Every test creates its own rows with random names, so runs can share a
//! database.

#![allow(clippy::expect_used)]

use chrono::{Duration, Utc};
use sqlx::PgPool;

use iranmarket_admin::db::locations::{CityInput, LocationAdminRepository, ProvinceInput};
use iranmarket_core::db::{CancelOutcome, OrderRepository, PaymentOutcome, RepositoryError};
use iranmarket_core::order::{NewOrder, NewOrderItem, PaymentError};
use iranmarket_core::otp::{MAX_OTP_ATTEMPTS, OtpOutcome};
use iranmarket_core::{CategoryId, OrderId, OrderStatus, ProductId, Toman};
use iranmarket_integration_tests::{test_pool, unique_suffix};
use iranmarket_storefront::db::otp::OtpRepository;

const PRICE: i64 = 85_000;

async fn product_with_stock(pool: &PgPool, stock: i32) -> ProductId {
    let suffix = unique_suffix(pool).await;
    let category: CategoryId = sqlx::query_scalar(
        "INSERT INTO shop.category (name, slug) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("Test category {suffix}"))
    .bind(format!("test-category-{suffix}"))
    .fetch_one(pool)
    .await
    .expect("insert category");

    sqlx::query_scalar(
        r"
        INSERT INTO shop.product (category_id, name, slug, price, stock)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(category)
    .bind(format!("Test rice {suffix}"))
    .bind(format!("test-rice-{suffix}"))
    .bind(Toman::new(PRICE))
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("insert product")
}

async fn order_for(pool: &PgPool, product_id: ProductId, quantity: i32) -> OrderId {
    let items_total = Toman::new(PRICE * i64::from(quantity));
    let order = NewOrder {
        user_id: None,
        first_name: "Sara".to_owned(),
        last_name: "Ahmadi".to_owned(),
        phone: "09121234567".to_owned(),
        address: "Tehran, Valiasr St.".to_owned(),
        city_id: None,
        shipping_cost: Toman::ZERO,
        discount_amount: Toman::ZERO,
        coupon_id: None,
        coupon_code: String::new(),
        total_price: items_total,
        items: vec![NewOrderItem {
            product_id,
            price: Toman::new(PRICE),
            quantity,
        }],
    };
    OrderRepository::new(pool)
        .create(&order)
        .await
        .expect("create order")
}

async fn stock_of(pool: &PgPool, product_id: ProductId) -> i32 {
    sqlx::query_scalar("SELECT stock FROM shop.product WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("read stock")
}

// =============================================================================
// Payment
// =============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_payment_deducts_stock_once() {
    let pool = test_pool().await;
    let product = product_with_stock(&pool, 10).await;
    let order = order_for(&pool, product, 3).await;
    let orders = OrderRepository::new(&pool);

    assert_eq!(orders.apply_payment(order).await.expect("first payment"), PaymentOutcome::Applied);
    assert_eq!(
        orders.apply_payment(order).await.expect("second payment"),
        PaymentOutcome::AlreadyApplied
    );

    assert_eq!(stock_of(&pool, product).await, 7);
    let saved = orders.get(order).await.expect("get").expect("order exists");
    assert!(saved.paid);
    assert!(saved.stock_deducted);
    assert_eq!(saved.status, OrderStatus::Processing);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_payment_with_insufficient_stock_changes_nothing() {
    let pool = test_pool().await;
    let product = product_with_stock(&pool, 2).await;
    let order = order_for(&pool, product, 3).await;
    let orders = OrderRepository::new(&pool);

    let err = orders.apply_payment(order).await.expect_err("not enough stock");
    assert!(matches!(
        err,
        RepositoryError::Payment(PaymentError::InsufficientStock { .. })
    ));

    assert_eq!(stock_of(&pool, product).await, 2);
    let saved = orders.get(order).await.expect("get").expect("order exists");
    assert!(!saved.paid);
    assert!(!saved.stock_deducted);
    assert_eq!(saved.status, OrderStatus::Pending);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_staff_cancel_restocks_once() {
    let pool = test_pool().await;
    let product = product_with_stock(&pool, 10).await;
    let order = order_for(&pool, product, 4).await;
    let orders = OrderRepository::new(&pool);
    orders.apply_payment(order).await.expect("payment");
    assert_eq!(stock_of(&pool, product).await, 6);

    assert_eq!(
        orders.cancel(order, true).await.expect("cancel"),
        CancelOutcome::Cancelled { restocked: true }
    );
    assert_eq!(stock_of(&pool, product).await, 10);

    assert_eq!(
        orders.cancel(order, true).await.expect("cancel again"),
        CancelOutcome::AlreadyCancelled
    );
    assert_eq!(stock_of(&pool, product).await, 10);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_customer_cannot_cancel_paid_order() {
    let pool = test_pool().await;
    let product = product_with_stock(&pool, 5).await;
    let order = order_for(&pool, product, 1).await;
    let orders = OrderRepository::new(&pool);
    orders.apply_payment(order).await.expect("payment");

    assert_eq!(
        orders.cancel_unpaid(order).await.expect("cancel"),
        CancelOutcome::NotCancellable
    );

    let saved = orders.get(order).await.expect("get").expect("order exists");
    assert_eq!(saved.status, OrderStatus::Processing);
    assert!(saved.paid);
    assert_eq!(stock_of(&pool, product).await, 4);
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_customer_cancels_unpaid_order() {
    let pool = test_pool().await;
    let product = product_with_stock(&pool, 5).await;
    let order = order_for(&pool, product, 2).await;
    let orders = OrderRepository::new(&pool);

    assert_eq!(
        orders.cancel_unpaid(order).await.expect("cancel"),
        CancelOutcome::Cancelled { restocked: false }
    );
    assert_eq!(stock_of(&pool, product).await, 5);
    let saved = orders.get(order).await.expect("get").expect("order exists");
    assert_eq!(saved.status, OrderStatus::Cancelled);
}

// =============================================================================
// Login codes
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires running database"]
async fn test_concurrent_correct_codes_are_accepted_once() {
    let pool = test_pool().await;
    let identifier = format!("otp-{}@iranmarket.test", unique_suffix(&pool).await);
    let otps = OtpRepository::new(&pool);
    otps.create(&identifier, "482913", Utc::now() + Duration::minutes(5))
        .await
        .expect("create code");

    let (first, second) = tokio::join!(
        otps.attempt(&identifier, "482913", Utc::now()),
        otps.attempt(&identifier, "482913", Utc::now()),
    );
    let outcomes = [first.expect("first attempt"), second.expect("second attempt")];

    let accepted = outcomes
        .iter()
        .filter(|o| **o == Some(OtpOutcome::Accepted))
        .count();
    assert_eq!(accepted, 1);
    assert!(outcomes.contains(&None));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires running database"]
async fn test_concurrent_wrong_guesses_all_count() {
    let pool = test_pool().await;
    let identifier = format!("otp-{}@iranmarket.test", unique_suffix(&pool).await);
    OtpRepository::new(&pool)
        .create(&identifier, "482913", Utc::now() + Duration::minutes(5))
        .await
        .expect("create code");

    let guesses: Vec<_> = (0..MAX_OTP_ATTEMPTS)
        .map(|_| {
            let pool = pool.clone();
            let identifier = identifier.clone();
            tokio::spawn(async move {
                OtpRepository::new(&pool)
                    .attempt(&identifier, "000000", Utc::now())
                    .await
            })
        })
        .collect();
    for guess in guesses {
        let outcome = guess.await.expect("task").expect("guess");
        assert_eq!(outcome, Some(OtpOutcome::Mismatch));
    }

    assert_eq!(
        OtpRepository::new(&pool)
            .attempt(&identifier, "482913", Utc::now())
            .await
            .expect("last attempt"),
        Some(OtpOutcome::TooManyAttempts)
    );
}

// =============================================================================
// Locations
// =============================================================================

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_derived_location_slugs_are_deduplicated() {
    let pool = test_pool().await;
    let locations = LocationAdminRepository::new(&pool);
    let name = format!("Test Province {}", unique_suffix(&pool).await);
    let province = |name: &str| ProvinceInput {
        name: name.to_owned(),
        slug: String::new(),
        sort_order: 0,
        is_active: true,
    };

    let first = locations.create_province(&province(&name)).await.expect("first province");
    let second = locations.create_province(&province(&name)).await.expect("second province");

    let first_slug = locations.province(first).await.expect("get").expect("exists").slug;
    let second_slug = locations.province(second).await.expect("get").expect("exists").slug;
    assert_eq!(second_slug, format!("{first_slug}-2"));

    let city = |province_id| CityInput {
        province_id,
        name: "Karaj".to_owned(),
        slug: String::new(),
        sort_order: 0,
        is_active: true,
        is_popular: false,
        delivery_available: true,
        shipping_zone_id: None,
    };
    let first_city = locations.create_city(&city(first)).await.expect("first city");
    let second_city = locations.create_city(&city(second)).await.expect("second city");

    let first_city_slug = locations.city(first_city).await.expect("get").expect("exists").city.slug;
    let second_city_slug = locations.city(second_city).await.expect("get").expect("exists").city.slug;
    assert_eq!(first_city_slug, format!("{first_slug}-karaj"));
    assert_eq!(second_city_slug, format!("{first_slug}-karaj-2"));

    // Saving unchanged keeps the row's own slug.
    locations.update_province(second, &province(&name)).await.expect("update");
    let kept = locations.province(second).await.expect("get").expect("exists").slug;
    assert_eq!(kept, second_slug);
}
