//! Postgres-backed tests for the vote ledger, the submission quota and the
//! moderation state machine. They need a real database because the properties
//! under test are about atomic conditional updates; opt in with
//! `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

use launchpad::error::ApiError;
use launchpad::products::repo::{self as products, NewProduct, ProductFlag, ProductStatus};
use launchpad::users::repo::{self as users};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

fn sample_product(owner: &str, name: &str) -> NewProduct {
    NewProduct {
        owner_email: owner.to_string(),
        name: name.to_string(),
        image: None,
        description: Some("a thing".to_string()),
        tags: vec!["tools".to_string(), "productivity".to_string()],
        external_link: None,
    }
}

async fn verified_owner(pool: &PgPool) -> String {
    let owner = unique_email("owner");
    users::register(pool, &owner, Some("Owner")).await.expect("register");
    users::verify_subscription(pool, &owner, 10.0, "tx-setup")
        .await
        .expect("verify");
    owner
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn vote_then_revote_counts_once() {
    let pool = test_pool().await;
    let owner = verified_owner(&pool).await;
    let product = products::create(&pool, sample_product(&owner, "Widget"))
        .await
        .expect("create");
    assert_eq!(product.upvotes, 0);
    assert!(product.voters.is_empty());

    let tally = products::cast_vote(&pool, product.id, "a@x.com")
        .await
        .expect("first vote");
    assert_eq!(tally, 1);

    let err = products::cast_vote(&pool, product.id, "a@x.com")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AlreadyVoted));

    let fresh = products::get(&pool, product.id).await.expect("get");
    assert_eq!(fresh.upvotes, 1);
    assert_eq!(fresh.voters, vec!["a@x.com".to_string()]);
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn concurrent_duplicate_votes_count_once() {
    let pool = test_pool().await;
    let owner = verified_owner(&pool).await;
    let product = products::create(&pool, sample_product(&owner, "Gadget"))
        .await
        .expect("create");

    let voter = unique_email("voter");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let voter = voter.clone();
        let id = product.id;
        handles.push(tokio::spawn(async move {
            products::cast_vote(&pool, id, &voter).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(tally) => {
                successes += 1;
                assert_eq!(tally, 1);
            }
            Err(ApiError::AlreadyVoted) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(successes, 1);

    let fresh = products::get(&pool, product.id).await.expect("get");
    assert_eq!(fresh.upvotes, 1);
    assert_eq!(fresh.voters, vec![voter]);
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn votes_from_distinct_users_all_count() {
    let pool = test_pool().await;
    let owner = verified_owner(&pool).await;
    let product = products::create(&pool, sample_product(&owner, "Doohickey"))
        .await
        .expect("create");

    let mut handles = Vec::new();
    for _ in 0..5 {
        let pool = pool.clone();
        let voter = unique_email("voter");
        let id = product.id;
        handles.push(tokio::spawn(async move {
            products::cast_vote(&pool, id, &voter).await
        }));
    }
    for handle in handles {
        handle.await.expect("task").expect("each distinct voter succeeds");
    }

    let fresh = products::get(&pool, product.id).await.expect("get");
    assert_eq!(fresh.upvotes, 5);
    assert_eq!(fresh.voters.len(), 5);
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn unverified_owner_capped_at_one_product() {
    let pool = test_pool().await;
    let owner = unique_email("free");
    users::register(&pool, &owner, None).await.expect("register");

    products::create(&pool, sample_product(&owner, "First"))
        .await
        .expect("first submission fits the free tier");

    let err = products::create(&pool, sample_product(&owner, "Second"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::QuotaExceeded));

    let mine = products::list_by_owner(&pool, &owner).await.expect("list");
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn concurrent_submissions_respect_quota() {
    let pool = test_pool().await;
    let owner = unique_email("racer");
    users::register(&pool, &owner, None).await.expect("register");

    let mut handles = Vec::new();
    for i in 0..8 {
        let pool = pool.clone();
        let owner = owner.clone();
        handles.push(tokio::spawn(async move {
            products::create(&pool, sample_product(&owner, &format!("Racy {i}"))).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(_) => successes += 1,
            Err(ApiError::QuotaExceeded) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(successes, 1);

    let mine = products::list_by_owner(&pool, &owner).await.expect("list");
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn verified_owner_is_unlimited() {
    let pool = test_pool().await;
    let owner = unique_email("subscriber");
    users::register(&pool, &owner, None).await.expect("register");

    products::create(&pool, sample_product(&owner, "Only free one"))
        .await
        .expect("free tier");
    let err = products::create(&pool, sample_product(&owner, "Blocked"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::QuotaExceeded));

    let user = users::verify_subscription(&pool, &owner, 10.0, "tx1")
        .await
        .expect("verify");
    assert_eq!(user.subscription_status, "verified");
    assert_eq!(user.transaction_ref.as_deref(), Some("tx1"));

    for i in 0..5 {
        products::create(&pool, sample_product(&owner, &format!("Paid {i}")))
            .await
            .expect("verified owners are never quota-checked");
    }

    let mine = products::list_by_owner(&pool, &owner).await.expect("list");
    assert_eq!(mine.len(), 6);
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn status_roundtrip_through_catalog_views() {
    let pool = test_pool().await;
    let owner = verified_owner(&pool).await;
    let product = products::create(&pool, sample_product(&owner, "Visible"))
        .await
        .expect("create");
    products::set_flag(&pool, product.id, ProductFlag::Featured, true)
        .await
        .expect("feature");

    products::set_status(&pool, product.id, ProductStatus::Accepted)
        .await
        .expect("accept");
    let accepted = products::search_accepted(&pool, "tool").await.expect("search");
    assert!(accepted.iter().any(|p| p.id == product.id));

    products::set_status(&pool, product.id, ProductStatus::Rejected)
        .await
        .expect("reject");
    let accepted = products::search_accepted(&pool, "tool").await.expect("search");
    assert!(!accepted.iter().any(|p| p.id == product.id));

    // Rejection does not disturb the orthogonal flags.
    let fresh = products::get(&pool, product.id).await.expect("get");
    assert!(fresh.featured);
    assert!(!fresh.reported);
    assert_eq!(fresh.status, "rejected");
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn registration_is_idempotent() {
    let pool = test_pool().await;
    let email = unique_email("repeat");

    let (first, created) = users::register(&pool, &email, Some("Repeat")).await.expect("register");
    assert!(created);
    let (second, created) = users::register(&pool, &email, Some("Changed")).await.expect("register");
    assert!(!created);
    assert_eq!(second.name, first.name);
    assert_eq!(second.created_at, first.created_at);
}

#[tokio::test]
#[ignore = "requires postgres; set TEST_DATABASE_URL"]
async fn roles_only_escalate() {
    let pool = test_pool().await;
    let email = unique_email("mod");
    users::register(&pool, &email, None).await.expect("register");

    let user = users::promote(&pool, &email, users::Role::Moderator)
        .await
        .expect("escalate");
    assert_eq!(user.role, "moderator");

    let err = users::promote(&pool, &email, users::Role::User).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(users::role(&pool, &email).await.expect("role"), "moderator");

    let user = users::promote(&pool, &email, users::Role::Admin)
        .await
        .expect("escalate again");
    assert_eq!(user.role, "admin");
}
