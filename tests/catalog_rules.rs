mod common;

use rust_decimal::Decimal;
use storefront_api::{
    dto::{
        cart::AddToCartRequest,
        catalog::{
            ClearInventoryRequest, CreateCollectionRequest, CreateProductRequest,
            CreateReviewRequest, InventoryAdjustRequest,
        },
        orders::CheckoutRequest,
        tags::{CreateTagRequest, TagTarget},
    },
    entity::enums::EntityKind,
    error::AppError,
    routes::params::LowStockQuery,
    services::{
        admin_service, cart_service, collection_service, order_service, product_service,
        review_service, tag_service,
    },
};
use uuid::Uuid;

use common::{customer, database_state, seed_collection, seed_product, staff};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn collections_with_products_are_protected() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let admin = staff();

    let collection = collection_service::create_collection(
        &state,
        &admin,
        CreateCollectionRequest {
            name: format!("Shoes {}", Uuid::new_v4()),
            featured_product_id: None,
        },
    )
    .await?
    .into_data()
    .unwrap();
    assert_eq!(collection.products_count, 0);

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            title: "Trail Runner".into(),
            slug: Some(format!("trail-runner-{}", Uuid::new_v4())),
            description: None,
            unit_price: Decimal::new(8900, 2),
            inventory: 4,
            collection_id: collection.id,
        },
    )
    .await?
    .into_data()
    .unwrap();
    assert_eq!(product.price_with_tax, Decimal::new(9790, 2));

    let counted = collection_service::get_collection(&state, collection.id)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(counted.products_count, 1);

    let blocked = collection_service::delete_collection(&state, &admin, collection.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    product_service::delete_product(&state, &admin, product.id).await?;
    collection_service::delete_collection(&state, &admin, collection.id).await?;
    assert!(matches!(
        collection_service::get_collection(&state, collection.id).await,
        Err(AppError::NotFound)
    ));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ordered_products_cannot_be_deleted() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let admin = staff();
    let buyer = customer();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(1500, 2), 3).await?;
    let cart = cart_service::create_cart(&state).await?.into_data().unwrap();
    cart_service::add_item(
        &state,
        cart.id,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    let placed = order_service::checkout(&state, &buyer, CheckoutRequest { cart_id: cart.id })
        .await?
        .into_data()
        .unwrap();

    let blocked = product_service::delete_product(&state, &admin, product.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    let blocked = order_service::delete_order(&state, &admin, placed.order.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn product_validation_rejects_bad_input() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let admin = staff();
    let collection = seed_collection(&state).await?;

    let cheap = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            title: "Penny".into(),
            slug: None,
            description: None,
            unit_price: Decimal::new(50, 2),
            inventory: 1,
            collection_id: collection.id,
        },
    )
    .await;
    assert!(matches!(cheap, Err(AppError::Validation(_))));

    let orphan = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            title: "Orphan".into(),
            slug: None,
            description: None,
            unit_price: Decimal::new(500, 2),
            inventory: 1,
            collection_id: i64::MAX,
        },
    )
    .await;
    assert!(matches!(orphan, Err(AppError::Validation(_))));

    for unit_price in [Decimal::new(1_000_000, 2), Decimal::new(10_005, 3)] {
        let out_of_range = product_service::create_product(
            &state,
            &admin,
            CreateProductRequest {
                title: "Out of range".into(),
                slug: Some(format!("out-of-range-{}", Uuid::new_v4())),
                description: None,
                unit_price,
                inventory: 1,
                collection_id: collection.id,
            },
        )
        .await;
        assert!(matches!(out_of_range, Err(AppError::Validation(_))));
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tags_attach_once_and_protect_themselves() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let admin = staff();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(700, 2), 8).await?;
    let tag = tag_service::create_tag(
        &state,
        &admin,
        CreateTagRequest {
            label: format!("gift-{}", Uuid::new_v4()),
        },
    )
    .await?
    .into_data()
    .unwrap();

    let target = TagTarget {
        kind: EntityKind::Product,
        object_id: product.id,
    };
    tag_service::attach_tag(&state, &admin, tag.id, target).await?;
    let tags = tag_service::attach_tag(&state, &admin, tag.id, target)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(tags.items, vec![tag.clone()]);

    // Same id, different kind: the collection carries no tags.
    let other = tag_service::tags_for(
        &state,
        TagTarget {
            kind: EntityKind::Collection,
            object_id: product.id,
        },
    )
    .await?
    .into_data()
    .unwrap();
    assert!(other.items.iter().all(|t| t.id != tag.id));

    let missing = tag_service::attach_tag(
        &state,
        &admin,
        tag.id,
        TagTarget {
            kind: EntityKind::Order,
            object_id: i64::MAX,
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let blocked = tag_service::delete_tag(&state, &admin, tag.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    tag_service::detach_tag(&state, &admin, tag.id, target).await?;
    tag_service::delete_tag(&state, &admin, tag.id).await?;

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn likes_count_each_principal_once() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let first = customer();
    let second = customer();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(700, 2), 8).await?;
    let target = TagTarget {
        kind: EntityKind::Product,
        object_id: product.id,
    };

    tag_service::like(&state, &first, target).await?;
    tag_service::like(&state, &first, target).await?;
    let summary = tag_service::like(&state, &second, target)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(summary.likes, 2);

    let summary = tag_service::unlike(&state, &first, target)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(summary.likes, 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn inventory_adjustments_stay_non_negative() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let admin = staff();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(1200, 2), 3).await?;

    let below_zero = admin_service::adjust_inventory(
        &state,
        &admin,
        product.id,
        InventoryAdjustRequest { delta: -4 },
    )
    .await;
    assert!(matches!(below_zero, Err(AppError::Validation(_))));

    let zero = admin_service::adjust_inventory(
        &state,
        &admin,
        product.id,
        InventoryAdjustRequest { delta: 0 },
    )
    .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let adjusted = admin_service::adjust_inventory(
        &state,
        &admin,
        product.id,
        InventoryAdjustRequest { delta: 2 },
    )
    .await?
    .into_data()
    .unwrap();
    assert_eq!(adjusted.inventory, 5);

    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            threshold: Some(6),
            per_page: Some(100),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .unwrap();
    assert!(low.items.iter().all(|p| p.inventory < 6));

    let cleared = admin_service::clear_inventory(
        &state,
        &admin,
        ClearInventoryRequest {
            product_ids: vec![product.id],
        },
    )
    .await?
    .into_data()
    .unwrap();
    assert_eq!(cleared.updated, 1);

    let reloaded = product_service::get_product(&state, product.id)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(reloaded.inventory, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reviews_belong_to_existing_products() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let moderator = staff();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(1200, 2), 3).await?;

    let review = review_service::create_review(
        &state,
        product.id,
        CreateReviewRequest {
            name: "Ana".into(),
            description: "Fits well".into(),
        },
    )
    .await?
    .into_data()
    .unwrap();

    let missing = review_service::create_review(
        &state,
        i64::MAX,
        CreateReviewRequest {
            name: "Ana".into(),
            description: "Lost".into(),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    let blank = review_service::create_review(
        &state,
        product.id,
        CreateReviewRequest {
            name: " ".into(),
            description: "x".into(),
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    let listed = review_service::list_reviews(&state, product.id)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(listed.items.len(), 1);

    review_service::delete_review(&state, &moderator, product.id, review.id).await?;
    assert!(matches!(
        review_service::get_review(&state, product.id, review.id).await,
        Err(AppError::NotFound)
    ));

    Ok(())
}
