mod common;

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use storefront_api::{
    dto::{cart::AddToCartRequest, orders::CheckoutRequest},
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        cart_items::{Column as CartItemCol, Entity as CartItems},
        customers::{Column as CustomerCol, Entity as Customers},
        enums::PaymentStatus,
        orders::{Column as OrderCol, Entity as Orders},
        products,
    },
    error::{AppError, CheckoutError},
    routes::params::OrderListQuery,
    services::{cart_service, customer_service, order_service},
};
use uuid::Uuid;

use common::{customer, database_state, seed_collection, seed_product};

async fn order_count(state: &storefront_api::state::AppState) -> anyhow::Result<u64> {
    Ok(Orders::find().count(&state.orm).await?)
}

async fn filled_cart(
    state: &storefront_api::state::AppState,
    product_id: i64,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let cart = cart_service::create_cart(state).await?.into_data().unwrap();
    cart_service::add_item(state, cart.id, AddToCartRequest { product_id, quantity }).await?;
    Ok(cart.id)
}

// Cart with (A, 2, 10.00) and (B, 1, 5.00) checked out by one principal.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn checkout_copies_cart_and_removes_it() -> anyhow::Result<()> {
    let Some((state, sink)) = database_state().await? else {
        return Ok(());
    };
    let user = customer();

    let collection = seed_collection(&state).await?;
    let a = seed_product(&state, collection.id, Decimal::new(1000, 2), 10).await?;
    let b = seed_product(&state, collection.id, Decimal::new(500, 2), 10).await?;

    let cart = cart_service::create_cart(&state).await?.into_data().unwrap();
    for (product_id, quantity) in [(a.id, 2), (b.id, 1)] {
        cart_service::add_item(&state, cart.id, AddToCartRequest { product_id, quantity }).await?;
    }

    let placed = order_service::checkout(&state, &user, CheckoutRequest { cart_id: cart.id })
        .await?
        .into_data()
        .unwrap();

    assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
    let lines: Vec<(i64, i32, Decimal)> = placed
        .items
        .iter()
        .map(|item| (item.product_id, item.quantity, item.unit_price))
        .collect();
    assert_eq!(
        lines,
        vec![
            (a.id, 2, Decimal::new(1000, 2)),
            (b.id, 1, Decimal::new(500, 2)),
        ]
    );
    assert_eq!(placed.total_price, Decimal::new(2500, 2));

    let owner = customer_service::find_customer(&state.orm, user.user_id)
        .await?
        .expect("customer created on checkout");
    assert_eq!(placed.order.customer_id, owner.id);

    assert!(matches!(
        cart_service::get_cart(&state, cart.id).await,
        Err(AppError::NotFound)
    ));
    let leftover = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .count(&state.orm)
        .await?;
    assert_eq!(leftover, 0);

    assert_eq!(sink.delivered(), vec![placed.order.id]);

    let audited = AuditLogs::find()
        .filter(AuditCol::UserId.eq(user.user_id))
        .filter(AuditCol::Action.eq("checkout"))
        .count(&state.orm)
        .await?;
    assert_eq!(audited, 1);

    // The same cart cannot be checked out twice.
    let again = order_service::checkout(&state, &user, CheckoutRequest { cart_id: cart.id }).await;
    assert!(matches!(again, Err(AppError::Checkout(CheckoutError::NotFound))));
    assert_eq!(sink.event_count(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn order_prices_are_snapshots() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let user = customer();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(1999, 2), 5).await?;
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

    let placed = order_service::checkout(&state, &user, CheckoutRequest { cart_id: cart.id })
        .await?
        .into_data()
        .unwrap();

    let mut active: products::ActiveModel = product.into();
    active.unit_price = Set(Decimal::new(2999, 2));
    active.update(&state.orm).await?;

    let reloaded = order_service::get_order(&state, &user, placed.order.id)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(reloaded.items[0].unit_price, Decimal::new(1999, 2));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_checkouts_create_no_orders() -> anyhow::Result<()> {
    let Some((state, sink)) = database_state().await? else {
        return Ok(());
    };
    let user = customer();

    let missing = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            cart_id: Uuid::new_v4(),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::Checkout(CheckoutError::NotFound))));

    let empty_cart = cart_service::create_cart(&state).await?.into_data().unwrap();
    let empty = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            cart_id: empty_cart.id,
        },
    )
    .await;
    assert!(matches!(empty, Err(AppError::Checkout(CheckoutError::EmptyCart))));

    // The empty cart survives the rollback.
    assert!(cart_service::get_cart(&state, empty_cart.id).await.is_ok());

    let mine = order_service::list_orders(&state, &user, OrderListQuery::default())
        .await?
        .into_data()
        .unwrap();
    assert!(mine.items.is_empty());
    assert_eq!(sink.event_count(), 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sink_failure_does_not_fail_checkout() -> anyhow::Result<()> {
    let Some((state, sink)) = database_state().await? else {
        return Ok(());
    };
    sink.set_fail(true);
    let user = customer();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(300, 2), 5).await?;
    let cart = cart_service::create_cart(&state).await?.into_data().unwrap();
    cart_service::add_item(
        &state,
        cart.id,
        AddToCartRequest {
            product_id: product.id,
            quantity: 3,
        },
    )
    .await?;

    let before = order_count(&state).await?;
    let placed = order_service::checkout(&state, &user, CheckoutRequest { cart_id: cart.id })
        .await?
        .into_data()
        .unwrap();

    assert_eq!(placed.items.len(), 1);
    assert!(order_count(&state).await? > before);
    assert!(sink.delivered().is_empty());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_merge_into_one_line() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(100, 2), 5).await?;
    let cart = cart_service::create_cart(&state).await?.into_data().unwrap();
    let request = AddToCartRequest {
        product_id: product.id,
        quantity: 1,
    };

    let (first, second) = tokio::join!(
        cart_service::add_item(&state, cart.id, request.clone()),
        cart_service::add_item(&state, cart.id, request.clone()),
    );
    first?;
    second?;

    let lines = cart_service::list_items(&state, cart.id)
        .await?
        .into_data()
        .unwrap()
        .items;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_adds_accumulate_quantity() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(250, 2), 5).await?;
    let cart = cart_service::create_cart(&state).await?.into_data().unwrap();

    for quantity in [2, 3] {
        cart_service::add_item(
            &state,
            cart.id,
            AddToCartRequest {
                product_id: product.id,
                quantity,
            },
        )
        .await?;
    }

    let detail = cart_service::get_cart(&state, cart.id)
        .await?
        .into_data()
        .unwrap();
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 5);
    assert_eq!(detail.total_price, Decimal::new(1250, 2));

    let bad = cart_service::add_item(
        &state,
        cart.id,
        AddToCartRequest {
            product_id: product.id,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(bad, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn other_customers_orders_are_hidden() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };
    let owner = customer();
    let stranger = customer();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(100, 2), 5).await?;
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
    let placed = order_service::checkout(&state, &owner, CheckoutRequest { cart_id: cart.id })
        .await?
        .into_data()
        .unwrap();

    let peek = order_service::get_order(&state, &stranger, placed.order.id).await;
    assert!(matches!(peek, Err(AppError::NotFound)));

    let mine = order_service::list_orders(&state, &owner, OrderListQuery::default())
        .await?
        .into_data()
        .unwrap();
    assert_eq!(mine.items.len(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_of_one_cart_place_one_order() -> anyhow::Result<()> {
    let Some((state, sink)) = database_state().await? else {
        return Ok(());
    };
    let user = customer();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(400, 2), 5).await?;
    let cart_id = filled_cart(&state, product.id, 2).await?;

    let (first, second) = tokio::join!(
        order_service::checkout(&state, &user, CheckoutRequest { cart_id }),
        order_service::checkout(&state, &user, CheckoutRequest { cart_id }),
    );

    let results = [first, second];
    let placed = results.iter().filter(|r| r.is_ok()).count();
    let missing = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Checkout(CheckoutError::NotFound))))
        .count();
    assert_eq!((placed, missing), (1, 1));

    let owner = customer_service::find_customer(&state.orm, user.user_id)
        .await?
        .expect("customer created on checkout");
    let orders = Orders::find()
        .filter(OrderCol::CustomerId.eq(owner.id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 1);
    assert_eq!(sink.event_count(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn first_checkouts_share_one_customer() -> anyhow::Result<()> {
    let Some((state, sink)) = database_state().await? else {
        return Ok(());
    };
    let user = customer();

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(150, 2), 5).await?;
    let first_cart = filled_cart(&state, product.id, 1).await?;
    let second_cart = filled_cart(&state, product.id, 3).await?;

    let (first, second) = tokio::join!(
        order_service::checkout(&state, &user, CheckoutRequest { cart_id: first_cart }),
        order_service::checkout(&state, &user, CheckoutRequest { cart_id: second_cart }),
    );
    let first = first?.into_data().unwrap();
    let second = second?.into_data().unwrap();

    let customers = Customers::find()
        .filter(CustomerCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(customers, 1);
    assert_eq!(first.order.customer_id, second.order.customer_id);
    assert_eq!(sink.event_count(), 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn line_quantity_is_capped() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(100, 2), 5).await?;
    let cart_id = filled_cart(&state, product.id, cart_service::MAX_QUANTITY).await?;

    let over = cart_service::add_item(
        &state,
        cart_id,
        AddToCartRequest {
            product_id: product.id,
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(over, Err(AppError::Validation(_))));

    let huge = cart_service::add_item(
        &state,
        cart_id,
        AddToCartRequest {
            product_id: product.id,
            quantity: i32::MAX,
        },
    )
    .await;
    assert!(matches!(huge, Err(AppError::Validation(_))));

    let lines = cart_service::list_items(&state, cart_id)
        .await?
        .into_data()
        .unwrap()
        .items;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, cart_service::MAX_QUANTITY);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn adding_to_a_vanishing_cart_reports_not_found() -> anyhow::Result<()> {
    let Some((state, _sink)) = database_state().await? else {
        return Ok(());
    };

    let collection = seed_collection(&state).await?;
    let product = seed_product(&state, collection.id, Decimal::new(100, 2), 5).await?;
    let request = AddToCartRequest {
        product_id: product.id,
        quantity: 1,
    };

    for _ in 0..10 {
        let cart = cart_service::create_cart(&state).await?.into_data().unwrap();
        let (added, deleted) = tokio::join!(
            cart_service::add_item(&state, cart.id, request.clone()),
            cart_service::delete_cart(&state, cart.id),
        );
        deleted?;
        assert!(matches!(added, Ok(_) | Err(AppError::NotFound)));
    }

    let gone = cart_service::add_item(&state, Uuid::new_v4(), request).await;
    assert!(matches!(gone, Err(AppError::NotFound)));

    Ok(())
}
