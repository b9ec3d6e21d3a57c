use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::{
    audit,
    dto::customers::{CustomerList, CustomerWithOrders, UpdateCustomerRequest},
    entity::{
        customers::{
            ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers,
            Model as CustomerModel,
        },
        enums::Membership,
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::{AppError, AppResult},
    middleware::{
        auth::AuthUser,
        permissions::{Capability, ensure},
    },
    models::Customer,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Returns the customer owned by `user_id`, creating it on first use.
///
/// The insert is guarded by the unique `user_id` column, so concurrent first
/// calls for one principal converge on a single row.
pub async fn get_or_create_customer<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> AppResult<CustomerModel> {
    Customers::insert(CustomerActive {
        id: NotSet,
        user_id: Set(user_id),
        phone: Set(String::new()),
        birth_date: Set(None),
        membership: Set(Membership::Bronze),
    })
    .on_conflict(OnConflict::column(CustomerCol::UserId).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;

    find_customer(db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("customer {user_id} vanished after upsert")))
}

pub async fn find_customer<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> AppResult<Option<CustomerModel>> {
    Ok(Customers::find()
        .filter(CustomerCol::UserId.eq(user_id))
        .one(db)
        .await?)
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Customer>> {
    let customer = get_or_create_customer(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success(
        "OK",
        Customer::from(customer),
        Some(Meta::empty()),
    ))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCustomerRequest,
) -> AppResult<ApiResponse<Customer>> {
    let existing = get_or_create_customer(&state.orm, user.user_id).await?;

    let mut active: CustomerActive = existing.into();
    if let Some(phone) = payload.phone {
        active.phone = Set(phone.trim().to_string());
    }
    if let Some(birth_date) = payload.birth_date {
        active.birth_date = Set(Some(birth_date));
    }
    if let Some(membership) = payload.membership {
        active.membership = Set(membership);
    }
    let customer = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "customer_update",
        "customers",
        serde_json::json!({ "customer_id": customer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Customer::from(customer),
        Some(Meta::empty()),
    ))
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure(user, Capability::ViewCustomers)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Customers::find().order_by_asc(CustomerCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;
    let customers = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<i64> = customers.iter().map(|c| c.id).collect();
    let counts: HashMap<i64, i64> = Orders::find()
        .select_only()
        .column(OrderCol::CustomerId)
        .column_as(Expr::col(OrderCol::Id).count(), "orders_count")
        .filter(OrderCol::CustomerId.is_in(ids))
        .group_by(OrderCol::CustomerId)
        .into_tuple::<(i64, i64)>()
        .all(&state.orm)
        .await?
        .into_iter()
        .collect();

    let items = customers
        .into_iter()
        .map(|model| CustomerWithOrders {
            orders_count: counts.get(&model.id).copied().unwrap_or(0),
            customer: Customer::from(model),
        })
        .collect();

    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
