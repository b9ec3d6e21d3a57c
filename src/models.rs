use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    cart_items, customers,
    enums::{Membership, PaymentStatus},
    order_items, orders, products, promotions, reviews, tags,
};

/// Flat sales tax applied to the displayed `price_with_tax`.
pub const TAX_RATE: Decimal = Decimal::from_parts(11, 0, 0, false, 1);

pub fn price_with_tax(unit_price: Decimal) -> Decimal {
    (unit_price * TAX_RATE).round_dp(2)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub featured_product_id: Option<i64>,
    pub products_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub price_with_tax: Decimal,
    pub inventory: i32,
    pub last_update: DateTime<Utc>,
    pub collection_id: i64,
    pub promotions: Vec<i64>,
}

impl Product {
    pub fn from_entity(model: products::Model, promotions: Vec<i64>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            price_with_tax: price_with_tax(model.unit_price),
            unit_price: model.unit_price,
            inventory: model.inventory,
            last_update: model.last_update.with_timezone(&Utc),
            collection_id: model.collection_id,
            promotions,
        }
    }
}

/// The product fields shown inside a cart line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProductSummary {
    pub id: i64,
    pub title: String,
    pub unit_price: Decimal,
}

impl From<products::Model> for ProductSummary {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            unit_price: model.unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Promotion {
    pub id: i64,
    pub description: String,
    pub discount: Decimal,
}

impl From<promotions::Model> for Promotion {
    fn from(model: promotions::Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            discount: model.discount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            name: model.name,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: Uuid,
    pub product_id: i64,
    pub quantity: i32,
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            cart_id: model.cart_id,
            product_id: model.product_id,
            quantity: model.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

impl From<customers::Model> for Customer {
    fn from(model: customers::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            phone: model.phone,
            birth_date: model.birth_date,
            membership: model.membership,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Order {
    pub id: i64,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub customer_id: i64,
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            placed_at: model.placed_at.with_timezone(&Utc),
            payment_status: model.payment_status,
            customer_id: model.customer_id,
        }
    }
}

/// One purchased line. `unit_price` is the price at checkout, not the product's current price.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: i64,
    pub label: String,
}

impl From<tags::Model> for Tag {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            label: model.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_is_ten_percent_rounded_to_cents() {
        assert_eq!(price_with_tax(Decimal::new(1000, 2)), Decimal::new(1100, 2));
        assert_eq!(price_with_tax(Decimal::new(999, 2)), Decimal::new(1099, 2));
        assert_eq!(price_with_tax(Decimal::new(105, 2)), Decimal::new(116, 2));
    }
}
