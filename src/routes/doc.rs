use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddToCartRequest, CartDetail, CartLine, CartLineList, UpdateCartItemRequest},
        catalog::{
            ClearInventoryRequest, ClearInventoryResult, CollectionList, CreateCollectionRequest,
            CreateProductRequest, CreatePromotionRequest, CreateReviewRequest,
            InventoryAdjustRequest, ProductList, PromotionList, ReviewList,
            UpdateCollectionRequest, UpdateProductRequest,
        },
        customers::{CustomerList, CustomerWithOrders, UpdateCustomerRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderRequest},
        tags::{CreateTagRequest, LikeSummary, TagList, TagTarget},
    },
    entity::enums::{EntityKind, Membership, PaymentStatus},
    models::{
        CartItem, Collection, Customer, Order, OrderItem, Product, ProductSummary, Promotion,
        Review, Tag,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, carts, collections, customers, health, orders, params, products, promotions, tags,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        collections::list_collections,
        collections::get_collection,
        collections::create_collection,
        collections::update_collection,
        collections::delete_collection,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::attach_promotion,
        products::detach_promotion,
        products::list_reviews,
        products::create_review,
        products::get_review,
        products::delete_review,
        promotions::list_promotions,
        promotions::create_promotion,
        carts::create_cart,
        carts::get_cart,
        carts::delete_cart,
        carts::list_items,
        carts::add_item,
        carts::update_item,
        carts::remove_item,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        customers::me,
        customers::update_me,
        customers::list_customers,
        tags::list_tags,
        tags::create_tag,
        tags::delete_tag,
        tags::attach_tag,
        tags::detach_tag,
        tags::tags_for,
        tags::like_summary,
        tags::like,
        tags::unlike,
        admin::list_low_stock,
        admin::clear_inventory,
        admin::adjust_inventory
    ),
    components(
        schemas(
            Collection,
            Product,
            ProductSummary,
            Promotion,
            Review,
            CartItem,
            Customer,
            Order,
            OrderItem,
            Tag,
            PaymentStatus,
            Membership,
            EntityKind,
            CreateCollectionRequest,
            UpdateCollectionRequest,
            CollectionList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreatePromotionRequest,
            PromotionList,
            CreateReviewRequest,
            ReviewList,
            InventoryAdjustRequest,
            ClearInventoryRequest,
            ClearInventoryResult,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLine,
            CartLineList,
            CartDetail,
            CheckoutRequest,
            UpdateOrderRequest,
            OrderWithItems,
            OrderList,
            UpdateCustomerRequest,
            CustomerWithOrders,
            CustomerList,
            CreateTagRequest,
            TagTarget,
            TagList,
            LikeSummary,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartDetail>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Collections", description = "Collection endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Promotions", description = "Promotion endpoints"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Carts", description = "Anonymous cart endpoints"),
        (name = "Orders", description = "Checkout and order endpoints"),
        (name = "Customers", description = "Customer profile endpoints"),
        (name = "Tags", description = "Generic tagging endpoints"),
        (name = "Likes", description = "Generic like endpoints"),
        (name = "Admin", description = "Inventory management endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
