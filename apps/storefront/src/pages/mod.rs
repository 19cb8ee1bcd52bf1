//! # Page Loaders
//!
//! Each loader gathers what one storefront or admin page shows and returns
//! it as a serializable view model. Catalog pages go through the route
//! cache; cart pages read the booking store directly.
//!
//! ```text
//! pages/
//! ├── catalog.rs   home, product list, product detail
//! ├── cart.rs      add to cart, cart page
//! ├── checkout.rs  order + payment from the cart
//! ├── account.rs   login, logout, register, my orders, cancel
//! └── admin.rs     dashboard, orders, products, categories
//! ```

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod checkout;

pub use account::{cancel_order, login, logout, my_orders, register, OrdersView};
pub use admin::{
    admin_categories, admin_dashboard, admin_orders, admin_products, AdminCategoriesView,
    AdminOrdersView, AdminProductsView, DashboardView,
};
pub use cart::{add_to_cart, add_to_cart_by_id, cart_page, clear_cart, remove_from_cart, CartView};
pub use catalog::{home, product_detail, product_list, HomeView, ProductDetailView, ProductListView};
pub use checkout::{checkout, CheckoutReceipt, CheckoutRequest};
