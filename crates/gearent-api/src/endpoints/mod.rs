//! Endpoint groups, one borrowed handle per resource.
//!
//! ```rust,ignore
//! let page = api.products().list(&ProductQuery::default()).await?;
//! api.orders().cancel(&order_id).await?;
//! ```

pub mod addresses;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;

pub use addresses::AddressesApi;
pub use auth::{AuthApi, NewAccount, Registration, Session};
pub use categories::CategoriesApi;
pub use orders::OrdersApi;
pub use payments::PaymentsApi;
pub use products::{ImageUpload, ProductQuery, ProductsApi};
pub use reviews::ReviewsApi;
