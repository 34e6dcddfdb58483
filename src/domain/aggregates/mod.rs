//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Product, ProductError, ProductStatus, ProductType, Variation};
pub use order::{Order, OrderError, OrderStatus, PaymentStatus};
pub use cart::{Cart, CartError, CartItem};
