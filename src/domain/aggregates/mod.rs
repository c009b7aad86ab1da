//! Aggregates module
pub mod user;
pub mod product;
pub mod order;
pub mod cart;

pub use user::{Gender, NewUser, User, UserError};
pub use product::{Product, ProductError, ProductUpdate};
pub use order::{Order, OrderError, OrderItem, OrderStatus, PaymentOutcome, PaymentStatus};
pub use cart::{Cart, CartError, CartItem};
