//! Database models
//!
//! Document types persisted in SurrealDB. Record links use [`RecordId`]
//! serialized as "table:id" strings (see [`serde_helpers`]).

pub mod serde_helpers;

pub mod category;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use category::{Category, CategoryCreate, CategoryId, CategoryUpdate};
pub use order::{Order, OrderId, OrderItem, PaymentMethod, ShippingAddress, VariantSnapshot};
pub use payment::{
    Payment, PaymentCreate, PaymentId, PaymentRecordStatus, PaymentStatusUpdate, PaymentType,
};
pub use product::{Product, ProductCreate, ProductId, ProductUpdate, Variant, VariantInput};
pub use user::{AuthProvider, SocialUserCreate, User, UserCreate, UserId, UserRole, UserUpdate};
