//! Domain models for the payment service.

pub mod checkout;
pub mod identity;
pub mod notification;
pub mod payment;
pub mod query;
pub mod status;

pub use checkout::{
    CheckoutRequest, CheckoutSession, CustomerDetails, GatewayTransactionStatus, ItemDetail,
};
pub use identity::{
    CREATE_PAYMENT, CallerIdentity, PermissionCheck, READ_ALL_PAYMENTS, UPDATE_PAYMENT, UserId,
    UserProfile,
};
pub use notification::{GatewayNotification, NotificationId, PaymentNotification};
pub use payment::{
    DEFAULT_CURRENCY, OrderId, PAYMENT_EXPIRY_HOURS, Payment, PaymentId, from_minor_units,
    to_minor_units,
};
pub use query::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PaymentFilters, PaymentPage, PaymentQuery, PaymentStats,
};
pub use status::{PaymentMethod, PaymentStatus};
