//! Bank payment gateway integration
pub mod callback;
pub mod gateway;

pub use callback::{CallbackOutcome, PaymentCallbackHandler, ORDER_ID_ALIASES};
pub use gateway::{CallbackFields, GatewayVerifier, ResponseCodeVerifier, Verification};
