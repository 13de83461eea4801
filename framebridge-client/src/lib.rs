//! Embedded-app side of the host frame bridge.
//!
//! A [`Bridge`] owns one session with the host: it correlates requests with
//! responses, runs the `initialize` handshake, keeps the host's capability
//! snapshot and routes host-pushed events. Capability namespaces are thin
//! typed call-sites on top of it.
//!
//! ```no_run
//! use framebridge_client::{Bridge, BridgeConfig};
//!
//! # async fn run() -> framebridge_client::Result<()> {
//! let (parts, _host) = framebridge_transport::pair("https://app.example", "https://host.example");
//! let bridge = Bridge::connect(BridgeConfig::new("https://host.example"), parts);
//! bridge.initialize().await?;
//! let cart = bridge.marketplace().get_cart().await?;
//! println!("{} items", cart.cart_items.len());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod bridge;
pub mod compat;
pub mod config;
pub mod correlation;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod logging;
pub mod namespaces;

pub use adapter::{Disposition, InboundRouter, OriginPolicy};
pub use bridge::{Bridge, HANDSHAKE_FUNCTION};
pub use compat::{
    callback, error_callback, with_callback, with_error_callback, Callback, CallbackPromise,
    ErrorCallback,
};
pub use config::BridgeConfig;
pub use correlation::{Correlator, PendingRequests};
pub use error::{BridgeError, Result};
pub use events::EventHandler;
pub use lifecycle::InitializationState;
pub use logging::{init_logging, init_test_logging};
pub use namespaces::marketplace::{self, Cart, CartItem, Marketplace};
pub use namespaces::monetization::marketplace::{
    Cart as MonetizationCart, CartItem as MonetizationCartItem, MonetizationMarketplace,
};
pub use namespaces::monetization::{self, Monetization, PlanInfo, PurchaseExperienceInput};

pub use framebridge_core::{ErrorCode, FrameContext, RequestId, Runtime, RuntimeCapabilities, SdkError};
pub use framebridge_transport as transport;
