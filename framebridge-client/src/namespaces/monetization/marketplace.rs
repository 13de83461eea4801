// monetization.marketplace
// Older, simpler cart contract; unrelated to the versioned cart of the marketplace namespace

use crate::bridge::Bridge;
use crate::compat::{self, Callback, CallbackPromise};
use crate::error::Result;
use framebridge_core::FrameContext;
use serde::{Deserialize, Serialize};

pub const CAPABILITY: &str = "monetization.marketplace";
const CONTEXTS: &[FrameContext] = &[FrameContext::Content];

/// Intent values hosts are known to send. The field stays a free-form string.
pub const INTENT_ADMIN: &str = "admin";
pub const INTENT_END_USER: &str = "endUser";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CartStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub instance_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub status: CartStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_items: Option<Vec<CartItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub item_id: u64,
    pub quantity: u32,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MonetizationMarketplace {
    bridge: Bridge,
}

impl MonetizationMarketplace {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    pub async fn get_cart(&self) -> Result<Cart> {
        self.bridge
            .call(CAPABILITY, CONTEXTS, "monetization.marketplace.getCart", vec![])
            .await
    }

    /// Replace the host's cart. Resolves to whether the host accepted it.
    ///
    /// Runs eagerly; `callback`, if given, receives the same outcome as the
    /// returned promise.
    pub fn set_cart(&self, cart: Cart, callback: Option<Callback<bool>>) -> CallbackPromise<bool> {
        let bridge = self.bridge.clone();
        let op = async move {
            let args = vec![serde_json::to_value(&cart)?];
            bridge
                .call(CAPABILITY, CONTEXTS, "monetization.marketplace.setCart", args)
                .await
        };
        compat::spawn(op, callback)
    }

    pub fn is_supported(&self) -> Result<bool> {
        self.bridge.ensure_initialized(&[])?;
        Ok(self.bridge.is_supported(CAPABILITY))
    }
}
