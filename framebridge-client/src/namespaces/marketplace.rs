use crate::bridge::Bridge;
use crate::error::Result;
use framebridge_core::FrameContext;
use serde::{Deserialize, Serialize};
use serde_json::to_value;

pub const CAPABILITY: &str = "marketplace";
const CONTEXTS: &[FrameContext] = &[FrameContext::Content];

/// The cart owned by the host for the app checkout flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub version: CartVersion,
    pub id: String,
    pub cart_info: CartInfo,
    pub cart_items: Vec<CartItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartVersion {
    pub major_version: u32,
    pub minor_version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartInfo {
    /// Country market the products are sold in.
    pub market: String,
    pub intent: Intent,
    pub locale: String,
    pub status: CartStatus,
    /// Currency of every price in the cart.
    pub currency: String,
    /// ISO 8601 timestamp.
    pub created_at: String,
    /// ISO 8601 timestamp.
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    /// Price of a single unit.
    pub price: f64,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A cart line, optionally carrying accessories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub item: Item,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<Vec<Item>>,
}

/// Who created the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    AdminUser,
    EndUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartStatus {
    Open,
    Processing,
    /// Checkout finished; the host answers the next `get_cart` with a new cart.
    Processed,
    /// Checkout failed; the host answers the next `get_cart` with a new cart.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartStatusParams {
    pub cart_status: CartStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_info: Option<String>,
}

/// Checkout flow against the cart owned by the host.
#[derive(Debug, Clone)]
pub struct Marketplace {
    bridge: Bridge,
}

impl Marketplace {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    pub async fn get_cart(&self) -> Result<Cart> {
        self.bridge
            .call(CAPABILITY, CONTEXTS, "marketplace.getCart", vec![])
            .await
    }

    /// Items whose id is already in the cart are overwritten; the rest are added.
    pub async fn add_or_update_cart_items(&self, cart_items: Vec<CartItem>) -> Result<()> {
        self.bridge
            .call_unit(
                CAPABILITY,
                CONTEXTS,
                "marketplace.addOrUpdateCartItems",
                vec![to_value(cart_items)?],
            )
            .await
    }

    pub async fn remove_cart_items(&self, cart_item_ids: Vec<String>) -> Result<()> {
        self.bridge
            .call_unit(
                CAPABILITY,
                CONTEXTS,
                "marketplace.removeCartItems",
                vec![to_value(cart_item_ids)?],
            )
            .await
    }

    pub async fn update_cart_status(&self, params: UpdateCartStatusParams) -> Result<()> {
        self.bridge
            .call_unit(
                CAPABILITY,
                CONTEXTS,
                "marketplace.updateCartStatus",
                vec![to_value(params)?],
            )
            .await
    }

    /// Whether the host offers the marketplace capability. Fails before initialization.
    pub fn is_supported(&self) -> Result<bool> {
        self.bridge.ensure_initialized(&[])?;
        Ok(self.bridge.is_supported(CAPABILITY))
    }
}
