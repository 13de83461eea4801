pub mod marketplace;

use crate::bridge::Bridge;
use crate::compat::{self, CallbackPromise, ErrorCallback};
use crate::error::{BridgeError, Result};
use framebridge_core::FrameContext;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use marketplace::MonetizationMarketplace;

pub const CAPABILITY: &str = "monetization";
const CONTEXTS: &[FrameContext] = &[FrameContext::Content];

/// A subscription plan offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInfo {
    pub plan_id: String,
    pub term: String,
}

/// How `open_purchase_experience` was called.
///
/// `Plan` is the future-only form. `Callback` is the legacy form whose
/// callback receives the failure, or `None` once the dialog completed.
pub enum PurchaseExperienceInput {
    Plan(Option<PlanInfo>),
    Callback {
        callback: ErrorCallback,
        plan_info: Option<PlanInfo>,
    },
}

impl PurchaseExperienceInput {
    pub fn with_callback<F>(callback: F, plan_info: Option<PlanInfo>) -> Self
    where
        F: FnOnce(Option<BridgeError>) + Send + 'static,
    {
        PurchaseExperienceInput::Callback {
            callback: compat::error_callback(callback),
            plan_info,
        }
    }

    fn into_parts(self) -> (Option<PlanInfo>, Option<ErrorCallback>) {
        match self {
            PurchaseExperienceInput::Plan(plan_info) => (plan_info, None),
            PurchaseExperienceInput::Callback {
                callback,
                plan_info,
            } => (plan_info, Some(callback)),
        }
    }
}

impl Default for PurchaseExperienceInput {
    fn default() -> Self {
        PurchaseExperienceInput::Plan(None)
    }
}

impl From<PlanInfo> for PurchaseExperienceInput {
    fn from(plan_info: PlanInfo) -> Self {
        PurchaseExperienceInput::Plan(Some(plan_info))
    }
}

impl From<Option<PlanInfo>> for PurchaseExperienceInput {
    fn from(plan_info: Option<PlanInfo>) -> Self {
        PurchaseExperienceInput::Plan(plan_info)
    }
}

impl fmt::Debug for PurchaseExperienceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseExperienceInput::Plan(plan_info) => {
                f.debug_tuple("Plan").field(plan_info).finish()
            }
            PurchaseExperienceInput::Callback { plan_info, .. } => f
                .debug_struct("Callback")
                .field("callback", &"<callback>")
                .field("plan_info", plan_info)
                .finish(),
        }
    }
}

/// Purchase flows hosted by the host.
#[derive(Debug, Clone)]
pub struct Monetization {
    bridge: Bridge,
}

impl Monetization {
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Open the host's purchase dialog.
    ///
    /// The operation starts immediately. A legacy callback fires when it
    /// settles whether or not the returned promise is awaited.
    pub fn open_purchase_experience(
        &self,
        input: impl Into<PurchaseExperienceInput>,
    ) -> CallbackPromise<()> {
        let (plan_info, callback) = input.into().into_parts();
        let bridge = self.bridge.clone();

        let op = async move {
            let args = vec![serde_json::to_value(plan_info)?];
            bridge
                .call_unit(
                    CAPABILITY,
                    CONTEXTS,
                    "monetization.openPurchaseExperience",
                    args,
                )
                .await
        };
        compat::spawn_with_error_callback(op, callback)
    }

    pub fn is_supported(&self) -> Result<bool> {
        self.bridge.ensure_initialized(&[])?;
        Ok(self.bridge.is_supported(CAPABILITY))
    }

    pub fn marketplace(&self) -> MonetizationMarketplace {
        MonetizationMarketplace::new(self.bridge.clone())
    }
}
