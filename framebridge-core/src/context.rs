use serde::{Deserialize, Serialize};
use std::fmt;

/// The surface of the host the embedded app is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameContext {
    Settings,
    Content,
    Authentication,
    Remove,
    Task,
    SidePanel,
    Stage,
    MeetingStage,
}

impl FrameContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameContext::Settings => "settings",
            FrameContext::Content => "content",
            FrameContext::Authentication => "authentication",
            FrameContext::Remove => "remove",
            FrameContext::Task => "task",
            FrameContext::SidePanel => "sidePanel",
            FrameContext::Stage => "stage",
            FrameContext::MeetingStage => "meetingStage",
        }
    }

    /// Whether this context is one of `accepted`. An empty list accepts every context.
    pub fn is_one_of(&self, accepted: &[FrameContext]) -> bool {
        accepted.is_empty() || accepted.contains(self)
    }
}

impl fmt::Display for FrameContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
