use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub const CAP_APPROVE_PLUGIN: &str = "local/plugins:approveplugin";
pub const CAP_VIEW_REPORTS: &str = "local/plugins:viewreports";
pub const CAP_EDIT_OWN_PLUGINS: &str = "local/plugins:editownplugins";

/// Value of `plugins.approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Approved,
    NeedsWork,
    Pending,
}

impl ApprovalStatus {
    pub fn code(self) -> i64 {
        match self {
            ApprovalStatus::Approved => 1,
            ApprovalStatus::NeedsWork => 0,
            ApprovalStatus::Pending => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ApprovalStatus::Approved),
            0 => Some(ApprovalStatus::NeedsWork),
            -1 => Some(ApprovalStatus::Pending),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::NeedsWork => "Needs more work",
            ApprovalStatus::Pending => "Waiting for approval",
        }
    }
}

/// Value of `contributors.maintainer`.
pub fn maintainer_role_label(code: i64) -> &'static str {
    match code {
        1 => "Lead maintainer",
        2 => "Maintainer",
        _ => "Contributor",
    }
}

/// Anything that can answer "does the current actor hold this capability".
pub trait CapabilityCheck {
    fn has_capability(&self, capability: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub fullname: String,
    pub siteadmin: bool,
    pub capabilities: HashSet<String>,
}

impl CapabilityCheck for Actor {
    fn has_capability(&self, capability: &str) -> bool {
        self.siteadmin || self.capabilities.contains(capability)
    }
}

/// One entry of the partner-ads feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerAd {
    pub partnerid: String,
    pub name: String,
    #[serde(default)]
    pub imageurl: Option<String>,
    pub url: String,
    #[serde(default)]
    pub country: Option<String>,
}
