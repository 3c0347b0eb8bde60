//! Per-asset action decision.
//!
//! Which button an asset gets is decided by an ordered rule table. The first
//! rule whose predicate holds wins, and the last rule always holds, so every
//! asset ends up with exactly one action:
//!
//! | # | action     | when                                             |
//! |---|------------|--------------------------------------------------|
//! | 1 | `free`     | main asset and the free download is unclaimed    |
//! | 2 | `download` | asset is the claimed free asset, or was purchased |
//! | 3 | `buy`      | always                                           |

use serde::Serialize;

/// Action offered for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Free,
    Download,
    Buy,
}

impl ActionKind {
    /// Button label shown by the storefront.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Free => "Get Free Download",
            ActionKind::Download => "Download",
            ActionKind::Buy => "Buy",
        }
    }
}

/// Everything the rules need to know about one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetFacts {
    /// The asset is the photo the gallery was opened for
    pub is_main: bool,

    /// The photo set's free download has been claimed
    pub free_redeemed: bool,

    /// This exact asset was the one claimed for free
    pub is_free_asset: bool,

    /// This asset is in the photo set's purchased set
    pub is_purchased: bool,
}

/// One row of the decision table.
#[derive(Clone, Copy)]
pub struct ActionRule {
    pub action: ActionKind,
    pub applies: fn(&AssetFacts) -> bool,
}

fn unclaimed_main(facts: &AssetFacts) -> bool {
    facts.is_main && !facts.free_redeemed
}

fn owned(facts: &AssetFacts) -> bool {
    facts.is_free_asset || facts.is_purchased
}

fn always(_: &AssetFacts) -> bool {
    true
}

/// Rules in evaluation order.
pub const ACTION_RULES: [ActionRule; 3] = [
    ActionRule {
        action: ActionKind::Free,
        applies: unclaimed_main,
    },
    ActionRule {
        action: ActionKind::Download,
        applies: owned,
    },
    ActionRule {
        action: ActionKind::Buy,
        applies: always,
    },
];

/// Pick the action for an asset.
pub fn decide_action(facts: &AssetFacts) -> ActionKind {
    ACTION_RULES
        .iter()
        .find(|rule| (rule.applies)(facts))
        .map(|rule| rule.action)
        .unwrap_or(ActionKind::Buy)
}

/// Action as serialized in the gallery payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub label: &'static str,
    pub url: Option<String>,
}

impl Action {
    pub fn new(kind: ActionKind, url: Option<String>) -> Self {
        Self {
            kind,
            label: kind.label(),
            url,
        }
    }
}
