//! Summary statistics for the network under the viewing user.

use serde::Deserialize;

use super::tree::ReferralTree;

/// The best-performing referral.  The backend sends either a bare name or an
/// object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TopReferrer {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        earnings: Option<f64>,
    },
}

impl TopReferrer {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryStats {
    pub total_referrals: u64,
    pub active_referrals: u64,
    pub total_earnings: f64,
    pub deepest_level: u64,
    pub average_per_level: f64,
    pub top_referrer: Option<TopReferrer>,
}

impl SummaryStats {
    /// Derive the stats from the tree itself (file sources, or when the stats
    /// endpoint is unavailable).  The root is the viewing user and is not
    /// counted as a referral.
    pub fn from_tree(tree: &ReferralTree) -> Self {
        let referrals: Vec<_> = tree.walk().into_iter().filter(|(_, level)| *level > 0).collect();
        let deepest = tree.deepest_level() as u64;
        let total = referrals.len() as u64;

        let top = referrals
            .iter()
            .map(|(n, _)| *n)
            .filter(|n| n.earnings > 0.0)
            .max_by(|a, b| a.earnings.total_cmp(&b.earnings))
            .map(|n| TopReferrer::Detailed {
                name: n.name.clone(),
                earnings: Some(n.earnings),
            });

        Self {
            total_referrals: total,
            active_referrals: referrals.iter().filter(|(n, _)| n.is_active).count() as u64,
            total_earnings: referrals.iter().map(|(n, _)| n.earnings).sum(),
            deepest_level: deepest,
            average_per_level: if deepest == 0 { 0.0 } else { total as f64 / deepest as f64 },
            top_referrer: top,
        }
    }
}
