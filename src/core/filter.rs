//! Client-side filtering for the list and grid views.
//!
//! Matching is a case-insensitive name substring plus a level bucket.  The
//! tree canvas ignores both: it always shows what the expansion set says.

use super::tree::{ReferralTree, TreeNode};

/// Level dropdown: `all | 1 | 2 | 3 | 4+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelFilter {
    #[default]
    All,
    Level(usize),
    FourPlus,
}

impl LevelFilter {
    pub const ALL: &[LevelFilter] = &[
        LevelFilter::All,
        LevelFilter::Level(1),
        LevelFilter::Level(2),
        LevelFilter::Level(3),
        LevelFilter::FourPlus,
    ];

    pub fn label(self) -> String {
        match self {
            LevelFilter::All => "all".into(),
            LevelFilter::Level(n) => n.to_string(),
            LevelFilter::FourPlus => "4+".into(),
        }
    }

    pub fn matches(self, level: usize) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Level(n) => level == n,
            LevelFilter::FourPlus => level >= 4,
        }
    }

    /// Next entry in dropdown order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Referrals (root excluded) matching `query` and `level`, in tree order.
pub fn filter_referrals<'a>(tree: &'a ReferralTree, query: &str, level: LevelFilter) -> Vec<(&'a TreeNode, usize)> {
    let needle = query.trim().to_lowercase();
    tree.walk()
        .into_iter()
        .filter(|(_, l)| *l > 0 && level.matches(*l))
        .filter(|(n, _)| needle.is_empty() || n.name.to_lowercase().contains(&needle))
        .collect()
}
