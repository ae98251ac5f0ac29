//! The role-gated tab workflow for a startup record.
//!
//! Which tabs a caller sees for a startup is a pure function of the
//! startup's status and the caller's roles. The rules live in one ordered,
//! declarative table ([`TAB_TABLE`]) so the whole surface can be enumerated
//! and tested; handlers never hand-roll visibility checks.

use serde::{Deserialize, Serialize};

use crate::db::{StartupStatus, User, UserRole};

/// Caller roles relative to one startup record.
///
/// `is_founder` is ownership (session user is the startup's founder), the
/// rest are platform roles. An absent session resolves to all-false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleSet {
    pub is_founder: bool,
    pub is_admin: bool,
    pub is_reviewer: bool,
    pub is_sponsor: bool,
}

impl RoleSet {
    pub const NONE: RoleSet = RoleSet {
        is_founder: false,
        is_admin: false,
        is_reviewer: false,
        is_sponsor: false,
    };

    pub fn resolve(user: Option<&User>, founder_id: &str) -> Self {
        match user {
            None => Self::NONE,
            Some(user) => {
                let role = user.role_enum();
                Self {
                    is_founder: user.id == founder_id,
                    is_admin: role == UserRole::Admin,
                    is_reviewer: role == UserRole::Reviewer,
                    is_sponsor: role == UserRole::Sponsor,
                }
            }
        }
    }

    /// Founder or admin: the pair that may manage a startup's own content
    pub fn can_manage(&self) -> bool {
        self.is_founder || self.is_admin
    }
}

/// One content panel on the startup detail surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Overview,
    Reviews,
    Milestones,
    Tasks,
    Financials,
    Team,
    Documents,
    Discussion,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Reviews => "reviews",
            Tab::Milestones => "milestones",
            Tab::Tasks => "tasks",
            Tab::Financials => "financials",
            Tab::Team => "team",
            Tab::Documents => "documents",
            Tab::Discussion => "discussion",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overview" => Ok(Tab::Overview),
            "reviews" => Ok(Tab::Reviews),
            "milestones" => Ok(Tab::Milestones),
            "tasks" => Ok(Tab::Tasks),
            "financials" => Ok(Tab::Financials),
            "team" => Ok(Tab::Team),
            "documents" => Ok(Tab::Documents),
            "discussion" => Ok(Tab::Discussion),
            _ => Err(format!("Unknown tab: {}", s)),
        }
    }
}

/// One row of the visibility table
pub struct TabSpec {
    pub tab: Tab,
    pub label: &'static str,
    visible: fn(StartupStatus, &RoleSet) -> bool,
}

impl TabSpec {
    pub fn is_visible(&self, status: StartupStatus, roles: &RoleSet) -> bool {
        (self.visible)(status, roles)
    }
}

/// The ordered visibility table. Order is display order; the first visible
/// row is the default tab. Overview is unconditionally visible, so the
/// visible set is never empty.
pub const TAB_TABLE: [TabSpec; 8] = [
    TabSpec {
        tab: Tab::Overview,
        label: "Overview",
        visible: |_, _| true,
    },
    TabSpec {
        tab: Tab::Reviews,
        label: "Reviews",
        visible: |status, roles| {
            status != StartupStatus::Draft
                && (roles.is_admin || roles.is_reviewer || roles.is_founder)
        },
    },
    TabSpec {
        tab: Tab::Milestones,
        label: "Milestones",
        visible: |status, roles| {
            status.is_portfolio() && (roles.can_manage() || roles.is_sponsor)
        },
    },
    TabSpec {
        tab: Tab::Tasks,
        label: "Tasks",
        visible: |status, roles| status.is_portfolio() && roles.can_manage(),
    },
    TabSpec {
        tab: Tab::Financials,
        label: "Financials",
        visible: |status, roles| {
            status.is_portfolio() && (roles.can_manage() || roles.is_sponsor)
        },
    },
    TabSpec {
        tab: Tab::Team,
        label: "Team",
        visible: |status, roles| roles.can_manage() || status != StartupStatus::Draft,
    },
    TabSpec {
        tab: Tab::Documents,
        label: "Documents",
        visible: |status, roles| {
            roles.can_manage()
                || (roles.is_reviewer && status != StartupStatus::Draft)
                || (roles.is_sponsor && status.is_portfolio())
        },
    },
    TabSpec {
        tab: Tab::Discussion,
        label: "Discussion",
        visible: |status, _| status != StartupStatus::Draft,
    },
];

/// Filter the table to the tabs visible for this status and role set, in
/// display order. Evaluated fresh on every call; nothing is cached.
pub fn visible_tabs(status: StartupStatus, roles: &RoleSet) -> Vec<Tab> {
    TAB_TABLE
        .iter()
        .filter(|spec| spec.is_visible(status, roles))
        .map(|spec| spec.tab)
        .collect()
}

/// Resolve a requested tab against the visible set: the request wins when
/// visible, otherwise the first visible tab is selected.
pub fn resolve_tab(requested: Option<Tab>, status: StartupStatus, roles: &RoleSet) -> Tab {
    let visible = visible_tabs(status, roles);
    match requested {
        Some(tab) if visible.contains(&tab) => tab,
        // Overview is always visible, so the set is never empty
        _ => visible[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(founder: bool, admin: bool, reviewer: bool, sponsor: bool) -> RoleSet {
        RoleSet {
            is_founder: founder,
            is_admin: admin,
            is_reviewer: reviewer,
            is_sponsor: sponsor,
        }
    }

    fn all_role_sets() -> Vec<RoleSet> {
        let mut sets = Vec::new();
        for bits in 0u8..16 {
            sets.push(roles(
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
            ));
        }
        sets
    }

    /// Independent restatement of the declared rules, used to pin the
    /// table against accidental edits.
    fn expected_visible(tab: Tab, status: StartupStatus, r: &RoleSet) -> bool {
        use StartupStatus::*;
        let portfolio = matches!(status, Accepted | Completed);
        let manage = r.is_founder || r.is_admin;
        match tab {
            Tab::Overview => true,
            Tab::Reviews => status != Draft && (r.is_admin || r.is_reviewer || r.is_founder),
            Tab::Milestones => portfolio && (manage || r.is_sponsor),
            Tab::Tasks => portfolio && manage,
            Tab::Financials => portfolio && (manage || r.is_sponsor),
            Tab::Team => manage || status != Draft,
            Tab::Documents => {
                manage
                    || (r.is_reviewer && status != Draft)
                    || (r.is_sponsor && portfolio)
            }
            Tab::Discussion => status != Draft,
        }
    }

    #[test]
    fn test_table_matches_declared_rules_for_every_combination() {
        for status in StartupStatus::ALL {
            for role_set in all_role_sets() {
                let visible = visible_tabs(status, &role_set);
                for spec in TAB_TABLE.iter() {
                    let expected = expected_visible(spec.tab, status, &role_set);
                    assert_eq!(
                        visible.contains(&spec.tab),
                        expected,
                        "tab {} for status {} roles {:?}",
                        spec.tab,
                        status,
                        role_set
                    );
                }
            }
        }
    }

    #[test]
    fn test_visible_tabs_preserve_table_order() {
        let all = visible_tabs(StartupStatus::Accepted, &roles(true, false, false, false));
        let positions: Vec<usize> = all
            .iter()
            .map(|t| TAB_TABLE.iter().position(|s| s.tab == *t).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_overview_always_visible() {
        for status in StartupStatus::ALL {
            for role_set in all_role_sets() {
                assert!(visible_tabs(status, &role_set).contains(&Tab::Overview));
            }
        }
    }

    #[test]
    fn test_draft_outsider_sees_only_overview() {
        // A session that is neither the founder nor an admin, on a draft
        let outsiders = [
            RoleSet::NONE,
            roles(false, false, true, false),
            roles(false, false, false, true),
        ];
        for role_set in outsiders {
            assert_eq!(
                visible_tabs(StartupStatus::Draft, &role_set),
                vec![Tab::Overview]
            );
        }
    }

    #[test]
    fn test_draft_founder_sees_working_set() {
        let visible = visible_tabs(StartupStatus::Draft, &roles(true, false, false, false));
        assert_eq!(visible, vec![Tab::Overview, Tab::Team, Tab::Documents]);
    }

    #[test]
    fn test_financials_require_portfolio_status() {
        let sponsor = roles(false, false, false, true);
        for status in [
            StartupStatus::Draft,
            StartupStatus::Submitted,
            StartupStatus::UnderReview,
            StartupStatus::Rejected,
        ] {
            assert!(!visible_tabs(status, &sponsor).contains(&Tab::Financials));
        }
        assert!(visible_tabs(StartupStatus::Accepted, &sponsor).contains(&Tab::Financials));
        assert!(visible_tabs(StartupStatus::Completed, &sponsor).contains(&Tab::Financials));
    }

    #[test]
    fn test_reviewer_cannot_see_tasks() {
        let reviewer = roles(false, false, true, false);
        for status in StartupStatus::ALL {
            assert!(!visible_tabs(status, &reviewer).contains(&Tab::Tasks));
        }
    }

    #[test]
    fn test_resolve_requested_tab_when_visible() {
        let admin = roles(false, true, false, false);
        assert_eq!(
            resolve_tab(Some(Tab::Reviews), StartupStatus::UnderReview, &admin),
            Tab::Reviews
        );
    }

    #[test]
    fn test_resolve_falls_back_to_first_visible() {
        // Financials are not visible under review; Overview is first
        let admin = roles(false, true, false, false);
        assert_eq!(
            resolve_tab(Some(Tab::Financials), StartupStatus::UnderReview, &admin),
            Tab::Overview
        );
        // No request at all also lands on the first visible tab
        assert_eq!(
            resolve_tab(None, StartupStatus::Draft, &RoleSet::NONE),
            Tab::Overview
        );
    }

    #[test]
    fn test_role_resolution_from_session() {
        use crate::db::User;
        let user = User {
            id: "u1".into(),
            email: "f@example.com".into(),
            password_hash: String::new(),
            name: "Founder".into(),
            role: "founder".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let own = RoleSet::resolve(Some(&user), "u1");
        assert!(own.is_founder && !own.is_admin && !own.is_reviewer && !own.is_sponsor);

        let other = RoleSet::resolve(Some(&user), "u2");
        assert!(!other.is_founder);

        assert_eq!(RoleSet::resolve(None, "u1"), RoleSet::NONE);
    }

    #[test]
    fn test_admin_role_is_not_ownership() {
        use crate::db::User;
        let admin = User {
            id: "a1".into(),
            email: "a@example.com".into(),
            password_hash: String::new(),
            name: "Admin".into(),
            role: "admin".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let resolved = RoleSet::resolve(Some(&admin), "someone-else");
        assert!(resolved.is_admin && !resolved.is_founder);
        // but an admin who founded the record carries both
        let both = RoleSet::resolve(Some(&admin), "a1");
        assert!(both.is_admin && both.is_founder);
    }
}
