use common::OrderStatus;

use crate::{BranchId, UserId};

/// Filter for the pending-order queues.
///
/// Aggregates whose status equals `exclude_status` are never returned.
/// Since the terminal status deletes the row this is normally a no-op, but
/// it keeps the queue correct for rows written by other tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFilter {
    /// Restrict to one branch.
    pub branch_id: Option<BranchId>,

    /// Restrict to one purchaser.
    pub user_id: Option<UserId>,

    pub exclude_status: OrderStatus,
}

impl Default for PendingFilter {
    fn default() -> Self {
        Self {
            branch_id: None,
            user_id: None,
            exclude_status: OrderStatus::Received,
        }
    }
}

impl PendingFilter {
    /// Every non-received aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by branch.
    pub fn branch_id(mut self, branch_id: BranchId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    /// Filters by purchaser.
    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Returns true if an aggregate with these attributes passes the filter.
    pub fn matches(&self, branch_id: BranchId, user_id: UserId, status: OrderStatus) -> bool {
        status != self.exclude_status
            && self.branch_id.is_none_or(|b| b == branch_id)
            && self.user_id.is_none_or(|u| u == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_excludes_received_only() {
        let filter = PendingFilter::new();
        assert!(filter.matches(BranchId::new(1), UserId::new(1), OrderStatus::Ready));
        assert!(!filter.matches(BranchId::new(1), UserId::new(1), OrderStatus::Received));
    }

    #[test]
    fn branch_and_user_filters_combine() {
        let filter = PendingFilter::new()
            .branch_id(BranchId::new(2))
            .user_id(UserId::new(5));
        assert!(filter.matches(BranchId::new(2), UserId::new(5), OrderStatus::Pending));
        assert!(!filter.matches(BranchId::new(3), UserId::new(5), OrderStatus::Pending));
        assert!(!filter.matches(BranchId::new(2), UserId::new(6), OrderStatus::Pending));
    }
}
