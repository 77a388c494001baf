//! Customer group identity and availability records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a customer group: home cell, customer type and period.
///
/// Customers sharing a key are interchangeable.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::GroupKey;
///
/// let key = GroupKey::new(4, 1, 0);
/// assert_eq!(key.source, 4);
/// assert_eq!(key.to_string(), "(4, 1, 0)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    /// Home cell the customers are dispatched from.
    pub source: usize,
    /// Customer type (fixes the task-completion rate).
    pub customer_type: usize,
    /// Period of availability.
    pub period: usize,
}

impl GroupKey {
    /// Creates a group key.
    pub fn new(source: usize, customer_type: usize, period: usize) -> Self {
        Self {
            source,
            customer_type,
            period,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.source, self.customer_type, self.period)
    }
}

/// An availability record: `count` interchangeable customers of one group.
///
/// Records with the same key are merged when an instance is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerGroup {
    /// Group identity.
    pub key: GroupKey,
    /// Number of customers available.
    pub count: u32,
}

impl CustomerGroup {
    /// Creates an availability record.
    pub fn new(source: usize, customer_type: usize, period: usize, count: u32) -> Self {
        Self {
            key: GroupKey::new(source, customer_type, period),
            count,
        }
    }
}
