//! Merging contributor lists into a running aggregate

use crate::model::User;
use crate::Result;
use serde::Serialize;
use std::collections::HashMap;

/// Contributors summed by login
///
/// Always ordered by contributions descending, then by login, so two
/// aggregates holding the same totals compare equal no matter in which order
/// their inputs arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Aggregate {
    users: Vec<User>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an aggregate from an arbitrary list, summing duplicate logins
    pub fn from_users(users: &[User]) -> Self {
        merge(&Self::new(), users)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Total contributions of one login
    pub fn contributions(&self, login: &str) -> Option<u64> {
        self.users
            .iter()
            .find(|u| u.login == login)
            .map(|u| u.contributions)
    }

    /// Login -> contributions view
    pub fn totals(&self) -> HashMap<String, u64> {
        self.users
            .iter()
            .map(|u| (u.login.clone(), u.contributions))
            .collect()
    }

    /// Sum of all contributions
    pub fn total_contributions(&self) -> u64 {
        self.users.iter().map(|u| u.contributions).sum()
    }

    /// Pretty-printed JSON array of `{login, contributions}` in aggregate order
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Combine `current` with one newly arrived contributor list
///
/// Pure: `current` is left untouched and a new aggregate is returned. Counts
/// for logins already present are added, new logins are inserted.
pub fn merge(current: &Aggregate, incoming: &[User]) -> Aggregate {
    let mut totals: HashMap<&str, u64> = HashMap::with_capacity(current.len() + incoming.len());
    for user in current.users.iter().chain(incoming) {
        *totals.entry(user.login.as_str()).or_insert(0) += user.contributions;
    }

    let mut users: Vec<User> = totals
        .into_iter()
        .map(|(login, contributions)| User::new(login, contributions))
        .collect();
    users.sort_by(|a, b| {
        b.contributions
            .cmp(&a.contributions)
            .then_with(|| a.login.cmp(&b.login))
    });

    Aggregate { users }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(batches: &[Vec<User>]) -> Aggregate {
        batches
            .iter()
            .fold(Aggregate::new(), |acc, batch| merge(&acc, batch))
    }

    #[test]
    fn test_merge_sums_same_login() {
        let a = Aggregate::from_users(&[User::new("x", 3)]);
        let merged = merge(&a, &[User::new("x", 2), User::new("y", 1)]);

        assert_eq!(merged.contributions("x"), Some(5));
        assert_eq!(merged.contributions("y"), Some(1));
        assert_eq!(merged.len(), 2);
        // Input left untouched
        assert_eq!(a.contributions("x"), Some(3));
    }

    #[test]
    fn test_merge_sums_duplicates_within_one_batch() {
        let merged = merge(&Aggregate::new(), &[User::new("x", 1), User::new("x", 4)]);
        assert_eq!(merged.users(), &[User::new("x", 5)]);
    }

    #[test]
    fn test_merge_orders_by_contributions_then_login() {
        let merged = merge(
            &Aggregate::new(),
            &[User::new("b", 2), User::new("c", 9), User::new("a", 2)],
        );
        let logins: Vec<&str> = merged.users().iter().map(|u| u.login.as_str()).collect();
        assert_eq!(logins, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let batches = vec![
            vec![User::new("user-1", 10), User::new("user-2", 20)],
            vec![User::new("user-2", 30), User::new("user-1", 40)],
            vec![User::new("user-2", 50), User::new("user-3", 60)],
        ];
        let expected = fold(&batches);

        let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in permutations {
            let reordered: Vec<Vec<User>> = order.iter().map(|&i| batches[i].clone()).collect();
            assert_eq!(fold(&reordered), expected, "order {:?}", order);
        }

        assert_eq!(expected.contributions("user-2"), Some(100));
        assert_eq!(expected.total_contributions(), 210);
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert!(merge(&Aggregate::new(), &[]).is_empty());

        let a = Aggregate::from_users(&[User::new("x", 0)]);
        assert_eq!(merge(&a, &[]), a);
    }

    #[test]
    fn test_to_json_keeps_aggregate_order() {
        let a = Aggregate::from_users(&[User::new("y", 1), User::new("x", 5)]);
        let json = a.to_json().unwrap();

        let parsed: Vec<User> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![User::new("x", 5), User::new("y", 1)]);
        assert!(json.contains("\"login\": \"x\""));
    }
}
