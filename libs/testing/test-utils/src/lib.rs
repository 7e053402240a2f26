//! Shared test infrastructure for the notifier crates.
//!
//! - `TestDatabase`: throwaway PostgreSQL container with the notifier schema applied
//!   (feature: "postgres", on by default)
//! - [`TestDataBuilder`]: deterministic tenant/user ids and names derived from the test name
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! # async fn example() {
//! let db = TestDatabase::new().await;
//! let data = TestDataBuilder::from_test_name("dispatch_writes_rows");
//! db.seed_user(data.tenant_id(), data.user_id(1), "Ada", "admin", None).await;
//! # }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Seeded generator so every test gets its own tenant and user id space.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Positive id in `1..=1_000_000_000`, stable per seed.
    pub fn tenant_id(&self) -> i64 {
        (self.seed % 1_000_000_000) as i64 + 1
    }

    /// Users of one builder never collide with another builder's tenant.
    pub fn user_id(&self, n: u32) -> i64 {
        self.tenant_id() * 1_000 + i64::from(n)
    }

    pub fn email(&self, local: &str) -> String {
        format!("{local}+{}@example.test", self.seed)
    }

    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{prefix}-{}-{suffix}", self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_data() {
        let a = TestDataBuilder::from_test_name("t");
        let b = TestDataBuilder::from_test_name("t");
        assert_eq!(a.tenant_id(), b.tenant_id());
        assert_eq!(a.user_id(3), b.user_id(3));
        assert_eq!(a.email("ops"), b.email("ops"));
    }

    #[test]
    fn different_names_different_tenants() {
        let a = TestDataBuilder::from_test_name("first");
        let b = TestDataBuilder::from_test_name("second");
        assert_ne!(a.tenant_id(), b.tenant_id());
    }

    #[test]
    fn ids_are_positive() {
        let data = TestDataBuilder::new(u64::MAX);
        assert!(data.tenant_id() > 0);
        assert!(data.user_id(0) > data.tenant_id());
    }
}
