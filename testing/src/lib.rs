//! # Mood Todos Testing
//!
//! Testing utilities and helpers for the Mood Todos workspace.
//!
//! This crate provides:
//! - Deterministic [`Clock`] implementations
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - [`InMemoryTodoStore`], a `TodoStore` with the same list semantics as Postgres
//! - Seeding helpers for list and pagination scenarios
//!
//! ## Example
//!
//! ```
//! use mood_todos_core::todo::ListQuery;
//! use mood_todos_core::todo_store::TodoStore;
//! use mood_todos_testing::{InMemoryTodoStore, seed_sequential};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryTodoStore::new();
//! seed_sequential(&store, 15).await?;
//!
//! let page = store.list(ListQuery::new()).await?;
//! assert_eq!(page.len(), 10);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use mood_todos_core::environment::Clock;

mod in_memory;

pub use in_memory::{InMemoryTodoStore, seed_sequential};
pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use mood_todos_testing::mocks::FixedClock;
    /// use mood_todos_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Used where a test needs two distinct timestamps, e.g. to show that a
    /// repeated completion keeps the first one.
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        ///
        /// # Panics
        ///
        /// Panics if the internal lock is poisoned.
        #[allow(clippy::unwrap_used)] // Test utility
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.lock().unwrap();
            *time += by;
        }
    }

    impl Clock for ManualClock {
        #[allow(clippy::unwrap_used)] // Test utility
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap()
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now_epoch_seconds(), 1_735_689_600);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(test_clock().now());
        let before = clock.now_epoch_seconds();
        clock.advance(chrono::Duration::seconds(90));
        assert_eq!(clock.now_epoch_seconds(), before + 90);
    }
}
