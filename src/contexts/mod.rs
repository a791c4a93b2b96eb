//! Cached data contexts: the signed-in student's profile and the shared
//! tag vocabularies. Each read yields a `QueryResult` snapshot.

pub mod query;
pub mod student;
pub mod tags;

use std::time::Duration;

use crate::config::AppConfig;

pub use query::{query_key, QueryCache, QueryKey, QueryResult, QueryStatus};
pub use student::AuthenticatedStudentContext;
pub use tags::{TagsContext, TagsSnapshot};

pub struct Contexts {
    pub student: AuthenticatedStudentContext,
    pub tags: TagsContext,
}

impl Contexts {
    /// Contexts sized from configuration: cached profiles live no longer
    /// than a session and are capped at `api.profile_cache_capacity`.
    pub fn from_config(config: &AppConfig) -> Self {
        let session_ttl = Duration::from_secs(config.security.session_expiry_hours * 3600);
        Self {
            student: AuthenticatedStudentContext::bounded(session_ttl, config.api.profile_cache_capacity),
            tags: TagsContext::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, Fixture};

    #[tokio::test]
    async fn profile_cache_honours_configured_capacity() {
        let fx = Fixture::new().await;
        fx.register("ana", &[]).await;
        fx.register("bia", &[]).await;

        let mut config = test_config();
        config.api.profile_cache_capacity = 1;
        let contexts = Contexts::from_config(&config);
        contexts.student.student(fx.store(), Some("ana")).await;
        contexts.student.student(fx.store(), Some("bia")).await;
        assert_eq!(contexts.student.cached_profiles().await, 1);
    }
}
