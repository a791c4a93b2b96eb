use std::time::Duration;

use super::query::{query_key, QueryCache, QueryKey, QueryResult};
use crate::database::Store;
use crate::services::students::get_student_profile;
use crate::services::views::Profile;

/// The signed-in student's own profile, cached per username.
#[derive(Default)]
pub struct AuthenticatedStudentContext {
    cache: QueryCache<Profile>,
}

impl AuthenticatedStudentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiles expire with the session that loaded them and at most
    /// `capacity` are held at once.
    pub fn bounded(session_ttl: Duration, capacity: usize) -> Self {
        Self { cache: QueryCache::bounded(session_ttl, capacity) }
    }

    pub async fn cached_profiles(&self) -> usize {
        self.cache.size().await
    }

    pub fn key(username: &str) -> QueryKey {
        query_key(&["students", "me", username])
    }

    /// Idle without a session username; otherwise the cached profile.
    pub async fn student(&self, store: &dyn Store, username: Option<&str>) -> QueryResult<Profile> {
        match username.filter(|u| !u.is_empty()) {
            None => QueryResult::idle(),
            Some(username) => self.cache.fetch(Self::key(username), || get_student_profile(store, username)).await,
        }
    }

    pub async fn refetch(&self, store: &dyn Store, username: Option<&str>) -> QueryResult<Profile> {
        match username.filter(|u| !u.is_empty()) {
            None => QueryResult::idle(),
            Some(username) => self.cache.refetch(Self::key(username), || get_student_profile(store, username)).await,
        }
    }

    /// Forget the cached profile, e.g. on logout or after the owner edits it.
    pub async fn invalidate(&self, username: &str) {
        if self.cache.invalidate(&Self::key(username)).await {
            tracing::debug!("Evicted cached profile for {}", username);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::query::QueryStatus;
    use crate::services::students::{edit_profile, EditProfileForm};
    use crate::testing::Fixture;

    #[tokio::test]
    async fn disabled_without_a_session() {
        let fx = Fixture::new().await;
        let context = AuthenticatedStudentContext::new();
        assert_eq!(context.student(fx.store(), None).await.status, QueryStatus::Idle);
        assert_eq!(context.student(fx.store(), Some("")).await.status, QueryStatus::Idle);
    }

    #[tokio::test]
    async fn serves_cached_profile_until_refetched() {
        let fx = Fixture::new().await;
        let ana = fx.register("ana", &[]).await;
        let context = AuthenticatedStudentContext::new();

        let first = context.student(fx.store(), Some("ana")).await;
        assert_eq!(first.data.as_ref().map(|p| p.semester), Some(3));

        edit_profile(fx.store(), ana.id, EditProfileForm { semester: 6, about: None, trails_ids: vec![] })
            .await
            .unwrap();
        let stale = context.student(fx.store(), Some("ana")).await;
        assert_eq!(stale.data.as_ref().map(|p| p.semester), Some(3));

        let fresh = context.refetch(fx.store(), Some("ana")).await;
        assert_eq!(fresh.data.as_ref().map(|p| p.semester), Some(6));
    }

    #[tokio::test]
    async fn profiles_beyond_capacity_are_evicted() {
        let fx = Fixture::new().await;
        let ana = fx.register("ana", &[]).await;
        fx.register("bia", &[]).await;
        fx.register("caio", &[]).await;
        let context = AuthenticatedStudentContext::bounded(Duration::from_secs(3600), 2);

        for name in ["ana", "bia", "caio"] {
            assert!(context.student(fx.store(), Some(name)).await.is_success());
        }
        assert_eq!(context.cached_profiles().await, 2);

        edit_profile(fx.store(), ana.id, EditProfileForm { semester: 8, about: None, trails_ids: vec![] })
            .await
            .unwrap();
        let reloaded = context.student(fx.store(), Some("ana")).await;
        assert_eq!(reloaded.data.as_ref().map(|p| p.semester), Some(8));
        assert_eq!(context.cached_profiles().await, 2);
    }

    #[tokio::test]
    async fn unknown_students_surface_as_errors() {
        let fx = Fixture::new().await;
        let context = AuthenticatedStudentContext::new();
        let result = context.student(fx.store(), Some("ghost")).await;
        assert_eq!(result.status, QueryStatus::Error);
        assert!(result.data.is_none());
    }
}
