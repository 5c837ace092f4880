//! Current scope and language resolution

use crate::contract::ScopeId;
use std::future::Future;

/// Names the active scope (site / tenant) and language
pub trait ScopeResolver: Send + Sync {
    fn current_scope(&self) -> Option<ScopeId>;

    fn current_language(&self) -> Option<String>;
}

/// Resolver that always answers the same scope and language
#[derive(Debug, Clone, Default)]
pub struct FixedScopeResolver {
    scope: Option<ScopeId>,
    language: Option<String>,
}

impl FixedScopeResolver {
    pub fn new(scope: i64) -> Self {
        Self {
            scope: Some(ScopeId(scope)),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

impl ScopeResolver for FixedScopeResolver {
    fn current_scope(&self) -> Option<ScopeId> {
        self.scope
    }

    fn current_language(&self) -> Option<String> {
        self.language.clone()
    }
}

/// Scope and language of the request being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    pub scope: ScopeId,
    pub language: Option<String>,
}

tokio::task_local! {
    static REQUEST_SCOPE: RequestScope;
}

/// Run `future` with `scope` visible to [`TaskLocalScopeResolver`]
pub async fn with_request_scope<F>(scope: RequestScope, future: F) -> F::Output
where
    F: Future,
{
    REQUEST_SCOPE.scope(scope, future).await
}

/// Resolver reading the task-local request scope set by [`with_request_scope`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLocalScopeResolver;

impl ScopeResolver for TaskLocalScopeResolver {
    fn current_scope(&self) -> Option<ScopeId> {
        REQUEST_SCOPE.try_with(|request| request.scope).ok()
    }

    fn current_language(&self) -> Option<String> {
        REQUEST_SCOPE
            .try_with(|request| request.language.clone())
            .ok()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_resolver() {
        let resolver = FixedScopeResolver::new(4).with_language("de");
        assert_eq!(resolver.current_scope(), Some(ScopeId(4)));
        assert_eq!(resolver.current_language().as_deref(), Some("de"));
        assert_eq!(FixedScopeResolver::default().current_scope(), None);
    }

    #[tokio::test]
    async fn test_task_local_resolver() {
        let resolver = TaskLocalScopeResolver;
        assert_eq!(resolver.current_scope(), None);

        let request = RequestScope {
            scope: ScopeId(9),
            language: Some("fr".to_owned()),
        };
        let (scope, language) = with_request_scope(request, async {
            (resolver.current_scope(), resolver.current_language())
        })
        .await;
        assert_eq!(scope, Some(ScopeId(9)));
        assert_eq!(language.as_deref(), Some("fr"));
    }
}
