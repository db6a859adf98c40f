use std::sync::Arc;

use crate::SessionUser;

/// Authentication collaborator: reports the current session's user, if any.
pub trait Authenticator: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;
}

impl<A> Authenticator for Arc<A>
where
    A: Authenticator + ?Sized,
{
    fn current_user(&self) -> Option<SessionUser> {
        (**self).current_user()
    }
}

/// Fixed-answer authenticator for tests, CLIs and already-verified transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticAuthenticator {
    user: Option<SessionUser>,
}

impl StaticAuthenticator {
    pub fn signed_in(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }
}

impl Authenticator for StaticAuthenticator {
    fn current_user(&self) -> Option<SessionUser> {
        self.user
    }
}
