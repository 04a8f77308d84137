//! Applying route decisions through a navigation primitive.

use crate::guard::decision::{AuthState, Location, RouteDecision, RouteGuard};

/// A single navigation request issued by the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: String,
    /// Overwrite the current history entry instead of pushing a new one.
    pub replace: bool,
    /// Where the user was headed, for post-login return.
    pub from: Option<Location>,
}

impl Navigation {
    pub fn replace(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            replace: true,
            from: None,
        }
    }

    pub fn with_from(mut self, from: Location) -> Self {
        self.from = Some(from);
        self
    }
}

/// The framework's navigation primitive.
pub trait Navigator {
    fn navigate(&mut self, navigation: Navigation);
}

impl<F> Navigator for F
where
    F: FnMut(Navigation),
{
    fn navigate(&mut self, navigation: Navigation) {
        self(navigation)
    }
}

/// What the guarded view ends up showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome<V> {
    /// Neutral placeholder while auth state loads.
    Placeholder,
    /// The protected children.
    Children(V),
    /// Nothing; a redirect was issued.
    Redirected(Navigation),
}

impl RouteGuard {
    /// Evaluate the guard and carry out any redirect on `navigator`.
    pub fn resolve<V, N>(
        &self,
        auth: &AuthState,
        location: &Location,
        children: V,
        navigator: &mut N,
    ) -> GuardOutcome<V>
    where
        N: Navigator + ?Sized,
    {
        let navigation = match self.decide(auth, location) {
            RouteDecision::Pending => return GuardOutcome::Placeholder,
            RouteDecision::Render => return GuardOutcome::Children(children),
            RouteDecision::RedirectToLogin(from) => {
                Navigation::replace(self.homes().login_path()).with_from(from)
            }
            RouteDecision::RedirectTo(path) => Navigation::replace(path),
        };

        tracing::debug!(to = %navigation.to, "Guard redirect");
        navigator.navigate(navigation.clone());
        GuardOutcome::Redirected(navigation)
    }
}
