//! Authentication for commands that act on behalf of the logged-in user.

use async_trait::async_trait;

use crate::app::{AppContext, GatorError, Result};
use crate::cli::registry::{Command, CommandHandler};
use crate::domain::User;
use crate::store::Store;

/// A handler that needs the current user.
#[async_trait]
pub trait AuthedHandler: Send + Sync {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command, user: User) -> Result<()>;
}

/// Adapts an [`AuthedHandler`] to the plain [`CommandHandler`] signature by
/// resolving the session user first.
pub struct LoggedIn<H>(H);

pub fn logged_in<H: AuthedHandler>(handler: H) -> LoggedIn<H> {
    LoggedIn(handler)
}

#[async_trait]
impl<H: AuthedHandler> CommandHandler for LoggedIn<H> {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command) -> Result<()> {
        let user = current_user(ctx)?;
        self.0.run(ctx, cmd, user).await
    }
}

/// Resolve the session's user name to a stored [`User`].
pub fn current_user(ctx: &AppContext) -> Result<User> {
    let name = ctx.config.current_user().ok_or(GatorError::NotLoggedIn)?;

    match ctx.store.get_user_by_name(name) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(GatorError::UserNotFound(name.to_string())),
        Err(e) => Err(GatorError::SessionLookup {
            name: name.to_string(),
            source: Box::new(e),
        }),
    }
}
