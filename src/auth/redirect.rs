//! Fire-and-forget notification that the session is gone and the user must
//! log in again.

/// Receives the "navigate to login" signal after a refresh cycle fails.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self);
}

/// Ignores the signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRedirect;

impl LoginRedirect for NoopRedirect {
    fn redirect_to_login(&self) {}
}

/// Emits a warning through `tracing`; the default for headless callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self) {
        tracing::warn!("session expired, login required");
    }
}

impl<F> LoginRedirect for F
where
    F: Fn() + Send + Sync,
{
    fn redirect_to_login(&self) {
        self()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn closures_act_as_redirects() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let redirect: Arc<dyn LoginRedirect> = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        redirect.redirect_to_login();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
