use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Single-flight marker: at most one [`RunGuard`] exists per token at a time.
#[derive(Clone, Default)]
pub struct RunToken(Arc<AtomicBool>);

impl RunToken {
    /// Take the token, or return [`None`] when somebody else holds it.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.0.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed).ok()?;
        Some(RunGuard(Arc::clone(&self.0)))
    }

    #[cfg(test)]
    pub fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the token when dropped.
#[must_use]
pub struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_holder() {
        let token = RunToken::default();
        let guard = token.try_acquire();
        assert!(guard.is_some());
        assert!(token.is_held());
        assert!(token.clone().try_acquire().is_none());

        drop(guard);
        assert!(!token.is_held());
        assert!(token.try_acquire().is_some());
    }
}
