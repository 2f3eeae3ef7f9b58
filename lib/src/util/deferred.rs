use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::Result;

type Thunk<T> = Box<dyn FnOnce() -> Result<T> + Send + Sync>;

/// A shared, fallible computation that runs at most once: on first use, or
/// earlier on the rayon pool via [`Deferred::spawn()`]. Its result, error
/// included, is cached and handed to every caller.
pub struct Deferred<T>(Arc<Lazy<Result<T>, Thunk<T>>>);

impl<T: Send + Sync + 'static> Deferred<T> {
    /// Starts computing the value on the rayon pool.
    #[inline(always)]
    pub fn spawn(&self) {
        let lazy = self.0.clone();
        rayon::spawn(move || { Lazy::force(&lazy); });
    }
}

impl<T> Deferred<T> {
    #[inline(always)]
    pub fn new<F>(with: F) -> Self
        where F: FnOnce() -> Result<T> + Send + Sync + 'static
    {
        Deferred(Arc::new(Lazy::new(Box::new(with))))
    }

    /// Computes the value if needed, blocking on a computation in progress.
    pub fn force(&self) -> Result<&T> {
        Lazy::force(&*self.0).as_ref().map_err(|e| e.clone())
    }

    /// Whether the computation has finished.
    pub fn is_done(&self) -> bool {
        Lazy::get(&*self.0).is_some()
    }
}

impl<T> Clone for Deferred<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Lazy::get(&*self.0) {
            Some(result) => f.debug_tuple("Deferred").field(result).finish(),
            None => f.write_str("Deferred(<pending>)"),
        }
    }
}
