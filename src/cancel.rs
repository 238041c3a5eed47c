use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation handle for a conversion run.
///
/// Cloning the token shares the underlying flag, so a caller can keep one
/// clone and hand another to [`convert_cancelable`](crate::convert_cancelable).
/// Cancellation is checked between sizes and between platform branches;
/// work already finished is kept, work not yet started is skipped and its
/// branch reports [`Error::Canceled`](crate::Error::Canceled).
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-canceled state.
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// Requests cancellation of the run holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns true once `cancel` has been called on any clone.
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
