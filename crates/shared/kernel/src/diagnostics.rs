//! Startup notices and scoped suppression.
//!
//! Registering routes after the application object already exists is normal during
//! bootstrap but would otherwise raise a "late setup method" notice for every hook.
//! Suppression is scoped to a guard and to the calling thread: notices raised by other
//! threads, or after the guard drops, are reported as usual.

use std::cell::RefCell;
use std::fmt;
use tracing::warn;

/// Category of a startup notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeCode {
    /// A setup hook ran after the application was already assembled.
    LateSetupMethod,
}

impl NoticeCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LateSetupMethod => "late_setup_method",
        }
    }
}

impl fmt::Display for NoticeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub code: NoticeCode,
    pub message: String,
}

impl Notice {
    pub fn new(code: NoticeCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

thread_local! {
    static SUPPRESSED: RefCell<Vec<NoticeCode>> = const { RefCell::new(Vec::new()) };
}

/// Reports a notice unless its code is suppressed on this thread.
///
/// Returns `true` when the notice was reported.
pub fn emit(notice: &Notice) -> bool {
    if is_suppressed(notice.code) {
        return false;
    }
    warn!(code = %notice.code, "{}", notice.message);
    true
}

#[must_use]
pub fn is_suppressed(code: NoticeCode) -> bool {
    SUPPRESSED.with(|s| s.borrow().contains(&code))
}

/// Suppresses `code` on this thread until the returned guard drops.
///
/// Guards nest: dropping an inner guard leaves the outer suppression in place.
#[must_use = "suppression ends when the guard is dropped"]
pub fn suppress(code: NoticeCode) -> SuppressionGuard {
    SUPPRESSED.with(|s| s.borrow_mut().push(code));
    SuppressionGuard { code, _not_send: std::marker::PhantomData }
}

/// Restores the previous suppression state on drop, including during unwinding.
#[derive(Debug)]
pub struct SuppressionGuard {
    code: NoticeCode,
    // Thread-local state: the guard must be dropped on the thread that created it.
    _not_send: std::marker::PhantomData<*const ()>,
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        SUPPRESSED.with(|s| {
            let mut stack = s.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|&c| c == self.code) {
                stack.remove(pos);
            }
        });
    }
}
