//! Warning and error sinks.
//!
//! Warnings and callback errors are routed through per-thread listener lists.
//! A warning listener returning `false` suppresses the `tracing` fallback; an
//! error listener returning `false` stops propagation of the error entirely.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use easel_data_path::PathSyntaxError;
use thiserror::Error;

use crate::options::global_options;

// ── Errors ────────────────────────────────────────────────────────────────

/// An error returned by a user callback (observer, listener, template hook).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("{0}")]
    Message(String),
    #[error("method \"{0}\" is not registered")]
    MissingMethod(String),
    #[error(transparent)]
    Path(#[from] PathSyntaxError),
}

impl CallbackError {
    pub fn msg(message: impl Into<String>) -> Self {
        CallbackError::Message(message.into())
    }
}

// ── Listener registry ─────────────────────────────────────────────────────

pub type WarningListener = Rc<dyn Fn(&str) -> bool>;
pub type ErrorListener = Rc<dyn Fn(&CallbackError, &str) -> bool>;

/// Handle returned when a listener is added; used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Sinks {
    next_id: u64,
    warnings: Vec<(ListenerId, WarningListener)>,
    errors: Vec<(ListenerId, ErrorListener)>,
}

impl Sinks {
    fn next(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }
}

thread_local! {
    static SINKS: RefCell<Sinks> = RefCell::new(Sinks::default());
    static INSIDE_ERROR_HANDLER: Cell<bool> = const { Cell::new(false) };
}

pub fn add_global_warning_listener(f: impl Fn(&str) -> bool + 'static) -> ListenerId {
    SINKS.with(|s| {
        let mut s = s.borrow_mut();
        let id = s.next();
        s.warnings.push((id, Rc::new(f)));
        id
    })
}

pub fn remove_global_warning_listener(id: ListenerId) -> bool {
    SINKS.with(|s| {
        let mut s = s.borrow_mut();
        let before = s.warnings.len();
        s.warnings.retain(|(i, _)| *i != id);
        s.warnings.len() != before
    })
}

pub fn add_global_error_listener(
    f: impl Fn(&CallbackError, &str) -> bool + 'static,
) -> ListenerId {
    SINKS.with(|s| {
        let mut s = s.borrow_mut();
        let id = s.next();
        s.errors.push((id, Rc::new(f)));
        id
    })
}

pub fn remove_global_error_listener(id: ListenerId) -> bool {
    SINKS.with(|s| {
        let mut s = s.borrow_mut();
        let before = s.errors.len();
        s.errors.retain(|(i, _)| *i != id);
        s.errors.len() != before
    })
}

// ── Dispatch ──────────────────────────────────────────────────────────────

/// Report a recoverable problem.
pub fn trigger_warning(message: &str) {
    // Snapshot the list so listeners may add or remove listeners.
    let listeners: Vec<WarningListener> =
        SINKS.with(|s| s.borrow().warnings.iter().map(|(_, f)| f.clone()).collect());
    let mut fallback = true;
    for f in listeners {
        if !f(message) {
            fallback = false;
        }
    }
    if fallback {
        tracing::warn!(target: "easel", "{message}");
    }
}

/// Report a callback error.
///
/// Returns the error back when the `throw_global_error` global option is set
/// and no listener stopped propagation.
pub fn dispatch_error(err: CallbackError, method: &str) -> Result<(), CallbackError> {
    if !INSIDE_ERROR_HANDLER.with(Cell::get) {
        INSIDE_ERROR_HANDLER.with(|c| c.set(true));
        let listeners: Vec<ErrorListener> =
            SINKS.with(|s| s.borrow().errors.iter().map(|(_, f)| f.clone()).collect());
        let mut should_break = false;
        for f in listeners {
            if !f(&err, method) {
                should_break = true;
            }
        }
        INSIDE_ERROR_HANDLER.with(|c| c.set(false));
        if should_break {
            return Ok(());
        }
    }
    if global_options().throw_global_error {
        return Err(err);
    }
    tracing::error!(target: "easel", method, "{err}");
    Ok(())
}

/// Run a callback and route its error through [`dispatch_error`].
pub fn safe_callback<T>(
    method: &str,
    f: impl FnOnce() -> Result<T, CallbackError>,
) -> Result<Option<T>, CallbackError> {
    match f() {
        Ok(v) => Ok(Some(v)),
        Err(e) => dispatch_error(e, method).map(|()| None),
    }
}
