//! Field merge rules for building the persisted record.
//!
//! Every attribute of a record falls into one class, and each class has one
//! merge rule:
//!
//! - **computed**: assigned by the server on create (id, certificates,
//!   generated key material). Once known it is carried forward, even when a
//!   later response omits it.
//! - **immutable**: fixed by the first create (creation time). Later
//!   responses never change it, even when the create left it unset.
//! - **reported**: owned by the server and re-fetched on every read (status,
//!   update time). A present value always wins; an absent one means
//!   "unknown", not "cleared".
//! - **submitted**: user-supplied values the API may drop or normalize in its
//!   response (display names, secrets). The request is authoritative.
//!
//! All rules are pure, so merging the same inputs twice gives the same
//! record.

use std::collections::BTreeMap;

/// Whether a value carries information. Empty strings, empty collections,
/// `None` and zero ids count as absent.
pub trait Known {
    fn is_known(&self) -> bool;
}

impl Known for String {
    fn is_known(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl<T: Known> Known for Option<T> {
    fn is_known(&self) -> bool {
        self.as_ref().is_some_and(Known::is_known)
    }
}

impl<T> Known for Vec<T> {
    fn is_known(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Known for BTreeMap<K, V> {
    fn is_known(&self) -> bool {
        !self.is_empty()
    }
}

impl Known for i64 {
    fn is_known(&self) -> bool {
        *self != 0
    }
}

impl Known for u32 {
    fn is_known(&self) -> bool {
        *self != 0
    }
}

impl Known for bool {
    fn is_known(&self) -> bool {
        true
    }
}

/// Server-computed attribute: the previously persisted value wins once set.
/// On first creation (no prior) the fresh value is taken as is.
pub fn computed<T: Known>(prior: Option<T>, fresh: T) -> T {
    match prior {
        Some(prior) if prior.is_known() => prior,
        _ => fresh,
    }
}

/// Attribute fixed at creation (creation time). Once a record exists its value
/// is final, even when it was never reported; only a first create fills it.
pub fn immutable<T>(prior: Option<T>, fresh: T) -> T {
    prior.unwrap_or(fresh)
}

/// Server-reported attribute: a present fresh value overwrites, an absent one
/// keeps what was known before.
pub fn reported<T: Known>(prior: Option<T>, fresh: T) -> T {
    if fresh.is_known() {
        return fresh;
    }
    match prior {
        Some(prior) if prior.is_known() => prior,
        _ => fresh,
    }
}

/// User-supplied attribute: the submitted value wins; the response only fills
/// in when nothing was submitted.
pub fn submitted<T: Known>(request: T, fresh: T) -> T {
    if request.is_known() { request } else { fresh }
}

/// The value the user asked for: taken from the plan on create and update,
/// from the persisted record on a plain read.
pub fn requested<P, R, T: Default>(
    plan: Option<&P>,
    prior: Option<&R>,
    from_plan: impl FnOnce(&P) -> T,
    from_prior: impl FnOnce(&R) -> T,
) -> T {
    match (plan, prior) {
        (Some(plan), _) => from_plan(plan),
        (None, Some(prior)) => from_prior(prior),
        (None, None) => T::default(),
    }
}

/// Drop blank strings so that `""` from the API reads as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(Known::is_known)
}
