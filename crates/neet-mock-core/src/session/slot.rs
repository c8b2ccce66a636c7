use serde::{Deserialize, Serialize};

/// A value that is set at most once.
///
/// Used for the paper and the exam start time: re-rendering a view must
/// never regenerate the paper or restart the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot<T>(Option<T>);

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Slot<T> {
    pub fn is_ready(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    /// Return the stored value, running `init` only when the slot is empty.
    pub fn get_or_insert_with(&mut self, init: impl FnOnce() -> T) -> &T {
        self.0.get_or_insert_with(init)
    }
}
