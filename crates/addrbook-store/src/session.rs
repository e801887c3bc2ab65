//! Scoped acquisition of an open store.
//!
//! A [`Session`] opens its store on creation and closes it when dropped, so
//! the store is released on early returns and panics as well.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::error::Result;
use crate::traits::AddressStore;

/// An open store, closed on drop.
///
/// Closing does not save. Call `save()` through the session to persist.
pub struct Session<'a, S: AddressStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: AddressStore + ?Sized> Session<'a, S> {
    /// Open `store` and guard it.
    pub fn open(store: &'a mut S) -> Result<Self> {
        store.open()?;
        debug!(locator = ?store.locator(), "store session opened");
        Ok(Self { store })
    }
}

impl<S: AddressStore + ?Sized> Deref for Session<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: AddressStore + ?Sized> DerefMut for Session<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: AddressStore + ?Sized> Drop for Session<'_, S> {
    fn drop(&mut self) {
        self.store.close();
        debug!(locator = ?self.store.locator(), "store session closed");
    }
}
