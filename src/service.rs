//! Process-wide services with first-writer-wins construction.
//!
//! Several start-up paths may race to build the same service (audio, effects).
//! A `ServiceSlot` hands every caller the instance that was installed first and
//! tells it whether it was the one that created it.

use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, single-threaded handle to an installed service.
pub type Shared<T> = Rc<RefCell<T>>;

#[derive(Debug)]
pub enum Installed<T> {
    /// This call constructed the service.
    Created(Shared<T>),
    /// A previous call already installed it; the initializer was not run.
    Existing(Shared<T>),
}

impl<T> Installed<T> {
    pub fn is_new(&self) -> bool {
        matches!(self, Installed::Created(_))
    }

    pub fn handle(&self) -> Shared<T> {
        match self {
            Installed::Created(h) | Installed::Existing(h) => h.clone(),
        }
    }
}

pub struct ServiceSlot<T> {
    cell: OnceCell<Shared<T>>,
}

impl<T> Default for ServiceSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ServiceSlot<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Install the service built by `init`, unless one is already present.
    pub fn install_with(&self, init: impl FnOnce() -> T) -> Installed<T> {
        if let Some(existing) = self.cell.get() {
            return Installed::Existing(existing.clone());
        }
        let handle = Rc::new(RefCell::new(init()));
        // `init` may have installed into this slot itself; the first one stays.
        match self.cell.set(handle.clone()) {
            Ok(()) => Installed::Created(handle),
            Err(_) => match self.cell.get() {
                Some(existing) => Installed::Existing(existing.clone()),
                None => Installed::Created(handle),
            },
        }
    }

    pub fn get(&self) -> Option<Shared<T>> {
        self.cell.get().cloned()
    }

    pub fn is_installed(&self) -> bool {
        self.cell.get().is_some()
    }
}
