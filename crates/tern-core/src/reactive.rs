//! Observable cells.
//!
//! A [`Cell`] holds one value and a list of listeners. `set` replaces the
//! value and then calls every listener synchronously, in subscription order,
//! with no lock held, so a listener may read or write other cells.
//!
//! A [`Derived`] cell recomputes from one or more source cells whenever a
//! source changes and cannot be written directly. Sources only hold weak
//! references to their derived cells, so dropping every handle to a derived
//! cell frees it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Identifies a listener registered with [`Readable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wraps an id handed out by a [`Readable`] implementation.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
    value: T,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_id: u64,
}

/// Read access to an observable value.
pub trait Readable<T> {
    /// Returns the current value.
    fn get(&self) -> T;

    /// Registers `listener` to run after every change. The listener is not
    /// called with the current value.
    fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static;

    /// Removes a listener. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Write access to an observable value.
pub trait Writable<T>: Readable<T> {
    /// Replaces the value and notifies listeners.
    fn set(&self, value: T);

    /// Replaces the value with `f(current)`.
    fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.get());
        self.set(next);
    }
}

/// Creates the writable slots a [`SessionStore`](crate::SessionStore) is
/// built from.
///
/// Any primitive implementing [`Writable`] can back the store; [`CellSlots`]
/// is the one used by default.
pub trait SlotFactory: Send + Sync + 'static {
    type Slot<T: Clone + Send + Sync + 'static>: Writable<T> + Send + Sync + 'static;

    fn slot<T: Clone + Send + Sync + 'static>(value: T) -> Self::Slot<T>;
}

/// Backs slots with [`Cell`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CellSlots;

impl SlotFactory for CellSlots {
    type Slot<T: Clone + Send + Sync + 'static> = Cell<T>;

    fn slot<T: Clone + Send + Sync + 'static>(value: T) -> Cell<T> {
        Cell::new(value)
    }
}

/// A settable observable value. Clones share the same slot.
pub struct Cell<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Clone + Send + 'static> Cell<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                value,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Returns a read-only cell holding `f` applied to this cell's value.
    pub fn map<U, F>(&self, f: F) -> Derived<U>
    where
        U: Clone + Send + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        Derived::map(self, f)
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn downgrade(&self) -> WeakCell<T> {
        WeakCell {
            slot: Arc::downgrade(&self.slot),
        }
    }
}

impl<T: Clone + Send + 'static> Readable<T> for Cell<T> {
    fn get(&self) -> T {
        self.lock().value.clone()
    }

    fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut slot = self.lock();
        let id = SubscriptionId(slot.next_id);
        let listener: Listener<T> = Arc::new(listener);
        slot.next_id += 1;
        slot.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().listeners.retain(|(existing, _)| *existing != id);
    }
}

impl<T: Clone + Send + 'static> Writable<T> for Cell<T> {
    fn set(&self, value: T) {
        let listeners: Vec<Listener<T>> = {
            let mut slot = self.lock();
            slot.value = value.clone();
            slot.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in listeners {
            listener(&value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Cell")
            .field("value", &slot.value)
            .field("listeners", &slot.listeners.len())
            .finish()
    }
}

struct WeakCell<T> {
    slot: Weak<Mutex<Slot<T>>>,
}

impl<T> WeakCell<T> {
    fn upgrade(&self) -> Option<Cell<T>> {
        self.slot.upgrade().map(|slot| Cell { slot })
    }
}

/// A read-only cell computed from other cells.
pub struct Derived<T> {
    cell: Cell<T>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Derived<T> {
    /// Derives a cell holding `f` applied to the value of `source`.
    pub fn map<S, R, F>(source: &R, f: F) -> Self
    where
        S: Clone + Send + 'static,
        R: Readable<S>,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let target = Cell::new(f(&source.get()));
        let weak = target.downgrade();
        source.subscribe(move |value: &S| {
            if let Some(target) = weak.upgrade() {
                target.set(f(value));
            }
        });
        Self { cell: target }
    }

    /// Derives a cell from three sources. `f` runs again whenever any source
    /// changes, seeing the latest value of all three.
    ///
    /// Sources are only reached through [`Readable`], so they may be any
    /// observable primitive. The derived cell keeps its own copy of the last
    /// value each source announced.
    pub fn combine3<A, B, C, RA, RB, RC, F>(a: &RA, b: &RB, c: &RC, f: F) -> Self
    where
        A: Clone + Send + 'static,
        B: Clone + Send + 'static,
        C: Clone + Send + 'static,
        RA: Readable<A>,
        RB: Readable<B>,
        RC: Readable<C>,
        F: Fn(&A, &B, &C) -> T + Send + Sync + 'static,
    {
        let initial = (a.get(), b.get(), c.get());
        let target = Cell::new(f(&initial.0, &initial.1, &initial.2));
        let latest = Mutex::new(initial);

        let recompute: Arc<dyn Fn(&dyn Fn(&mut (A, B, C))) + Send + Sync> = {
            let target = target.downgrade();
            Arc::new(move |apply: &dyn Fn(&mut (A, B, C))| {
                let Some(target) = target.upgrade() else {
                    return;
                };
                let next = {
                    let mut latest = latest.lock().unwrap_or_else(PoisonError::into_inner);
                    apply(&mut latest);
                    f(&latest.0, &latest.1, &latest.2)
                };
                target.set(next);
            })
        };

        let on_a = Arc::clone(&recompute);
        a.subscribe(move |value: &A| on_a(&|latest: &mut (A, B, C)| latest.0 = value.clone()));
        let on_b = Arc::clone(&recompute);
        b.subscribe(move |value: &B| on_b(&|latest: &mut (A, B, C)| latest.1 = value.clone()));
        c.subscribe(move |value: &C| {
            recompute(&|latest: &mut (A, B, C)| latest.2 = value.clone())
        });

        Self { cell: target }
    }
}

impl<T: Clone + Send + 'static> Readable<T> for Derived<T> {
    fn get(&self) -> T {
        self.cell.get()
    }

    fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.cell.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.cell.unsubscribe(id)
    }
}

impl<T: fmt::Debug> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Derived").field(&self.cell).finish()
    }
}
