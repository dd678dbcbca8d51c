use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared liveness flag for one registered callback.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    id: u64,
    live: Rc<Cell<bool>>,
    /// Identity of the registry that issued this token.
    owner: Rc<()>,
}

impl Token {
    pub(crate) fn cancel(&self) {
        self.live.set(false);
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.get()
    }
}

struct Entry {
    id: u64,
    live: Rc<Cell<bool>>,
    callback: Box<dyn FnMut()>,
}

/// Single-threaded list of callbacks that can be cancelled at any time,
/// including from inside one of the callbacks while a dispatch is running.
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    entries: RefCell<Vec<Entry>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
    owner: Rc<()>,
}

impl CallbackRegistry {
    pub(crate) fn register(&self, callback: Box<dyn FnMut()>) -> Token {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let live = Rc::new(Cell::new(true));
        self.entries.borrow_mut().push(Entry {
            id,
            live: live.clone(),
            callback,
        });
        Token {
            id,
            live,
            owner: self.owner.clone(),
        }
    }

    fn owns(&self, token: &Token) -> bool {
        Rc::ptr_eq(&self.owner, &token.owner)
    }

    /// Cancel and drop a callback. Already removed tokens are fine; tokens
    /// issued by another registry are left untouched.
    pub(crate) fn remove(&self, token: &Token) {
        if !self.owns(token) {
            tracing::debug!("ignoring removal of a foreign callback");
            return;
        }
        token.cancel();
        // During a dispatch the entries are checked out; they get pruned when
        // the dispatch puts them back.
        if let Ok(mut entries) = self.entries.try_borrow_mut() {
            entries.retain(|e| e.id != token.id);
        }
    }

    /// Run every live callback once. Callbacks registered during the
    /// dispatch wait for the next one. Re-entrant calls run nothing.
    pub(crate) fn dispatch(&self) -> usize {
        if self.dispatching.replace(true) {
            tracing::warn!("re-entrant dispatch ignored");
            return 0;
        }

        let mut batch = std::mem::take(&mut *self.entries.borrow_mut());
        let mut ran = 0;
        for entry in batch.iter_mut() {
            // Checked right before each call: an earlier callback in this
            // batch may have cancelled a later one.
            if entry.live.get() {
                (entry.callback)();
                ran += 1;
            }
        }

        let mut entries = self.entries.borrow_mut();
        let added = std::mem::take(&mut *entries);
        batch.extend(added);
        batch.retain(|e| e.live.get());
        *entries = batch;
        self.dispatching.set(false);
        ran
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.live.get())
            .count()
    }
}
