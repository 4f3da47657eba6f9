// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::deferred::{DeferredEvent, DeferredSender};
use super::kinds::{Event, EventKind};
use crate::error::EngineResult;
use crate::identifier::Identifier;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type Callback = dyn FnMut(&dyn Any) -> EngineResult<()>;

struct Listener {
    id: Identifier,
    callback: Rc<RefCell<Callback>>,
}

/// A type-indexed, synchronous publish/subscribe dispatcher.
///
/// Listeners of one [`EventKind`] are invoked in subscription order, which is
/// significant: subsystems subscribed earlier are notified earlier in the same
/// frame. All methods take `&self` so listeners may subscribe, unsubscribe or
/// dispatch other events while a dispatch is in progress.
///
/// Listener errors are not caught: [`dispatch`](EventBus::dispatch) stops at
/// the first failing listener and returns its error.
pub struct EventBus {
    listeners: RefCell<HashMap<EventKind, Vec<Listener>>>,
    deferred_sender: flume::Sender<DeferredEvent>,
    deferred_receiver: flume::Receiver<DeferredEvent>,
}

impl EventBus {
    /// Creates an event bus with no listeners.
    pub fn new() -> Self {
        let (deferred_sender, deferred_receiver) = flume::unbounded();
        log::info!("EventBus initialized.");
        Self {
            listeners: RefCell::new(HashMap::new()),
            deferred_sender,
            deferred_receiver,
        }
    }

    /// Appends `callback` to the listeners of `T` and returns the
    /// registration's identifier, to be passed to
    /// [`unsubscribe`](Self::unsubscribe).
    ///
    /// Callbacks capture whatever context they need explicitly (typically an
    /// `Rc` to the owning service).
    pub fn subscribe<T, F>(&self, mut callback: F) -> Identifier
    where
        T: Event,
        F: FnMut(&T) -> EngineResult<()> + 'static,
    {
        let id = Identifier::new();
        let mut warned = false;
        let erased = move |event: &dyn Any| match event.downcast_ref::<T>() {
            Some(event) => callback(event),
            // Two types sharing a `Custom` name; not ours to handle.
            None => {
                if !warned {
                    warned = true;
                    log::warn!(
                        "Listener {id} for {} skipped an event of another type with the same kind {:?}",
                        type_name::<T>(),
                        T::KIND
                    );
                }
                Ok(())
            }
        };
        self.listeners
            .borrow_mut()
            .entry(T::KIND)
            .or_default()
            .push(Listener {
                id,
                callback: Rc::new(RefCell::new(erased)),
            });
        log::trace!("Listener {id} subscribed to {:?}", T::KIND);
        id
    }

    /// Removes the listener `id` from the listeners of `T`.
    ///
    /// Returns `false` (and does nothing else) if no such listener exists.
    pub fn unsubscribe<T: Event>(&self, id: Identifier) -> bool {
        self.remove_listener(T::KIND, id)
    }

    /// Removes the listener `id` from the listeners of `kind`.
    ///
    /// Linear in the number of listeners of that kind.
    // TODO: keep an id -> position index per kind if profiling shows
    // per-frame kinds with many short-lived listeners.
    pub fn remove_listener(&self, kind: EventKind, id: Identifier) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };
        match list.iter().position(|listener| listener.id == id) {
            Some(position) => {
                list.remove(position);
                log::trace!("Listener {id} unsubscribed from {kind:?}");
                true
            }
            None => false,
        }
    }

    /// Invokes every listener of `T`, in subscription order.
    ///
    /// The listener list is snapshotted when the dispatch starts: listeners
    /// added during the dispatch first run on the next dispatch, listeners
    /// removed during the dispatch still run in this one. A listener that is
    /// already running further up the stack is skipped for nested dispatches.
    pub fn dispatch<T: Event>(&self, event: &T) -> EngineResult<()> {
        let snapshot: Vec<Rc<RefCell<Callback>>> = match self.listeners.borrow().get(&T::KIND) {
            Some(list) => list.iter().map(|l| l.callback.clone()).collect(),
            None => return Ok(()),
        };
        log::trace!(
            "Dispatching {:?} to {} listener(s)",
            T::KIND,
            snapshot.len()
        );

        let event: &dyn Any = event;
        for listener in snapshot {
            let Ok(mut callback) = listener.try_borrow_mut() else {
                log::warn!("Skipping re-entrant listener for {:?}", T::KIND);
                continue;
            };
            (&mut *callback)(event)?;
        }
        Ok(())
    }

    /// Returns a thread-safe sender for events to dispatch later.
    pub fn deferred_sender(&self) -> DeferredSender {
        DeferredSender::new(self.deferred_sender.clone())
    }

    /// Dispatches every queued deferred event, oldest first.
    ///
    /// Returns the number of events dispatched. On a listener error the
    /// remaining events stay queued.
    pub fn flush_deferred(&self) -> EngineResult<usize> {
        let mut flushed = 0;
        while let Ok(job) = self.deferred_receiver.try_recv() {
            job(self)?;
            flushed += 1;
        }
        Ok(flushed)
    }

    /// Returns the number of queued deferred events.
    pub fn pending_deferred(&self) -> usize {
        self.deferred_receiver.len()
    }

    /// Returns the number of listeners subscribed to `T`.
    pub fn listener_count<T: Event>(&self) -> usize {
        self.listener_count_of(T::KIND)
    }

    /// Returns the number of listeners subscribed to `kind`.
    pub fn listener_count_of(&self, kind: EventKind) -> usize {
        self.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Removes every listener of every kind.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        let mut map = f.debug_map();
        for (kind, list) in listeners.iter() {
            map.entry(kind, &list.len());
        }
        map.finish()
    }
}
