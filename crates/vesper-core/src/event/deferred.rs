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

use super::bus::EventBus;
use super::kinds::Event;
use crate::error::EngineResult;

pub(crate) type DeferredEvent = Box<dyn FnOnce(&EventBus) -> EngineResult<()> + Send>;

/// A thread-safe handle for queueing events on an [`EventBus`].
///
/// Queued events are dispatched when the simulation thread calls
/// [`EventBus::flush_deferred`]; the scheduler does so at the start of each
/// processed frame.
#[derive(Clone)]
pub struct DeferredSender {
    sender: flume::Sender<DeferredEvent>,
}

impl DeferredSender {
    pub(crate) fn new(sender: flume::Sender<DeferredEvent>) -> Self {
        Self { sender }
    }

    /// Queues `event`, logging an error if the bus no longer exists.
    ///
    /// Returns `true` if the event was queued.
    pub fn post<T: Event + Send>(&self, event: T) -> bool {
        log::trace!("Posting a deferred {:?} event.", T::KIND);
        let job: DeferredEvent = Box::new(move |bus: &EventBus| bus.dispatch(&event));
        match self.sender.send(job) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to post event: {e}. Event bus likely dropped.");
                false
            }
        }
    }
}

impl std::fmt::Debug for DeferredSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredSender")
            .field("queued", &self.sender.len())
            .finish()
    }
}
