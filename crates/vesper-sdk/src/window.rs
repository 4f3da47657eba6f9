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

//! The window service and its backends.

use crate::config::WindowConfig;
use std::any::type_name;
use std::cell::{Cell, RefCell};
use vesper_core::event::{EventBus, WindowClosed};
use vesper_core::platform::NativeHandle;
use vesper_core::{EngineError, EngineResult};

/// A trait that abstracts the behavior of a window.
///
/// Any windowing backend can implement this trait to drive the engine's run
/// loop, which keeps ticking until [`is_closed`](Self::is_closed) reports
/// `true`.
pub trait WindowBackend {
    /// Processes pending platform events. Called once per main-loop iteration.
    fn poll_events(&mut self) -> EngineResult<()>;

    /// Returns `true` once the window has been closed.
    fn is_closed(&self) -> bool;

    /// Asks the window to close. Takes effect on the next poll at the latest.
    fn request_close(&mut self);

    /// Returns the physical dimensions (width, height) of the window's inner area.
    fn inner_size(&self) -> (u32, u32);

    /// The platform window handle, for graphics backends.
    fn native_handle(&self) -> NativeHandle;
}

/// A window without a platform surface, for servers, tests and tools.
///
/// It stays open until a close is requested or, if a frame limit is set,
/// until the main loop has polled it that many times.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    size: (u32, u32),
    frame_limit: Option<u64>,
    polls: u64,
    close_requested: bool,
    closed: bool,
}

impl HeadlessWindow {
    /// Creates an open headless window.
    pub fn new(width: u32, height: u32, frame_limit: Option<u64>) -> Self {
        Self {
            size: (width, height),
            frame_limit,
            polls: 0,
            close_requested: false,
            closed: frame_limit == Some(0),
        }
    }

    /// Creates a headless window from the window settings.
    pub fn from_config(config: &WindowConfig) -> Self {
        Self::new(config.width, config.height, config.frame_limit)
    }

    /// Number of polls that left the window open.
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl WindowBackend for HeadlessWindow {
    fn poll_events(&mut self) -> EngineResult<()> {
        if self.closed {
            return Ok(());
        }
        let limit_reached = self.frame_limit.is_some_and(|limit| self.polls >= limit);
        if self.close_requested || limit_reached {
            self.closed = true;
        } else {
            self.polls += 1;
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn inner_size(&self) -> (u32, u32) {
        self.size
    }

    fn native_handle(&self) -> NativeHandle {
        NativeHandle::null()
    }
}

/// The service wrapping the active [`WindowBackend`].
///
/// Dispatches [`WindowClosed`] exactly once, from the poll that first
/// observes the window closed.
pub struct WindowService {
    backend: RefCell<Box<dyn WindowBackend>>,
    close_reported: Cell<bool>,
}

impl WindowService {
    /// Wraps `backend`.
    pub fn new(backend: Box<dyn WindowBackend>) -> Self {
        let (width, height) = backend.inner_size();
        log::info!("Window service created ({width}x{height})");
        Self {
            backend: RefCell::new(backend),
            close_reported: Cell::new(false),
        }
    }

    /// Polls the backend and returns `true` while the window is open.
    pub fn poll(&self, bus: &EventBus) -> EngineResult<bool> {
        let closed = {
            let mut backend = self.backend_mut()?;
            backend.poll_events()?;
            backend.is_closed()
        };
        if closed && !self.close_reported.replace(true) {
            log::info!("Window closed");
            bus.dispatch(&WindowClosed)?;
        }
        Ok(!closed)
    }

    /// Returns `true` once the window has been closed.
    pub fn is_closed(&self) -> bool {
        self.backend
            .try_borrow()
            .map(|backend| backend.is_closed())
            .unwrap_or(false)
    }

    /// Asks the window to close. Safe to call from event listeners.
    pub fn request_close(&self) -> EngineResult<()> {
        log::debug!("Window close requested");
        self.backend_mut()?.request_close();
        Ok(())
    }

    /// The inner size of the window.
    pub fn inner_size(&self) -> EngineResult<(u32, u32)> {
        Ok(self.backend_ref()?.inner_size())
    }

    /// The platform window handle.
    pub fn native_handle(&self) -> EngineResult<NativeHandle> {
        Ok(self.backend_ref()?.native_handle())
    }

    fn backend_ref(&self) -> EngineResult<std::cell::Ref<'_, Box<dyn WindowBackend>>> {
        self.backend
            .try_borrow()
            .map_err(|_| EngineError::ReentrantAccess {
                type_name: type_name::<Self>(),
            })
    }

    fn backend_mut(&self) -> EngineResult<std::cell::RefMut<'_, Box<dyn WindowBackend>>> {
        self.backend
            .try_borrow_mut()
            .map_err(|_| EngineError::ReentrantAccess {
                type_name: type_name::<Self>(),
            })
    }
}

impl std::fmt::Debug for WindowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowService")
            .field("closed", &self.is_closed())
            .field("close_reported", &self.close_reported.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn frame_limit_closes_after_that_many_polls() {
        let mut window = HeadlessWindow::new(640, 480, Some(2));
        for _ in 0..2 {
            window.poll_events().unwrap();
            assert!(!window.is_closed());
        }
        window.poll_events().unwrap();
        assert!(window.is_closed());
        assert_eq!(window.polls(), 2);
        assert!(window.native_handle().is_null());
        assert!(HeadlessWindow::new(1, 1, Some(0)).is_closed());
    }

    #[test]
    fn close_is_reported_once() {
        let bus = EventBus::new();
        let closes = Rc::new(Cell::new(0));
        let counter = closes.clone();
        bus.subscribe(move |_: &WindowClosed| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        let service = WindowService::new(Box::new(HeadlessWindow::new(800, 600, None)));

        assert!(service.poll(&bus).unwrap());
        service.request_close().unwrap();
        assert!(!service.poll(&bus).unwrap());
        assert!(!service.poll(&bus).unwrap());

        assert_eq!(closes.get(), 1);
        assert!(service.is_closed());
        assert_eq!(service.inner_size().unwrap(), (800, 600));
    }

    #[test]
    fn close_requested_from_a_listener() {
        let bus = EventBus::new();
        let service = Rc::new(WindowService::new(Box::new(HeadlessWindow::new(1, 1, None))));
        let handle = service.clone();
        bus.subscribe(move |_: &WindowClosed| handle.request_close());

        service.request_close().unwrap();
        // The listener runs after the backend borrow is released.
        assert!(!service.poll(&bus).unwrap());
    }
}
