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

use crate::identifier::Identifier;
use crate::time::{FixedTime, FrameTime};

/// The tag under which an event type's listeners are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// First event of a fixed simulation step.
    EarlyFixedUpdate,
    /// The fixed simulation step (physics, deterministic logic).
    FixedUpdate,
    /// Last event of a fixed simulation step.
    LateFixedUpdate,
    /// Opens a variable-rate frame.
    MainLoopBegin,
    /// Runs before the frame's main update.
    EarlyUpdate,
    /// The frame's main update (game logic, behaviours).
    Update,
    /// Runs after every update writer has run.
    LateUpdate,
    /// Renderer state capture.
    PreRender,
    /// Drawing.
    Render,
    /// Presentation and post-draw bookkeeping.
    PostRender,
    /// Closes a frame. Destroyed game objects are reaped here.
    MainLoopEnd,
    /// An asset was released by its owner.
    AssetUnloaded,
    /// The window service reported that the window closed.
    WindowClosed,
    /// A user-defined event type. The name must be unique per type.
    Custom(&'static str),
}

/// An immutable value describing something that happened.
///
/// # Examples
///
/// ```
/// use vesper_core::event::{Event, EventKind};
///
/// struct ScoreChanged { score: u32 }
///
/// impl Event for ScoreChanged {
///     const KIND: EventKind = EventKind::Custom("ScoreChanged");
/// }
/// ```
pub trait Event: 'static {
    /// The listener list this event type is dispatched to.
    const KIND: EventKind;
}

macro_rules! time_events {
    ($time:ty => $($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq)]
            pub struct $name(pub $time);

            impl Event for $name {
                const KIND: EventKind = EventKind::$name;
            }
        )+
    };
}

time_events!(FixedTime =>
    /// Dispatched first in each fixed step.
    EarlyFixedUpdate,
    /// Dispatched once per fixed step.
    FixedUpdate,
    /// Dispatched last in each fixed step.
    LateFixedUpdate,
);

time_events!(FrameTime =>
    /// Dispatched first in each processed frame.
    MainLoopBegin,
    /// Dispatched before [`Update`].
    EarlyUpdate,
    /// Dispatched once per processed frame for game logic.
    Update,
    /// Dispatched after [`Update`].
    LateUpdate,
    /// Dispatched before [`Render`].
    PreRender,
    /// Dispatched once per processed frame for drawing.
    Render,
    /// Dispatched after [`Render`].
    PostRender,
    /// Dispatched last in each processed frame.
    MainLoopEnd,
);

/// An asset was released and handles to it should be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetUnloaded {
    /// The identifier of the released asset.
    pub asset: Identifier,
}

impl Event for AssetUnloaded {
    const KIND: EventKind = EventKind::AssetUnloaded;
}

/// The window was closed; the run loop stops after this event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowClosed;

impl Event for WindowClosed {
    const KIND: EventKind = EventKind::WindowClosed;
}

/// The fixed-step events, in dispatch order.
pub const FIXED_STEP_ORDER: [EventKind; 3] = [
    EventKind::EarlyFixedUpdate,
    EventKind::FixedUpdate,
    EventKind::LateFixedUpdate,
];

/// The per-frame events, in dispatch order.
pub const FRAME_ORDER: [EventKind; 8] = [
    EventKind::MainLoopBegin,
    EventKind::EarlyUpdate,
    EventKind::Update,
    EventKind::LateUpdate,
    EventKind::PreRender,
    EventKind::Render,
    EventKind::PostRender,
    EventKind::MainLoopEnd,
];
