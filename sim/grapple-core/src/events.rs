//! Grapple notifications.
//!
//! The host can observe transitions two ways: [`Grapple::tick`] returns the
//! [`ExtensionOutcome`] of the tick an extension finishes on, and
//! [`GrappleHandlers`] holds optional callbacks invoked synchronously when a
//! transition completes. An empty slot means nobody is listening.
//!
//! [`Grapple::tick`]: crate::Grapple::tick

use grapple_types::BodyId;
use nalgebra::Point3;

/// How an extension ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtensionOutcome {
    /// The rope latched onto `body` at `point`.
    Contact {
        /// Struck body.
        body: BodyId,
        /// Impact point in world coordinates.
        point: Point3<f64>,
    },
    /// The rope reached full range without hitting anything.
    Fail,
}

impl ExtensionOutcome {
    /// Check if the extension latched onto something.
    #[must_use]
    pub fn is_contact(&self) -> bool {
        matches!(self, Self::Contact { .. })
    }
}

/// Transition a handler can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrappleEvent {
    /// Extension ended on a hit.
    Contact,
    /// Extension ended at full range.
    Fail,
    /// An actor was coupled to the tail.
    Connected,
    /// An actor was uncoupled.
    Disconnected,
}

type Handler = Box<dyn FnMut()>;

/// Optional callbacks for each [`GrappleEvent`].
#[derive(Default)]
pub struct GrappleHandlers {
    on_contact: Option<Handler>,
    on_fail: Option<Handler>,
    on_connected: Option<Handler>,
    on_disconnected: Option<Handler>,
}

impl std::fmt::Debug for GrappleHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrappleHandlers")
            .field("on_contact", &self.on_contact.is_some())
            .field("on_fail", &self.on_fail.is_some())
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .finish()
    }
}

impl GrappleHandlers {
    /// Create an empty set of handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contact handler.
    #[must_use]
    pub fn on_contact(mut self, handler: impl FnMut() + 'static) -> Self {
        self.on_contact = Some(Box::new(handler));
        self
    }

    /// Set the fail handler.
    #[must_use]
    pub fn on_fail(mut self, handler: impl FnMut() + 'static) -> Self {
        self.on_fail = Some(Box::new(handler));
        self
    }

    /// Set the connected handler.
    #[must_use]
    pub fn on_connected(mut self, handler: impl FnMut() + 'static) -> Self {
        self.on_connected = Some(Box::new(handler));
        self
    }

    /// Set the disconnected handler.
    #[must_use]
    pub fn on_disconnected(mut self, handler: impl FnMut() + 'static) -> Self {
        self.on_disconnected = Some(Box::new(handler));
        self
    }

    /// Invoke the handler for `event`, if any.
    pub fn emit(&mut self, event: GrappleEvent) {
        if let Some(handler) = self.slot(event) {
            handler();
        }
    }

    fn slot(&mut self, event: GrappleEvent) -> &mut Option<Handler> {
        match event {
            GrappleEvent::Contact => &mut self.on_contact,
            GrappleEvent::Fail => &mut self.on_fail,
            GrappleEvent::Connected => &mut self.on_connected,
            GrappleEvent::Disconnected => &mut self.on_disconnected,
        }
    }
}
