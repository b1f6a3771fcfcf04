//! Serialized event dispatch.
//!
//! Every radio callback runs on one loop, one at a time, in arrival order,
//! each to completion before the next is taken. The queue is bounded; a
//! full queue hands the event back to the producer instead of dropping it,
//! so the producer waits and retries.
//!
//! On the target the queue is an `embassy_sync` channel and the loop never
//! returns. On the host, tests drive [`Dispatcher::run_until_stopped`] from
//! an [`EventQueue`] they fill themselves.

use heapless::Deque;

use crate::ble::event::GapEvent;
use crate::ble::GapEventHandler;

/// Returned by [`EventQueue::post`] when every slot is taken. Carries the
/// rejected task back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub struct QueueFull<T>(pub T);

/// Fixed-capacity FIFO of pending tasks.
pub struct EventQueue<T, const N: usize> {
    slots: Deque<T, N>,
}

impl<T, const N: usize> EventQueue<T, N> {
    pub const fn new() -> Self {
        Self {
            slots: Deque::new(),
        }
    }

    /// Append `task` behind everything already queued.
    pub fn post(&mut self, task: T) -> Result<(), QueueFull<T>> {
        self.slots.push_back(task).map_err(QueueFull)
    }

    /// Oldest queued task, if any.
    pub fn take(&mut self) -> Option<T> {
        self.slots.pop_front()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for EventQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the dispatcher pulls its next event from. `None` stops the loop.
pub trait EventSource {
    fn next_event(&mut self) -> Option<GapEvent>;
}

impl<const N: usize> EventSource for EventQueue<GapEvent, N> {
    fn next_event(&mut self) -> Option<GapEvent> {
        self.take()
    }
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Option<GapEvent> {
        (**self).next_event()
    }
}

/// Runs events against the single registered handler.
pub struct Dispatcher<H> {
    handler: H,
    dispatched: u32,
}

impl<H: GapEventHandler> Dispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            dispatched: 0,
        }
    }

    /// Run one event to completion.
    pub fn dispatch(&mut self, event: GapEvent) {
        trace!("dispatch #{}: {}", self.dispatched, event_name(&event));
        event.deliver(&mut self.handler);
        self.dispatched = self.dispatched.wrapping_add(1);
    }

    /// Pull and run events in order until `source` reports stop. Returns
    /// how many ran.
    pub fn run_until_stopped<S: EventSource>(&mut self, mut source: S) -> usize {
        let mut ran = 0;
        while let Some(event) = source.next_event() {
            self.dispatch(event);
            ran += 1;
        }
        ran
    }

    /// Total events dispatched since creation.
    pub fn dispatched(&self) -> u32 {
        self.dispatched
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }
}

fn event_name(event: &GapEvent) -> &'static str {
    match event {
        GapEvent::InitComplete(_) => "init-complete",
        GapEvent::AdvertisingReport(_) => "advertising-report",
        GapEvent::ConnectionComplete(_) => "connection-complete",
        GapEvent::DisconnectionComplete(_) => "disconnection-complete",
    }
}
