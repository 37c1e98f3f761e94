//! Consumer end of a unit traversal.

use anyhow::Result;

use crate::event::ClassEvent;

/// Receives the events of one unit, in order.
///
/// Stages wrap a downstream sink and forward whatever they do not rewrite.
/// Errors raised by a sink belong to whoever raised them; stages pass them
/// back to their caller untouched.
pub trait EventSink {
    fn accept(&mut self, event: ClassEvent) -> Result<()>;
}

/// Collects events in memory.
impl EventSink for Vec<ClassEvent> {
    fn accept(&mut self, event: ClassEvent) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn accept(&mut self, event: ClassEvent) -> Result<()> {
        (**self).accept(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn accept(&mut self, event: ClassEvent) -> Result<()> {
        (**self).accept(event)
    }
}
