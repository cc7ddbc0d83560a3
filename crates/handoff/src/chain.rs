// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Request chaining.
//!
//! A child request may point at one parent and keeps it alive, so a task
//! in the middle of a chain can drop its own handle to the parent and
//! still answer it through the child. A parent must have been allocated
//! before its child, so chains cannot loop.

use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::request::Request;

impl Request {
    /// Link this request to `parent`. Only one parent may be set.
    pub fn set_parent(&self, parent: &Request) -> Result<()> {
        if parent.id() >= self.id() {
            return Err(Error::ParentNotOlder {
                parent: parent.id(),
                child: self.id(),
            });
        }
        self.record
            .parent
            .set(Arc::clone(&parent.record))
            .map_err(|_| Error::ParentAlreadySet { id: self.id() })?;
        trace!(request = %self.id(), parent = %parent.id(), "parent linked");
        Ok(())
    }

    /// The parent, if one was set.
    pub fn parent(&self) -> Option<Request> {
        self.record.parent.get().map(|record| Request {
            record: Arc::clone(record),
        })
    }

    pub fn has_parent(&self) -> bool {
        self.record.parent.get().is_some()
    }

    /// Complete the parent with `result`.
    ///
    /// This is the last step of processing a child: once the child's own
    /// completion has been handled, its originator is answered. The parent
    /// is completed at most once no matter how many paths try.
    pub fn complete_parent(&self, result: i8) -> Result<()> {
        let parent = self.parent().ok_or(Error::NoParent { id: self.id() })?;
        parent.complete(result)
    }

    /// Iterate from the parent up to the root of the chain.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: self.parent(),
        }
    }
}

/// Iterator over a request's ancestors, nearest first.
pub struct Ancestors {
    next: Option<Request>,
}

impl Iterator for Ancestors {
    type Item = Request;

    fn next(&mut self) -> Option<Request> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}
