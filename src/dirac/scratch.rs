// SPDX-License-Identifier: AGPL-3.0-only

//! Call-scoped temporaries.
//!
//! Operators never hold on to caller buffers: a [`Scratch`] lends up to two
//! fields for the duration of one call and is consumed by it, so nothing can
//! dangle after the call returns, on the success path or the error path.
//! When no lent field fits the layout a call needs, a temporary is allocated
//! and dropped at the end of the call.

use crate::field::spinor::{FieldLayout, SpinorField, SpinorView, SpinorViewMut};

/// Up to two caller-provided temporaries.
#[derive(Debug, Default)]
pub struct Scratch<'s> {
    slots: [Option<&'s mut SpinorField>; 2],
}

impl<'s> Scratch<'s> {
    /// No temporaries; every buffer is allocated on demand.
    #[must_use]
    pub const fn none() -> Self {
        Self { slots: [None, None] }
    }

    #[must_use]
    pub fn one(tmp1: &'s mut SpinorField) -> Self {
        Self {
            slots: [Some(tmp1), None],
        }
    }

    #[must_use]
    pub fn two(tmp1: &'s mut SpinorField, tmp2: &'s mut SpinorField) -> Self {
        Self {
            slots: [Some(tmp1), Some(tmp2)],
        }
    }

    /// Number of lent temporaries still available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// A buffer shaped as `layout` and the scratch that remains. The first
    /// lent field that fits is used; otherwise one is allocated.
    pub(crate) fn split(&mut self, layout: FieldLayout) -> (Buffer<'_>, Scratch<'_>) {
        let [first, second] = &mut self.slots;
        let first = first.as_deref_mut();
        let second = second.as_deref_mut();
        match first {
            Some(f) if fits(&*f, &layout) => (Buffer::lent(f, layout), Scratch {
                slots: [second, None],
            }),
            first => match second {
                Some(f) if fits(&*f, &layout) => (Buffer::lent(f, layout), Scratch {
                    slots: [first, None],
                }),
                second => {
                    log::debug!("scratch: allocating temporary for {layout}");
                    (Buffer::Owned(SpinorField::zeros(layout)), Scratch {
                        slots: [first, second],
                    })
                }
            },
        }
    }
}

fn fits(field: &SpinorField, layout: &FieldLayout) -> bool {
    field.layout().same_shape(layout) && field.data().len() >= layout.len()
}

/// A temporary: borrowed from the caller or owned by the call.
#[derive(Debug)]
pub(crate) enum Buffer<'a> {
    Lent(SpinorViewMut<'a>),
    Owned(SpinorField),
}

impl<'a> Buffer<'a> {
    fn lent(field: &'a mut SpinorField, layout: FieldLayout) -> Self {
        match field.view_as_mut(layout) {
            Some(view) => Self::Lent(view),
            None => Self::Owned(SpinorField::zeros(layout)),
        }
    }

    pub(crate) fn view_mut(&mut self) -> SpinorViewMut<'_> {
        match self {
            Self::Lent(v) => v.reborrow(),
            Self::Owned(f) => f.view_mut(),
        }
    }

    pub(crate) fn view(&self) -> SpinorView<'_> {
        match self {
            Self::Lent(v) => v.as_view(),
            Self::Owned(f) => f.view(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn is_lent(&self) -> bool {
        matches!(self, Self::Lent(_))
    }
}
