use std::iter::FusedIterator;

pub mod fmt;
#[cfg(test)]
pub(crate) mod test_utils;

/// Adds [`through`](IterExt::through) to every iterator.
pub trait IterExt: Iterator + Sized {
    /// Yields items up to and including the first one matching `last`, then
    /// stops. Useful to bound infinite iterators such as the lexer.
    fn through<P>(self, last: P) -> Through<Self, P>
    where
        P: FnMut(&Self::Item) -> bool,
    {
        Through {
            inner: Some(self),
            last,
        }
    }
}

impl<I: Iterator> IterExt for I {}

pub struct Through<I, P> {
    /// Dropped once the final item was yielded.
    inner: Option<I>,
    last: P,
}

impl<I, P> Iterator for Through<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let item = self.inner.as_mut()?.next();
        match &item {
            Some(item) if !(self.last)(item) => {}
            _ => self.inner = None,
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Some(inner) => (0, inner.size_hint().1),
            None => (0, Some(0)),
        }
    }
}

impl<I, P> FusedIterator for Through<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
}
