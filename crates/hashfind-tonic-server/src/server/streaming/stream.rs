use core::{
    pin::Pin,
    task::{Context, Poll},
};
use futures::Stream;
use hashfind_tonic_core::hashfind::CancelOnDrop;

pin_project_lite::pin_project! {
    /// A response stream that owns the drop guard of its search.
    ///
    /// tonic drops the response stream when the client disconnects, resets the
    /// call, or the stream has been fully written. Any of these sets the
    /// search's cancel flag.
    pub struct CancellableStream<S> {
        #[pin]
        inner: S,
        _guard: CancelOnDrop,
    }
}

impl<S> CancellableStream<S> {
    pub const fn new(inner: S, guard: CancelOnDrop) -> Self {
        Self {
            inner,
            _guard: guard,
        }
    }
}

impl<S: Stream> Stream for CancellableStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
