//! Pass-through sink that notes whether anything was written through it.
//!
//! A `WriteTracker` sits between a child's output pipe and the real
//! stdout/stderr. Bytes are handed to the destination unchanged and in
//! order; the only side effect is the `wrote` flag.
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// One watched output stream.
#[derive(Debug)]
pub struct WriteTracker<W> {
    destination: W,
    watched: bool,
    wrote: bool,
}

impl<W> WriteTracker<W> {
    /// Wrap `destination`. `watched` selects whether a write counts as failure.
    pub fn new(destination: W, watched: bool) -> Self {
        Self {
            destination,
            watched,
            wrote: false,
        }
    }

    /// True once at least one non-empty chunk has passed through.
    pub fn wrote(&self) -> bool {
        self.wrote
    }

    /// True if this stream is watched and was written to.
    pub fn failed(&self) -> bool {
        self.watched && self.wrote
    }

    /// Give back the wrapped destination.
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.destination
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for WriteTracker<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if !buf.is_empty() {
            this.wrote = true;
        }
        Pin::new(&mut this.destination).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().destination).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().destination).poll_shutdown(cx)
    }
}

/// Copy `source` into `tracker` until EOF, then flush.
///
/// Returns the tracker so its flags can be read once the stream is done,
/// along with the number of bytes relayed.
pub async fn relay<R, W>(
    mut source: R,
    mut tracker: WriteTracker<W>,
) -> io::Result<(WriteTracker<W>, u64)>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let bytes = tokio::io::copy(&mut source, &mut tracker).await?;
    tracker.flush().await?;
    Ok((tracker, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Destination that rejects every write with a broken pipe.
    #[derive(Debug)]
    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn test_new_tracker_has_not_written() {
        let tracker = WriteTracker::new(Vec::<u8>::new(), true);
        assert!(!tracker.wrote());
        assert!(!tracker.failed());
    }

    #[tokio::test]
    async fn test_write_forwards_bytes_and_sets_flag() {
        let mut tracker = WriteTracker::new(Vec::<u8>::new(), true);
        let n = tracker.write(b"hello\n").await.unwrap();
        assert_eq!(n, 6);
        assert!(tracker.wrote());
        assert!(tracker.failed());
        assert_eq!(tracker.into_inner(), b"hello\n");
    }

    #[tokio::test]
    async fn test_empty_write_does_not_set_flag() {
        let mut tracker = WriteTracker::new(Vec::<u8>::new(), true);
        let n = tracker.write(b"").await.unwrap();
        assert_eq!(n, 0);
        assert!(!tracker.wrote());
        assert!(!tracker.failed());
    }

    #[tokio::test]
    async fn test_unwatched_stream_never_fails() {
        let mut tracker = WriteTracker::new(Vec::<u8>::new(), false);
        tracker.write_all(b"noise").await.unwrap();
        assert!(tracker.wrote());
        assert!(!tracker.failed());
        assert_eq!(tracker.into_inner(), b"noise");
    }

    #[tokio::test]
    async fn test_flag_stays_set_after_empty_write() {
        let mut tracker = WriteTracker::new(Vec::<u8>::new(), true);
        tracker.write_all(b"x").await.unwrap();
        tracker.write(b"").await.unwrap();
        assert!(tracker.wrote());
    }

    #[tokio::test]
    async fn test_destination_error_propagates() {
        let mut tracker = WriteTracker::new(BrokenPipe, true);
        let err = tracker.write(b"data").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        // The attempt still counts as a write.
        assert!(tracker.wrote());
    }

    #[tokio::test]
    async fn test_relay_copies_everything_in_order() {
        let input: &[u8] = b"line one\nline two\n\x00\xffbinary";
        let tracker = WriteTracker::new(Vec::<u8>::new(), true);
        let (tracker, bytes) = relay(input, tracker).await.unwrap();
        assert_eq!(bytes, input.len() as u64);
        assert!(tracker.failed());
        assert_eq!(tracker.into_inner(), input);
    }

    #[tokio::test]
    async fn test_relay_empty_source_leaves_flag_clear() {
        let input: &[u8] = b"";
        let tracker = WriteTracker::new(Vec::<u8>::new(), true);
        let (tracker, bytes) = relay(input, tracker).await.unwrap();
        assert_eq!(bytes, 0);
        assert!(!tracker.wrote());
        assert!(tracker.into_inner().is_empty());
    }

    #[tokio::test]
    async fn test_relay_surfaces_destination_error() {
        let input: &[u8] = b"data";
        let tracker = WriteTracker::new(BrokenPipe, false);
        let err = relay(input, tracker).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
