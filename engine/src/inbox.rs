use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Marshals values from any number of producers onto one consuming context.
///
/// Producers hold an [`Outbox`]; the consumer owns the only [`Inbox`] and is
/// the sole place values are handled, so handling never overlaps.
pub fn channel<T>() -> (Outbox<T>, Inbox<T>) {
    let (tx, rx) = unbounded_channel();
    (Outbox { tx }, Inbox { rx })
}

#[derive(Debug)]
pub struct Outbox<T> {
    tx: UnboundedSender<T>,
}

impl<T> Clone for Outbox<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> Outbox<T> {
    /// Returns `false` once the inbox is closed or dropped; the value is lost.
    pub fn send(&self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
pub struct Inbox<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> Inbox<T> {
    pub fn try_next(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Hands every queued value to `handle`, in arrival order.
    pub fn drain(&mut self, mut handle: impl FnMut(T)) -> usize {
        let mut handled = 0;
        while let Some(value) = self.try_next() {
            handle(value);
            handled += 1;
        }
        handled
    }

    /// Waits for the next value. `None` once every outbox is gone and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stops accepting values and throws away whatever was still queued.
    pub fn close_and_discard(&mut self) -> usize {
        self.rx.close();
        let mut discarded = 0;
        while self.try_next().is_some() {
            discarded += 1;
        }
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_order_across_producers() {
        let (a, mut inbox) = channel();
        let b = a.clone();
        a.send(1);
        b.send(2);
        a.send(3);

        let mut seen = Vec::new();
        assert_eq!(inbox.drain(|v| seen.push(v)), 3);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(inbox.try_next(), None);
    }

    #[test]
    fn close_discards_queue_and_rejects_new_values() {
        let (outbox, mut inbox) = channel();
        outbox.send("a");
        outbox.send("b");

        assert_eq!(inbox.close_and_discard(), 2);
        assert!(outbox.is_closed());
        assert!(!outbox.send("c"));
        assert_eq!(inbox.try_next(), None);
    }

    #[tokio::test]
    async fn recv_ends_when_producers_are_dropped() {
        let (outbox, mut inbox) = channel();
        outbox.send(7u8);
        drop(outbox);

        assert_eq!(inbox.recv().await, Some(7));
        assert_eq!(inbox.recv().await, None);
    }
}
