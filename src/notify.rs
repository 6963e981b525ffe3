//! Booking lifecycle events.
//!
//! A tokio broadcast channel decouples state changes from their consumers
//! (notification senders, audit sinks). Publishing never fails the
//! operation that produced the event: if nobody is listening the event is
//! dropped, and a lagging subscriber only loses its own backlog.

use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum BookingEvent {
    /// Advance payment reconciled; the booking is confirmed.
    Confirmed {
        booking_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
    },
    /// Booking cancelled, with any refund owed.
    Cancelled {
        booking_id: Uuid,
        user_id: Uuid,
        refund_amount: Option<Decimal>,
    },
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<BookingEvent>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget: an event with no subscribers is simply dropped.
    pub fn publish(&self, event: BookingEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!(?event, "no subscribers for booking event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();

        let id = Uuid::new_v4();
        notifier.publish(BookingEvent::Confirmed {
            booking_id: id,
            user_id: Uuid::new_v4(),
            amount: dec!(1500),
        });

        match rx.recv().await.unwrap() {
            BookingEvent::Confirmed { booking_id, amount, .. } => {
                assert_eq!(booking_id, id);
                assert_eq!(amount, dec!(1500));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let notifier = Notifier::default();
        notifier.publish(BookingEvent::Cancelled {
            booking_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refund_amount: None,
        });
    }
}
