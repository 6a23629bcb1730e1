//! One execution per key; concurrent callers share the result
//!
//! The first caller for a key becomes the leader and receives a [`FlightGuard`].
//! Later callers subscribe to the leader's broadcast. The registry entry is removed
//! before the result is sent, and also when the guard is dropped without a
//! result, in which case followers observe a closed channel.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Registry of in-flight executions
#[derive(Debug)]
pub struct SingleFlight<K, T>
where
    K: Eq + Hash,
{
    flights: Arc<DashMap<K, broadcast::Sender<T>>>,
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            flights: Arc::new(DashMap::new()),
        }
    }
}

impl<K, T> Clone for SingleFlight<K, T>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            flights: Arc::clone(&self.flights),
        }
    }
}

/// Role assigned by [`SingleFlight::join`]
#[derive(Debug)]
pub enum Flight<K, T>
where
    K: Eq + Hash,
{
    Leader(FlightGuard<K, T>),
    Follower(broadcast::Receiver<T>),
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lead the flight for `key`, or follow the one already running
    pub fn join(&self, key: K) -> Flight<K, T> {
        match self.flights.entry(key.clone()) {
            Entry::Occupied(entry) => Flight::Follower(entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (tx, _) = broadcast::channel(1);
                entry.insert(tx.clone());
                Flight::Leader(FlightGuard {
                    key,
                    flights: Arc::clone(&self.flights),
                    tx: Some(tx),
                })
            }
        }
    }

    /// Keys currently in flight
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    #[inline]
    #[must_use]
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.flights.contains_key(key)
    }
}

/// Leadership of one flight
#[derive(Debug)]
pub struct FlightGuard<K, T>
where
    K: Eq + Hash,
{
    key: K,
    flights: Arc<DashMap<K, broadcast::Sender<T>>>,
    tx: Option<broadcast::Sender<T>>,
}

impl<K, T> FlightGuard<K, T>
where
    K: Eq + Hash,
{
    /// Publish the result to every follower; returns how many received it
    pub fn complete(mut self, value: T) -> usize {
        let Some(tx) = self.tx.take() else {
            return 0;
        };
        self.release(&tx);
        tx.send(value).unwrap_or(0)
    }

    fn release(&self, tx: &broadcast::Sender<T>) {
        self.flights.remove_if(&self.key, |_, current| current.same_channel(tx));
    }
}

impl<K, T> Drop for FlightGuard<K, T>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            self.release(&tx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn followers_receive_leader_result() {
        let flights: SingleFlight<&str, u32> = SingleFlight::new();
        let Flight::Leader(guard) = flights.join("k") else {
            panic!("first caller must lead");
        };
        let Flight::Follower(mut a) = flights.join("k") else {
            panic!("second caller must follow");
        };
        let Flight::Follower(mut b) = flights.join("k") else {
            panic!("third caller must follow");
        };

        assert_eq!(guard.complete(7), 2);
        assert_eq!(a.recv().await.unwrap(), 7);
        assert_eq!(b.recv().await.unwrap(), 7);
        assert_eq!(flights.in_flight(), 0);
    }

    #[tokio::test]
    async fn dropped_leader_closes_followers() {
        let flights: SingleFlight<u8, u8> = SingleFlight::new();
        let leader = flights.join(1);
        let Flight::Follower(mut follower) = flights.join(1) else {
            panic!("expected follower");
        };
        drop(leader);

        assert!(matches!(follower.recv().await, Err(RecvError::Closed)));
        assert!(!flights.is_in_flight(&1));
        assert!(matches!(flights.join(1), Flight::Leader(_)));
    }

    #[test]
    fn distinct_keys_fly_independently() {
        let flights: SingleFlight<u8, u8> = SingleFlight::new();
        let _a = flights.join(1);
        let b = flights.join(2);
        assert!(matches!(b, Flight::Leader(_)));
        assert_eq!(flights.in_flight(), 2);
    }
}
