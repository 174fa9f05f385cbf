//! Trailing-edge debounce driven by the host's poll tick.
//!
//! Each key keeps only its latest value and a deadline that moves forward on
//! every push. [`Debouncer::poll`] hands back the values whose quiet window has
//! elapsed. No timers are owned here: the UI thread already ticks, and firing
//! from that tick keeps every handler on the one dispatch thread.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Quiet window applied to profile field edits.
pub const FIELD_EDIT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
struct Pending<V> {
    deadline: Instant,
    value: V,
}

#[derive(Debug)]
pub struct Debouncer<K, V> {
    wait: Duration,
    pending: HashMap<K, Pending<V>>,
}

impl<K, V> Debouncer<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: HashMap::new(),
        }
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Record a call at `now`, superseding any pending value for `key`.
    pub fn push(&mut self, key: K, value: V, now: Instant) {
        self.pending.insert(
            key,
            Pending {
                deadline: now + self.wait,
                value,
            },
        );
    }

    /// Values whose window elapsed by `now`, earliest deadline first.
    pub fn poll(&mut self, now: Instant) -> Vec<(K, V)> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut fired: Vec<(Instant, K, V)> = due
            .into_iter()
            .filter_map(|key| {
                self.pending
                    .remove(&key)
                    .map(|pending| (pending.deadline, key, pending.value))
            })
            .collect();
        fired.sort_by_key(|(deadline, _, _)| *deadline);
        fired.into_iter().map(|(_, key, value)| (key, value)).collect()
    }

    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|pending| pending.value)
    }

    /// Drop every pending key matching `predicate`.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&K) -> bool) {
        self.pending.retain(|key, _| !predicate(key));
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn burst_collapses_into_one_trailing_call() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(FIELD_EDIT_DEBOUNCE);
        let mut fired = Vec::new();

        let keystrokes = [(0, "a"), (100, "ab"), (200, "abc"), (600, "abcd")];
        let mut keys = keystrokes.iter().peekable();
        for tick in (0..=2000).step_by(10) {
            let now = t0 + ms(tick);
            while let Some((at, value)) = keys.peek()
                && *at == tick
            {
                debouncer.push("nickname", value.to_string(), now);
                keys.next();
            }
            for (key, value) in debouncer.poll(now) {
                fired.push((tick, key, value));
            }
        }

        assert_eq!(fired, vec![(1100, "nickname", "abcd".to_owned())]);
    }

    #[test]
    fn does_not_fire_before_the_window_closes() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(ms(500));
        debouncer.push(1, "x", t0);
        assert!(debouncer.poll(t0 + ms(499)).is_empty());
        assert_eq!(debouncer.poll(t0 + ms(500)), vec![(1, "x")]);
        assert!(debouncer.poll(t0 + ms(5000)).is_empty());
    }

    #[test]
    fn keys_settle_independently_in_deadline_order() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(ms(500));
        debouncer.push("b", 2, t0 + ms(50));
        debouncer.push("a", 1, t0);
        assert_eq!(debouncer.next_deadline(), Some(t0 + ms(500)));
        assert_eq!(debouncer.poll(t0 + ms(600)), vec![("a", 1), ("b", 2)]);
    }

    #[test]
    fn cancel_where_drops_matching_keys() {
        let t0 = Instant::now();
        let mut debouncer = Debouncer::new(ms(500));
        debouncer.push((7, 'n'), "x", t0);
        debouncer.push((7, 'u'), "y", t0);
        debouncer.push((8, 'n'), "z", t0);
        debouncer.cancel_where(|(id, _)| *id == 7);
        assert_eq!(debouncer.len(), 1);
        assert!(debouncer.is_pending(&(8, 'n')));
    }
}
