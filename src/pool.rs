//! C10: the connection pool (spec §4.8).
//!
//! A host-keyed, bounded LRU of idle connections. Grounded on the pooling
//! role `penumbra-x-rquest/src/client/conn.rs` plays atop hyper's own
//! pool, reimplemented directly here since specter owns the socket
//! lifecycle end to end instead of delegating to `hyper::Client`'s pool.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::conn::Conn;

/// The pool key: `(scheme, host, port, proxy)` (spec §3, §4.8, §8 property
/// 8: acquiring with keys differing in any field never yields the same
/// connection).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub proxy: Option<String>,
}

struct Bucket {
    idle: Vec<Conn>,
}

/// Bounded per-host idle connection pool. Internal bookkeeping is
/// serialized behind a `Mutex`; each handed-out [`Conn`] has unique
/// ownership until the caller calls [`Pool::release`] or drops it (spec
/// §4.8, §5 "Connection pool").
pub struct Pool {
    max_idle_per_host: usize,
    buckets: Mutex<HashMap<PoolKey, Bucket>>,
}

impl Pool {
    pub fn new(max_idle_per_host: usize) -> Pool {
        Pool {
            max_idle_per_host,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Pops any non-closed idle connection for `key`, or `None` if the
    /// bucket is empty (the caller then dials a fresh one).
    pub fn acquire(&self, key: &PoolKey) -> Option<Conn> {
        let mut buckets = self.buckets.lock().expect("pool mutex poisoned");
        let bucket = buckets.get_mut(key)?;
        while let Some(conn) = bucket.idle.pop() {
            if !conn.is_closed() {
                log::debug!("pool: reusing connection for {}:{}", key.host, key.port);
                return Some(conn);
            }
        }
        None
    }

    /// Returns `conn` to the pool, unless it is closed or the bucket is
    /// already at capacity, in which case it is dropped (closing it).
    pub fn release(&self, key: PoolKey, conn: Conn) {
        if conn.is_closed() {
            return;
        }
        let mut buckets = self.buckets.lock().expect("pool mutex poisoned");
        let bucket = buckets.entry(key).or_insert_with(|| Bucket { idle: Vec::new() });
        if bucket.idle.len() >= self.max_idle_per_host {
            log::debug!("pool: bucket full, closing connection instead of pooling");
            return;
        }
        bucket.idle.push(conn);
    }

    /// Closes every pooled connection and clears the map.
    pub fn close(&self) {
        let mut buckets = self.buckets.lock().expect("pool mutex poisoned");
        for bucket in buckets.values_mut() {
            for conn in bucket.idle.drain(..) {
                conn.close();
            }
        }
        buckets.clear();
    }

    #[cfg(test)]
    fn idle_len(&self, key: &PoolKey) -> usize {
        self.buckets
            .lock()
            .unwrap()
            .get(key)
            .map(|b| b.idle.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::Conn;

    fn key(host: &str) -> PoolKey {
        PoolKey {
            scheme: "https".to_string(),
            host: host.to_string(),
            port: 443,
            proxy: None,
        }
    }

    #[test]
    fn different_keys_never_share_a_connection() {
        let pool = Pool::new(4);
        pool.release(key("a.example"), Conn::test_placeholder());
        assert!(pool.acquire(&key("b.example")).is_none());
        assert!(pool.acquire(&key("a.example")).is_some());
    }

    #[test]
    fn bucket_bound_closes_overflow_instead_of_pooling() {
        let pool = Pool::new(1);
        pool.release(key("a.example"), Conn::test_placeholder());
        pool.release(key("a.example"), Conn::test_placeholder());
        assert_eq!(pool.idle_len(&key("a.example")), 1);
    }

    #[test]
    fn closed_connection_is_never_returned() {
        let pool = Pool::new(4);
        let conn = Conn::test_placeholder();
        conn.close();
        pool.release(key("a.example"), conn);
        assert!(pool.acquire(&key("a.example")).is_none());
    }
}
