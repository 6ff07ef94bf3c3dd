//! Test doubles and common utilities for contract tests
//!
//! These doubles record what the manager asks of the name server side
//! without running `nsupdate`.

#![allow(dead_code)]

use bindman_core::error::{Error, Result};
use bindman_core::{DnsRecord, DnsUpdater, ManagerConfig, RecordManager, UpdateTransport};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// A DnsUpdater that counts calls and can be told to fail
#[derive(Default)]
pub struct MockDnsUpdater {
    add_count: AtomicUsize,
    update_count: AtomicUsize,
    removal_count: AtomicUsize,
    fail: AtomicBool,
}

impl MockDnsUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with an execution error
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn add_count(&self) -> usize {
        self.add_count.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_count.load(Ordering::SeqCst)
    }

    pub fn removal_count(&self) -> usize {
        self.removal_count.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::execution("exit status 2", "; Communication with server failed"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl DnsUpdater for MockDnsUpdater {
    async fn add_rr(&self, _record: &DnsRecord, _ttl: Duration) -> Result<()> {
        self.add_count.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    async fn update_rr(&self, _record: &DnsRecord, _ttl: Duration) -> Result<()> {
        self.update_count.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    async fn remove_rr(&self, _name: &str, _record_type: &str) -> Result<()> {
        self.removal_count.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }
}

/// An UpdateTransport that records every session script
#[derive(Default)]
pub struct RecordingTransport {
    scripts: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl UpdateTransport for RecordingTransport {
    async fn submit(&self, script: &str) -> Result<()> {
        self.scripts.lock().unwrap().push(script.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::execution(
                "nsupdate exited with exit status: 2",
                "update failed: REFUSED",
            ));
        }
        Ok(())
    }
}

/// Minimal valid configuration rooted at `base_path`
pub fn test_config(base_path: &Path, removal_delay: Duration) -> ManagerConfig {
    ManagerConfig::builder()
        .with_server("localhost")
        .with_key_file("Ktest.com.+157+50086.key")
        .with_zone("test.com")
        .with_base_path(base_path)
        .with_removal_delay(removal_delay)
        .build()
        .expect("test config is valid")
}

/// Manager backed by a MockDnsUpdater with `n` records `test<i>.test.com` A 0.0.0.0
pub async fn manager_with_records(
    base_path: &Path,
    removal_delay: Duration,
    n: usize,
) -> (RecordManager, Arc<MockDnsUpdater>, Vec<DnsRecord>) {
    let updater = Arc::new(MockDnsUpdater::new());
    let manager = RecordManager::new(test_config(base_path, removal_delay), updater.clone())
        .await
        .expect("manager construction succeeds");

    let mut records = Vec::new();
    for i in 0..n {
        let record = DnsRecord::new(format!("test{}.test.com", i), "A", "0.0.0.0");
        manager
            .add_dns_record(&record)
            .await
            .expect("adding a record succeeds");
        records.push(record);
    }

    (manager, updater, records)
}
