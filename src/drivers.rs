//! In-process console driver pair: the only `DataSource`/`DataSink`
//! implementations shipped in-tree, used to exercise the router end to end
//! from the demo binary. Real protocol drivers are out of scope.

use crate::common::{DataPoint, Value};
use crate::error::Result;
use crate::interfaces::{DataSink, DataSource};
use parking_lot::Mutex;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::info;

/// Reads whitespace-separated `address value` pairs from stdin, one per
/// line, and emits a `DataPoint` with a string value for each.
type Callback = Box<dyn Fn(DataPoint) + Send + Sync>;

pub struct ConsoleSource {
    id: String,
    callback: Arc<Mutex<Option<Callback>>>,
    running: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleSource {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(ConsoleSource {
            id: id.into(),
            callback: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        })
    }
}

impl DataSource for ConsoleSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let running = Arc::clone(&self.running);
        let callback = Arc::clone(&self.callback);
        let handle = std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if !running.load(Ordering::Acquire) {
                    break;
                }
                let Ok(line) = line else { break };
                let mut parts = line.trim().splitn(2, char::is_whitespace);
                let address = parts.next().unwrap_or("").trim();
                if address.is_empty() {
                    continue;
                }
                let value = parts.next().unwrap_or("").trim().to_string();
                let dp = DataPoint::new(address, Value::String(value));
                if let Some(cb) = callback.lock().as_ref() {
                    cb(dp);
                }
            }
        });
        *self.reader.lock() = Some(handle);
        Ok(())
    }

    /// Signals the reader thread to stop. Doesn't join it: the thread is
    /// blocked on a line read from stdin and won't observe the flag until
    /// the next line (or EOF) arrives, which may never happen.
    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.reader.lock().take();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn set_callback(&self, callback: Callback) {
        *self.callback.lock() = Some(callback);
    }
}

/// Logs every received `DataPoint` at info level. `start`/`stop` are no-ops;
/// the sink is always healthy.
pub struct ConsoleSink {
    id: String,
    running: AtomicBool,
}

impl ConsoleSink {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(ConsoleSink {
            id: id.into(),
            running: AtomicBool::new(false),
        })
    }
}

impl DataSink for ConsoleSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn send(&self, data_point: DataPoint) -> Result<()> {
        info!(
            address = data_point.address(),
            value = ?data_point.value(),
            quality = ?data_point.quality(),
            "{} <- data point",
            self.id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_sink_logs_without_error() {
        let sink = ConsoleSink::new("console");
        sink.start().unwrap();
        assert!(sink.is_healthy());
        assert!(sink.send(DataPoint::new("x", Value::I32(1))).is_ok());
        sink.stop();
        assert!(!sink.is_running());
    }

    #[test]
    fn console_source_starts_and_stops_idempotently() {
        let source = ConsoleSource::new("console");
        source.set_callback(Box::new(|_| {}));
        source.start().unwrap();
        assert!(source.is_running());
        source.stop();
        assert!(!source.is_running());
    }
}
