//! External driver contracts: the boundary between the core routing
//! engine and protocol-specific source/sink implementations.
//!
//! Source callbacks run on driver-owned threads and must not call back into
//! the router under a lock the caller is holding; `route()` is reentrant and
//! lock-free on its fast path, so a direct synchronous callback is the right
//! shape here rather than a future.

use crate::common::DataPoint;
use crate::error::Result;

/// Implemented by protocol drivers that produce [`DataPoint`]s.
pub trait DataSource: Send + Sync {
    fn id(&self) -> &str;
    fn start(&self) -> Result<()>;
    fn stop(&self);
    fn is_running(&self) -> bool;

    /// Installs the callback the source invokes for every produced point.
    fn set_callback(&self, callback: Box<dyn Fn(DataPoint) + Send + Sync>);

    fn add_address(&self, _address: &str) -> Result<()> {
        Err(crate::error::BridgeError::NotImplemented("add_address".into()))
    }

    fn remove_address(&self, _address: &str) -> Result<()> {
        Err(crate::error::BridgeError::NotImplemented(
            "remove_address".into(),
        ))
    }

    fn addresses(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Implemented by output drivers that consume [`DataPoint`]s.
pub trait DataSink: Send + Sync {
    fn id(&self) -> &str;
    fn start(&self) -> Result<()>;
    fn stop(&self);
    fn is_running(&self) -> bool;
    fn is_healthy(&self) -> bool;

    fn send(&self, data_point: DataPoint) -> Result<()>;

    /// Default implementation loops over `send`; sinks with native batch
    /// support (e.g. a single network write) should override this.
    fn send_batch(&self, data_points: &[DataPoint]) -> Result<()> {
        for dp in data_points {
            self.send(dp.clone())?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn max_batch_size(&self) -> usize {
        1
    }

    fn can_accept_data(&self) -> bool {
        self.is_running() && self.is_healthy()
    }

    fn pending_count(&self) -> usize {
        0
    }
}
