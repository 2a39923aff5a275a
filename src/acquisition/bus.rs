//! Shared sensor bus: the physical port and the latest-sample cache under one lock

use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::{BusError, SensorPort};
use crate::types::{SensorSample, SensorSnapshot, VibrationMagnitude};

struct BusInner {
    port: Box<dyn SensorPort>,
    latest: Option<SensorSnapshot>,
}

/// Exclusive-access guard around the accelerometer and the shared state.
///
/// Every operation acquires the same mutex with the configured bounded wait
/// and returns [`BusError::Contended`] instead of blocking past it. Snapshots
/// are copied out whole, so a reader never sees a half-written sample.
pub struct SensorBus {
    inner: Mutex<BusInner>,
    gravity: f64,
    lock_timeout: Duration,
}

impl SensorBus {
    pub fn new(port: Box<dyn SensorPort>, gravity: f64, lock_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(BusInner { port, latest: None }),
            gravity,
            lock_timeout,
        }
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    async fn lock(&self) -> Result<tokio::sync::MutexGuard<'_, BusInner>, BusError> {
        tokio::time::timeout(self.lock_timeout, self.inner.lock())
            .await
            .map_err(|_| BusError::Contended {
                waited_ms: self.lock_timeout.as_millis() as u64,
            })
    }

    /// Copy out the latest snapshot. `Ok(None)` until the first write.
    pub async fn try_read(&self) -> Result<Option<SensorSnapshot>, BusError> {
        let guard = self.lock().await?;
        Ok(guard.latest)
    }

    /// Replace the cached snapshot entirely.
    pub async fn write(&self, sample: SensorSample) -> Result<(), BusError> {
        let snapshot = SensorSnapshot::from_sample(sample, self.gravity);
        let mut guard = self.lock().await?;
        guard.latest = Some(snapshot);
        Ok(())
    }

    /// Read the port and publish the result to the shared state, under one
    /// acquisition. A failed read leaves the previous snapshot untouched.
    pub async fn sample(&self) -> Result<SensorSnapshot, BusError> {
        let mut guard = self.lock().await?;
        let sample = match guard.port.read() {
            Ok(sample) => sample,
            Err(e) => {
                debug!(port = guard.port.port_name(), error = %e, "Sensor read failed, keeping stale snapshot");
                return Err(e.into());
            }
        };
        let snapshot = SensorSnapshot::from_sample(sample, self.gravity);
        guard.latest = Some(snapshot);
        trace!(magnitude = %snapshot.magnitude, "Shared sensor state updated");
        Ok(snapshot)
    }

    /// Read one magnitude for a spectrum capture. The shared state is not touched.
    pub async fn read_magnitude(&self) -> Result<VibrationMagnitude, BusError> {
        let mut guard = self.lock().await?;
        let sample = guard.port.read()?;
        Ok(sample.magnitude(self.gravity))
    }
}
