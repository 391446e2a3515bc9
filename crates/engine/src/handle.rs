//! Destroyable, validating front end to an [`Engine`].
//!
//! [`EngineHandle`] is what callers outside the crate normally hold. It
//! accepts caller-width integers and text addresses, validates them, and
//! keeps working (returning [`Error::InvalidHandle`]) after it has been
//! destroyed.
//!
//! ```text
//!   score ops ─────────► RwLock::read  ─┐
//!   clear / load / destroy ► RwLock::write ├─► Option<Engine>
//! ```
//!
//! Score operations only share the read side, so they run fully in
//! parallel; the engine's own block guards do the fine-grained exclusion.

use block::Score;
use bulk::BulkStats;
use config::Config;
use parking_lot::RwLock;
use std::path::Path;
use tracing::debug;

use crate::{Engine, Error, Result};

pub struct EngineHandle {
    inner: RwLock<Option<Engine>>,
    reject_bogons: bool,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("engine", &*self.inner.read())
            .field("reject_bogons", &self.reject_bogons)
            .finish()
    }
}

impl EngineHandle {
    /// Creates a handle around a fresh engine with default settings.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the engine cannot be allocated.
    pub fn create() -> Result<Self> {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Result<Self> {
        Ok(Self {
            inner: RwLock::new(Some(Engine::with_config(config)?)),
            reject_bogons: config.reject_bogons,
        })
    }

    /// Wraps an existing engine.
    pub fn from_engine(engine: Engine) -> Self {
        Self {
            inner: RwLock::new(Some(engine)),
            reject_bogons: false,
        }
    }

    /// Turns bogon rejection for text addresses on or off.
    #[must_use]
    pub fn reject_bogons(mut self, on: bool) -> Self {
        self.reject_bogons = on;
        self
    }

    /// Releases the engine. Calling it again is a no-op.
    pub fn destroy(&self) {
        if self.inner.write().take().is_some() {
            debug!("engine handle destroyed");
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.inner.read().is_some()
    }

    // -------------------- Text addresses --------------------

    pub fn get(&self, ip: &str) -> Result<i32> {
        let addr = self.parse(ip)?;
        self.get_u32(addr)
    }

    pub fn get_ex(&self, ip: &str) -> Result<Option<i32>> {
        let addr = self.parse(ip)?;
        self.get_ex_u32(addr)
    }

    pub fn set(&self, ip: &str, value: i32) -> Result<i32> {
        let addr = self.parse(ip)?;
        self.set_u32(addr, value)
    }

    pub fn increment(&self, ip: &str, delta: i32) -> Result<i32> {
        let addr = self.parse(ip)?;
        self.increment_u32(addr, delta)
    }

    pub fn decrement(&self, ip: &str, delta: i32) -> Result<i32> {
        let addr = self.parse(ip)?;
        self.decrement_u32(addr, delta)
    }

    pub fn delete(&self, ip: &str) -> Result<bool> {
        let addr = self.parse(ip)?;
        self.delete_u32(addr)
    }

    // -------------------- Raw addresses --------------------

    pub fn get_u32(&self, addr: u32) -> Result<i32> {
        self.with(|e| Ok(e.get(addr).into()))
    }

    pub fn get_ex_u32(&self, addr: u32) -> Result<Option<i32>> {
        self.with(|e| Ok(e.get_ex(addr).map(i32::from)))
    }

    /// Returns the previous score.
    pub fn set_u32(&self, addr: u32, value: i32) -> Result<i32> {
        let value = score_arg("score", value)?;
        self.with(|e| e.set(addr, value).map(i32::from))
    }

    /// Returns the new score.
    pub fn increment_u32(&self, addr: u32, delta: i32) -> Result<i32> {
        let delta = score_arg("delta", delta)?;
        self.with(|e| e.increment(addr, delta).map(i32::from))
    }

    pub fn decrement_u32(&self, addr: u32, delta: i32) -> Result<i32> {
        let delta = score_arg("delta", delta)?;
        self.with(|e| e.decrement(addr, delta).map(i32::from))
    }

    pub fn delete_u32(&self, addr: u32) -> Result<bool> {
        self.with(|e| Ok(e.delete(addr)))
    }

    // -------------------- Bulk & maintenance --------------------

    pub fn bulk_load_file<P: AsRef<Path>>(&self, path: P) -> Result<BulkStats> {
        self.with(|e| e.bulk_load_file(path))
    }

    pub fn bulk_load_buffer(&self, data: &[u8]) -> Result<BulkStats> {
        self.with(|e| e.bulk_load_buffer(data))
    }

    pub fn decay(&self, factor: f64, deadzone: u16) -> Result<u64> {
        self.with(|e| e.decay(factor, deadzone))
    }

    pub fn clear(&self) -> Result<()> {
        self.with_mut(|e| {
            e.clear();
            Ok(())
        })
    }

    pub fn count(&self) -> Result<u64> {
        self.with(|e| Ok(e.count()))
    }

    pub fn block_count(&self) -> Result<usize> {
        self.with(|e| Ok(e.block_count()))
    }

    pub fn memory_usage(&self) -> Result<usize> {
        self.with(|e| Ok(e.memory_usage()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        self.with(|e| e.save(path))
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        self.with_mut(|e| e.load(path))
    }

    /// Runs `f` against the engine under the shared lock. `f` must not call
    /// back into the handle: a queued writer would deadlock it.
    pub(crate) fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Engine) -> Result<T>,
    {
        match self.inner.read().as_ref() {
            Some(engine) => f(engine),
            None => Err(Error::InvalidHandle),
        }
    }

    fn with_mut<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> Result<T>,
    {
        match self.inner.write().as_mut() {
            Some(engine) => f(engine),
            None => Err(Error::InvalidHandle),
        }
    }

    fn parse(&self, ip: &str) -> Result<u32> {
        let addr = addr::parse_ipv4(ip)
            .map_err(|e| Error::InvalidArgument(format!("address {ip:?}: {e}")))?;
        if self.reject_bogons && addr::is_bogon(addr) {
            return Err(Error::Bogon(addr));
        }
        Ok(addr)
    }
}

fn score_arg(what: &str, value: i32) -> Result<Score> {
    Score::try_from(value).map_err(|e| Error::InvalidArgument(format!("{what}: {e}")))
}
