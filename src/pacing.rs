//! Cooperative pacing between extraction batches.
//!
//! Pacing only ever delays work; it never changes what is extracted.

use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use sysinfo::System;

use crate::config::PacingConfig;
use crate::error::Result;

/// Blocks until the caller may start the next batch of work.
pub trait Pacer: Send + Sync {
    /// Wait until resources are available. Returns immediately if they are.
    fn wait_until_available(&self);
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

impl Pacer for NoopPacer {
    fn wait_until_available(&self) {}
}

/// Sleeps while host CPU or memory usage sits above the configured thresholds.
pub struct SystemLoadPacer {
    config: PacingConfig,
    system: Mutex<System>,
}

impl std::fmt::Debug for SystemLoadPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemLoadPacer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SystemLoadPacer {
    /// Create a pacer with the given thresholds.
    pub fn new(config: PacingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            system: Mutex::new(System::new()),
        })
    }

    /// Current (CPU %, memory %) of the host.
    pub fn sample(&self) -> (f32, f32) {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // CPU usage is a delta between two refreshes.
        system.refresh_cpu();
        thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_cpu();
        system.refresh_memory();

        let cpu = system.global_cpu_info().cpu_usage();
        let total = system.total_memory();
        let memory = if total == 0 {
            0.0
        } else {
            (system.used_memory() as f64 / total as f64 * 100.0) as f32
        };
        (cpu, memory)
    }

    fn overloaded(&self, cpu: f32, memory: f32) -> bool {
        cpu > self.config.cpu_threshold || memory > self.config.memory_threshold
    }
}

impl Pacer for SystemLoadPacer {
    fn wait_until_available(&self) {
        let started = Instant::now();
        loop {
            let (cpu, memory) = self.sample();
            if !self.overloaded(cpu, memory) {
                return;
            }
            if let Some(max_wait) = self.config.max_wait() {
                if started.elapsed() >= max_wait {
                    log::warn!(
                        "Host still busy after {:?} (CPU {:.1}%, memory {:.1}%), continuing",
                        max_wait,
                        cpu,
                        memory
                    );
                    return;
                }
            }
            log::debug!("Host busy (CPU {:.1}%, memory {:.1}%), waiting", cpu, memory);
            thread::sleep(self.config.check_interval());
        }
    }
}
