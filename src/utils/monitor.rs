#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// 單一階段 (extract / transform / load) 的耗時與記憶體
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_mb: Option<u64>,
}

#[cfg(feature = "cli")]
pub struct RunMonitor {
    enabled: bool,
    started: Instant,
    phase_started: Mutex<Instant>,
    system: Mutex<System>,
    pid: Option<Pid>,
    phases: Mutex<Vec<PhaseStats>>,
}

#[cfg(feature = "cli")]
impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            started: now,
            phase_started: Mutex::new(now),
            system: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
            phases: Mutex::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn current_memory_mb(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(pid).map(|p| p.memory() / 1024 / 1024)
    }

    /// 結束目前階段並記錄，下一階段從現在開始計時
    pub fn finish_phase(&self, phase: &str) {
        if !self.enabled {
            return;
        }

        let elapsed = match self.phase_started.lock() {
            Ok(mut started) => {
                let elapsed = started.elapsed();
                *started = Instant::now();
                elapsed
            }
            Err(_) => return,
        };

        let stats = PhaseStats {
            phase: phase.to_string(),
            elapsed,
            memory_mb: self.current_memory_mb(),
        };

        match stats.memory_mb {
            Some(mb) => tracing::info!("📊 {} took {:?} (memory: {}MB)", phase, elapsed, mb),
            None => tracing::info!("📊 {} took {:?}", phase, elapsed),
        }

        if let Ok(mut phases) = self.phases.lock() {
            phases.push(stats);
        }
    }

    pub fn phases(&self) -> Vec<PhaseStats> {
        self.phases
            .lock()
            .map(|phases| phases.clone())
            .unwrap_or_default()
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self
            .phases()
            .iter()
            .filter_map(|p| p.memory_mb)
            .max()
            .unwrap_or(0);
        tracing::info!(
            "📊 Run finished in {:?}, peak memory {}MB",
            self.started.elapsed(),
            peak
        );
    }
}

#[cfg(feature = "cli")]
impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct RunMonitor;

#[cfg(not(feature = "cli"))]
impl RunMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn finish_phase(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}
}
