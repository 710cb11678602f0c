//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall; mlockall elsewhere).

use crate::cli::{RtArgs, RtLock};

/// Lock process memory according to `lock`. Falls back from `All` to
/// `Current` when the larger lock is refused.
#[cfg(unix)]
fn apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    fn lock_with(flags: libc::c_int) -> std::io::Result<()> {
        let rc = unsafe { mlockall(flags) };
        if rc != 0 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    let result = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => lock_with(MCL_CURRENT),
        RtLock::All => lock_with(MCL_CURRENT | MCL_FUTURE).or_else(|e| {
            tracing::debug!(error = %e, "mlockall(current|future) refused, trying current");
            lock_with(MCL_CURRENT)
        }),
    };
    result.map_err(|e| {
        eyre::eyre!("mlockall failed: {e}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'")
    })
}

#[cfg(target_os = "linux")]
fn apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param, sched_setscheduler};

    let (min, max) = unsafe {
        let min = sched_get_priority_min(SCHED_FIFO);
        let max = sched_get_priority_max(SCHED_FIFO);
        if min < 0 || max < 0 { (1, 99) } else { (min, max) }
    };
    let prio_val = prio.unwrap_or(max).clamp(min, max);
    let param = sched_param {
        sched_priority: prio_val,
    };
    let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        eyre::bail!("sched_setscheduler(SCHED_FIFO, {prio_val}) failed: {err}; hint: needs CAP_SYS_NICE or root");
    }
    Ok(prio_val)
}

#[cfg(target_os = "linux")]
fn apply_affinity(cpu: usize) -> eyre::Result<()> {
    let max_bits = std::mem::size_of::<libc::cpu_set_t>() * 8;
    if cpu >= max_bits {
        eyre::bail!("requested CPU {cpu} exceeds cpu_set_t capacity {max_bits}");
    }
    let online = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if online < 1 || cpu as libc::c_long >= online {
        eyre::bail!("requested CPU {cpu} >= online {online}");
    }
    let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
    unsafe {
        libc::CPU_ZERO(&mut desired);
        libc::CPU_SET(cpu, &mut desired);
    }
    let rc = unsafe { libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &desired) };
    if rc != 0 {
        Err(eyre::eyre!(std::io::Error::last_os_error()))
    } else {
        Ok(())
    }
}

/// Apply the requested real-time settings once per process. Failures are
/// logged and the loop keeps running with normal scheduling.
pub fn setup_rt_once(args: &RtArgs) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !args.rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        let lock = args.rt_lock.unwrap_or_else(RtLock::os_default);

        #[cfg(unix)]
        {
            match apply_mem_lock(lock) {
                Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
                Err(err) => tracing::warn!(%err, "RT: memory lock not applied"),
            }
        }

        #[cfg(target_os = "linux")]
        {
            match apply_fifo_priority(args.rt_prio) {
                Ok(prio) => tracing::info!(prio, "RT: SCHED_FIFO enabled"),
                Err(err) => tracing::warn!(%err, "RT: priority not applied"),
            }
            let cpu = args.rt_cpu.unwrap_or(0);
            match apply_affinity(cpu) {
                Ok(()) => tracing::info!(cpu, "RT: pinned to CPU"),
                Err(err) => tracing::warn!(%err, "RT: affinity not applied"),
            }
        }

        #[cfg(not(target_os = "linux"))]
        tracing::warn!(
            prio = ?args.rt_prio,
            cpu = ?args.rt_cpu,
            ?lock,
            "RT: SCHED_FIFO and affinity are only supported on Linux"
        );
    });
}
