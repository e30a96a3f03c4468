use {dashmap::DashMap, model::Address, std::sync::Arc};

/// Keyed mutex (address -> busy) bounding each caller to one in-flight
/// `Execute*` call at a time (§4.4, §9 "Per-caller in-flight guard").
/// Acquisition happens on execute entry; release happens via `Drop`
/// regardless of whether the call that held the guard succeeded or failed.
#[derive(Clone, Default)]
pub struct InFlightGuards {
    busy: Arc<DashMap<Address, ()>>,
}

impl InFlightGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the guard for `caller`, or `None` if another execute for the
    /// same address is already in flight.
    pub fn try_acquire(&self, caller: Address) -> Option<InFlightGuard> {
        if self.busy.insert(caller, ()).is_some() {
            // Already held; put the marker back exactly as it was and refuse.
            return None;
        }
        Some(InFlightGuard {
            busy: self.busy.clone(),
            caller,
        })
    }
}

pub struct InFlightGuard {
    busy: Arc<DashMap<Address, ()>>,
    caller: Address,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.remove(&self.caller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        let mut hex = "0".repeat(39);
        hex.push((b'0' + n) as char);
        format!("0x{hex}").parse().unwrap()
    }

    #[test]
    fn second_acquire_for_same_caller_fails_while_first_holds() {
        let guards = InFlightGuards::new();
        let a = addr(1);
        let first = guards.try_acquire(a);
        assert!(first.is_some());
        assert!(guards.try_acquire(a).is_none());
        drop(first);
        assert!(guards.try_acquire(a).is_some());
    }

    #[test]
    fn distinct_callers_do_not_contend() {
        let guards = InFlightGuards::new();
        let a = addr(1);
        let b = addr(2);
        let _first = guards.try_acquire(a);
        assert!(guards.try_acquire(b).is_some());
    }
}
