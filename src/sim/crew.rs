//! Repair queue ordering and crew-capacity admission control.

use crate::sim::clock::TIME_EPS;
use crate::sim::component::{ComponentRef, ComponentType, ComponentRegistry, Status};

/// Per-type crew capacity and usage.
///
/// Crews are strictly dedicated: an idle branch-crew slot is never loaned to
/// bus or generator work.
#[derive(Debug, Clone)]
pub struct CrewPool {
    capacity: [usize; 3],
    active: [usize; 3],
}

impl CrewPool {
    pub fn new(branch: usize, bus: usize, generator: usize) -> Self {
        Self {
            capacity: [branch, bus, generator],
            active: [0; 3],
        }
    }

    pub fn capacity(&self, ctype: ComponentType) -> usize {
        self.capacity[ctype.index()]
    }

    pub fn active_count(&self, ctype: ComponentType) -> usize {
        self.active[ctype.index()]
    }

    pub fn available(&self, ctype: ComponentType) -> usize {
        self.capacity(ctype) - self.active_count(ctype)
    }

    fn admit(&mut self, ctype: ComponentType) {
        let i = ctype.index();
        assert!(self.active[i] < self.capacity[i], "crew pool over capacity");
        self.active[i] += 1;
    }

    fn release(&mut self, ctype: ComponentType) {
        let i = ctype.index();
        assert!(self.active[i] > 0, "releasing an idle crew pool");
        self.active[i] -= 1;
    }
}

/// A damaged component waiting for a crew, with its assigned repair duration.
#[derive(Debug, Clone)]
pub struct RepairTask {
    pub comp: ComponentRef,
    pub duration_hr: f64,
}

/// A component under active repair.
#[derive(Debug, Clone)]
pub struct ActiveRepair {
    pub comp: ComponentRef,
    pub remaining_hr: f64,
}

/// Orders damaged components and admits them into capacity-bounded work.
///
/// Global ordering is shortest-processing-time-first: ascending by duration,
/// with ties keeping their original relative order (stable sort). Admission
/// scans types in the fixed `Branch → Bus → Generator` precedence.
#[derive(Debug, Clone)]
pub struct CrewAllocator {
    pool: CrewPool,
    queued: Vec<RepairTask>,
    active: Vec<ActiveRepair>,
}

impl CrewAllocator {
    pub fn new(pool: CrewPool, mut tasks: Vec<RepairTask>) -> Self {
        tasks.sort_by(|a, b| a.duration_hr.total_cmp(&b.duration_hr));
        Self {
            pool,
            queued: tasks,
            active: Vec::new(),
        }
    }

    /// Fills free slots from the queue, moving admitted components to
    /// `Active` in the registry.
    pub fn replenish(&mut self, registry: &mut ComponentRegistry) {
        for ctype in ComponentType::ALL {
            while self.pool.available(ctype) > 0 {
                let Some(pos) = self.queued.iter().position(|t| t.comp.ctype == ctype) else {
                    break;
                };
                let task = self.queued.remove(pos);
                self.pool.admit(ctype);
                registry.set_status(task.comp, Status::Active);
                self.active.push(ActiveRepair {
                    comp: task.comp,
                    remaining_hr: task.duration_hr,
                });
            }
        }
    }

    /// Shortest remaining repair time among active work, if any.
    pub fn min_remaining(&self) -> Option<f64> {
        self.active
            .iter()
            .map(|a| a.remaining_hr)
            .min_by(f64::total_cmp)
    }

    /// Removes and returns every active repair finishing within `dt` hours,
    /// releasing their crew slots. Ties complete together, in admission
    /// order.
    pub fn take_completions(&mut self, dt: f64) -> Vec<ComponentRef> {
        let mut done = Vec::new();
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].remaining_hr <= dt + TIME_EPS {
                let repair = self.active.remove(i);
                self.pool.release(repair.comp.ctype);
                done.push(repair.comp);
            } else {
                i += 1;
            }
        }
        done
    }

    /// Decrements every active repair by the elapsed interval.
    pub fn advance(&mut self, dt: f64) {
        for a in &mut self.active {
            a.remaining_hr = (a.remaining_hr - dt).max(0.0);
        }
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn active(&self) -> &[ActiveRepair] {
        &self.active
    }

    pub fn pool(&self) -> &CrewPool {
        &self.pool
    }

    /// Components still needing crew work, queued or in progress.
    pub fn remaining_work(&self) -> usize {
        self.queued.len() + self.active.len()
    }
}
