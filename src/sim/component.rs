//! Component identity, lifecycle status, and the status registry.

use std::fmt;

/// Equipment categories tracked by the simulator.
///
/// Crew pools are dedicated per type, and admission always scans types in
/// [`ComponentType::ALL`] order (branches, then buses, then generators).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    Branch,
    Bus,
    Generator,
}

impl ComponentType {
    /// Fixed admission precedence order.
    pub const ALL: [ComponentType; 3] = [
        ComponentType::Branch,
        ComponentType::Bus,
        ComponentType::Generator,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            ComponentType::Branch => 0,
            ComponentType::Bus => 1,
            ComponentType::Generator => 2,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentType::Branch => "branch",
            ComponentType::Bus => "bus",
            ComponentType::Generator => "generator",
        };
        f.write_str(s)
    }
}

/// Typed component identity: a type tag plus a positive id unique within the
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentRef {
    pub ctype: ComponentType,
    pub id: usize,
}

impl ComponentRef {
    pub fn branch(id: usize) -> Self {
        Self {
            ctype: ComponentType::Branch,
            id,
        }
    }

    pub fn bus(id: usize) -> Self {
        Self {
            ctype: ComponentType::Bus,
            id,
        }
    }

    pub fn generator(id: usize) -> Self {
        Self {
            ctype: ComponentType::Generator,
            id,
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ctype, self.id)
    }
}

/// Lifecycle state of one component.
///
/// Legal transitions: `Healthy → Damaged | Disconnected` (disturbance),
/// `Damaged | Disconnected → Active` (crew admission), `Active → Restored`
/// (repair completion), `Disconnected → Restored` (reconnect-only, no crew
/// time), and `Restored → Healthy`. Never `Restored → Damaged` within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Healthy,
    Damaged,
    Disconnected,
    Active,
    Restored,
}

impl Status {
    /// Whether the component is out of service (damaged, tripped, or under
    /// active repair).
    pub fn is_outaged(self) -> bool {
        matches!(self, Status::Damaged | Status::Disconnected | Status::Active)
    }
}

fn transition_allowed(from: Status, to: Status) -> bool {
    use Status::*;
    matches!(
        (from, to),
        (Healthy, Damaged)
            | (Healthy, Disconnected)
            | (Damaged, Active)
            | (Disconnected, Active)
            | (Active, Restored)
            | (Disconnected, Restored)
            | (Restored, Healthy)
    )
}

/// Per-component status table, dense per type (index = id − 1).
///
/// All components start `Healthy`. Every mutation goes through
/// [`ComponentRegistry::set_status`], which enforces the transition diagram.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    statuses: [Vec<Status>; 3],
}

impl ComponentRegistry {
    /// Creates a registry for the given per-type component counts.
    pub fn new(branches: usize, buses: usize, generators: usize) -> Self {
        Self {
            statuses: [
                vec![Status::Healthy; branches],
                vec![Status::Healthy; buses],
                vec![Status::Healthy; generators],
            ],
        }
    }

    /// Number of components of one type.
    pub fn len(&self, ctype: ComponentType) -> usize {
        self.statuses[ctype.index()].len()
    }

    pub fn is_empty(&self, ctype: ComponentType) -> bool {
        self.statuses[ctype.index()].is_empty()
    }

    /// Current status of a component.
    ///
    /// # Panics
    ///
    /// Panics if the id is zero or out of range for its type.
    pub fn status(&self, comp: ComponentRef) -> Status {
        assert!(comp.id >= 1, "component ids are positive");
        self.statuses[comp.ctype.index()][comp.id - 1]
    }

    /// Moves a component to a new status.
    ///
    /// # Panics
    ///
    /// Panics if the transition is not legal (e.g. `Restored → Damaged`) or
    /// the id is out of range.
    pub fn set_status(&mut self, comp: ComponentRef, next: Status) {
        let current = self.status(comp);
        assert!(
            transition_allowed(current, next),
            "illegal status transition for {comp}: {current:?} -> {next:?}"
        );
        self.statuses[comp.ctype.index()][comp.id - 1] = next;
    }

    /// Count of out-of-service components of one type.
    pub fn outaged_count(&self, ctype: ComponentType) -> usize {
        self.statuses[ctype.index()]
            .iter()
            .filter(|s| s.is_outaged())
            .count()
    }

    /// All components of one type currently in the given status, in id order.
    pub fn with_status(&self, ctype: ComponentType, status: Status) -> Vec<ComponentRef> {
        self.statuses[ctype.index()]
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == status)
            .map(|(i, _)| ComponentRef { ctype, id: i + 1 })
            .collect()
    }

    /// Whether any component of any type has the given status.
    pub fn any_with_status(&self, status: Status) -> bool {
        self.statuses
            .iter()
            .any(|col| col.iter().any(|s| *s == status))
    }
}
