use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::error::{QuantityError, Resource};
use crate::model::ResourceList;
use crate::quantity::{parse_cpu, parse_memory, Mebibytes, Millicores};

/// A CPU and memory pair. `Default` is the zero identity for summing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resources {
    pub cpu: Millicores,
    pub memory: Mebibytes,
}

impl Resources {
    pub const fn new(cpu: Millicores, memory: Mebibytes) -> Self {
        Resources { cpu, memory }
    }

    /// Parses the CPU and memory entries of a resource list.
    ///
    /// A missing entry counts as zero. An entry that fails to parse also
    /// counts as zero and is handed back alongside the partial total.
    pub fn from_requests(requests: &ResourceList) -> (Resources, Vec<(Resource, QuantityError)>) {
        let mut errors = Vec::new();
        let mut total = Resources::default();

        if let Some(cpu) = requests.get(Resource::Cpu.key()) {
            match parse_cpu(cpu) {
                Ok(cpu) => total.cpu = cpu,
                Err(e) => errors.push((Resource::Cpu, e)),
            }
        }
        if let Some(memory) = requests.get(Resource::Memory.key()) {
            match parse_memory(memory) {
                Ok(memory) => total.memory = memory,
                Err(e) => errors.push((Resource::Memory, e)),
            }
        }

        (total, errors)
    }

    /// Sums `items`, saturating each dimension at its maximum.
    ///
    /// Also returns the dimensions that overflowed, at most once each. The
    /// saturated total is the same for any order of `items`.
    pub fn accumulate<I>(items: I) -> (Resources, Vec<Resource>)
    where
        I: IntoIterator<Item = Resources>,
    {
        let mut total = Resources::default();
        let (mut cpu_overflow, mut memory_overflow) = (false, false);

        for item in items {
            total.cpu = total.cpu.checked_add(item.cpu).unwrap_or_else(|| {
                cpu_overflow = true;
                Millicores::MAX
            });
            total.memory = total.memory.checked_add(item.memory).unwrap_or_else(|| {
                memory_overflow = true;
                Mebibytes::MAX
            });
        }

        let overflowed = [(cpu_overflow, Resource::Cpu), (memory_overflow, Resource::Memory)]
            .into_iter()
            .filter_map(|(hit, resource)| hit.then_some(resource))
            .collect();
        (total, overflowed)
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources {
            cpu: self.cpu + rhs.cpu,
            memory: self.memory + rhs.memory,
        }
    }
}

impl AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        *self = *self + rhs;
    }
}

impl Sum for Resources {
    fn sum<I: Iterator<Item = Resources>>(iter: I) -> Resources {
        iter.fold(Resources::default(), Add::add)
    }
}

impl<'a> Sum<&'a Resources> for Resources {
    fn sum<I: Iterator<Item = &'a Resources>>(iter: I) -> Resources {
        iter.copied().sum()
    }
}
