//! Resource requests per component.

use crate::error::{Error, Result};

/// Resources to reserve for each instance of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRequirements {
    /// Single- or multithreaded, non-MPI; all cores on one node.
    Threaded { threads: u32 },
    /// MPI processes placed on individual cores.
    MpiCores {
        mpi_processes: u32,
        threads_per_mpi_process: u32,
    },
    /// MPI processes placed by whole nodes.
    MpiNodes {
        nodes: u32,
        mpi_processes_per_node: u32,
        threads_per_mpi_process: u32,
    },
}

/// Which shape a set of document keys selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Threaded,
    MpiCores,
    MpiNodes,
}

impl Shape {
    /// Keys that identify this shape, excluding shared optional ones.
    fn keys(self) -> &'static [&'static str] {
        match self {
            Self::Threaded => &["threads"],
            Self::MpiCores => &["mpi_processes"],
            Self::MpiNodes => &["nodes", "mpi_processes_per_node"],
        }
    }

    /// Determine the shape from the keys present.
    ///
    /// `threads_per_mpi_process` is shared by both MPI shapes and does not
    /// pick one by itself.
    pub(crate) fn detect<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<Shape> {
        let keys: Vec<&str> = keys.into_iter().collect();
        let found: Vec<Shape> = [Self::Threaded, Self::MpiCores, Self::MpiNodes]
            .into_iter()
            .filter(|shape| shape.keys().iter().any(|k| keys.contains(k)))
            .collect();

        match found.as_slice() {
            [shape] => {
                if *shape == Self::Threaded && keys.contains(&"threads_per_mpi_process") {
                    return Err(Error::AmbiguousResourceShape {
                        keys: keys.join(", "),
                    });
                }
                Ok(*shape)
            }
            [] => Err(Error::MissingKey("threads, mpi_processes or nodes")),
            _ => Err(Error::AmbiguousResourceShape {
                keys: keys.join(", "),
            }),
        }
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32> {
    if value <= 0 {
        return Err(Error::NotPositive { field, value });
    }
    u32::try_from(value).map_err(|_| Error::InvalidValue(format!("`{field}` is too large: {value}")))
}

impl ResourceRequirements {
    pub fn threaded(threads: i64) -> Result<Self> {
        Ok(Self::Threaded {
            threads: positive("threads", threads)?,
        })
    }

    pub fn mpi_cores(mpi_processes: i64, threads_per_mpi_process: Option<i64>) -> Result<Self> {
        Ok(Self::MpiCores {
            mpi_processes: positive("mpi_processes", mpi_processes)?,
            threads_per_mpi_process: positive(
                "threads_per_mpi_process",
                threads_per_mpi_process.unwrap_or(1),
            )?,
        })
    }

    pub fn mpi_nodes(
        nodes: i64,
        mpi_processes_per_node: i64,
        threads_per_mpi_process: Option<i64>,
    ) -> Result<Self> {
        Ok(Self::MpiNodes {
            nodes: positive("nodes", nodes)?,
            mpi_processes_per_node: positive("mpi_processes_per_node", mpi_processes_per_node)?,
            threads_per_mpi_process: positive(
                "threads_per_mpi_process",
                threads_per_mpi_process.unwrap_or(1),
            )?,
        })
    }

    /// Total number of cores per instance, saturating at `u64::MAX`.
    pub fn total_cores(&self) -> u64 {
        match *self {
            Self::Threaded { threads } => u64::from(threads),
            Self::MpiCores {
                mpi_processes,
                threads_per_mpi_process,
            } => u64::from(mpi_processes) * u64::from(threads_per_mpi_process),
            Self::MpiNodes {
                nodes,
                mpi_processes_per_node,
                threads_per_mpi_process,
            } => (u64::from(nodes) * u64::from(mpi_processes_per_node))
                .saturating_mul(u64::from(threads_per_mpi_process)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn shapes_are_detected_from_keys() {
        assert_eq!(Shape::detect(["threads"]).unwrap(), Shape::Threaded);
        assert_eq!(
            Shape::detect(["mpi_processes", "threads_per_mpi_process"]).unwrap(),
            Shape::MpiCores
        );
        assert_eq!(
            Shape::detect(["nodes", "mpi_processes_per_node"]).unwrap(),
            Shape::MpiNodes
        );
    }

    #[test]
    fn mixed_shapes_are_ambiguous() {
        assert!(matches!(
            Shape::detect(["threads", "mpi_processes"]),
            Err(Error::AmbiguousResourceShape { .. })
        ));
        assert!(matches!(
            Shape::detect(["mpi_processes", "nodes"]),
            Err(Error::AmbiguousResourceShape { .. })
        ));
        assert!(matches!(
            Shape::detect(["threads", "threads_per_mpi_process"]),
            Err(Error::AmbiguousResourceShape { .. })
        ));
        assert_eq!(
            Shape::detect(Vec::<&str>::new()),
            Err(Error::MissingKey("threads, mpi_processes or nodes"))
        );
    }

    #[test]
    fn counts_must_be_positive() {
        assert_eq!(
            ResourceRequirements::threaded(0),
            Err(Error::NotPositive {
                field: "threads",
                value: 0
            })
        );
        assert!(ResourceRequirements::mpi_cores(4, Some(-1)).is_err());
        assert!(ResourceRequirements::mpi_nodes(2, 0, None).is_err());
    }

    #[test]
    fn total_cores() {
        assert_eq!(ResourceRequirements::threaded(8).unwrap().total_cores(), 8);
        assert_eq!(
            ResourceRequirements::mpi_cores(16, Some(2)).unwrap().total_cores(),
            32
        );
        assert_eq!(
            ResourceRequirements::mpi_nodes(2, 4, None).unwrap().total_cores(),
            8
        );
    }
}
