//! NUMA (Non-Uniform Memory Access) topology of the generating host
//!
//! The generated script is usually run on the machine it was generated on,
//! so the plan is checked against the local CPU count and node layout.

use crate::config::SweepConfig;
use crate::core::Invocation;

/// NUMA node information
#[derive(Debug, Clone)]
pub struct NumaNode {
    /// Node ID
    pub id: usize,
    /// CPUs belonging to this node
    pub cpus: Vec<usize>,
    /// Total memory in bytes
    pub memory_total: u64,
}

/// NUMA topology information
#[derive(Debug, Clone)]
pub struct NumaTopology {
    /// NUMA nodes
    pub nodes: Vec<NumaNode>,
    /// Total CPUs across all nodes
    pub total_cpus: usize,
    /// Is NUMA actually available/meaningful
    pub is_numa_system: bool,
}

/// Problem found when checking a plan against the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// A run asks for more workers than there are logical CPUs
    Oversubscribed {
        /// Requested worker count
        threads: usize,
        /// Logical CPUs on this host
        cpus: usize,
    },
    /// Interleaving launcher configured on a single-node host
    InterleaveWithoutNuma {
        /// Launcher command
        launcher: String,
    },
}

impl std::fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oversubscribed { threads, cpus } => write!(
                f,
                "{} workers requested but this host has {} logical CPUs",
                threads, cpus
            ),
            Self::InterleaveWithoutNuma { launcher } => write!(
                f,
                "'{}' is configured but this host has a single NUMA node",
                launcher
            ),
        }
    }
}

impl NumaTopology {
    /// Detect NUMA topology from the system
    #[cfg(target_os = "linux")]
    pub fn detect() -> Self {
        let mut nodes = Vec::new();

        if let Ok(entries) = std::fs::read_dir("/sys/devices/system/node") {
            for entry in entries.filter_map(|e| e.ok()) {
                let name = entry.file_name();
                let name_str = name.to_string_lossy();

                if let Some(id) = name_str
                    .strip_prefix("node")
                    .and_then(|n| n.parse::<usize>().ok())
                {
                    let node_path = entry.path();
                    nodes.push(NumaNode {
                        id,
                        cpus: Self::read_node_cpus(&node_path),
                        memory_total: Self::read_node_memory(&node_path),
                    });
                }
            }
        }

        nodes.sort_by_key(|n| n.id);
        Self::from_nodes(nodes)
    }

    /// Detect NUMA topology (single node outside Linux)
    #[cfg(not(target_os = "linux"))]
    pub fn detect() -> Self {
        Self::from_nodes(Vec::new())
    }

    /// Build a topology from known nodes, falling back to one node
    pub fn from_nodes(mut nodes: Vec<NumaNode>) -> Self {
        if nodes.is_empty() || nodes.iter().all(|n| n.cpus.is_empty()) {
            nodes = vec![NumaNode {
                id: 0,
                cpus: (0..num_cpus::get()).collect(),
                memory_total: 0,
            }];
        }

        let total_cpus = nodes.iter().map(|n| n.cpus.len()).sum();
        let is_numa_system = nodes.len() > 1;
        Self {
            nodes,
            total_cpus,
            is_numa_system,
        }
    }

    /// Number of NUMA nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(target_os = "linux")]
    fn read_node_cpus(node_path: &std::path::Path) -> Vec<usize> {
        std::fs::read_to_string(node_path.join("cpulist"))
            .map(|content| Self::parse_cpu_list(content.trim()))
            .unwrap_or_default()
    }

    #[cfg(target_os = "linux")]
    fn read_node_memory(node_path: &std::path::Path) -> u64 {
        std::fs::read_to_string(node_path.join("meminfo"))
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|line| line.contains("MemTotal:"))
                    .and_then(Self::parse_meminfo_value)
            })
            .map(|kb| kb * 1024)
            .unwrap_or(0)
    }

    #[cfg(target_os = "linux")]
    fn parse_meminfo_value(line: &str) -> Option<u64> {
        line.split_whitespace()
            .nth(3) // Format: "Node X MemTotal: 12345 kB"
            .and_then(|s| s.parse().ok())
    }

    /// Parse CPU list format (e.g., "0-3,8-11" -> [0,1,2,3,8,9,10,11])
    pub fn parse_cpu_list(s: &str) -> Vec<usize> {
        let mut cpus = Vec::new();

        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                if let (Ok(start), Ok(end)) = (start.parse::<usize>(), end.parse::<usize>()) {
                    cpus.extend(start..=end);
                }
            } else if let Ok(cpu) = part.parse::<usize>() {
                cpus.push(cpu);
            }
        }

        cpus
    }

    /// Check a plan against this host
    pub fn check_plan(&self, config: &SweepConfig, invocations: &[Invocation]) -> Vec<PlanWarning> {
        let mut warnings = Vec::new();

        let mut oversubscribed: Vec<usize> = invocations
            .iter()
            .map(|i| i.threads)
            .filter(|&t| t > self.total_cpus)
            .collect();
        oversubscribed.sort_unstable();
        oversubscribed.dedup();
        warnings.extend(oversubscribed.into_iter().map(|threads| PlanWarning::Oversubscribed {
            threads,
            cpus: self.total_cpus,
        }));

        if let Some(launcher) = config.launcher() {
            if !self.is_numa_system && invocations.iter().any(|i| i.interleave) {
                warnings.push(PlanWarning::InterleaveWithoutNuma {
                    launcher: launcher.to_string(),
                });
            }
        }

        warnings
    }

    /// Print NUMA topology summary
    pub fn print_summary(&self) {
        println!("NUMA Topology:");
        println!("  Nodes: {}", self.num_nodes());
        println!("  Total CPUs: {}", self.total_cpus);
        println!("  NUMA System: {}", self.is_numa_system);

        for node in &self.nodes {
            println!("  Node {}:", node.id);
            println!("    CPUs: {}", node.cpus.len());
            if node.memory_total > 0 {
                println!(
                    "    Memory: {}",
                    humansize::format_size(node.memory_total, humansize::BINARY)
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan;

    fn two_nodes(cpus_per_node: usize) -> NumaTopology {
        NumaTopology::from_nodes(vec![
            NumaNode {
                id: 0,
                cpus: (0..cpus_per_node).collect(),
                memory_total: 0,
            },
            NumaNode {
                id: 1,
                cpus: (cpus_per_node..2 * cpus_per_node).collect(),
                memory_total: 0,
            },
        ])
    }

    #[test]
    fn test_topology_detection() {
        let topology = NumaTopology::detect();
        assert!(topology.num_nodes() >= 1);
        assert!(topology.total_cpus >= 1);
    }

    #[test]
    fn test_cpu_list_parsing() {
        assert_eq!(NumaTopology::parse_cpu_list("0-3"), vec![0, 1, 2, 3]);
        assert_eq!(NumaTopology::parse_cpu_list("0,2,4"), vec![0, 2, 4]);
        assert_eq!(NumaTopology::parse_cpu_list("0-2,4-6"), vec![0, 1, 2, 4, 5, 6]);
        assert!(NumaTopology::parse_cpu_list("").is_empty());
    }

    #[test]
    fn test_benchmark_host_has_no_warnings() {
        // 72 cores with hyperthreading over two sockets
        let topology = two_nodes(72);
        let config = SweepConfig::default();
        let invocations = plan(&config).unwrap();
        assert!(topology.check_plan(&config, &invocations).is_empty());
    }

    #[test]
    fn test_oversubscription_reported_once_per_count() {
        let topology = two_nodes(32);
        let config = SweepConfig::default();
        let invocations = plan(&config).unwrap();
        let warnings = topology.check_plan(&config, &invocations);
        assert_eq!(
            warnings,
            vec![
                PlanWarning::Oversubscribed { threads: 128, cpus: 64 },
                PlanWarning::Oversubscribed { threads: 144, cpus: 64 },
            ]
        );
    }

    #[test]
    fn test_interleave_on_single_node() {
        let topology = NumaTopology::from_nodes(vec![NumaNode {
            id: 0,
            cpus: (0..256).collect(),
            memory_total: 0,
        }]);
        let config = SweepConfig::default();
        let invocations = plan(&config).unwrap();
        let warnings = topology.check_plan(&config, &invocations);
        assert_eq!(
            warnings,
            vec![PlanWarning::InterleaveWithoutNuma {
                launcher: "numactl -iall".to_string()
            }]
        );
        assert!(warnings[0].to_string().contains("single NUMA node"));
    }
}
