use std::io::Write;

use anyhow::Result;

use crate::aggregate::{NodeUtilization, Report};

fn percent(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{r:.1}%"))
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn write_text(out: &mut impl Write, report: &Report, show_pods: bool) -> Result<()> {
    for node in &report.nodes {
        write_node(out, node, show_pods)?;
    }

    let cluster = &report.cluster;
    writeln!(out, "🌐 Cluster")?;
    writeln!(out, "-----------------------------------")?;
    writeln!(
        out,
        "  Allocatable: CPU {}, memory {}",
        cluster.allocatable.cpu, cluster.allocatable.memory
    )?;
    writeln!(
        out,
        "  Requested:   CPU {}, memory {}",
        cluster.requested.cpu, cluster.requested.memory
    )?;
    writeln!(
        out,
        "  Utilization: CPU {}, memory {}",
        percent(cluster.cpu_utilization),
        percent(cluster.memory_utilization)
    )?;

    if !report.diagnostics.is_empty() {
        writeln!(out)?;
        writeln!(out, "⚠️ Skipped ({}):", report.diagnostics.len())?;
        for diagnostic in &report.diagnostics {
            writeln!(out, "  {diagnostic}")?;
        }
    }

    Ok(())
}

fn write_node(out: &mut impl Write, node: &NodeUtilization, show_pods: bool) -> Result<()> {
    writeln!(out, "🖥️ Node: {}", node.name)?;
    writeln!(out, "-----------------------------------")?;
    writeln!(
        out,
        "  Allocatable: CPU {}, memory {}",
        or_unknown(node.allocatable_cpu),
        or_unknown(node.allocatable_memory)
    )?;
    writeln!(
        out,
        "  Requested:   CPU {}, memory {}",
        node.requested.cpu, node.requested.memory
    )?;
    writeln!(
        out,
        "  Utilization: CPU {}, memory {}",
        percent(node.cpu_utilization),
        percent(node.memory_utilization)
    )?;

    if show_pods {
        writeln!(out, "  Pods ({}):", node.pods.len())?;
        for pod in &node.pods {
            writeln!(
                out,
                "    {} ({}), CPU {}, memory {}",
                pod.name, pod.namespace, pod.requested.cpu, pod.requested.memory
            )?;
        }
    }

    writeln!(out)?;
    Ok(())
}

pub fn write_json(out: &mut impl Write, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(out.by_ref(), report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::model::{ContainerSnapshot, NodeSnapshot, PodSnapshot};

    fn sample() -> Report {
        let nodes = [
            NodeSnapshot {
                name: "n1".into(),
                allocatable: [("cpu", "3"), ("memory", "8192Mi")]
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            NodeSnapshot {
                name: "n2".into(),
                allocatable: [("cpu", "2.5")]
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        ];
        let pods = [PodSnapshot {
            name: "web".into(),
            namespace: "shop".into(),
            node_name: Some("n1".into()),
            containers: vec![ContainerSnapshot {
                name: "app".into(),
                requests: [("cpu", "750m"), ("memory", "1024Mi")]
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }],
        }];
        aggregate(&nodes, &pods)
    }

    #[test]
    fn text_lists_nodes_and_skips() {
        let mut out = Vec::new();
        write_text(&mut out, &sample(), true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("🖥️ Node: n1"));
        assert!(text.contains("  Allocatable: CPU 3000m, memory 8192Mi"));
        assert!(text.contains("  Requested:   CPU 750m, memory 1024Mi"));
        assert!(text.contains("  Utilization: CPU 25.0%, memory 12.5%"));
        assert!(text.contains("    web (shop), CPU 750m, memory 1024Mi"));
        assert!(text.contains("  Allocatable: CPU -, memory 0Mi"));
        assert!(text.contains("  Utilization: CPU n/a, memory n/a"));
        assert!(text.contains("⚠️ Skipped (1):"));
        assert!(text.contains("node n2: allocatable cpu: invalid quantity: \"2.5\""));
    }

    #[test]
    fn text_hides_pods_by_default() {
        let mut out = Vec::new();
        write_text(&mut out, &sample(), false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("web (shop)"));
    }

    #[test]
    fn json_leaves_writer_usable() {
        let mut out = Vec::new();
        write_json(&mut out, &sample()).unwrap();
        write_json(&mut out, &sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("}\n"));
        assert_eq!(text.matches("\"nodes\"").count(), 2);
    }

    #[test]
    fn json_keeps_undefined_utilization_as_null() {
        let mut out = Vec::new();
        write_json(&mut out, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["nodes"][0]["requested"]["cpu"], 750);
        assert_eq!(value["nodes"][0]["cpu_utilization"], 25.0);
        assert!(value["nodes"][1]["allocatable_cpu"].is_null());
        assert!(value["nodes"][1]["memory_utilization"].is_null());
        assert_eq!(value["diagnostics"][0]["kind"], "InvalidAllocatable");
        assert_eq!(value["diagnostics"][0]["resource"], "cpu");
    }
}
