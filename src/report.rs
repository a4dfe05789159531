use crate::input::{Priorities, Topics};
use crate::{AssignmentOutcome, Assignments};
use std::fmt::Write;

fn render_outcome(
    out: &mut String,
    title: &str,
    topics: &Topics,
    priorities: &Priorities,
    outcome: &AssignmentOutcome,
) -> std::fmt::Result {
    writeln!(out, "=== {} Assignment ===", title)?;
    for ((student, topic), rank) in priorities
        .students
        .iter()
        .zip(&outcome.topics)
        .zip(&outcome.ranks)
    {
        let name = topics.names.get(*topic).map(String::as_str).unwrap_or("?");
        writeln!(out, "  {:<10} → {:<10}   (prio {})", student, name, rank)?;
    }
    writeln!(
        out,
        "Avg prio: {:.2}, Std prio: {:.2}, Worst prio: {}",
        outcome.summary.average, outcome.summary.std_dev, outcome.summary.worst
    )
}

fn write_report(
    out: &mut String,
    topics: &Topics,
    priorities: &Priorities,
    assignments: &Assignments,
) -> std::fmt::Result {
    render_outcome(out, "LSAP", topics, priorities, &assignments.sum_optimal)?;
    writeln!(out)?;
    render_outcome(out, "LBAP", topics, priorities, &assignments.bottleneck)
}

/// Plain-text report: the sum-optimal (LSAP) block, a blank line, the bottleneck (LBAP) block.
pub fn render(topics: &Topics, priorities: &Priorities, assignments: &Assignments) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_report(&mut out, topics, priorities, assignments);
    out
}

#[cfg(test)]
mod tests {
    use super::render;
    use crate::input::{Priorities, Topics};
    use crate::solve_assignments;

    #[test]
    fn test_render() {
        let topics = Topics {
            ids: vec![1, 2],
            names: vec!["Graphs".to_string(), "Parsers".to_string()],
            capacities: vec![1, 1],
        };
        let priorities = Priorities {
            students: vec!["Ada".to_string(), "Bob".to_string()],
            preferences: vec![vec![1, 2], vec![1, 2]],
        };
        let assignments =
            solve_assignments(&topics.ids, &topics.capacities, &priorities.preferences).unwrap();
        let report = render(&topics, &priorities, &assignments);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "=== LSAP Assignment ===");
        assert!(lines[1].starts_with("  Ada        → "));
        assert_eq!(lines[3], "Avg prio: 1.50, Std prio: 0.50, Worst prio: 2");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "=== LBAP Assignment ===");
        assert_eq!(lines[8], "Avg prio: 1.50, Std prio: 0.50, Worst prio: 2");
        assert!(report.contains("Graphs       (prio 1)"));
        assert!(report.contains("Parsers      (prio 2)"));
    }
}
