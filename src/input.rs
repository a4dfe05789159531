//! Topic and priority CSV files.
//!
//! Topics: header `id,name,capacity` where `capacity` may be empty or absent (defaults to 1).
//! Priorities: header `name,prio1,prio2,...`, every non-`name` column is a priority in
//! header order and holds a topic id.

use crate::error::AssignmentError;
use crate::matrix::usable_capacity;
use anyhow::{anyhow, bail, ensure, Context, Result};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Topics {
    pub ids: Vec<i64>,
    pub names: Vec<String>,
    pub capacities: Vec<usize>,
}

impl Topics {
    /// Seats usable by `num_students`, see [`usable_capacity`]. `None` on overflow.
    pub fn usable_capacity(&self, num_students: usize) -> Option<usize> {
        usable_capacity(&self.capacities, num_students)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Priorities {
    pub students: Vec<String>,
    /// topic ids per student, most preferred first
    pub preferences: Vec<Vec<i64>>,
}

/// Splits one CSV record. Double quotes group a field and `""` inside them is a literal quote.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields.iter().map(|f| f.trim().to_string()).collect()
}

/// Header plus data records, blank lines dropped. Records are paired with 1-based line numbers.
fn read_records(text: &str) -> Result<(Vec<String>, Vec<(usize, Vec<String>)>)> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let (_, header) = lines.next().ok_or_else(|| anyhow!("file is empty"))?;
    let header = split_record(header);
    let records = lines.map(|(i, line)| (i + 1, split_record(line))).collect();
    Ok((header, records))
}

fn column(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h == name)
}

fn cell(record: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| record.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

pub fn parse_topics_file(path: &Path) -> Result<Topics> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read topics file {}", path.display()))?;
    parse_topics_text(&text).with_context(|| format!("invalid topics file {}", path.display()))
}

pub fn parse_topics_text(text: &str) -> Result<Topics> {
    let (header, records) = read_records(text)?;
    let id_col = column(&header, "id");
    let name_col = column(&header, "name");
    ensure!(
        id_col.is_some() && name_col.is_some(),
        "topics file must have columns: id,name,capacity"
    );
    let capacity_col = column(&header, "capacity");

    let mut topics = Topics {
        ids: Vec::new(),
        names: Vec::new(),
        capacities: Vec::new(),
    };
    let mut seen_ids = HashSet::new();
    for (line, record) in records {
        let raw_id = cell(&record, id_col);
        let name = cell(&record, name_col);
        let raw_capacity = cell(&record, capacity_col);

        if raw_id.is_empty() && name.is_empty() {
            continue;
        }
        ensure!(
            !raw_id.is_empty(),
            "line {}: topic with name {:?} is missing an 'id'",
            line,
            name
        );
        ensure!(
            !name.is_empty(),
            "line {}: topic with id {:?} is missing a 'name'",
            line,
            raw_id
        );
        let id: i64 = raw_id
            .parse()
            .map_err(|_| anyhow!("line {}: invalid topic id {:?} (must be integer)", line, raw_id))?;
        ensure!(seen_ids.insert(id), "line {}: duplicate topic id {}", line, id);

        let capacity: i64 = if raw_capacity.is_empty() {
            1
        } else {
            raw_capacity.parse().map_err(|_| {
                anyhow!(
                    "line {}: invalid capacity {:?} for topic id {}",
                    line,
                    raw_capacity,
                    id
                )
            })?
        };
        ensure!(
            capacity > 0,
            "topic id {} must have a positive capacity, got {}",
            id,
            capacity
        );

        topics.ids.push(id);
        topics.names.push(name.to_string());
        topics.capacities.push(capacity as usize);
    }
    ensure!(!topics.ids.is_empty(), "no topics found in topics file");
    Ok(topics)
}

pub fn parse_priorities_file(path: &Path, topics: &Topics) -> Result<Priorities> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read priorities file {}", path.display()))?;
    parse_priorities_text(&text, topics)
        .with_context(|| format!("invalid priorities file {}", path.display()))
}

pub fn parse_priorities_text(text: &str, topics: &Topics) -> Result<Priorities> {
    let (header, records) = read_records(text)?;
    let name_col =
        column(&header, "name").ok_or_else(|| anyhow!("priorities file must have a 'name' column"))?;
    let valid_ids: HashSet<i64> = topics.ids.iter().copied().collect();

    let mut priorities = Priorities {
        students: Vec::new(),
        preferences: Vec::new(),
    };
    for (line, record) in records {
        let student = cell(&record, Some(name_col));
        if student.is_empty() {
            continue;
        }

        let mut prefs = Vec::new();
        for (index, value) in record.iter().enumerate() {
            if index == name_col || index >= header.len() || value.is_empty() {
                continue;
            }
            let id: i64 = value.parse().map_err(|_| {
                anyhow!(
                    "line {}: invalid topic id {:?} in priorities for student {:?} (must be an integer)",
                    line,
                    value,
                    student
                )
            })?;
            if !valid_ids.contains(&id) {
                bail!(
                    "line {}: student {:?} refers to unknown topic id {} in priorities",
                    line,
                    student,
                    id
                );
            }
            prefs.push(id);
        }

        ensure!(
            !prefs.is_empty(),
            "student {:?} has no priorities specified",
            student
        );
        let distinct: HashSet<&i64> = prefs.iter().collect();
        ensure!(
            distinct.len() == prefs.len(),
            "duplicate topic ids in priorities for student {:?}: {:?}",
            student,
            prefs
        );

        priorities.students.push(student.to_string());
        priorities.preferences.push(prefs);
    }
    ensure!(
        !priorities.students.is_empty(),
        "no students found in priorities file"
    );
    Ok(priorities)
}

/// Checks the preconditions of the engine: equally long priority lists and enough capacity.
pub fn validate(topics: &Topics, priorities: &Priorities) -> Result<()> {
    if let Some(first) = priorities.preferences.first() {
        let expected = first.len();
        for (student, prefs) in priorities.students.iter().zip(&priorities.preferences) {
            ensure!(
                prefs.len() == expected,
                "student {:?} has {} priorities; expected {}",
                student,
                prefs.len(),
                expected
            );
        }
    }

    let students = priorities.students.len();
    let capacity = topics
        .usable_capacity(students)
        .ok_or_else(|| anyhow!("total topic capacity overflows"))?;
    if capacity < students {
        return Err(AssignmentError::InfeasibleCapacity { capacity, students })
            .context("matching is impossible");
    }
    Ok(())
}
