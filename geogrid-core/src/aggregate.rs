//! Map-reduce of assignments into per-cell counts

use crate::types::{AggregateCell, Assignment};
use std::collections::HashMap;

/// Group assignments by cell. One aggregate per distinct cell id, ordered
/// by the cell's first appearance in `assignments`; empty cells produce
/// nothing.
pub fn aggregate(assignments: &[Assignment]) -> Vec<AggregateCell> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut aggregates: Vec<AggregateCell> = Vec::new();

    for assignment in assignments {
        let slot = *slots.entry(assignment.cell_id.as_str()).or_insert_with(|| {
            aggregates.push(AggregateCell {
                cell_id: assignment.cell_id.clone(),
                count: 0,
                position: assignment.cell_centroid,
                members: Vec::new(),
            });
            aggregates.len() - 1
        });

        let entry = &mut aggregates[slot];
        entry.count += 1;
        entry.members.push(assignment.clone());
    }

    aggregates
}
