//! Example demonstrating the supported collection shapes.

use std::collections::{BTreeSet, VecDeque};
use xml_model::{entity_type, from_str, member, to_string, ModelBuilder, Stack};

#[derive(Debug, Clone, PartialEq, Default)]
struct Task {
    title: String,
    priority: u8,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Board {
    name: String,
    backlog: VecDeque<Task>,
    undo: Stack<String>,
    labels: BTreeSet<String>,
    grid: Vec<Vec<u8>>,
    archive: Vec<Task>,
}

entity_type!(Task, Board);

fn main() -> xml_model::Result<()> {
    let mut builder = ModelBuilder::new();
    builder
        .has_known_entity::<Task>()
        .property(member!(Task, title))?
        .is_mapped_as_attribute()
        .property(member!(Task, priority))?
        .is_mapped_as_attribute();
    builder
        .has_known_entity::<Board>()
        .property(member!(Board, name))?
        .is_mapped_as_attribute()
        .property(member!(Board, backlog))?
        .property(member!(Board, undo))?
        .property(member!(Board, labels))?
        .property(member!(Board, grid))?
        .property(member!(Board, archive))?;
    let model = builder.build();

    let mut undo = Stack::new();
    undo.push("create board".to_string());
    undo.push("add task".to_string());
    undo.push("rename task".to_string());

    let board = Board {
        name: "Sprint 12".to_string(),
        backlog: VecDeque::from(vec![
            Task {
                title: "Write docs".to_string(),
                priority: 2,
            },
            Task {
                title: "Fix login".to_string(),
                priority: 1,
            },
        ]),
        undo,
        labels: ["backend", "docs", "urgent"].iter().map(|s| s.to_string()).collect(),
        grid: vec![vec![1, 0], vec![], vec![0, 1]],
        // empty collections are left out of the output
        archive: Vec::new(),
    };

    let xml = to_string(&model, &board)?;
    println!("Serialized board:\n{}\n", xml);

    let mut parsed: Board = from_str(&model, &xml)?;
    println!("Backlog (queue order):");
    for task in &parsed.backlog {
        println!("  {} (p{})", task.title, task.priority);
    }
    println!("Labels: {:?}", parsed.labels);
    println!("Grid rows kept: {}", parsed.grid.len());

    print!("Undo (pop order):");
    while let Some(action) = parsed.undo.pop() {
        print!(" [{}]", action);
    }
    println!();
    Ok(())
}
