//! ASCII rendering helpers shared by the example binaries.
use nav_grid::uniform::GridGraph;

/// Installs a simple stdout tracing subscriber for the examples.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .try_init();
}

/// Renders walkability as one character per cell: `.` walkable, `#` not.
/// Rows are printed north-up (largest z first).
pub fn render_walkability_ascii(graph: &GridGraph) -> String {
    render_cells(graph, |walkable, _| if walkable { '.' } else { '#' })
}

/// Renders tags as hex digits on walkable cells (`#` for unwalkable,
/// `.` for tag 0).
pub fn render_tags_ascii(graph: &GridGraph) -> String {
    render_cells(graph, |walkable, tag| match (walkable, tag) {
        (false, _) => '#',
        (true, 0) => '.',
        (true, tag) => char::from_digit(u32::from(tag) % 16, 16).unwrap_or('?'),
    })
}

fn render_cells(graph: &GridGraph, cell: impl Fn(bool, u8) -> char) -> String {
    let mut out = String::new();
    for z in (0..graph.depth() as i32).rev() {
        for x in 0..graph.width() as i32 {
            match graph.node(x, z) {
                Some(node) => out.push(cell(node.walkable, node.tag)),
                None => out.push(' '),
            }
        }
        out.push('\n');
    }
    out
}
