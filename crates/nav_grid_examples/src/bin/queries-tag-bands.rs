use glam::{Vec2, Vec3};
use nav_grid::prelude::*;
use nav_grid_examples::{init_tracing, render_tags_ascii};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Tag-mode erosion paints clearance bands around a pillar without
    // shrinking the walkable set.
    let probe = FnProbe::new(|p: Vec3| {
        if p.x.abs() < 1.1 && p.z.abs() < 1.1 {
            ProbeSample::blocked_at(Vec3::new(p.x, 0.0, p.z))
        } else {
            ProbeSample::walkable_at(Vec3::new(p.x, 0.0, p.z))
        }
    });
    let config =
        GridConfig::new(Vec2::new(15.0, 15.0)).with_erosion(ErosionConfig::tags(3, 1));
    let graph = GridGraph::build(GraphId(0), config, &probe)?;
    println!("clearance bands:\n{}", render_tags_ascii(&graph));

    // A bulky agent keeps out of the innermost two bands.
    let query = Vec3::new(-1.8, 0.0, 0.2);
    let roomy = graph.nearest_where(query, &NearestConstraint::default(), |n| {
        n.walkable && (n.tag == 0 || n.tag > 2)
    });
    match roomy {
        Some(hit) => println!("bulky agent clamps to {:?}", hit.position),
        None => println!("no cell with enough clearance"),
    }

    Ok(())
}
