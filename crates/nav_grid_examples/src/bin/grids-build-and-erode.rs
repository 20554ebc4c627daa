use glam::{Vec2, Vec3};
use nav_grid::prelude::*;
use nav_grid_examples::{init_tracing, render_walkability_ascii};

/// A flat plane with an L-shaped wall near the middle.
fn wall_probe() -> FnProbe<impl Fn(Vec3) -> ProbeSample + Send + Sync> {
    FnProbe::new(|p: Vec3| {
        let in_wall = (p.x.abs() < 0.6 && p.z >= -4.0 && p.z <= 2.0)
            || (p.z.abs() < 0.6 && p.x >= -4.0 && p.x <= 0.0);
        if in_wall {
            ProbeSample::blocked_at(Vec3::new(p.x, 0.0, p.z))
        } else {
            ProbeSample::walkable_at(Vec3::new(p.x, 0.0, p.z))
        }
    })
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let probe = wall_probe();

    for erosion in [0u32, 1, 2] {
        let config = GridConfig::new(Vec2::new(20.0, 20.0))
            .with_erosion(ErosionConfig::unwalkable(erosion));
        let graph = GridGraph::build(GraphId(0), config, &probe)?;

        let walkable = graph.nodes().iter().filter(|n| n.walkable).count();
        println!(
            "erosion {erosion}: {walkable}/{} cells walkable",
            graph.node_count()
        );
        println!("{}", render_walkability_ascii(&graph));
    }

    Ok(())
}
