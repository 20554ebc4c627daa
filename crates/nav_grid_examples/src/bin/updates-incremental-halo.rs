use glam::{Vec2, Vec3};
use nav_grid::prelude::*;
use nav_grid_examples::{init_tracing, render_walkability_ascii};

/// A crate-sized obstacle that can be toggled on and off.
fn probe_with_crate(present: bool) -> FnProbe<impl Fn(Vec3) -> ProbeSample + Send + Sync> {
    FnProbe::new(move |p: Vec3| {
        let blocked = present && p.x.abs() <= 1.6 && p.z.abs() <= 1.6;
        if blocked {
            ProbeSample::blocked_at(Vec3::new(p.x, 0.0, p.z))
        } else {
            ProbeSample::walkable_at(Vec3::new(p.x, 0.0, p.z))
        }
    })
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config =
        GridConfig::new(Vec2::new(17.0, 17.0)).with_erosion(ErosionConfig::unwalkable(1));
    let mut graph = GridGraph::build(GraphId(0), config, &probe_with_crate(false))?;
    println!("open field:\n{}", render_walkability_ascii(&graph));

    // Something heavy lands in the middle: re-probe a bounded region only.
    let bounds = Aabb::from_center_size(Vec3::ZERO, Vec3::new(3.2, 2.0, 3.2));
    let mut update = GridUpdate::new(bounds).with_reprobe();
    match graph.update_area(&mut update, &probe_with_crate(true)) {
        UpdateOutcome::Applied(summary) => {
            println!(
                "crate placed: re-probed {} cells, reconnected {}",
                summary.probed_cells, summary.reconnected_cells
            );
        }
        UpdateOutcome::Skipped => anyhow::bail!("update was skipped"),
    }
    println!("{}", render_walkability_ascii(&graph));

    // An agent standing inside the blocked area asks for the closest safe
    // cell.
    let hit = graph
        .nearest_where(Vec3::ZERO, &NearestConstraint::default(), |n| n.walkable)
        .expect("some cell is walkable");
    println!("nearest walkable cell from the center: {:?}", hit.position);

    // The crate is hauled away again.
    let mut update = GridUpdate::new(bounds).with_reprobe();
    graph.update_area(&mut update, &probe_with_crate(false));
    println!("crate removed:\n{}", render_walkability_ascii(&graph));

    Ok(())
}
