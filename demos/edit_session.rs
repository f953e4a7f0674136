//! Drive an editing session and export the result

use hex_refinement_schemes::*;

fn main() -> Result<()> {
    let config = SessionConfigBuilder::new()
        .initial_size(2)?
        .max_size(8)?
        .build()?;
    let mut session = Session::new(config)?;

    // Dense grid over the bottom layer
    session.set_clip(IVec3::ZERO, IVec3::new(2, 2, 1))?;
    let diff = session.add_children_clip_grid();
    println!("Added {} children", diff.added.len());

    // Cap the top layer with a single child
    let top = session.add_child_box(IVec3::new(0, 0, 1), IVec3::splat(2))?.added[0];
    session.set_active(Some(top))?;

    // Select the cap, clone it and flip the clone
    session.set_selected(top, true)?;
    let clone = session.clone_shown().added[0];
    session.set_all_selected(false);
    session.set_selected(clone, true)?;
    session.flip_shown(Axis::Z);
    session.set_all_selected(false);
    println!("Clone now spans {:?}", session.child(clone)?.verts()[0]);
    session.remove_child(clone)?;

    let diff = session.double_size()?;
    println!(
        "Doubled to size {}, {} children rescaled",
        session.size(),
        diff.updated.len()
    );

    let ray = RayQuery::new(DVec3::new(0.0, 0.0, -20.0), DVec3::Z);
    if let Some(hit) = session.pick(&ray)? {
        println!("Picked lattice coordinate {:?}", hit.coord);
    }

    let scheme = session.compile()?;
    println!(
        "Compiled {} children into {} vertices",
        scheme.child_count(),
        scheme.vertices().len()
    );

    let name = symbol_name_from_path("schemes/layer-cap.rse");
    let exporter = CodeExporter::new(ExportConfigBuilder::new().name(name).build()?)?;
    println!("\n{}", session.export_code(&exporter));

    Ok(())
}
