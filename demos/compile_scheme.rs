//! Compile a face-split scheme and replay it inside a deformed cell

use hex_refinement_schemes::*;

fn main() -> Result<()> {
    // Four children splitting the cell into quarters across the xy plane
    let size = 2;
    let mut children = Vec::new();
    for x in 0..size {
        for y in 0..size {
            let min = IVec3::new(x, y, 0);
            children.push(cube_verts(min, min + IVec3::new(1, 1, size)));
        }
    }

    let scheme = CompiledScheme::build(&children, size)?;
    println!(
        "Compiled {} children into {} shared vertices",
        scheme.child_count(),
        scheme.vertices().len()
    );

    for (i, vertex) in scheme.vertices().iter().enumerate().take(6) {
        let weights: Vec<String> = vertex
            .influences()
            .iter()
            .map(|inf| format!("c{}*{:.3}", inf.corner(), inf.weight()))
            .collect();
        println!("  v{}: {}", i, weights.join(" + "));
    }

    // A sheared source cell
    let mut source = SourceCell::unit_cube();
    for corner in 4..8 {
        let p = source.corner(corner);
        source.set_corner(corner, p + DVec3::new(0.5, 0.0, 0.0));
    }

    let refined = scheme.apply(source.corners());
    println!("\nRefined children:");
    for (i, child) in refined.iter().enumerate() {
        println!("  child {}: min {:?} max {:?}", i, child[0], child[7]);
    }

    let exporter = CodeExporter::new(ExportConfigBuilder::new().name("quarterSplit").build()?)?;
    println!("\n{}", exporter.render_influences(&scheme));

    Ok(())
}
