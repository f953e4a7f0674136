//! Sample a deformed source cell and pick lattice points with rays

use hex_refinement_schemes::*;

fn main() -> Result<()> {
    let mut source = SourceCell::cube(1.0);
    source.set_corner(7, DVec3::new(1.5, 1.5, 1.5));

    let lattice = Lattice::build(4, &source)?;
    println!("Lattice of size {} holds {} points", lattice.size(), lattice.len());

    let center = lattice.point(IVec3::splat(2))?;
    println!("Center point: {:?}", center);

    let rays = [
        RayQuery::new(DVec3::new(0.0, 0.0, -10.0), DVec3::Z),
        RayQuery::new(DVec3::new(10.0, 10.0, 10.0), DVec3::splat(-1.0)),
        // pointing away: only points behind the origin remain
        RayQuery::new(DVec3::new(0.0, 0.0, -10.0), DVec3::NEG_Z).skip_behind(true),
    ];
    for ray in &rays {
        match lattice.closest_to_ray(ray) {
            Some(hit) => println!(
                "Ray from {:?}: coord {:?} (index {}, sqr distance {:.4}, behind {})",
                ray.origin, hit.coord, hit.index, hit.sqr_distance, hit.behind
            ),
            None => println!("Ray from {:?}: no candidate", ray.origin),
        }
    }

    // restrict to the lower octant
    let hit = lattice.closest_to_ray_within(&rays[1], IVec3::ZERO, IVec3::splat(2))?;
    if let Some(hit) = hit {
        println!("Within lower octant: {:?}", hit.coord);
    }

    Ok(())
}
