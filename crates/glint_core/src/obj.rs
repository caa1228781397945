//! Wavefront OBJ export of a loaded scene.
//!
//! Dumps every object's triangles in world space. Used by the CLI's `-`
//! mode for inspecting geometry in external tools.

use std::io::{self, Write};

use crate::scene::Scene;

/// Write the scene's geometry as an OBJ file.
pub fn write_obj<W: Write>(scene: &Scene, out: &mut W) -> io::Result<()> {
    writeln!(out, "# {} objects", scene.objects.len())?;

    // OBJ face indices are global and 1-based
    let mut vertex_base = 1usize;

    for (i, object) in scene.objects.iter().enumerate() {
        let mesh = &scene.meshes[object.mesh];
        writeln!(out, "o object_{i}")?;

        for &position in &mesh.positions {
            let p = match object.transform {
                Some(transform) => transform.transform_point3(position),
                None => position,
            };
            writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        }

        for &[a, b, c] in &mesh.indices {
            writeln!(
                out,
                "f {} {} {}",
                vertex_base + a as usize,
                vertex_base + b as usize,
                vertex_base + c as usize
            )?;
        }

        vertex_base += mesh.positions.len();
    }

    Ok(())
}
