mod make_cylinder;
mod make_grid;
mod make_mesh;

pub use make_cylinder::MakeCylinder;
pub use make_grid::{Grid, MakeGrid};
pub use make_mesh::{BuiltMesh, MakeMesh};
