mod edge_loop;
mod region_to_loop;

pub use edge_loop::EdgeLoop;
pub use region_to_loop::RegionToLoop;
