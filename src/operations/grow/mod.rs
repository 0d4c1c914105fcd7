mod accelerated;
mod boundary_loop;
mod extend_selection;
mod extender;

pub use accelerated::AcceleratedLoopExtender;
pub use boundary_loop::GrowToBoundaryLoop;
pub use extend_selection::ExtendToBoundaryLoops;
pub use extender::{LoopExtender, LoopExtension, ReferenceLoopExtender};
