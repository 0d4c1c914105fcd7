mod mirror;

pub use mirror::MirrorSelect;
