pub mod args;
pub mod display;
pub mod op;
pub mod ops;

pub use ops::{Cat, Cp, Gc, Info, Init, Ls, Mkdir, Mv, Put, Rm, Rmdir, Shell, Stats, Version};
