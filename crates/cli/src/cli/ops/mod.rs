pub mod cat;
pub mod cp;
pub mod gc;
pub mod info;
pub mod init;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod put;
pub mod rm;
pub mod rmdir;
pub mod shell;
pub mod stats;
pub mod version;

pub use cat::Cat;
pub use cp::Cp;
pub use gc::Gc;
pub use info::Info;
pub use init::Init;
pub use ls::Ls;
pub use mkdir::Mkdir;
pub use mv::Mv;
pub use put::Put;
pub use rm::Rm;
pub use rmdir::Rmdir;
pub use shell::Shell;
pub use stats::Stats;
pub use version::Version;
