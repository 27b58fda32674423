pub mod cat;
pub mod chmod;
pub mod get;
pub mod list;
pub mod mkdir;
pub mod put;
pub mod remove;
pub mod rename;
pub mod stat;
pub mod tree;

pub use cat::cat_command;
pub use chmod::chmod_command;
pub use get::get_command;
pub use list::list_command;
pub use mkdir::mkdir_command;
pub use put::put_command;
pub use remove::remove_command;
pub use rename::rename_command;
pub use stat::stat_command;
pub use tree::tree_command;
