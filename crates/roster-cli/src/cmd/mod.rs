pub mod config;
pub mod criteria;
pub mod init;
pub mod member;
pub mod queue;
pub mod scan;
pub mod watch;
