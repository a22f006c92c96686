pub mod file;
pub mod sink;

pub use file::PassLogFile;
pub use sink::{ChannelSink, LogLevel, LogLine, LogSink, PassLog};
