mod collection;
mod task;

pub use collection::TaskCollection;
pub use task::{Priority, RepeatDay, Task, TaskType, parse_date};
