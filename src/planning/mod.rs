//! Prioritization of gaps and the task plan derived from them.

pub mod priority;
pub mod tasks;

pub use priority::PriorityMatrix;
pub use tasks::{
    group_related_tasks, prioritize_tasks, quick_wins, Task, TaskGenerator, WorkPackage,
};
