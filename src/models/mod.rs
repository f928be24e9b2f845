pub mod lesson;
pub mod program;
pub mod term;
pub mod topic;

// Re-export core models for easy access
pub use lesson::{ContentType, Lesson, LessonContext, NewLesson, UpdateLesson};
pub use program::{NewProgram, Program, UpdateProgram};
pub use term::{NewTerm, Term};
pub use topic::Topic;
