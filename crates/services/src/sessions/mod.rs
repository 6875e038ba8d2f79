mod progress;
mod service;
mod timer;
mod workflow;

pub use progress::SessionProgress;
pub use service::{AdvanceResult, PREPARATION_DELAY_SECONDS, SessionController, Tick};
pub use timer::{SessionTimer, TimerEvent};
pub use workflow::{QuizWorkflow, SessionCompletion};
