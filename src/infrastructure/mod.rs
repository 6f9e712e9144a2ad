pub mod clock;
pub mod task;

pub use clock::Clock;
pub use task::TaskHandle;
