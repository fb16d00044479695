pub mod queue;
pub mod reconciler;
