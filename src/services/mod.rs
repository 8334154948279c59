pub mod excel;
pub mod formatter;
pub mod pipeline;
pub mod profiler;
pub mod queue;
pub mod recommender;
