//! Property tests over scoring, ranking and learning.

mod learning_properties;
mod ranking_properties;
