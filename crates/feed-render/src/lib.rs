//! Display pipeline: retention, render-selection and the per-record
//! rendering contract, plus the configuration panel controller.

pub mod content;
pub mod html;
pub mod message;
pub mod panel;
pub mod pipeline;
pub mod time;
pub mod ui;

pub use pipeline::{FeedPipeline, FeedView, Selection};
pub use time::RenderContext;
