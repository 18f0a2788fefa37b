mod article;
mod source;

pub use article::{ArticleSummary, Latest, Watermark};
pub use source::Source;
