pub mod dashboard;
pub mod features;
pub mod output;
pub mod records;
pub mod sentiment;
pub mod stats;
pub mod taxonomy;
pub mod text;
pub mod weekly;
