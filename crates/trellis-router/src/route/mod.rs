/// Route module for file-based routing
///
/// Contains pure functional components for route tokenizing and compilation:
/// - `pattern`: source path → classified segments
/// - `parser`: classified segments → compiled pattern with specificity
pub mod parser;
pub mod pattern;

// Re-export commonly used types
pub use parser::{compile, calculate_specificity, Matcher, RoutePattern, SourceId};
pub use pattern::{classify_segment, is_error_page, is_ignored, tokenize, Segment, SegmentKind};
