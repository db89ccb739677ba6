pub mod fetcher;
pub mod fragment;
pub mod source_map;

pub use fetcher::{HttpTransport, SourceFetcher, SourceFile, SourceTransport};
pub use fragment::{create_source_fragment, FragmentLine};
pub use source_map::SourceMapIndex;
