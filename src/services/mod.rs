pub mod coverage;
pub mod curation;
pub mod providers;

pub use coverage::{ContributorCoverage, CoverageReport};
pub use curation::{Curator, MovieCheck};
pub use providers::{DbpediaProvider, MetadataProvider};
