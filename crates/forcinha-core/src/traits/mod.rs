//! Capability traits (ports) implemented by infrastructure crates

mod ports;

pub use ports::{
    AffiliationSource, EntityFactsSource, LinkStore, MemberSource, MetadataStore, RepoResult,
    RoleSink, UpstreamResult,
};
