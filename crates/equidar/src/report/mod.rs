//! Report Aggregator: school reports and their municipality roll-up. Both are
//! computed fresh from the store on every call.

mod municipality;
mod panel;
mod school;
pub mod views;

pub use municipality::{build_municipality_report, MAX_MUNICIPAL_PRIORITIES};
pub use panel::{composite_panel, SchoolCompositePanel};
pub use school::{build_school_report, default_stage};
pub use views::{
    Classification, ClassificationCount, CompositeIndexSummary, MunicipalAverages,
    MunicipalityReport, SchoolReport,
};
