//! Period comparisons and the aggregate view built on top of them

pub mod delta;
pub mod view;

pub use delta::{delta, Delta, DeltaKind};
pub use view::{
    build_report, AggregateReport, DishComparison, PeriodComparison, ReportRequest, StarChef,
};
