use crate::value_objects::{Money, Percent};
use serde::Serialize;

pub mod portfolio;
pub mod reliability;

/// One slice of a lender's portfolio breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSlice {
    pub label: &'static str,
    pub value: Money,
    pub percent: Percent,
}
