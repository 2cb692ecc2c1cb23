// Reports module - Flow KPIs, deal analytics and city-AUM geography

pub mod deals;
pub mod flows;
pub mod geography;

pub use deals::{
    calculate_deals_report, calculate_investor_profile, calculate_repeat_activity,
    calculate_stock_detail, DealDimension, DealsReport, RepeatBy, RepeatEntry,
};
pub use flows::{
    calculate_flow_summary, calculate_segment_breakdown, fiscal_year_trend, monthly_flows,
    FlowSummary, TrendReport,
};
pub use geography::{compare_latest_quarters, list_quarter_summaries, QuarterComparison};
