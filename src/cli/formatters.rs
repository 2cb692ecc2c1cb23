//! Output formatting module for CLI display
//!
//! Renders report structs as terminal tables and keeps presentation apart
//! from calculation. Flow amounts are denominated in ₹ crore, deal amounts
//! in plain rupees.

use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::db::{QuarterAum, UploadAudit, UploadStatus};
use crate::fiscal::PeriodOption;
use crate::reports::deals::{DealsReport, InvestorProfile, RepeatEntry, StockDetail};
use crate::reports::flows::{
    AverageBasis, FlowSummary, InvestorKpi, MonthlyFlow, SegmentBreakdownEntry, TrendReport,
};
use crate::reports::geography::{QuarterComparison, QuarterSummary};
use crate::utils::{format_crore, format_inr, format_signed_pct};

/// Green for inflows, red for outflows
fn signed(text: String, value: Decimal) -> String {
    if value > Decimal::ZERO {
        text.green().to_string()
    } else if value < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

fn average_cell(kpi: &InvestorKpi, basis: Option<AverageBasis>) -> String {
    match (kpi.period_average, basis) {
        (Some(avg), Some(AverageBasis::PerDay)) => format!("{}/day", format_crore(avg)),
        (Some(avg), Some(AverageBasis::PerMonth)) => format!("{}/month", format_crore(avg)),
        _ => "-".to_string(),
    }
}

/// Format the flow KPI summary for terminal output
pub fn format_flow_summary(summary: &FlowSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} Flow Summary - {} ({} to {}, {} trading days)\n\n",
        "📊".cyan().bold(),
        summary.period_label.bold(),
        summary.start.format("%d/%m/%Y"),
        summary.end.format("%d/%m/%Y"),
        summary.trading_days
    ));

    #[derive(Tabled)]
    struct KpiRow {
        #[tabled(rename = "Investor")]
        investor: String,
        #[tabled(rename = "Gross Purchase")]
        purchase: String,
        #[tabled(rename = "Gross Sales")]
        sales: String,
        #[tabled(rename = "Net")]
        net: String,
        #[tabled(rename = "Average")]
        average: String,
        #[tabled(rename = "Change")]
        change: String,
        #[tabled(rename = "Positive Days")]
        positive_days: String,
    }

    let rows = vec![
        KpiRow {
            investor: "FII".to_string(),
            purchase: format_crore(summary.fii.gross_purchase),
            sales: format_crore(summary.fii.gross_sales),
            net: signed(format_crore(summary.fii.net), summary.fii.net),
            average: average_cell(&summary.fii, summary.average_basis),
            change: format_signed_pct(summary.fii.change_pct),
            positive_days: format!("{}/{}", summary.fii.positive_days, summary.trading_days),
        },
        KpiRow {
            investor: "DII".to_string(),
            purchase: format_crore(summary.dii.gross_purchase),
            sales: format_crore(summary.dii.gross_sales),
            net: signed(format_crore(summary.dii.net), summary.dii.net),
            average: average_cell(&summary.dii, summary.average_basis),
            change: format_signed_pct(summary.dii.change_pct),
            positive_days: format!("{}/{}", summary.dii.positive_days, summary.trading_days),
        },
    ];

    let table = Table::new(rows).with(Style::rounded()).to_string();
    output.push_str(&table);
    output.push('\n');

    output.push_str(&format!(
        "\n  Combined net: {} ({})\n",
        signed(format_crore(summary.combined_net), summary.combined_net),
        format_signed_pct(summary.combined_change_pct)
    ));
    if summary.dominant_side == "Balanced" {
        output.push_str("  Dominance: Balanced\n");
    } else {
        output.push_str(&format!(
            "  Dominance: {} leads by {}\n",
            summary.dominant_side.bold(),
            format_crore(summary.dominance_gap.abs())
        ));
    }

    output
}

/// Format month-by-month flow rows
pub fn format_monthly_flows(months: &[MonthlyFlow]) -> String {
    if months.is_empty() {
        return String::new();
    }

    #[derive(Tabled)]
    struct MonthRow {
        #[tabled(rename = "Month")]
        month: String,
        #[tabled(rename = "FII Net")]
        fii: String,
        #[tabled(rename = "DII Net")]
        dii: String,
        #[tabled(rename = "Combined")]
        combined: String,
        #[tabled(rename = "Days")]
        days: String,
    }

    let rows: Vec<MonthRow> = months
        .iter()
        .map(|m| MonthRow {
            month: m.label.clone(),
            fii: signed(format_crore(m.fii_net), m.fii_net),
            dii: signed(format_crore(m.dii_net), m.dii_net),
            combined: signed(format_crore(m.combined_net), m.combined_net),
            days: m.trading_days.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("\n{} Monthly Flows\n\n{}\n", "📅".cyan().bold(), table)
}

/// Format the segment breakdown, already ranked by absolute net
pub fn format_segment_breakdown(entries: &[SegmentBreakdownEntry]) -> String {
    if entries.is_empty() {
        return "\n  No segment flow rows in this period.\n".to_string();
    }

    #[derive(Tabled)]
    struct SegmentRow {
        #[tabled(rename = "Investor")]
        investor: String,
        #[tabled(rename = "Segment")]
        segment: String,
        #[tabled(rename = "Asset Class")]
        asset_class: String,
        #[tabled(rename = "Gross Purchase")]
        purchase: String,
        #[tabled(rename = "Gross Sales")]
        sales: String,
        #[tabled(rename = "Net")]
        net: String,
    }

    let rows: Vec<SegmentRow> = entries
        .iter()
        .map(|e| SegmentRow {
            investor: e.investor_type.as_str().to_string(),
            segment: e.segment.label().to_string(),
            asset_class: e.asset_class.label().to_string(),
            purchase: format_crore(e.gross_purchase),
            sales: format_crore(e.gross_sales),
            net: signed(format_crore(e.net), e.net),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("\n{} Segment Breakdown\n\n{}\n", "🧭".cyan().bold(), table)
}

/// Format the fiscal-year trend: a month grid, quarter totals, and
/// year-over-year growth
pub fn format_trend_report(report: &TrendReport) -> String {
    let mut output = String::new();

    for warning in &report.warnings {
        output.push_str(&format!("{} {}\n", "⚠".yellow().bold(), warning));
    }
    if report.series.is_empty() {
        output.push_str("\nNo fiscal years to compare.\n");
        return output;
    }

    output.push_str(&format!(
        "\n{} Fiscal-Year Trend (₹ Cr, net)\n\n",
        "📈".cyan().bold()
    ));

    // One FII and one DII column per requested year
    let mut builder = Builder::default();
    let mut header = vec!["Month".to_string()];
    for series in &report.series {
        header.push(format!("{} FII", series.fiscal_year));
        header.push(format!("{} DII", series.fiscal_year));
    }
    builder.push_record(header);

    for (idx, month) in report.months.iter().enumerate() {
        let mut row = vec![month.to_string()];
        for series in &report.series {
            row.push(signed(format_crore(series.fii_net[idx]), series.fii_net[idx]));
            row.push(signed(format_crore(series.dii_net[idx]), series.dii_net[idx]));
        }
        builder.push_record(row);
    }

    let mut totals = vec!["Total".to_string()];
    for series in &report.series {
        totals.push(signed(format_crore(series.fii_total), series.fii_total));
        totals.push(signed(format_crore(series.dii_total), series.dii_total));
    }
    builder.push_record(totals);

    let table = builder.build().with(Style::rounded()).to_string();
    output.push_str(&table);
    output.push('\n');

    // Quarter roll-up, combined FII+DII
    let mut builder = Builder::default();
    let mut header = vec!["Quarter".to_string()];
    for series in &report.series {
        header.push(series.fiscal_year.clone());
    }
    builder.push_record(header);
    for qn in 0..4 {
        let mut row = vec![format!("Q{}", qn + 1)];
        for series in &report.series {
            row.push(signed(
                format_crore(series.quarter_net[qn]),
                series.quarter_net[qn],
            ));
        }
        builder.push_record(row);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    output.push_str(&format!(
        "\n{} Quarterly Net (combined)\n\n{}\n",
        "🗓".cyan().bold(),
        table
    ));

    if !report.comparisons.is_empty() {
        #[derive(Tabled)]
        struct GrowthRow {
            #[tabled(rename = "From")]
            from: String,
            #[tabled(rename = "To")]
            to: String,
            #[tabled(rename = "FII Growth")]
            fii: String,
            #[tabled(rename = "DII Growth")]
            dii: String,
            #[tabled(rename = "Combined")]
            combined: String,
        }

        let rows: Vec<GrowthRow> = report
            .comparisons
            .iter()
            .map(|c| GrowthRow {
                from: c.from_year.clone(),
                to: c.to_year.clone(),
                fii: format_signed_pct(c.fii_growth_pct),
                dii: format_signed_pct(c.dii_growth_pct),
                combined: format_signed_pct(c.combined_growth_pct),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        output.push_str(&format!(
            "\n{} Year-over-Year Growth\n\n{}\n",
            "↕".cyan().bold(),
            table
        ));
    }

    output
}

/// Format the deal KPI block with its dimensional breakdown
pub fn format_deals_report(report: &DealsReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} Deals - {} ({} to {})\n\n",
        "🤝".cyan().bold(),
        report.period_label.bold(),
        report.start.format("%d/%m/%Y"),
        report.end.format("%d/%m/%Y"),
    ));

    output.push_str(&format!(
        "  Deals: {} ({} buy / {} sell / {} undisclosed)\n",
        report.total_deals, report.buy_deals, report.sell_deals, report.neutral_deals
    ));
    output.push_str(&format!(
        "  Total buying:  {}\n",
        format_inr(report.total_buying).green()
    ));
    output.push_str(&format!(
        "  Total selling: {}\n",
        format_inr(report.total_selling).red()
    ));
    output.push_str(&format!(
        "  Net flow:      {}\n",
        signed(format_inr(report.net_flow), report.net_flow)
    ));
    if let Some(stock) = &report.most_active_stock {
        output.push_str(&format!(
            "  Most active stock:  {} ({} deals, {})\n",
            stock.name.bold(),
            stock.deal_count,
            format_inr(stock.total_value)
        ));
    }
    if let Some(client) = &report.most_active_client {
        output.push_str(&format!(
            "  Most active client: {} ({} deals, {})\n",
            client.name.bold(),
            client.deal_count,
            format_inr(client.total_value)
        ));
    }

    if report.breakdown.is_empty() {
        output.push_str("\n  No deals in this period.\n");
        return output;
    }

    #[derive(Tabled)]
    struct BreakdownRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Deals")]
        deals: String,
        #[tabled(rename = "Buy")]
        buy: String,
        #[tabled(rename = "Sell")]
        sell: String,
        #[tabled(rename = "Net")]
        net: String,
        #[tabled(rename = "Share")]
        share: String,
    }

    let rows: Vec<BreakdownRow> = report
        .breakdown
        .iter()
        .map(|e| BreakdownRow {
            name: e.name.clone(),
            deals: e.deal_count.to_string(),
            buy: format_inr(e.buy_value),
            sell: format_inr(e.sell_value),
            net: signed(format_inr(e.net_value), e.net_value),
            share: format!("{:.1}%", e.share_pct),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    output.push_str(&format!(
        "\n{} Breakdown by {}\n\n{}\n",
        "🧮".cyan().bold(),
        report.dimension.as_str(),
        table
    ));
    output
}

/// Format one stock's window aggregate
pub fn format_stock_detail(detail: &StockDetail) -> String {
    let mut output = String::new();
    let title = match &detail.security_name {
        Some(name) => format!("{} - {}", detail.symbol, name),
        None => detail.symbol.clone(),
    };
    output.push_str(&format!(
        "\n{} {} [{}]\n\n",
        "🔎".cyan().bold(),
        title.bold(),
        detail.sector
    ));
    output.push_str(&format!(
        "  Deals: {} ({} buy / {} sell)\n",
        detail.deal_count, detail.buy_deals, detail.sell_deals
    ));
    output.push_str(&format!(
        "  Bought: {}  (avg price ₹{:.2})\n",
        format_inr(detail.buy_value).green(),
        detail.avg_buy_price
    ));
    output.push_str(&format!(
        "  Sold:   {}  (avg price ₹{:.2})\n",
        format_inr(detail.sell_value).red(),
        detail.avg_sell_price
    ));
    output.push_str(&format!(
        "  Net:    {}\n",
        signed(format_inr(detail.net_value), detail.net_value)
    ));
    if !detail.top_buyers.is_empty() {
        output.push_str(&format!("  Top buyers:  {}\n", detail.top_buyers.join(", ")));
    }
    if !detail.top_sellers.is_empty() {
        output.push_str(&format!("  Top sellers: {}\n", detail.top_sellers.join(", ")));
    }
    output
}

/// Format one client's window aggregate
pub fn format_investor_profile(profile: &InvestorProfile) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} {} [{}]\n\n",
        "🧑".cyan().bold(),
        profile.client_name.bold(),
        profile.investor_class.as_str()
    ));
    output.push_str(&format!(
        "  Deals: {} ({} buy / {} sell)\n",
        profile.deal_count, profile.buy_deals, profile.sell_deals
    ));
    output.push_str(&format!(
        "  Total traded: {}  (avg deal {})\n",
        format_inr(profile.total_value),
        format_inr(profile.avg_deal_size)
    ));
    output.push_str(&format!(
        "  Net flow:     {}\n",
        signed(format_inr(profile.net_value), profile.net_value)
    ));
    output.push_str(&format!("  Stocks traded: {}\n", profile.stocks_traded));
    if !profile.preferred_sectors.is_empty() {
        output.push_str(&format!(
            "  Preferred sectors: {}\n",
            profile.preferred_sectors.join(", ")
        ));
    }
    output
}

/// Format repeat-activity entries
pub fn format_repeats(entries: &[RepeatEntry], by_label: &str) -> String {
    if entries.is_empty() {
        return "\n  No repeated activity in this period.\n".to_string();
    }

    #[derive(Tabled)]
    struct RepeatRow {
        #[tabled(rename = "Entity")]
        entity: String,
        #[tabled(rename = "Deals")]
        deals: String,
        #[tabled(rename = "Counterparties")]
        counterparties: String,
        #[tabled(rename = "Total Value")]
        value: String,
        #[tabled(rename = "First")]
        first: String,
        #[tabled(rename = "Last")]
        last: String,
    }

    let rows: Vec<RepeatRow> = entries
        .iter()
        .map(|e| RepeatRow {
            entity: e.entity.clone(),
            deals: e.occurrences.to_string(),
            counterparties: e.counterparties.to_string(),
            value: format_inr(e.total_value),
            first: e.first_date.format("%d/%m/%Y").to_string(),
            last: e.last_date.format("%d/%m/%Y").to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!(
        "\n{} Repeated {} activity\n\n{}\n",
        "🔁".cyan().bold(),
        by_label,
        table
    )
}

/// Format the stored-quarter listing
pub fn format_quarter_list(summaries: &[QuarterSummary]) -> String {
    if summaries.is_empty() {
        return "\n  No city-AUM quarters stored yet.\n".to_string();
    }

    #[derive(Tabled)]
    struct QuarterRow {
        #[tabled(rename = "Quarter")]
        quarter: String,
        #[tabled(rename = "As Of")]
        as_of: String,
        #[tabled(rename = "Cities")]
        cities: String,
        #[tabled(rename = "Top City")]
        top_city: String,
        #[tabled(rename = "Top Share")]
        top_share: String,
        #[tabled(rename = "Computed Total")]
        computed: String,
        #[tabled(rename = "Stated Total")]
        stated: String,
    }

    let rows: Vec<QuarterRow> = summaries
        .iter()
        .map(|s| QuarterRow {
            quarter: s.quarter_key.clone(),
            as_of: s.as_of_date.format("%d/%m/%Y").to_string(),
            cities: s.city_count.to_string(),
            top_city: s.top_city.clone().unwrap_or_else(|| "-".to_string()),
            top_share: format!("{:.2}%", s.top_city_pct),
            computed: format!("{:.2}%", s.computed_total_pct),
            stated: format!("{:.2}%", s.stated_total_pct),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("\n{} City-AUM Quarters\n\n{}\n", "🏙".cyan().bold(), table)
}

/// Format one quarter's city table with its roll-ups and reconciliation
pub fn format_quarter_detail(quarter: &QuarterAum) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} {} (as of {})\n\n",
        "🏙".cyan().bold(),
        quarter.quarter_key.bold(),
        quarter.as_of_date.format("%d/%m/%Y")
    ));

    #[derive(Tabled)]
    struct CityRow {
        #[tabled(rename = "City")]
        city: String,
        #[tabled(rename = "Share")]
        share: String,
        #[tabled(rename = "Latitude")]
        latitude: String,
        #[tabled(rename = "Longitude")]
        longitude: String,
    }

    let rows: Vec<CityRow> = quarter
        .cities
        .iter()
        .map(|c| CityRow {
            city: c.city.clone(),
            share: format!("{:.2}%", c.share_pct),
            latitude: c
                .latitude
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "-".to_string()),
            longitude: c
                .longitude
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    output.push_str(&table);
    output.push('\n');

    output.push_str(&format!(
        "\n  Other cities: {:.2}%   NRI/Overseas: {:.2}%\n",
        quarter.other_cities_pct, quarter.nri_overseas_pct
    ));

    let computed = quarter.computed_total();
    let diff = (computed - quarter.stated_total_pct).abs();
    if diff >= Decimal::new(1, 1) {
        output.push_str(&format!(
            "  {} Computed total {:.2}% differs from stated {:.2}%\n",
            "⚠".yellow().bold(),
            computed,
            quarter.stated_total_pct
        ));
    } else {
        output.push_str(&format!(
            "  {} Total reconciles at {:.2}%\n",
            "✓".green().bold(),
            computed
        ));
    }
    output
}

/// Format the city-by-city change between the two latest quarters
pub fn format_quarter_comparison(comparison: &QuarterComparison) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{} City Shares: {} vs {}\n\n",
        "🏙".cyan().bold(),
        comparison.from_quarter,
        comparison.to_quarter.bold()
    ));

    #[derive(Tabled)]
    struct ChangeRow {
        #[tabled(rename = "City")]
        city: String,
        #[tabled(rename = "Previous")]
        previous: String,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "Change")]
        change: String,
    }

    let rows: Vec<ChangeRow> = comparison
        .changes
        .iter()
        .map(|c| ChangeRow {
            city: c.city.clone(),
            previous: c
                .previous_pct
                .map(|v| format!("{:.2}%", v))
                .unwrap_or_else(|| "-".to_string()),
            current: c
                .current_pct
                .map(|v| format!("{:.2}%", v))
                .unwrap_or_else(|| "-".to_string()),
            change: {
                let text = if c.change_points.is_sign_negative() {
                    format!("{:.2} pp", c.change_points)
                } else {
                    format!("+{:.2} pp", c.change_points)
                };
                signed(text, c.change_points)
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    output.push_str(&table);
    output.push('\n');
    output
}

/// Format the upload audit trail, newest first
pub fn format_uploads(uploads: &[UploadAudit]) -> String {
    if uploads.is_empty() {
        return "\n  No uploads recorded yet.\n".to_string();
    }

    #[derive(Tabled)]
    struct UploadRow {
        #[tabled(rename = "Uploaded")]
        uploaded: String,
        #[tabled(rename = "Collection")]
        collection: String,
        #[tabled(rename = "File")]
        file: String,
        #[tabled(rename = "Rows")]
        rows: String,
        #[tabled(rename = "Skipped")]
        skipped: String,
        #[tabled(rename = "Date Range")]
        range: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<UploadRow> = uploads
        .iter()
        .map(|u| {
            let status = match u.status {
                UploadStatus::Success => u.status.as_str().green().to_string(),
                UploadStatus::Partial => u.status.as_str().yellow().to_string(),
                UploadStatus::Failed => u.status.as_str().red().to_string(),
            };
            let range = match (u.date_range_start, u.date_range_end) {
                (Some(start), Some(end)) => format!(
                    "{} - {}",
                    start.format("%d/%m/%Y"),
                    end.format("%d/%m/%Y")
                ),
                _ => "-".to_string(),
            };
            UploadRow {
                uploaded: u.uploaded_at.format("%d/%m/%Y %H:%M").to_string(),
                collection: u.collection.clone(),
                file: u.file_name.clone(),
                rows: u.rows_ingested.to_string(),
                skipped: u.rows_skipped.to_string(),
                range,
                status,
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("\n{} Upload History\n\n{}\n", "📦".cyan().bold(), table)
}

/// Format the selectable period listing
pub fn format_periods(
    current_fy: &str,
    years: &[PeriodOption],
    quarters: &[PeriodOption],
    months: &[PeriodOption],
) -> String {
    #[derive(Tabled)]
    struct PeriodRow {
        #[tabled(rename = "Kind")]
        kind: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Label")]
        label: String,
    }

    let mut rows = vec![
        PeriodRow {
            kind: "fixed".to_string(),
            value: "today".to_string(),
            label: "Today".to_string(),
        },
        PeriodRow {
            kind: "fixed".to_string(),
            value: "all".to_string(),
            label: "All Time".to_string(),
        },
        PeriodRow {
            kind: "fixed".to_string(),
            value: "30d".to_string(),
            label: "Last 30 Days (any Nd works)".to_string(),
        },
    ];
    for (kind, options) in [("year", years), ("quarter", quarters), ("month", months)] {
        for option in options {
            rows.push(PeriodRow {
                kind: kind.to_string(),
                value: option.value.clone(),
                label: option.label.clone(),
            });
        }
    }

    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!(
        "\n{} Reporting Periods (current fiscal year: {})\n\n{}\n",
        "🕐".cyan().bold(),
        current_fy.bold(),
        table
    )
}
