//! Weekly cost report rendering.
//!
//! The figures are formatted up front into a [`ReportData`] value which is then
//! fed to two liquid templates, one HTML and one plain text. Rendering takes the
//! generation timestamp as an argument, so the same input always yields the same
//! document.

use crate::cost::{round_to, to_amount, PercentChange};
use crate::delta::{CostComparison, ServiceDelta};
use crate::error::CostReportError;
use crate::period::Period;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use liquid::{Parser, ParserBuilder, Template};
use serde::Serialize;

pub const MAX_REPORTED_SERVICES: usize = 10;

const INCREASE_COLOR: &str = "#e74c3c";
const DECREASE_COLOR: &str = "#27ae60";

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>AWS Cost Report</title>
</head>
<body style="margin: 0; padding: 40px 20px; background-color: #f5f7fa; font-family: Arial, sans-serif; color: #333333; line-height: 1.6;">
<div style="max-width: 800px; margin: 0 auto; background: #ffffff; border-radius: 12px; overflow: hidden;">
<div style="background: #667eea; color: #ffffff; padding: 40px 30px; text-align: center;">
<h1 style="margin: 0 0 10px 0; font-size: 28px;">AWS Cost Report</h1>
<p style="margin: 0; font-size: 16px;">{{ current_label }}</p>
</div>
<div style="padding: 30px;">
<table style="width: 100%; border-collapse: separate; border-spacing: 12px 0; margin-bottom: 30px;">
<tr>
<td style="background: #f8f9fa; border: 2px solid #e9ecef; border-radius: 8px; padding: 20px; text-align: center;">
<div style="font-size: 28px; font-weight: 700; color: #2c3e50;">{{ current_total }}</div>
<div style="font-size: 13px; color: #6c757d; text-transform: uppercase;">Current Week</div>
</td>
<td style="background: #f8f9fa; border: 2px solid #e9ecef; border-radius: 8px; padding: 20px; text-align: center;">
<div style="font-size: 28px; font-weight: 700; color: #2c3e50;">{{ previous_total }}</div>
<div style="font-size: 13px; color: #6c757d; text-transform: uppercase;">Previous Week</div>
</td>
<td style="background: #f8f9fa; border: 2px solid #e9ecef; border-radius: 8px; padding: 20px; text-align: center;">
<div style="font-size: 28px; font-weight: 700; color: {{ change_color }};">{{ total_change }}</div>
<div style="font-size: 13px; color: #6c757d; text-transform: uppercase;">{{ total_change_percent }} Change</div>
</td>
</tr>
</table>
<div style="background: #e3f2fd; border-left: 4px solid #2196f3; padding: 15px 20px; margin: 20px 0; border-radius: 4px;">
<p style="margin: 0; color: #1565c0; font-size: 14px;"><strong>Quick Insight:</strong> {% if spending_unchanged %}Your AWS spending is unchanged from last week.{% else %}Your AWS spending has {{ change_direction }} by {{ total_change_amount }} ({{ total_change_percent }}) compared to last week.{% endif %}</p>
</div>
<h2 style="font-size: 20px; color: #2c3e50; padding-bottom: 10px; border-bottom: 3px solid #667eea;">Cost Breakdown by Service</h2>
<table style="width: 100%; border-collapse: collapse;">
<thead>
<tr>
<th style="background: #f8f9fa; padding: 12px; text-align: left; font-size: 13px; color: #495057;">Service</th>
<th style="background: #f8f9fa; padding: 12px; text-align: right; font-size: 13px; color: #495057;">Current Week</th>
<th style="background: #f8f9fa; padding: 12px; text-align: right; font-size: 13px; color: #495057;">Previous Week</th>
<th style="background: #f8f9fa; padding: 12px; text-align: right; font-size: 13px; color: #495057;">Change (USD)</th>
</tr>
</thead>
<tbody>
{% for row in services %}<tr class="service-row">
<td style="padding: 12px; border-bottom: 1px solid #e9ecef; font-weight: 500;">{{ row.service | escape }}</td>
<td style="padding: 12px; border-bottom: 1px solid #e9ecef; text-align: right; font-family: 'Courier New', monospace;">{{ row.current }}</td>
<td style="padding: 12px; border-bottom: 1px solid #e9ecef; text-align: right; font-family: 'Courier New', monospace;">{{ row.previous }}</td>
<td style="padding: 12px; border-bottom: 1px solid #e9ecef; text-align: right; font-weight: 600; color: {{ row.color }};">{{ row.change }}</td>
</tr>
{% endfor %}</tbody>
</table>
{% if has_recommendations %}<h2 style="font-size: 20px; color: #2c3e50; padding-bottom: 10px; border-bottom: 3px solid #667eea;">Recommendations</h2>
<ul style="padding-left: 20px; line-height: 2;">
{% for recommendation in recommendations %}<li style="margin-bottom: 10px; color: #495057;">{{ recommendation | escape }}</li>
{% endfor %}</ul>
{% endif %}</div>
<div style="background: #f8f9fa; padding: 20px 30px; text-align: center; font-size: 12px; color: #6c757d; border-top: 1px solid #e9ecef;">
<p><strong>AWS Cost Optimizer</strong> - Automated Weekly Report</p>
<p>Generated on {{ generated_at }}</p>
<p style="font-size: 11px;">Previous Period: {{ previous_label }}</p>
</div>
</div>
</body>
</html>
"#;

const TEXT_TEMPLATE: &str = "AWS Cost Report
{{ current_label }}

SUMMARY
----------------------------------------
Current Week:  {{ current_total }}
Previous Week: {{ previous_total }}
Change:        {{ total_change }} ({{ total_change_percent }})

{% if has_services %}TOP SERVICES
{% for row in services %}- {{ row.service }}: {{ row.current }} (was {{ row.previous }}, {{ row.change }})
{% endfor %}{% endif %}{% if has_recommendations %}
RECOMMENDATIONS
{% for recommendation in recommendations %}- {{ recommendation }}
{% endfor %}{% endif %}
Previous Period: {{ previous_label }}
Report generated on {{ generated_at }}
";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub subject: String,
    pub html_body: String,
    pub plain_text_body: String,
}

pub struct ReportInput<'a> {
    pub current_period: Period,
    pub previous_period: Period,
    pub comparison: &'a CostComparison,
    pub recommendations: &'a [String],
}

#[derive(Debug, Serialize)]
struct ServiceRow {
    service: String,
    current: String,
    previous: String,
    change: String,
    color: &'static str,
}

#[derive(Debug, Serialize)]
struct ReportData {
    current_label: String,
    previous_label: String,
    current_total: String,
    previous_total: String,
    total_change: String,
    total_change_amount: String,
    total_change_percent: String,
    change_color: &'static str,
    change_direction: &'static str,
    spending_unchanged: bool,
    has_services: bool,
    services: Vec<ServiceRow>,
    has_recommendations: bool,
    recommendations: Vec<String>,
    generated_at: String,
}

pub struct ReportRenderer {
    html: Template,
    text: Template,
}

impl ReportRenderer {
    pub fn new() -> Result<Self, CostReportError> {
        let parser: Parser = ParserBuilder::with_stdlib().build()?;
        Ok(ReportRenderer {
            html: parser.parse(HTML_TEMPLATE)?,
            text: parser.parse(TEXT_TEMPLATE)?,
        })
    }

    pub fn render(
        &self,
        input: &ReportInput<'_>,
        generated_at: DateTime<Utc>,
    ) -> Result<ReportDocument, CostReportError> {
        let data = report_data(input, generated_at)?;
        let globals = liquid::to_object(&data)?;

        Ok(ReportDocument {
            subject: format!(
                "AWS Cost Report: {} ({})",
                data.current_total, data.total_change_percent
            ),
            html_body: self.html.render(&globals)?,
            plain_text_body: self.text.render(&globals)?,
        })
    }
}

fn report_data(
    input: &ReportInput<'_>,
    generated_at: DateTime<Utc>,
) -> Result<ReportData, CostReportError> {
    let comparison = input.comparison;
    let total_delta = to_amount(&comparison.total_delta)?;
    let services = comparison
        .services
        .iter()
        .take(MAX_REPORTED_SERVICES)
        .map(service_row)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ReportData {
        current_label: input.current_period.label(),
        previous_label: input.previous_period.label(),
        current_total: format_currency(to_amount(&comparison.current_total)?),
        previous_total: format_currency(to_amount(&comparison.previous_total)?),
        total_change: format_signed(total_delta, 2),
        total_change_amount: format_currency(total_delta.abs()),
        total_change_percent: format_percent(&comparison.total_percent)?,
        change_color: change_color(&comparison.total_delta),
        change_direction: if total_delta < 0.0 {
            "decreased"
        } else {
            "increased"
        },
        // Sub-cent movements print as $0.00 and read as no change.
        spending_unchanged: round_to(total_delta, 2) == 0.0,
        has_services: !services.is_empty(),
        services,
        has_recommendations: !input.recommendations.is_empty(),
        recommendations: input.recommendations.to_vec(),
        generated_at: generated_at.format("%B %d, %Y at %I:%M %p UTC").to_string(),
    })
}

fn service_row(delta: &ServiceDelta) -> Result<ServiceRow, CostReportError> {
    Ok(ServiceRow {
        service: delta.service.clone(),
        current: format_currency(to_amount(&delta.current)?),
        previous: format_currency(to_amount(&delta.previous)?),
        change: format!(
            "{} ({})",
            format_signed(to_amount(&delta.delta)?, 2),
            format_percent(&delta.delta_percent)?
        ),
        color: change_color(&delta.delta),
    })
}

fn change_color(delta: &BigDecimal) -> &'static str {
    if *delta > BigDecimal::from(0) {
        INCREASE_COLOR
    } else {
        DECREASE_COLOR
    }
}

/// `$1234.50`, or `-$3.00` for credits.
pub fn format_currency(value: f64) -> String {
    let rounded = round_to(value, 2);
    if rounded < 0.0 {
        format!("-${:.2}", rounded.abs())
    } else {
        format!("${:.2}", rounded.abs())
    }
}

/// Always carries a sign: `+20.00`, `-3.50`, `+0.00`.
pub fn format_signed(value: f64, decimals: usize) -> String {
    let rounded = round_to(value, decimals as i32);
    let sign = if rounded < 0.0 { '-' } else { '+' };
    format!("{}{:.*}", sign, decimals, rounded.abs())
}

/// `+25.0%`, or `N/A` when there is nothing to compare against.
pub fn format_percent(percent: &PercentChange) -> Result<String, CostReportError> {
    Ok(match percent.to_f64()? {
        Some(value) => format!("{}%", format_signed(value, 1)),
        None => "N/A".to_string(),
    })
}
