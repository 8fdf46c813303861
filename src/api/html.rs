//! HTML Dashboard
//!
//! Server-rendered page: site and year selectors, the reading and threshold
//! forms, export links, a line chart of the filtered readings and the
//! overconsumption alert list. No client-side script; every control is a
//! plain form.

use std::fmt::Write;

use crate::api::dto::selection_query;
use crate::dashboard::{
    ChartData, DashboardView, FormErrors, NoticeKind, ReadingForm, ThresholdForm,
};
use crate::model::Resource;

const CHART_WIDTH: f64 = 700.0;
const CHART_HEIGHT: f64 = 300.0;
const CHART_PADDING: f64 = 40.0;

const STYLE: &str = r#"
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;padding:2rem;color:#222}
h2{margin-top:2rem}
form{margin:.5rem 0}
input,select,button{margin:.2rem .3rem .2rem 0;padding:.3rem .5rem}
.field-error{color:#b00020;font-size:.85rem;display:block}
.notice{background:#fff4e5;border-left:4px solid #ff9800;padding:.5rem 1rem;margin:.3rem 0}
.notice.rejected{border-color:#b00020;background:#fdecea}
.alerts{color:red}
.legend span{margin-right:1rem}
"#;

/// Everything needed to render the page once
pub struct Page<'a> {
    pub view: &'a DashboardView,
    pub reading_input: Option<&'a ReadingForm>,
    pub reading_errors: Option<&'a FormErrors>,
    pub threshold_input: Option<&'a ThresholdForm>,
    pub threshold_errors: Option<&'a FormErrors>,
}

impl<'a> Page<'a> {
    pub fn new(view: &'a DashboardView) -> Self {
        Self {
            view,
            reading_input: None,
            reading_errors: None,
            threshold_input: None,
            threshold_errors: None,
        }
    }

    pub fn with_reading_errors(mut self, input: &'a ReadingForm, errors: &'a FormErrors) -> Self {
        self.reading_input = Some(input);
        self.reading_errors = Some(errors);
        self
    }

    pub fn with_threshold_errors(
        mut self,
        input: &'a ThresholdForm,
        errors: &'a FormErrors,
    ) -> Self {
        self.threshold_input = Some(input);
        self.threshold_errors = Some(errors);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(16 * 1024);
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str("<title>Campmeter</title>\n<style>");
        out.push_str(STYLE);
        out.push_str("</style>\n</head>\n<body>\n");

        self.render_notices(&mut out);
        self.render_selectors(&mut out);
        self.render_reading_form(&mut out);
        self.render_threshold_form(&mut out);
        self.render_history(&mut out);

        out.push_str("</body>\n</html>\n");
        out
    }

    fn query(&self) -> String {
        selection_query(&self.view.selection)
    }

    fn render_notices(&self, out: &mut String) {
        if self.view.notices.is_empty() {
            return;
        }

        for notice in &self.view.notices {
            let class = match notice.kind {
                NoticeKind::Transport => "notice",
                NoticeKind::Rejected => "notice rejected",
            };
            let _ = writeln!(
                out,
                "<div class=\"{}\">{} <small>({})</small></div>",
                class,
                escape(&notice.message),
                notice.at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        let _ = writeln!(
            out,
            "<form method=\"post\" action=\"/notices/clear{}\"><button>Dismiss</button></form>",
            escape(&self.query())
        );
    }

    fn render_selectors(&self, out: &mut String) {
        let selection = &self.view.selection;

        out.push_str("<form method=\"get\" action=\"/\">\n<select name=\"site\">\n");
        out.push_str("<option value=\"\">-- Select a site --</option>\n");
        for site in &self.view.sites {
            let selected = if selection.site == Some(site.id) { " selected" } else { "" };
            let _ = writeln!(
                out,
                "<option value=\"{}\"{}>{}</option>",
                site.id,
                selected,
                escape(&site.name)
            );
        }
        out.push_str("</select>\n<select name=\"year\">\n<option value=\"\">All years</option>\n");
        for year in &self.view.years {
            let selected = if selection.year == Some(*year) { " selected" } else { "" };
            let _ = writeln!(out, "<option value=\"{0}\"{1}>{0}</option>", year, selected);
        }
        out.push_str("</select>\n<button>Show</button>\n</form>\n");

        let _ = writeln!(
            out,
            "<form method=\"post\" action=\"/refresh{}\"><button>Refresh data</button></form>",
            escape(&self.query())
        );
    }

    fn render_reading_form(&self, out: &mut String) {
        let input = self.reading_input;
        let errors = self.reading_errors;
        let value = |f: fn(&ReadingForm) -> &str| input.map(f).unwrap_or("");

        out.push_str("<h2>Record a reading</h2>\n");
        let _ = writeln!(
            out,
            "<form method=\"post\" action=\"/readings{}\">",
            escape(&self.query())
        );
        self.hidden_site(out);
        field_error(out, errors, "site");

        let _ = writeln!(
            out,
            "<input type=\"date\" name=\"date\" value=\"{}\">",
            escape(value(|f| f.date.as_str()))
        );
        field_error(out, errors, "date");

        for (name, placeholder, typed) in [
            ("water", "Water meter", value(|f| f.water.as_str())),
            ("electricity", "Electricity meter", value(|f| f.electricity.as_str())),
            ("gas", "Gas meter", value(|f| f.gas.as_str())),
        ] {
            text_input(out, name, placeholder, typed);
            field_error(out, errors, name);
        }

        out.push_str("<button>Save</button>\n</form>\n");
    }

    fn render_threshold_form(&self, out: &mut String) {
        let threshold = &self.view.threshold;
        let input = self.threshold_input;
        let errors = self.threshold_errors;

        out.push_str("<h2>Thresholds</h2>\n");
        let _ = writeln!(
            out,
            "<form method=\"post\" action=\"/thresholds{}\">",
            escape(&self.query())
        );
        self.hidden_site(out);
        field_error(out, errors, "site");

        for (resource, placeholder) in [
            (Resource::Water, "Water threshold"),
            (Resource::Electricity, "Electricity threshold"),
            (Resource::Gas, "Gas threshold"),
        ] {
            let current = match input {
                Some(form) => match resource {
                    Resource::Water => form.water.clone(),
                    Resource::Electricity => form.electricity.clone(),
                    Resource::Gas => form.gas.clone(),
                },
                None => threshold.get(resource).to_string(),
            };
            text_input(out, resource.label(), placeholder, &current);
            field_error(out, errors, resource.label());
        }

        out.push_str("<button>Save thresholds</button>\n</form>\n");
        out.push_str("<a href=\"/export/thresholds.csv\"><button>Export thresholds</button></a>\n");
    }

    fn render_history(&self, out: &mut String) {
        out.push_str("<h2>Reading history</h2>\n");
        let _ = writeln!(
            out,
            "<a href=\"/export/readings.csv{}\"><button>Export CSV</button></a>",
            escape(&self.query())
        );

        render_chart(out, &self.view.chart);

        out.push_str("<ul class=\"alerts\">\n");
        for line in &self.view.alerts {
            let _ = writeln!(out, "<li>{}</li>", escape(&line.text()));
        }
        out.push_str("</ul>\n");
    }

    fn hidden_site(&self, out: &mut String) {
        let site = self
            .view
            .selection
            .site
            .map(|id| id.to_string())
            .unwrap_or_default();
        let _ = writeln!(out, "<input type=\"hidden\" name=\"site\" value=\"{}\">", site);
        if let Some(site) = self.view.selected_site() {
            let _ = writeln!(out, "<strong>{}</strong>", escape(&site.name));
        }
    }
}

fn text_input(out: &mut String, name: &str, placeholder: &str, value: &str) {
    let _ = writeln!(
        out,
        "<input name=\"{}\" placeholder=\"{}\" inputmode=\"decimal\" value=\"{}\">",
        name,
        placeholder,
        escape(value)
    );
}

fn field_error(out: &mut String, errors: Option<&FormErrors>, field: &str) {
    if let Some(message) = errors.and_then(|e| e.field(field)) {
        let _ = writeln!(out, "<span class=\"field-error\">{}</span>", escape(message));
    }
}

/// Minimal SVG line chart: points evenly spaced in reading order
fn render_chart(out: &mut String, chart: &ChartData) {
    if chart.is_empty() {
        out.push_str("<p>No readings for this selection.</p>\n");
        return;
    }

    let max = chart.max_value().max(1.0);
    let plot_w = CHART_WIDTH - 2.0 * CHART_PADDING;
    let plot_h = CHART_HEIGHT - 2.0 * CHART_PADDING;
    let step = if chart.points.len() > 1 {
        plot_w / (chart.points.len() - 1) as f64
    } else {
        0.0
    };
    let x = |i: usize| CHART_PADDING + step * i as f64;
    let y = |v: f64| CHART_PADDING + plot_h - (v / max) * plot_h;

    let _ = writeln!(
        out,
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\">",
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );
    let _ = writeln!(
        out,
        "<rect x=\"{p}\" y=\"{p}\" width=\"{pw}\" height=\"{ph}\" fill=\"none\" stroke=\"#ccc\" stroke-dasharray=\"3 3\"/>",
        p = CHART_PADDING,
        pw = plot_w,
        ph = plot_h
    );
    let _ = writeln!(
        out,
        "<text x=\"4\" y=\"{}\" font-size=\"10\">{}</text>",
        CHART_PADDING,
        max
    );

    for series in &chart.series {
        let points: Vec<String> = chart
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{:.1},{:.1}", x(i), y(p.value(series.resource))))
            .collect();
        let _ = writeln!(
            out,
            "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"><title>{}</title></polyline>",
            series.color,
            points.join(" "),
            series.label
        );
    }

    if let (Some(first), Some(last)) = (chart.points.first(), chart.points.last()) {
        let _ = writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\">{}</text>",
            CHART_PADDING,
            CHART_HEIGHT - 10.0,
            first.date
        );
        let _ = writeln!(
            out,
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" text-anchor=\"end\">{}</text>",
            CHART_WIDTH - CHART_PADDING,
            CHART_HEIGHT - 10.0,
            last.date
        );
    }
    out.push_str("</svg>\n<div class=\"legend\">");
    for series in &chart.series {
        let _ = write!(
            out,
            "<span style=\"color:{}\">&#9632; {}</span>",
            series.color, series.label
        );
    }
    out.push_str("</div>\n");
}

/// Escape text for HTML element content and quoted attributes
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DashboardData, Selection, ValidationError};
    use crate::model::{Reading, Site, Threshold};
    use chrono::NaiveDate;

    fn view(selection: Selection) -> DashboardView {
        let data = DashboardData {
            sites: vec![Site {
                id: 1,
                name: "Les <Pins>".into(),
            }],
            readings: vec![Reading {
                id: 1,
                site_id: 1,
                reading_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                water: 10.0,
                electricity: 1.0,
                gas: 1.0,
            }],
            thresholds: vec![Threshold {
                id: 9,
                site_id: 1,
                water: 5.0,
                electricity: 50.0,
                gas: 50.0,
            }],
            ..Default::default()
        };
        DashboardView::build(&data, selection)
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_page_shows_alerts_and_threshold_values() {
        let view = view(Selection::for_site(1));
        let html = Page::new(&view).render();

        assert!(html.contains("Overconsumption water: 10"));
        assert!(html.contains("name=\"water\" placeholder=\"Water threshold\" inputmode=\"decimal\" value=\"5\""));
        assert!(html.contains("Les &lt;Pins&gt;"));
        assert!(html.contains("<option value=\"1\" selected>"));
        assert!(html.contains("<polyline"));
        assert!(html.contains("/export/readings.csv?site=1"));
    }

    #[test]
    fn test_page_shows_field_errors_and_typed_input() {
        let view = view(Selection::for_site(1));
        let input = ReadingForm {
            site: "1".into(),
            date: "2023-02-01".into(),
            water: "abc".into(),
            ..Default::default()
        };
        let errors = FormErrors(vec![ValidationError {
            field: "water",
            message: "\"abc\" is not a number".into(),
        }]);

        let html = Page::new(&view).with_reading_errors(&input, &errors).render();
        assert!(html.contains("<span class=\"field-error\">&quot;abc&quot; is not a number</span>"));
        assert!(html.contains("value=\"2023-02-01\""));
    }

    #[test]
    fn test_empty_selection_has_no_chart() {
        let view = view(Selection::new(None, Some(1999)));
        let html = Page::new(&view).render();
        assert!(html.contains("No readings for this selection."));
        assert!(html.contains("<option value=\"\">All years</option>"));
    }
}
