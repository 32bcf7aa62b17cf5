use std::fmt::Write;

use super::layout::{page, text};
use crate::services::calories::CalorieReport;

pub fn report(report: &CalorieReport) -> String {
    let mut body = String::from(
        "<h1>Calories per 100 g</h1><table><tr><th>Ingredient</th><th>kcal</th><th>kJ</th></tr>",
    );
    for line in &report.lines {
        let (kcal, kj) = match line.energy {
            Some(e) => (e.kcal.to_string(), e.kj.to_string()),
            None => ("N/A".to_string(), "N/A".to_string()),
        };
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{kcal}</td><td>{kj}</td></tr>",
            text(&line.item)
        );
    }
    let _ = write!(
        body,
        "<tr><th>Total</th><th>{}</th><th>{}</th></tr></table>",
        report.total.kcal, report.total.kj
    );
    body.push_str(r#"<p class="muted">Totals include only ingredients we know about.</p>"#);

    page("Calories", &body)
}
