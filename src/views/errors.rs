use axum::http::StatusCode;
use uuid::Uuid;

use super::layout::{page as layout, text};

pub fn page(status: StatusCode, title: &str, message: &str, reference: Option<Uuid>) -> String {
    let reference = reference
        .map(|r| format!(r#"<p class="muted">Reference: {r}</p>"#))
        .unwrap_or_default();

    let body = format!(
        r#"<section class="error">
<h1>{title}</h1>
<p>{message}</p>
<p class="muted">HTTP {code}</p>
{reference}
</section>
<p><a href="/input">Back to search</a></p>"#,
        title = text(title),
        message = text(message),
        code = status.as_u16(),
    );

    layout(title, &body)
}
