//! Shared page chrome and escaping helpers.
use html_escape::{encode_double_quoted_attribute, encode_text};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #222; background: #fafaf7; }
header { background: #2f6b3b; color: #fff; padding: 0.75rem 1.5rem; }
header a { color: #fff; text-decoration: none; font-weight: 600; }
main { max-width: 56rem; margin: 1.5rem auto; padding: 0 1rem; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(15rem, 1fr)); gap: 1rem; }
.card { background: #fff; border: 1px solid #ddd; border-radius: 6px; padding: 0.75rem; }
.card img, .hero { max-width: 100%; border-radius: 4px; }
.muted { color: #777; font-size: 0.9rem; }
.error { border-left: 4px solid #b03a2e; padding-left: 1rem; }
table { border-collapse: collapse; }
td, th { padding: 0.25rem 0.75rem; border-bottom: 1px solid #eee; text-align: left; }
form.inline { display: inline; }
"#;

pub fn text(s: &str) -> String {
    encode_text(s).into_owned()
}

pub fn attr(s: &str) -> String {
    encode_double_quoted_attribute(s).into_owned()
}

/// Wrap a page body. `title` is escaped here; `body` must already be safe HTML.
pub fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Smart Recipes</title>
<style>{STYLE}</style>
</head>
<body>
<header><a href="/">Smart Recipes</a> · <a href="/input">Find recipes</a></header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = text(title),
    )
}
