use std::fmt::Write;

use super::layout::{attr, page, text};
use crate::services::recipes::{
    RecipeCollection, RecipeDetail, RecipeSummary, SearchQuery,
    models::{Instructions, NutritionFact},
};

fn list(items: &[String]) -> String {
    items.iter().map(|i| text(i)).collect::<Vec<_>>().join(", ")
}

fn card(r: &RecipeSummary) -> String {
    let mut out = String::from(r#"<article class="card">"#);
    if let Some(img) = &r.image_url {
        let _ = write!(out, r#"<img src="{}" alt="{}">"#, attr(img), attr(&r.title));
    }
    let _ = write!(
        out,
        r#"<h3><a href="/recipe/{id}">{title}</a></h3><p class="muted">♥ {likes}</p>"#,
        id = r.id,
        title = text(&r.title),
        likes = r.likes,
    );
    if !r.used_ingredients.is_empty() {
        let _ = write!(out, "<p>Uses: {}</p>", list(&r.used_ingredients));
    }
    if !r.missed_ingredients.is_empty() {
        let _ = write!(out, "<p>Also needs: {}</p>", list(&r.missed_ingredients));
    }
    out.push_str("</article>");
    out
}

/// Re-submits the same search at another offset.
fn page_button(query: &SearchQuery, offset: u32, label: &str) -> String {
    format!(
        r#"<form class="inline" method="post" action="/generate">
<input type="hidden" name="ingredients" value="{ingredients}">
<input type="hidden" name="diet" value="{diet}">
<input type="hidden" name="offset" value="{offset}">
<button type="submit">{label}</button></form>"#,
        ingredients = attr(&query.joined_ingredients()),
        diet = attr(query.diet().map_or("", |d| d.as_str())),
        label = text(label),
    )
}

pub fn results(query: &SearchQuery, collection: &RecipeCollection) -> String {
    let mut body = format!(
        "<h1>Recipes with {}</h1>",
        text(&query.ingredients().collect::<Vec<_>>().join(", "))
    );
    if let Some(diet) = query.diet() {
        let _ = write!(body, r#"<p class="muted">Diet: {}</p>"#, text(diet.label()));
    }

    if collection.is_empty() {
        body.push_str(
            r#"<p>No recipes matched those ingredients. <a href="/input">Try a different list</a>.</p>"#,
        );
    } else {
        let _ = write!(
            body,
            r#"<p class="muted">Showing {} of {} results.</p><section class="cards">"#,
            collection.recipes.len(),
            collection.total_results
        );
        for r in &collection.recipes {
            body.push_str(&card(r));
        }
        body.push_str("</section>");
    }

    body.push_str("<nav>");
    if let Some(prev) = collection.previous_offset() {
        body.push_str(&page_button(query, prev, "← Previous"));
    }
    if let Some(next) = collection.next_offset() {
        body.push_str(&page_button(query, next, "More recipes →"));
    }
    body.push_str("</nav>");

    let _ = write!(
        body,
        r#"<p class="muted">Fetched {}</p>"#,
        collection.fetched_at.format("%Y-%m-%d %H:%M UTC")
    );

    page("Results", &body)
}

fn format_amount(fact: &NutritionFact) -> String {
    if fact.amount.fract() == 0.0 {
        format!("{:.0} {}", fact.amount, fact.unit)
    } else {
        format!("{:.1} {}", fact.amount, fact.unit)
    }
}

pub fn detail(d: &RecipeDetail) -> String {
    let mut body = format!("<h1>{}</h1>", text(&d.title));
    if let Some(img) = &d.image_url {
        let _ = write!(body, r#"<img class="hero" src="{}" alt="{}">"#, attr(img), attr(&d.title));
    }

    let mut facts = Vec::new();
    if let Some(s) = d.servings {
        facts.push(format!("Serves {s}"));
    }
    if let Some(m) = d.ready_in_minutes {
        facts.push(format!("Ready in {m} min"));
    }
    if !facts.is_empty() {
        let _ = write!(body, r#"<p class="muted">{}</p>"#, facts.join(" · "));
    }

    body.push_str("<h2>Ingredients</h2>");
    if d.ingredients.is_empty() {
        body.push_str(r#"<p class="muted">No ingredient list available.</p>"#);
    } else {
        body.push_str("<ul>");
        for i in &d.ingredients {
            let line = i.original.as_deref().unwrap_or(&i.name);
            let _ = write!(body, "<li>{}", text(line));
            if let Some(aisle) = &i.aisle {
                let _ = write!(body, r#" <span class="muted">({})</span>"#, text(aisle));
            }
            body.push_str("</li>");
        }
        body.push_str("</ul>");
    }

    body.push_str("<h2>Instructions</h2>");
    match &d.instructions {
        Instructions::Steps(steps) => {
            body.push_str("<ol>");
            for s in steps {
                let _ = write!(body, r#"<li value="{}">{}</li>"#, s.number, text(&s.text));
            }
            body.push_str("</ol>");
        }
        Instructions::Text(t) => {
            let _ = write!(body, "<p>{}</p>", text(t));
        }
        Instructions::Missing => {
            body.push_str(r#"<p class="muted">No instructions provided.</p>"#);
        }
    }

    if !d.nutrition.is_empty() {
        body.push_str("<h2>Nutrition (per serving)</h2><table>");
        for n in &d.nutrition {
            let _ = write!(
                body,
                "<tr><th>{}</th><td>{}</td></tr>",
                text(&n.name),
                text(&format_amount(n))
            );
        }
        body.push_str("</table>");
    }

    if let Some(src) = &d.source_url {
        let _ = write!(
            body,
            r#"<p><a href="{}" rel="noopener noreferrer">Original recipe</a></p>"#,
            attr(src)
        );
    }

    page(&d.title, &body)
}
