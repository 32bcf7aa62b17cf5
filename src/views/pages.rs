use super::layout::{attr, page, text};
use crate::services::recipes::Diet;
use crate::api::dto::forms::MAX_INGREDIENTS_LEN;

pub fn home() -> String {
    page(
        "Welcome",
        r#"<h1>What can I cook tonight?</h1>
<p>Tell us what is in your kitchen and we will find recipes that use it.</p>
<p><a href="/input">Start with your ingredients →</a></p>"#,
    )
}

/// Search form plus the calorie lookup form.
pub fn input(diets: &[Diet]) -> String {
    let options: String = diets
        .iter()
        .map(|d| {
            format!(
                r#"<option value="{}">{}</option>"#,
                attr(d.as_str()),
                text(d.label())
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Find recipes</h1>
<form method="post" action="/generate">
<p><label>Ingredients (comma separated)<br>
<input type="text" name="ingredients" maxlength="{max}" size="60" placeholder="egg, flour, milk" required></label></p>
<p><label>Diet<br>
<select name="diet"><option value="">No preference</option>{options}</select></label></p>
<p><button type="submit">Search</button></p>
</form>
<h2>Calorie check</h2>
<form method="post" action="/calories">
<p><label>Ingredients (comma separated)<br>
<input type="text" name="ingredients" maxlength="{max}" size="60" placeholder="apple, banana" required></label></p>
<p><button type="submit">Count calories</button></p>
</form>"#,
        max = MAX_INGREDIENTS_LEN,
    );

    page("Find recipes", &body)
}
