use std::sync::OnceLock;

use minijinja::{Environment, context};

use crate::controller::view::Panel;
use crate::entities::drug::SearchForm;
use crate::error::DrugLookupError;
use crate::render::page::Page;

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(serde::Serialize)]
struct PanelRow<'a> {
    heading: &'static str,
    count_label: &'a str,
    cards: &'a [crate::controller::view::DrugCard],
}

fn truncate_bytes(s: String, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s;
    }
    if max_bytes == 0 {
        return "…".to_string();
    }
    let mut boundary = max_bytes;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    let mut out = s[..boundary].trim_end().to_string();
    out.push('…');
    out
}

fn env() -> Result<&'static Environment<'static>, DrugLookupError> {
    if let Some(env) = ENV.get() {
        return Ok(env);
    }

    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("truncate", truncate_bytes);
    env.add_template("page.md.j2", include_str!("../../templates/page.md.j2"))?;
    env.add_template("panel.md.j2", include_str!("../../templates/panel.md.j2"))?;
    env.add_template("card.md.j2", include_str!("../../templates/card.md.j2"))?;

    Ok(ENV.get_or_init(|| env))
}

/// Search conditions in the order the form lists them, empty ones skipped.
pub fn form_summary(form: &SearchForm) -> String {
    [
        ("성분코드", &form.generic_code),
        ("품목명", &form.item_name),
        ("제품코드", &form.product_code),
        ("제조업체", &form.manufacturer),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        let value = value.trim();
        (!value.is_empty()).then(|| format!("{label}: {value}"))
    })
    .collect::<Vec<_>>()
    .join(", ")
}

pub fn page_markdown(page: &Page) -> Result<String, DrugLookupError> {
    let panels: Vec<PanelRow<'_>> = Panel::ALL
        .into_iter()
        .filter_map(|panel| {
            let view = page.panel(panel);
            view.visible.then(|| PanelRow {
                heading: panel.heading(),
                count_label: &view.count_label,
                cards: &view.cards,
            })
        })
        .collect();

    let tmpl = env()?.get_template("page.md.j2")?;
    Ok(tmpl.render(context! {
        form_summary => form_summary(&page.form),
        error => page.error.as_deref(),
        panels => panels,
    })?)
}
