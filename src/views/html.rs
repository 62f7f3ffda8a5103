// Markup fragments for tables and forms. All dynamic text is escaped here.
use std::collections::HashMap;

use crate::models::entity::{field_text, input_time, record_id, display_time};
use crate::models::{Field, FieldKind, NamedOption, Record, Resource};
use super::escape;

pub fn table_header(resource: &Resource) -> String {
    let cells = resource
        .columns
        .iter()
        .map(|column| format!("<th>{}</th>", escape(column.label)))
        .collect::<Vec<_>>()
        .join("");
    format!(r#"<tr>{}<th class="actions">Actions</th></tr>"#, cells)
}

pub fn table_rows(resource: &Resource, records: &[Record]) -> String {
    if records.is_empty() {
        return format!(
            r#"<tr><td colspan="{}" class="empty">No {} found.</td></tr>"#,
            resource.columns.len() + 1,
            escape(&resource.title.to_lowercase())
        );
    }

    records
        .iter()
        .map(|record| {
            let cells = resource
                .columns
                .iter()
                .map(|column| {
                    let text = field_text(record, column.keys)
                        .map(|text| if column.is_time { display_time(&text) } else { text })
                        .unwrap_or_else(|| column.fallback.to_string());
                    format!("<td>{}</td>", escape(&text))
                })
                .collect::<Vec<_>>()
                .join("");
            format!("<tr>{}<td class=\"actions\">{}</td></tr>", cells, row_actions(resource, record))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn row_actions(resource: &Resource, record: &Record) -> String {
    let Some(id) = record_id(record) else {
        return String::new();
    };
    let id = escape(&id);
    format!(
        r#"<a href="{list}?edit={id}" class="button">Edit</a>
<form method="post" action="{list}" class="inline" onsubmit="return confirm('Delete this {singular}?');">
    <input type="hidden" name="actionType" value="delete">
    <input type="hidden" name="id" value="{id}">
    <button type="submit" class="danger">Delete</button>
</form>"#,
        list = resource.list_path,
        id = id,
        singular = escape(resource.singular),
    )
}

/// Inputs for `fields`, prefilled from `values`; selects read from `options`.
pub fn form_inputs(
    fields: &[Field],
    values: &HashMap<&str, String>,
    options: &HashMap<&str, Vec<NamedOption>>,
) -> String {
    fields
        .iter()
        .map(|field| {
            let value = values.get(field.name).map(String::as_str).unwrap_or("");
            let required = if field.required { " required" } else { "" };
            let input = match field.kind {
                FieldKind::Select { source } => {
                    let choices = options
                        .get(source)
                        .map(|list| {
                            list.iter()
                                .map(|option| {
                                    let option_value = option.value();
                                    let selected = if option_value == value { " selected" } else { "" };
                                    format!(
                                        r#"<option value="{}"{}>{}</option>"#,
                                        escape(&option_value),
                                        selected,
                                        escape(&option.name)
                                    )
                                })
                                .collect::<Vec<_>>()
                                .join("")
                        })
                        .unwrap_or_default();
                    format!(
                        r#"<select id="{name}" name="{name}"{required}><option value="">Select…</option>{choices}</select>"#,
                        name = field.name,
                        required = required,
                        choices = choices,
                    )
                }
                kind => {
                    let (input_type, extra) = match kind {
                        FieldKind::Email => ("email", ""),
                        FieldKind::Number => ("number", r#" step="any""#),
                        FieldKind::DateTime => ("datetime-local", ""),
                        _ => ("text", ""),
                    };
                    let value = if kind == FieldKind::DateTime { input_time(value) } else { value.to_string() };
                    format!(
                        r#"<input type="{input_type}" id="{name}" name="{name}" value="{value}"{extra}{required}>"#,
                        input_type = input_type,
                        name = field.name,
                        value = escape(&value),
                        extra = extra,
                        required = required,
                    )
                }
            };
            format!(
                r#"<label for="{}">{}</label>
{}"#,
                field.name,
                escape(field.label),
                input
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Update form for one record; `record` is `None` when re-rendering after a
/// failed submission (values are not echoed back).
pub fn edit_form(resource: &Resource, id: &str, record: Option<&Record>) -> String {
    let values: HashMap<&str, String> = match record {
        Some(record) => resource
            .update_fields
            .iter()
            .filter_map(|field| field_text(record, &[field.name]).map(|v| (field.name, v)))
            .collect(),
        None => HashMap::new(),
    };

    format!(
        r#"<section class="edit">
<h2>Edit {singular}</h2>
<form method="post" action="{list}">
    <input type="hidden" name="actionType" value="update">
    <input type="hidden" name="id" value="{id}">
    {inputs}
    <div class="buttons">
        <a href="{list}" class="button">Cancel</a>
        <button type="submit">Save</button>
    </div>
</form>
</section>"#,
        singular = escape(resource.singular),
        list = resource.list_path,
        id = escape(id),
        inputs = form_inputs(resource.update_fields, &values, &HashMap::new()),
    )
}
