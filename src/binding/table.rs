//! Tabular data binding
//!
//! Three input shapes are accepted and reconciled into one canonical
//! header-row-plus-data-rows form before anything touches the tree:
//!
//! - row-major: the first entry is the header sequence, later entries are
//!   per-row cell sequences
//! - row-major with double headers: a row entry that is a keyed map reads
//!   as a row label plus its cell sequence, rendered as a leading `th`
//! - column-major: a map of column name to per-row values, transposed by
//!   index
//!
//! Projection then reuses whatever table structure already exists: a
//! present header row acts as the allowed-column filter, and a
//! template-marked row is cloned per data row through the registry.

use markup5ever_rcdom::Handle;
use tracing::debug;

use crate::binding::directive;
use crate::binding::value::BindValue;
use crate::config::MarkupConfig;
use crate::dom::tree;
use crate::error::{BindError, Result};
use crate::template::TemplateRegistry;

/// Normalized tabular data
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// One normalized row; `label` is the double-header cell, when present
#[derive(Debug, Clone)]
pub struct TableRow {
    pub label: Option<String>,
    pub cells: Vec<BindValue>,
}

/// Normalize tabular input into canonical form
///
/// A row entry that is a keyed map always reads as a double-header row
/// (first pair: label and cell sequence); keyed scalar data in row
/// position is therefore taken for a double header. Disambiguating that
/// case needs an explicit shape discriminator the input format does not
/// carry yet.
pub fn normalize(data: &BindValue) -> Result<CanonicalTable> {
    match data {
        BindValue::Seq(entries) => normalize_rows(entries),
        BindValue::Map(columns) => normalize_columns(columns),
        _ => Err(BindError::IncorrectTableDataFormat {
            entry: "table data must be a sequence of rows or a map of columns".to_string(),
        }),
    }
}

fn normalize_rows(entries: &[BindValue]) -> Result<CanonicalTable> {
    let Some(BindValue::Seq(header_cells)) = entries.first() else {
        return Err(BindError::IncorrectTableDataFormat {
            entry: "header row (first entry) is not a sequence".to_string(),
        });
    };
    let headers: Vec<String> = header_cells.iter().map(BindValue::display).collect();

    let mut rows = Vec::new();
    for (index, entry) in entries.iter().skip(1).enumerate() {
        match entry {
            BindValue::Seq(cells) => rows.push(TableRow {
                label: None,
                cells: cells.clone(),
            }),
            BindValue::Map(pairs) => {
                let Some((label, value)) = pairs.first() else {
                    return Err(BindError::IncorrectTableDataFormat {
                        entry: format!("row {} is an empty map", index + 1),
                    });
                };
                let BindValue::Seq(cells) = value else {
                    return Err(BindError::IncorrectTableDataFormat {
                        entry: format!("row {} ('{label}') does not hold a sequence", index + 1),
                    });
                };
                rows.push(TableRow {
                    label: Some(label.clone()),
                    cells: cells.clone(),
                });
            }
            _ => {
                return Err(BindError::IncorrectTableDataFormat {
                    entry: format!("row {} is not iterable", index + 1),
                });
            }
        }
    }
    Ok(CanonicalTable { headers, rows })
}

fn normalize_columns(columns: &[(String, BindValue)]) -> Result<CanonicalTable> {
    let mut headers = Vec::new();
    let mut series: Vec<&[BindValue]> = Vec::new();
    for (name, value) in columns {
        let BindValue::Seq(cells) = value else {
            return Err(BindError::IncorrectTableDataFormat {
                entry: format!("column '{name}' is not iterable"),
            });
        };
        headers.push(name.clone());
        series.push(cells);
    }

    let row_count = series.iter().map(|s| s.len()).max().unwrap_or(0);
    let rows = (0..row_count)
        .map(|i| TableRow {
            label: None,
            cells: series
                .iter()
                .map(|s| s.get(i).cloned().unwrap_or(BindValue::Null))
                .collect(),
        })
        .collect();
    Ok(CanonicalTable { headers, rows })
}

/// Bind tabular data onto every table in (or at) the context
pub fn bind_table_onto(
    registry: &mut TemplateRegistry,
    config: &MarkupConfig,
    root: &Handle,
    data: &BindValue,
    context: &Handle,
) -> Result<()> {
    let table = normalize(data)?;

    let targets = if tree::element_name(context).as_deref() == Some("table") {
        vec![context.clone()]
    } else {
        tree::find_by_tag(context, "table")
    };
    if targets.is_empty() {
        return Err(BindError::TableElementNotFound);
    }

    for target in targets {
        project(registry, config, root, &table, &target)?;
    }
    Ok(())
}

fn project(
    registry: &mut TemplateRegistry,
    config: &MarkupConfig,
    root: &Handle,
    table: &CanonicalTable,
    element: &Handle,
) -> Result<()> {
    // Existing header cells filter and order the columns; otherwise a
    // header row is synthesized from the normalized headers
    let allowed: Vec<String> = match header_cells(element) {
        Some(cells) => cells
            .iter()
            .map(|cell| {
                tree::get_attr(cell, &config.key_attr)
                    .unwrap_or_else(|| tree::text_content(cell).trim().to_string())
            })
            .collect(),
        None => {
            synthesize_header(element, &table.headers);
            table.headers.clone()
        }
    };
    let column_index: Vec<Option<usize>> = allowed
        .iter()
        .map(|key| table.headers.iter().position(|h| h == key))
        .collect();

    let body = tree::find_by_tag(element, "tbody")
        .into_iter()
        .next()
        .unwrap_or_else(|| element.clone());
    let has_row_template = row_template_exists(registry, root, element);

    for row in &table.rows {
        let row_element = if has_row_template {
            registry.insert_clone(root, element, None)?
        } else {
            let tr = tree::new_element("tr");
            tree::append_child(&body, &tr);
            tr
        };
        populate_row(row, &allowed, &column_index, &row_element, config)?;
    }

    debug!(
        rows = table.rows.len(),
        columns = allowed.len(),
        "table bind complete"
    );
    Ok(())
}

/// The cells of an existing header row, if the table has one
fn header_cells(table: &Handle) -> Option<Vec<Handle>> {
    tree::find_by_tag(table, "tr").into_iter().find_map(|tr| {
        let cells: Vec<Handle> = tree::element_children(&tr)
            .into_iter()
            .filter(|c| tree::element_name(c).as_deref() == Some("th"))
            .collect();
        if cells.is_empty() {
            None
        } else {
            Some(cells)
        }
    })
}

fn synthesize_header(table: &Handle, headers: &[String]) {
    let thead = tree::new_element("thead");
    let tr = tree::new_element("tr");
    for header in headers {
        let th = tree::new_element("th");
        tree::set_text_content(&th, header);
        tree::append_child(&tr, &th);
    }
    tree::append_child(&thead, &tr);

    match tree::element_children(table).first() {
        Some(first) => tree::insert_before(table, &thead, first),
        None => tree::append_child(table, &thead),
    }
}

fn row_template_exists(registry: &mut TemplateRegistry, root: &Handle, table: &Handle) -> bool {
    registry
        .get_mut(root, table, None)
        .map(|instance| tree::element_name(instance.prototype()).as_deref() == Some("tr"))
        .unwrap_or(false)
}

fn populate_row(
    row: &TableRow,
    allowed: &[String],
    column_index: &[Option<usize>],
    row_element: &Handle,
    config: &MarkupConfig,
) -> Result<()> {
    // A double-header label becomes a th in column 0, data shifts right
    if let Some(label) = &row.label {
        let th = tree::new_element("th");
        tree::set_text_content(&th, label);
        match tree::element_children(row_element).first() {
            Some(first) => tree::insert_before(row_element, &th, first),
            None => tree::append_child(row_element, &th),
        }
    }

    let mut cells: Vec<Handle> = tree::element_children(row_element)
        .into_iter()
        .filter(|c| {
            matches!(
                tree::element_name(c).as_deref(),
                Some("td") | Some("th")
            )
        })
        .collect();
    let offset = usize::from(row.label.is_some());

    for (position, mapped) in column_index.iter().enumerate() {
        let value = mapped
            .and_then(|i| row.cells.get(i))
            .cloned()
            .unwrap_or(BindValue::Null);
        let slot = position + offset;
        let cell = match cells.get(slot) {
            Some(existing) => existing.clone(),
            None => {
                let td = tree::new_element("td");
                tree::append_child(row_element, &td);
                cells.push(td.clone());
                td
            }
        };
        // Pre-existing cells with element content (inputs, markup) are
        // filled by the directive pass below, not overwritten
        if tree::element_children(&cell).is_empty() {
            tree::set_text_content(&cell, &value.display());
        }
    }

    // Re-run directives so row templates carrying directive attributes
    // (inputs with a row id and the like) see the same per-row data
    for (position, mapped) in column_index.iter().enumerate() {
        let value = mapped
            .and_then(|i| row.cells.get(i))
            .cloned()
            .unwrap_or(BindValue::Null);
        directive::apply_directives(Some(&allowed[position]), &value, row_element, config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn setup(html: &str) -> (Document, TemplateRegistry, MarkupConfig) {
        let doc = Document::parse(html).expect("Should parse");
        let config = MarkupConfig::default();
        let registry = TemplateRegistry::extract(&doc.root(), &config);
        (doc, registry, config)
    }

    fn seq_of(items: &[&str]) -> BindValue {
        BindValue::Seq(items.iter().map(|s| BindValue::from(*s)).collect())
    }

    #[test]
    fn test_normalize_row_major() {
        let data = BindValue::Seq(vec![
            seq_of(&["Day", "Weather"]),
            seq_of(&["Mon", "Sun"]),
            seq_of(&["Tue", "Rain"]),
        ]);
        let table = normalize(&data).expect("Should normalize");
        assert_eq!(table.headers, vec!["Day", "Weather"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[1].display(), "Sun");
        assert!(table.rows[0].label.is_none());
    }

    #[test]
    fn test_normalize_column_major_matches_row_major() {
        let row_major = BindValue::Seq(vec![
            seq_of(&["Day", "Weather"]),
            seq_of(&["Mon", "Sun"]),
            seq_of(&["Tue", "Rain"]),
        ]);
        let column_major = BindValue::Map(vec![
            ("Day".to_string(), seq_of(&["Mon", "Tue"])),
            ("Weather".to_string(), seq_of(&["Sun", "Rain"])),
        ]);
        let a = normalize(&row_major).unwrap();
        let b = normalize(&column_major).unwrap();
        assert_eq!(a.headers, b.headers);
        for (x, y) in a.rows.iter().zip(&b.rows) {
            let xs: Vec<String> = x.cells.iter().map(BindValue::display).collect();
            let ys: Vec<String> = y.cells.iter().map(BindValue::display).collect();
            assert_eq!(xs, ys);
        }
    }

    #[test]
    fn test_normalize_double_header_rows() {
        let data = BindValue::Seq(vec![
            seq_of(&["Q1", "Q2"]),
            BindValue::Map(vec![("Revenue".to_string(), seq_of(&["10", "12"]))]),
            BindValue::Map(vec![("Costs".to_string(), seq_of(&["7", "8"]))]),
        ]);
        let table = normalize(&data).unwrap();
        assert_eq!(table.rows[0].label.as_deref(), Some("Revenue"));
        assert_eq!(table.rows[1].label.as_deref(), Some("Costs"));
        assert_eq!(table.rows[1].cells[0].display(), "7");
    }

    #[test]
    fn test_normalize_rejects_scalar_row() {
        let data = BindValue::Seq(vec![seq_of(&["A"]), BindValue::from("oops")]);
        let result = normalize(&data);
        match result {
            Err(BindError::IncorrectTableDataFormat { entry }) => {
                assert!(entry.contains("row 1"));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_rejects_scalar_column() {
        let data = BindValue::Map(vec![
            ("Day".to_string(), seq_of(&["Mon"])),
            ("Weather".to_string(), BindValue::from("Sun")),
        ]);
        let result = normalize(&data);
        match result {
            Err(BindError::IncorrectTableDataFormat { entry }) => {
                assert!(entry.contains("column 'Weather'"));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_synthesizes_header_and_rows() {
        let (doc, mut registry, config) = setup("<table id=\"t\"></table>");
        let data = BindValue::Seq(vec![
            seq_of(&["Day", "Weather"]),
            seq_of(&["Mon", "Sun"]),
        ]);
        let root = doc.root();
        let table = doc.find_by_id("t").unwrap();
        bind_table_onto(&mut registry, &config, &root, &data, &table).expect("Should bind");

        let html = crate::dom::outer_html(&table);
        assert!(html.contains("<thead><tr><th>Day</th><th>Weather</th></tr></thead>"));
        assert!(html.contains("<tr><td>Mon</td><td>Sun</td></tr>"));
    }

    #[test]
    fn test_existing_header_filters_columns() {
        let (doc, mut registry, config) = setup(
            "<table id=\"t\"><thead><tr><th>Weather</th></tr></thead><tbody></tbody></table>",
        );
        let data = BindValue::Map(vec![
            ("Day".to_string(), seq_of(&["Mon", "Tue"])),
            ("Weather".to_string(), seq_of(&["Sun", "Rain"])),
        ]);
        let root = doc.root();
        let table = doc.find_by_id("t").unwrap();
        bind_table_onto(&mut registry, &config, &root, &data, &table).unwrap();

        let html = crate::dom::outer_html(&table);
        // Day is filtered out, only Weather cells render
        assert!(html.contains("<tr><td>Sun</td></tr>"));
        assert!(html.contains("<tr><td>Rain</td></tr>"));
        assert!(!html.contains("Mon"));
    }

    #[test]
    fn test_header_key_marker_overrides_text() {
        let (doc, mut registry, config) = setup(
            "<table id=\"t\"><thead><tr><th data-weft-key=\"w\">Forecast</th></tr></thead></table>",
        );
        let data = BindValue::Map(vec![("w".to_string(), seq_of(&["Sun"]))]);
        let root = doc.root();
        let table = doc.find_by_id("t").unwrap();
        bind_table_onto(&mut registry, &config, &root, &data, &table).unwrap();
        assert!(crate::dom::outer_html(&table).contains("<td>Sun</td>"));
    }

    #[test]
    fn test_header_without_data_renders_empty() {
        let (doc, mut registry, config) = setup(
            "<table id=\"t\"><thead><tr><th>Day</th><th>Mood</th></tr></thead></table>",
        );
        let data = BindValue::Map(vec![("Day".to_string(), seq_of(&["Mon"]))]);
        let root = doc.root();
        let table = doc.find_by_id("t").unwrap();
        bind_table_onto(&mut registry, &config, &root, &data, &table).unwrap();
        assert!(crate::dom::outer_html(&table).contains("<tr><td>Mon</td><td></td></tr>"));
    }

    #[test]
    fn test_double_header_shifts_cells() {
        let (doc, mut registry, config) = setup("<table id=\"t\"></table>");
        let data = BindValue::Seq(vec![
            seq_of(&["Q1", "Q2"]),
            BindValue::Map(vec![("Revenue".to_string(), seq_of(&["10", "12"]))]),
        ]);
        let root = doc.root();
        let table = doc.find_by_id("t").unwrap();
        bind_table_onto(&mut registry, &config, &root, &data, &table).unwrap();
        assert!(crate::dom::outer_html(&table)
            .contains("<tr><th>Revenue</th><td>10</td><td>12</td></tr>"));
    }

    #[test]
    fn test_row_template_reused() {
        let (doc, mut registry, config) = setup(
            "<table id=\"t\"><thead><tr><th>Day</th></tr></thead>\
             <tbody><tr data-weft-template class=\"row\"><td></td></tr></tbody></table>",
        );
        let data = BindValue::Map(vec![("Day".to_string(), seq_of(&["Mon", "Tue"]))]);
        let root = doc.root();
        let table = doc.find_by_id("t").unwrap();
        bind_table_onto(&mut registry, &config, &root, &data, &table).unwrap();

        // Clones keep the template marker until cleanup; check structure
        let tbody = tree::find_by_tag(&table, "tbody")[0].clone();
        let rows = tree::element_children(&tbody);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| tree::classes(r) == vec!["row"]));
        assert_eq!(tree::text_content(&rows[0]), "Mon");
        assert_eq!(tree::text_content(&rows[1]), "Tue");
    }

    #[test]
    fn test_row_template_directives_get_row_data() {
        let (doc, mut registry, config) = setup(
            "<table id=\"t\"><thead><tr><th>Day</th></tr></thead>\
             <tbody><tr data-weft-template><td><input data-weft:value=\"Day\"></td></tr></tbody></table>",
        );
        let data = BindValue::Map(vec![("Day".to_string(), seq_of(&["Mon"]))]);
        let root = doc.root();
        let table = doc.find_by_id("t").unwrap();
        bind_table_onto(&mut registry, &config, &root, &data, &table).unwrap();

        let input = tree::find_by_tag(&table, "input")[0].clone();
        assert_eq!(tree::get_attr(&input, "value"), Some("Mon".to_string()));
    }

    #[test]
    fn test_non_table_context_without_table_errors() {
        let (doc, mut registry, config) = setup("<div id=\"d\">no table here</div>");
        let data = BindValue::Map(vec![("Day".to_string(), seq_of(&["Mon"]))]);
        let root = doc.root();
        let div = doc.find_by_id("d").unwrap();
        let result = bind_table_onto(&mut registry, &config, &root, &data, &div);
        assert!(matches!(result, Err(BindError::TableElementNotFound)));
    }
}
