use crate::models::Row;
use scraper::{ElementRef, Html, Selector};

/// Pull every materialized row out of a page snapshot.
///
/// Headers come from the table's header cells when any non-empty one exists;
/// otherwise positional names (`Column_1`, `Column_2`, ...) are synthesized
/// from the first body row. Cell text is trimmed and zipped against headers
/// by index. Rows without a single data cell are loading placeholders or
/// decoration and are skipped. No table in the document means an empty
/// result, never an error.
pub fn rows_from_html(html: &str) -> Vec<Row> {
    let document = Html::parse_document(html);

    let table_sel = Selector::parse("table, [role='table']").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let tr_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let Some(table) = document.select(&table_sel).next() else {
        return Vec::new();
    };

    let mut headers: Vec<String> = table
        .select(&th_sel)
        .map(cell_text)
        .filter(|text| !text.is_empty())
        .collect();

    let body_rows: Vec<Vec<String>> = table
        .select(&tr_sel)
        .map(|tr| tr.select(&td_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    if headers.is_empty() {
        if let Some(first) = body_rows.first() {
            headers = (1..=first.len()).map(|i| format!("Column_{i}")).collect();
        }
    }

    body_rows
        .into_iter()
        .map(|cells| {
            let mut row = Row::new();
            for (i, value) in cells.into_iter().enumerate() {
                let column = headers
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("Column_{}", i + 1));
                row.push(column, value);
            }
            row
        })
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
