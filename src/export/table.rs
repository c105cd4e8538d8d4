use polars::prelude::*;

use super::ScheduleRow;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tabular view of the exported rows, one row per task in id order.
pub fn to_dataframe(rows: &[ScheduleRow]) -> PolarsResult<DataFrame> {
    let date = |value: Option<chrono::NaiveDate>| value.map(|d| d.format(DATE_FORMAT).to_string());
    df!(
        "id" => rows.iter().map(|r| r.task_id).collect::<Vec<i32>>(),
        "name" => rows.iter().map(|r| r.name.clone()).collect::<Vec<String>>(),
        "duration" => rows.iter().map(|r| r.duration).collect::<Vec<i64>>(),
        "es" => rows.iter().map(|r| r.early_start).collect::<Vec<i64>>(),
        "ef" => rows.iter().map(|r| r.early_finish).collect::<Vec<i64>>(),
        "ls" => rows.iter().map(|r| r.late_start).collect::<Vec<i64>>(),
        "lf" => rows.iter().map(|r| r.late_finish).collect::<Vec<i64>>(),
        "total_float" => rows.iter().map(|r| r.total_float).collect::<Vec<i64>>(),
        "free_float" => rows.iter().map(|r| r.free_float).collect::<Vec<i64>>(),
        "critical" => rows.iter().map(|r| r.is_critical).collect::<Vec<bool>>(),
        "resources" => rows.iter().map(|r| r.resources.clone()).collect::<Vec<String>>(),
        "start_date" => rows.iter().map(|r| date(r.start_date)).collect::<Vec<Option<String>>>(),
        "finish_date" => rows.iter().map(|r| date(r.finish_date)).collect::<Vec<Option<String>>>(),
        "baseline_finish" => rows.iter().map(|r| r.baseline_finish).collect::<Vec<Option<i64>>>(),
        "variance" => rows.iter().map(|r| r.finish_variance).collect::<Vec<Option<i64>>>(),
    )
}

fn cell(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::Boolean(true) => "yes".to_string(),
        AnyValue::Boolean(false) => String::new(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Renders a frame as a fixed-width, `+---+` bordered text table.
pub fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| cell(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(String::len).collect();
    for row in &cells {
        for (ci, s) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(s.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let push_row = |out: &mut String, values: &[String]| {
        out.push('|');
        for (ci, s) in values.iter().enumerate() {
            out.push(' ');
            out.push_str(s);
            out.push_str(&" ".repeat(widths[ci].saturating_sub(s.len())));
            out.push_str(" |");
        }
        out.push('\n');
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    push_row(&mut out, &col_names);
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        push_row(&mut out, row);
    }
    out.push_str(&sep);
    out.push('\n');
    out
}
