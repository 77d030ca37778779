use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::error::{GanttError, Result};
use crate::model::{ChartDocument, Header, Relation, RelationKind, Task};

/// Bar fills handed out in row order when the CSV has no colour column.
pub const PALETTE: &[&str] = &[
    "#4285F4", "#34A853", "#AB47BC", "#FB8C00", "#03A9F4", "#E53935", "#00BCD4", "#FFC107",
];

/// Label columns of an imported chart.
pub fn default_headers() -> Vec<Header> {
    vec![
        Header::new("name", "Task"),
        Header::new("start", "Start"),
        Header::new("end", "End"),
        Header::new("progress", "Progress"),
    ]
}

/// Map a status string to a completion percentage.
fn status_to_percentage(status: &str) -> f32 {
    match status.trim().to_lowercase().as_str() {
        "finished" | "done" | "complete" | "completed" => 100.0,
        "in progress" | "in-progress" | "active" | "started" => 50.0,
        "released" | "planned" => 25.0,
        _ => 0.0,
    }
}

fn parse_percentage(s: &str) -> Option<f32> {
    let value: f32 = s.trim().trim_end_matches('%').trim().parse().ok()?;
    Some(value.clamp(0.0, 100.0))
}

/// Accepts RFC 3339 instants and a handful of common date layouts.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Some(instant.with_timezone(&Utc));
    }
    ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Pick the separator that occurs most often in the header line.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons > commas && semicolons >= tabs {
        b';'
    } else if tabs > commas {
        b'\t'
    } else {
        b','
    }
}

fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Id,
    Name,
    Start,
    End,
    Percentage,
    Status,
    Class,
    Parent,
    Relations,
}

fn header_to_column(normalized: &str) -> Option<Column> {
    match normalized {
        "id" | "taskid" | "key" | "wbs" => Some(Column::Id),
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity" => {
            Some(Column::Name)
        }
        "start" | "startdate" | "from" | "begin" | "begindate" => Some(Column::Start),
        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "duedate" => {
            Some(Column::End)
        }
        "percentage" | "percent" | "progress" | "complete" | "%" => Some(Column::Percentage),
        "status" | "state" | "stage" => Some(Column::Status),
        "class" | "color" | "colour" => Some(Column::Class),
        "parent" | "parentid" | "parenttask" | "parentname" | "subtaskof" => Some(Column::Parent),
        "relations" | "relation" | "dependencies" | "depends" | "predecessorof" | "links" => {
            Some(Column::Relations)
        }
        _ => None,
    }
}

/// A parsed row whose references are still raw text.
struct Row {
    task: Task,
    parent: Option<String>,
    relations: Option<String>,
}

/// Result of [`import_csv`].
#[derive(Debug, Clone)]
pub struct CsvImport {
    pub document: ChartDocument,
    pub skipped: usize,
}

/// Import tasks from a CSV file.
pub fn import_csv(path: &Path) -> Result<CsvImport> {
    let content = std::fs::read_to_string(path).map_err(|source| GanttError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import_csv_str(&content)
}

/// Import tasks from CSV text.
///
/// The delimiter (comma, semicolon, tab) is detected from the header line and
/// headers are matched loosely ("Task Label", "Start Date", ...). Only a name
/// or id column is required. `parent` and `relations` may name either ids or
/// task names; relations are written as `B:FS;C:SS`.
pub fn import_csv_str(content: &str) -> Result<CsvImport> {
    let first_line = content.lines().next().unwrap_or("");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(first_line))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();
    if !columns
        .iter()
        .any(|c| matches!(c, Some(Column::Name) | Some(Column::Id)))
    {
        return Err(GanttError::MissingColumns {
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut rows: Vec<Row> = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(line, error = %e, "skipping unreadable CSV row");
                skipped += 1;
                continue;
            }
        };

        let mut fields: HashMap<Column, &str> = HashMap::new();
        for (column, field) in columns.iter().zip(record.iter()) {
            if let Some(column) = column {
                if !field.is_empty() {
                    fields.insert(*column, field);
                }
            }
        }

        let name = fields.get(&Column::Name).or(fields.get(&Column::Id));
        let Some(name) = name.map(|s| s.to_string()) else {
            skipped += 1;
            continue;
        };
        let id = fields
            .get(&Column::Id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut task = Task::new(id, name.clone());
        let mut bad_date = false;
        for (column, slot) in [(Column::Start, &mut task.main.start), (Column::End, &mut task.main.end)] {
            if let Some(raw) = fields.get(&column) {
                match parse_date(raw) {
                    Some(date) => *slot = Some(date),
                    None => {
                        warn!(line, value = %raw, "skipping CSV row with an invalid date");
                        bad_date = true;
                    }
                }
            }
        }
        if bad_date {
            skipped += 1;
            continue;
        }

        task.main.percentage = fields
            .get(&Column::Percentage)
            .and_then(|s| parse_percentage(s))
            .or_else(|| fields.get(&Column::Status).map(|s| status_to_percentage(s)))
            .unwrap_or(0.0);
        task.main.class = fields
            .get(&Column::Class)
            .map(|s| s.to_string())
            .unwrap_or_else(|| PALETTE[rows.len() % PALETTE.len()].to_string());

        let day = |d: Option<DateTime<Utc>>| d.map(|d| d.format("%Y-%m-%d").to_string());
        task.data.insert("name".into(), name);
        if let Some(start) = day(task.main.start) {
            task.data.insert("start".into(), start);
        }
        if let Some(end) = day(task.main.end) {
            task.data.insert("end".into(), end);
        }
        task.data
            .insert("progress".into(), format!("{} %", task.main.percentage));

        rows.push(Row {
            task,
            parent: fields.get(&Column::Parent).map(|s| s.to_string()),
            relations: fields.get(&Column::Relations).map(|s| s.to_string()),
        });
    }

    if rows.is_empty() {
        return Err(GanttError::EmptyImport { skipped });
    }

    let tasks = resolve_references(rows);
    Ok(CsvImport {
        document: ChartDocument::new(default_headers(), tasks),
        skipped,
    })
}

/// Turn parent and relation text into task ids, matching ids first and then
/// case-insensitive names.
fn resolve_references(rows: Vec<Row>) -> Vec<Task> {
    let mut lookup: HashMap<String, String> = HashMap::new();
    for row in &rows {
        lookup
            .entry(row.task.name.to_lowercase())
            .or_insert_with(|| row.task.id.clone());
    }
    for row in &rows {
        lookup.insert(row.task.id.to_lowercase(), row.task.id.clone());
    }
    let resolve = |reference: &str| lookup.get(&reference.trim().to_lowercase()).cloned();

    rows.into_iter()
        .map(|row| {
            let mut task = row.task;
            if let Some(parent) = row.parent {
                match resolve(&parent) {
                    Some(id) if id != task.id => task.parent = Some(id),
                    Some(_) => warn!(task = %task.id, "ignoring self parent"),
                    None => warn!(task = %task.id, parent = %parent, "parent task not found"),
                }
            }
            for entry in row.relations.iter().flat_map(|r| r.split(';')) {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let (target, kind) = entry.split_once(':').unwrap_or((entry, "FS"));
                let kind = match kind.parse::<RelationKind>() {
                    Ok(kind) => kind,
                    Err(e) => {
                        warn!(task = %task.id, error = %e, "skipping relation");
                        continue;
                    }
                };
                match resolve(target) {
                    Some(target) => task.relations.push(Relation { target, kind }),
                    None => warn!(task = %task.id, target = %target, "relation target not found"),
                }
            }
            task
        })
        .collect()
}
