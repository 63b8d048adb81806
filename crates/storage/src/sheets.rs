//! Google Sheets client
//!
//! A spreadsheet consists of the sheets `Workouts` (one row per workout), `Exercises` (one row per
//! completed set) and `Settings`. The sheets `Exercise Stats` and `Dashboard` are derived from the
//! workout data and recreated on every update.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use gloo_net::http::{Request, RequestBuilder, Response};
use liftr_domain as domain;
use log::{debug, warn};
use serde_json::{Value, json};

use crate::{
    Config,
    rest::{GlooNetSendRequest, SendRequest},
};

const WORKOUTS_SHEET: &str = "Workouts";
const EXERCISES_SHEET: &str = "Exercises";
const SETTINGS_SHEET: &str = "Settings";
const EXERCISE_STATS_SHEET: &str = "Exercise Stats";
const DASHBOARD_SHEET: &str = "Dashboard";

const WORKOUTS_HEADER: [&str; 6] = [
    "ID",
    "Date",
    "Day Number",
    "Day Name",
    "Duration (sec)",
    "Total Sets",
];
const EXERCISES_HEADER: [&str; 8] = [
    "Workout ID",
    "Date",
    "Exercise",
    "Tier",
    "Set Number",
    "Reps",
    "Weight (lbs)",
    "Completed",
];
const SETTINGS_HEADER: [&str; 2] = ["Key", "Value"];

#[derive(Clone)]
pub struct Sheets<S: SendRequest> {
    pub sender: S,
    pub config: Config,
}

impl Sheets<GlooNetSendRequest> {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            sender: GlooNetSendRequest,
            config,
        }
    }
}

impl<S: SendRequest> Sheets<S> {
    fn spreadsheet_url(&self, id: &domain::SpreadsheetID) -> String {
        format!("{}/{id}", self.config.sheets_base_url)
    }

    fn values_url(&self, id: &domain::SpreadsheetID, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(id),
            range.replace('\'', "%27").replace(' ', "%20")
        )
    }

    async fn call<T>(
        &self,
        credential: &domain::SheetsCredential,
        builder: RequestBuilder,
        body: Option<&Value>,
    ) -> Result<T, SheetsError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let builder = builder.header(
            "Authorization",
            &format!("Bearer {}", credential.access_token),
        );
        let request = match body {
            Some(body) => builder.json(body)?,
            None => builder.build()?,
        };
        let response = self.send(request).await?;
        if !response.ok() {
            return Err(api_error(response).await);
        }
        Ok(response.json::<T>().await?)
    }

    async fn send(&self, request: Request) -> Result<Response, SheetsError> {
        self.sender
            .send_request(request)
            .await
            .map_err(|_| SheetsError::NoConnection)
    }

    async fn read_values(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let value_range: ValueRange = self
            .call(
                credential,
                Request::get(&self.values_url(id, range)),
                None,
            )
            .await?;
        Ok(value_range.values)
    }

    async fn append_values(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        range: &str,
        values: Vec<Vec<Value>>,
    ) -> Result<(), SheetsError> {
        if values.is_empty() {
            return Ok(());
        }
        self.call::<Value>(
            credential,
            Request::post(&format!(
                "{}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
                self.values_url(id, range)
            )),
            Some(&json!({ "values": values })),
        )
        .await?;
        Ok(())
    }

    async fn write_values(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        value_input_option: &str,
        data: Vec<(String, Vec<Vec<Value>>)>,
    ) -> Result<(), SheetsError> {
        self.call::<Value>(
            credential,
            Request::post(&format!("{}/values:batchUpdate", self.spreadsheet_url(id))),
            Some(&json!({
                "valueInputOption": value_input_option,
                "data": data
                    .into_iter()
                    .map(|(range, values)| json!({ "range": range, "values": values }))
                    .collect::<Vec<_>>(),
            })),
        )
        .await?;
        Ok(())
    }

    async fn batch_update(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        requests: Vec<Value>,
    ) -> Result<BatchUpdateResponse, SheetsError> {
        self.call(
            credential,
            Request::post(&format!("{}:batchUpdate", self.spreadsheet_url(id))),
            Some(&json!({ "requests": requests })),
        )
        .await
    }

    /// Delete the derived sheets if present and add empty ones.
    ///
    /// Returns the sheet ids of the new dashboard and statistics sheets.
    async fn recreate_derived_sheets(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
    ) -> Result<(i64, i64), SheetsError> {
        let spreadsheet: Spreadsheet = self
            .call(
                credential,
                Request::get(&format!(
                    "{}?fields=sheets.properties(sheetId,title)",
                    self.spreadsheet_url(id)
                )),
                None,
            )
            .await?;

        let mut requests = spreadsheet
            .sheets
            .iter()
            .filter(|s| [DASHBOARD_SHEET, EXERCISE_STATS_SHEET].contains(&s.properties.title.as_str()))
            .map(|s| json!({ "deleteSheet": { "sheetId": s.properties.sheet_id } }))
            .collect::<Vec<_>>();
        requests.push(add_sheet_request(DASHBOARD_SHEET, 200, 30));
        requests.push(add_sheet_request(EXERCISE_STATS_SHEET, 1000, 50));

        let response = self.batch_update(credential, id, requests).await?;
        let mut added = response
            .replies
            .into_iter()
            .filter_map(|reply| reply.add_sheet)
            .map(|reply| reply.properties.sheet_id);

        match (added.next(), added.next()) {
            (Some(dashboard), Some(exercise_stats)) => Ok((dashboard, exercise_stats)),
            _ => Err(SheetsError::Other(anyhow::anyhow!(
                "failed to create derived sheets"
            ))),
        }
    }
}

impl<S: SendRequest> domain::SpreadsheetStore for Sheets<S> {
    async fn is_spreadsheet_reachable(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
    ) -> bool {
        match self
            .call::<Value>(
                credential,
                Request::get(&format!("{}?fields=spreadsheetId", self.spreadsheet_url(id))),
                None,
            )
            .await
        {
            Ok(_) => true,
            Err(err) => {
                debug!("spreadsheet {id} not reachable: {err}");
                false
            }
        }
    }

    async fn create_spreadsheet(
        &self,
        credential: &domain::SheetsCredential,
    ) -> Result<domain::SpreadsheetID, domain::WriteError> {
        let sheets = [WORKOUTS_SHEET, EXERCISES_SHEET, SETTINGS_SHEET]
            .iter()
            .map(|title| json!({ "properties": { "title": title } }))
            .collect::<Vec<_>>();
        let created: CreatedSpreadsheet = self
            .call(
                credential,
                Request::post(&self.config.sheets_base_url),
                Some(&json!({
                    "properties": { "title": self.config.spreadsheet_title },
                    "sheets": sheets,
                })),
            )
            .await?;
        let id = domain::SpreadsheetID::new(&created.spreadsheet_id)
            .map_err(|err| domain::WriteError::Other(Box::new(err)))?;

        self.write_values(
            credential,
            &id,
            "RAW",
            vec![
                (format!("{WORKOUTS_SHEET}!A1:F1"), vec![header(&WORKOUTS_HEADER)]),
                (format!("{EXERCISES_SHEET}!A1:H1"), vec![header(&EXERCISES_HEADER)]),
                (format!("{SETTINGS_SHEET}!A1:B1"), vec![header(&SETTINGS_HEADER)]),
            ],
        )
        .await?;

        Ok(id)
    }

    async fn append_workout_rows(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        workouts: &[domain::Workout],
    ) -> Result<(), domain::WriteError> {
        self.append_values(
            credential,
            id,
            &format!("{WORKOUTS_SHEET}!A:F"),
            workout_rows(workouts),
        )
        .await?;
        self.append_values(
            credential,
            id,
            &format!("{EXERCISES_SHEET}!A:H"),
            exercise_rows(workouts),
        )
        .await?;
        Ok(())
    }

    async fn read_workout_rows(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
    ) -> Result<Vec<domain::Workout>, domain::ReadError> {
        let workout_rows = self
            .read_values(credential, id, &format!("{WORKOUTS_SHEET}!A2:F"))
            .await?;
        let exercise_rows = self
            .read_values(credential, id, &format!("{EXERCISES_SHEET}!A2:H"))
            .await?;
        Ok(parse_workouts(&workout_rows, &exercise_rows))
    }

    async fn write_statistics_sheets(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        statistics: &domain::SpreadsheetStatistics,
    ) -> Result<(), domain::WriteError> {
        let (dashboard_sheet_id, exercise_stats_sheet_id) =
            self.recreate_derived_sheets(credential, id).await?;

        if statistics.total_workouts() == 0 {
            self.write_values(
                credential,
                id,
                "USER_ENTERED",
                vec![(
                    format!("'{DASHBOARD_SHEET}'!A1:B3"),
                    vec![
                        vec![json!("LiftR Dashboard"), json!("")],
                        vec![json!(""), json!("")],
                        vec![
                            json!("No workouts recorded yet. Complete a workout to see charts!"),
                            json!(""),
                        ],
                    ],
                )],
            )
            .await?;
            return Ok(());
        }

        let exercise_stats = exercise_stats_values(statistics);
        let dashboard = dashboard_values(statistics);
        self.write_values(
            credential,
            id,
            "USER_ENTERED",
            vec![
                (
                    format!(
                        "'{EXERCISE_STATS_SHEET}'!A1:{}{}",
                        column_letter(exercise_stats[0].len() - 1),
                        exercise_stats.len()
                    ),
                    exercise_stats,
                ),
                (
                    format!("'{DASHBOARD_SHEET}'!A1:B{}", dashboard.len()),
                    dashboard,
                ),
            ],
        )
        .await?;

        self.batch_update(
            credential,
            id,
            chart_requests(statistics, dashboard_sheet_id, exercise_stats_sheet_id),
        )
        .await?;

        Ok(())
    }
}

/// Column name of a zero-based column index (`0` is `A`, `26` is `AA`).
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut letters = vec![];
    let mut n = index + 1;
    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(remainder).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn header(titles: &[&str]) -> Vec<Value> {
    titles.iter().map(|t| json!(t)).collect()
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Summary rows of the `Workouts` sheet.
#[must_use]
pub fn workout_rows(workouts: &[domain::Workout]) -> Vec<Vec<Value>> {
    workouts
        .iter()
        .map(|w| {
            vec![
                json!(w.id.to_string()),
                json!(format_date(w.date)),
                json!(u8::from(w.day)),
                json!(w.day_name),
                json!(w.duration),
                json!(w.num_completed_sets()),
            ]
        })
        .collect()
}

/// Rows of the `Exercises` sheet. Only completed sets are included.
#[must_use]
pub fn exercise_rows(workouts: &[domain::Workout]) -> Vec<Vec<Value>> {
    workouts
        .iter()
        .flat_map(|w| {
            w.completed_sets().map(|(exercise, set)| {
                vec![
                    json!(w.id.to_string()),
                    json!(format_date(w.date)),
                    json!(exercise.name),
                    json!(exercise.tier.to_string()),
                    json!(set.set_number),
                    json!(set.actual_reps),
                    json!(f32::from(set.weight)),
                    json!(true),
                ]
            })
        })
        .collect()
}

/// Rebuild workouts from the rows of the `Workouts` and `Exercises` sheets.
///
/// Workout rows without id, date, day number or day name, or with an invalid day number or date,
/// are dropped. Set rows without workout id or exercise name are ignored.
#[must_use]
pub fn parse_workouts(
    workout_rows: &[Vec<String>],
    exercise_rows: &[Vec<String>],
) -> Vec<domain::Workout> {
    let mut exercises: BTreeMap<&str, Vec<domain::ExerciseLog>> = BTreeMap::new();

    for row in exercise_rows {
        let cell = |idx: usize| row.get(idx).map_or("", |c| c.trim());
        let (workout_id, name) = (cell(0), cell(2));
        if workout_id.is_empty() || name.is_empty() {
            continue;
        }

        let logs = exercises.entry(workout_id).or_default();
        let idx = match logs.iter().position(|e| e.name == name) {
            Some(idx) => idx,
            None => {
                logs.push(domain::ExerciseLog {
                    name: name.to_string(),
                    tier: domain::Tier::try_from(cell(3)).unwrap_or(domain::Tier::T3),
                    sets: vec![],
                });
                logs.len() - 1
            }
        };

        let reps = cell(5).parse::<u32>().unwrap_or(0);
        logs[idx].sets.push(domain::SetLog {
            set_number: cell(4).parse::<u32>().unwrap_or(0),
            target_reps: reps,
            actual_reps: reps,
            weight: domain::Weight::clamped(cell(6).parse::<f32>().unwrap_or(0.0)),
            completed: cell(7).eq_ignore_ascii_case("true"),
        });
    }

    workout_rows
        .iter()
        .filter_map(|row| {
            let cell = |idx: usize| row.get(idx).map_or("", |c| c.trim());
            if (0..4).any(|idx| cell(idx).is_empty()) {
                return None;
            }
            let workout = (|| -> Result<domain::Workout, Box<dyn std::error::Error>> {
                Ok(domain::Workout {
                    id: domain::WorkoutID::new(cell(0))?,
                    date: DateTime::parse_from_rfc3339(cell(1))?.with_timezone(&Utc),
                    day: domain::DayNumber::try_from(cell(2))?,
                    day_name: cell(3).to_string(),
                    duration: cell(4).parse::<u32>().unwrap_or(0),
                    exercises: exercises.get(cell(0)).cloned().unwrap_or_default(),
                })
            })();
            workout
                .inspect_err(|err| warn!("ignored invalid workout row {}: {err}", cell(0)))
                .ok()
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: f32) -> i64 {
    value.round() as i64
}

/// Content of the `Exercise Stats` sheet including the header row.
#[must_use]
pub fn exercise_stats_values(statistics: &domain::SpreadsheetStatistics) -> Vec<Vec<Value>> {
    let mut header = vec![json!("Date"), json!("Total Volume"), json!("Total Reps")];
    header.extend(statistics.exercises.iter().map(|e| json!(format!("{e} Vol"))));
    header.extend(statistics.exercises.iter().map(|e| json!(format!("{e} Reps"))));

    let mut values = vec![header];
    for row in &statistics.rows {
        let mut cells = vec![
            json!(row.date.format("%Y-%m-%d").to_string()),
            json!(round(row.total_volume)),
            json!(row.total_reps),
        ];
        cells.extend(row.exercise_volumes.iter().map(|v| json!(round(*v))));
        cells.extend(row.exercise_reps.iter().map(|r| json!(r)));
        values.push(cells);
    }
    values
}

/// Content of the summary area of the `Dashboard` sheet.
#[must_use]
pub fn dashboard_values(statistics: &domain::SpreadsheetStatistics) -> Vec<Vec<Value>> {
    let mut values = vec![
        vec![json!("LiftR Dashboard"), json!("")],
        vec![json!(""), json!("")],
        vec![json!("Total Workouts"), json!(statistics.total_workouts())],
        vec![json!("Total Sets Completed"), json!(statistics.total_sets)],
        vec![json!("Total Reps"), json!(statistics.total_reps)],
        vec![
            json!("Total Weight Lifted (lbs)"),
            json!(round(statistics.total_volume)),
        ],
        vec![json!(""), json!("")],
        vec![json!("Workouts by Day"), json!("")],
    ];
    for (idx, count) in statistics.workouts_by_day.iter().enumerate() {
        values.push(vec![json!(format!("Day {}", idx + 1)), json!(count)]);
    }
    values.extend([
        vec![json!(""), json!("")],
        vec![json!("Individual exercise charts below"), json!("")],
        vec![json!("Data in \"Exercise Stats\" sheet"), json!("")],
    ]);
    values
}

struct Chart {
    title: String,
    chart_type: &'static str,
    axis_title: &'static str,
    column: usize,
    anchor: (usize, usize),
    size: (u32, u32),
}

impl Chart {
    fn request(&self, dashboard_sheet_id: i64, exercise_stats_sheet_id: i64, rows: usize) -> Value {
        let source = |column: usize| {
            json!({
                "sourceRange": {
                    "sources": [{
                        "sheetId": exercise_stats_sheet_id,
                        "startRowIndex": 0,
                        "endRowIndex": rows,
                        "startColumnIndex": column,
                        "endColumnIndex": column + 1
                    }]
                }
            })
        };
        json!({
            "addChart": {
                "chart": {
                    "spec": {
                        "title": self.title,
                        "basicChart": {
                            "chartType": self.chart_type,
                            "legendPosition": "NO_LEGEND",
                            "axis": [
                                { "position": "BOTTOM_AXIS", "title": "Date" },
                                { "position": "LEFT_AXIS", "title": self.axis_title }
                            ],
                            "domains": [{ "domain": source(0) }],
                            "series": [{ "series": source(self.column), "targetAxis": "LEFT_AXIS" }],
                            "headerCount": 1
                        }
                    },
                    "position": {
                        "overlayPosition": {
                            "anchorCell": {
                                "sheetId": dashboard_sheet_id,
                                "rowIndex": self.anchor.0,
                                "columnIndex": self.anchor.1
                            },
                            "widthPixels": self.size.0,
                            "heightPixels": self.size.1
                        }
                    }
                }
            }
        })
    }
}

/// Charts of the total volume, the total reps and the volume of each exercise per workout.
#[must_use]
pub fn chart_requests(
    statistics: &domain::SpreadsheetStatistics,
    dashboard_sheet_id: i64,
    exercise_stats_sheet_id: i64,
) -> Vec<Value> {
    let mut charts = vec![
        Chart {
            title: "Total Volume Per Workout (lbs)".to_string(),
            chart_type: "COLUMN",
            axis_title: "Volume (lbs)",
            column: 1,
            anchor: (0, 3),
            size: (500, 300),
        },
        Chart {
            title: "Total Reps Per Workout".to_string(),
            chart_type: "COLUMN",
            axis_title: "Reps",
            column: 2,
            anchor: (0, 11),
            size: (500, 300),
        },
    ];
    charts.extend(statistics.exercises.iter().enumerate().map(|(idx, exercise)| Chart {
        title: format!("{exercise} - Volume (lbs)"),
        chart_type: "LINE",
        axis_title: "Volume (lbs)",
        column: 3 + idx,
        anchor: ((idx / 3) * 16 + 17, (idx % 3) * 8),
        size: (450, 250),
    }));

    let rows = statistics.total_workouts() + 1;
    charts
        .iter()
        .map(|c| c.request(dashboard_sheet_id, exercise_stats_sheet_id, rows))
        .collect()
}

fn add_sheet_request(title: &str, row_count: u32, column_count: u32) -> Value {
    json!({
        "addSheet": {
            "properties": {
                "title": title,
                "gridProperties": { "rowCount": row_count, "columnCount": column_count }
            }
        }
    })
}

async fn api_error(response: Response) -> SheetsError {
    let status = format!("{} {}", response.status(), response.status_text());
    match response.json::<ApiErrorResponse>().await {
        Ok(body) => SheetsError::Api(body.error.message),
        Err(_) => SheetsError::Api(status),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SheetsError {
    #[error("no connection")]
    NoConnection,
    #[error("{0}")]
    Api(String),
    #[error(transparent)]
    Request(#[from] gloo_net::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SheetsError> for domain::ReadError {
    fn from(value: SheetsError) -> Self {
        match value {
            SheetsError::NoConnection => {
                domain::ReadError::Storage(domain::StorageError::NoConnection)
            }
            err => domain::ReadError::Other(Box::new(err)),
        }
    }
}

impl From<SheetsError> for domain::WriteError {
    fn from(value: SheetsError) -> Self {
        match value {
            SheetsError::NoConnection => {
                domain::WriteError::Storage(domain::StorageError::NoConnection)
            }
            err => domain::WriteError::Other(Box::new(err)),
        }
    }
}

#[derive(serde::Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

#[derive(serde::Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(serde::Deserialize)]
struct Sheet {
    properties: SheetProperties,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    #[serde(default)]
    title: String,
}

#[derive(serde::Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Reply>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    add_sheet: Option<Sheet>,
}

#[derive(serde::Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(serde::Deserialize)]
struct ApiError {
    message: String,
}
