/// Endpoints and limits of the remote stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the document store.
    pub api_base_url: String,
    pub sheets_base_url: String,
    /// Title of newly created spreadsheets.
    pub spreadsheet_title: String,
    /// Maximum number of workouts fetched from the document store.
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "api".to_string(),
            sheets_base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            spreadsheet_title: "LiftR Workout Data".to_string(),
            history_limit: 50,
        }
    }
}
