//! Per-user dashboard session.
//!
//! Holds one user's uploaded files and current filter selection and reruns
//! the full pipeline through [`compute`] on every [`DashboardSession::render`].
//! Nothing computed is kept between interactions; a session only remembers
//! its inputs.

use std::collections::BTreeSet;
use std::path::PathBuf;

use energy_core::models::{FileError, FilterSelection, Granularity, UploadedFile};
use energy_core::settings::DashboardConfig;
use energy_data::analysis::{compute, DashboardView};
use energy_data::reader::load_files;

// ── DashboardSession ──────────────────────────────────────────────────────────

/// Interaction controller sitting between a presentation layer and the
/// stateless pipeline.
///
/// # Example
/// ```
/// use energy_core::models::UploadedFile;
/// use energy_core::settings::DashboardConfig;
/// use energy_runtime::session::DashboardSession;
///
/// let mut session = DashboardSession::new(DashboardConfig::default());
/// session.upload(UploadedFile::new("a.csv", "Timestamp,Meter\n2024-01-01 00:00,1\n"));
/// let view = session.render();
/// assert_eq!(view.series.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DashboardSession {
    /// Uploaded files in upload order.
    files: Vec<UploadedFile>,
    /// Paths that could not be read from disk.
    load_errors: Vec<FileError>,
    config: DashboardConfig,
    selection: FilterSelection,
}

impl DashboardSession {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            files: Vec::new(),
            load_errors: Vec::new(),
            config,
            selection: FilterSelection::default(),
        }
    }

    // ── Uploads ───────────────────────────────────────────────────────────

    /// Add a file. A file with the same name replaces the earlier upload in
    /// place.
    pub fn upload(&mut self, file: UploadedFile) {
        match self.files.iter_mut().find(|f| f.name == file.name) {
            Some(existing) => {
                tracing::debug!(file = %file.name, "replacing uploaded file");
                *existing = file;
            }
            None => {
                tracing::debug!(file = %file.name, "file uploaded");
                self.files.push(file);
            }
        }
    }

    pub fn add_files<I: IntoIterator<Item = UploadedFile>>(&mut self, files: I) {
        for file in files {
            self.upload(file);
        }
    }

    /// Read files and directories from disk and upload what could be read.
    /// Returns the number of files added.
    pub fn load_paths(&mut self, paths: &[PathBuf]) -> usize {
        let loaded = load_files(paths);
        let count = loaded.files.len();
        self.add_files(loaded.files);
        self.load_errors.extend(loaded.errors);
        count
    }

    /// Remove the file called `name`. Returns `false` when no such file
    /// was uploaded.
    pub fn remove_file(&mut self, name: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.name != name);
        before != self.files.len()
    }

    /// Forget every upload and reset the selection.
    pub fn clear(&mut self) {
        self.files.clear();
        self.load_errors.clear();
        self.selection = FilterSelection::default();
        tracing::debug!("session cleared");
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    // ── Selection ─────────────────────────────────────────────────────────

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
    }

    /// Restrict to `categories`; an empty list selects every category.
    pub fn select_categories<I, S>(&mut self, categories: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.categories = categories.into_iter().map(Into::into).collect();
    }

    /// Restrict to hours of the day; an empty list removes the restriction.
    pub fn select_hours<I: IntoIterator<Item = u32>>(&mut self, hours: I) {
        let hours: BTreeSet<u32> = hours.into_iter().collect();
        self.selection.hours = (!hours.is_empty()).then_some(hours);
    }

    /// Descend one level by picking `key` from the current chart.
    ///
    /// Returns `false` at the hour level, where there is nothing finer, and
    /// for a key that cannot name a month or day.
    pub fn drill_into(&mut self, key: i32) -> bool {
        let granularity = self.selection.granularity();
        let moved = match granularity {
            Granularity::Year => {
                self.selection.year = Some(key);
                self.selection.month = None;
                self.selection.day = None;
                true
            }
            Granularity::Month => match u32::try_from(key) {
                Ok(month @ 1..=12) => {
                    self.selection.month = Some(month);
                    self.selection.day = None;
                    true
                }
                _ => false,
            },
            Granularity::Day => match u32::try_from(key) {
                Ok(day @ 1..=31) => {
                    self.selection.day = Some(day);
                    true
                }
                _ => false,
            },
            Granularity::Hour => false,
        };

        if moved {
            tracing::debug!(?granularity, key, "drilled down");
        }
        moved
    }

    /// Ascend one level, clearing the finest active date restriction.
    /// Returns `false` when already at the top.
    pub fn drill_up(&mut self) -> bool {
        match self.selection.effective_date() {
            (Some(_), Some(_), Some(_)) => self.selection.day = None,
            (Some(_), Some(_), None) => {
                self.selection.month = None;
                self.selection.day = None;
            }
            (Some(_), None, _) => {
                self.selection.year = None;
                self.selection.month = None;
                self.selection.day = None;
            }
            (None, _, _) => return false,
        }
        true
    }

    // ── Rendering ─────────────────────────────────────────────────────────

    /// Run the whole pipeline over the current uploads and selection.
    ///
    /// Disk read failures are listed ahead of the parse failures.
    pub fn render(&self) -> DashboardView {
        tracing::debug!(
            files = self.files.len(),
            granularity = ?self.selection.granularity(),
            "rendering session"
        );
        let mut view = compute(&self.files, &self.config, &self.selection);
        if !self.load_errors.is_empty() {
            let parse_errors = std::mem::take(&mut view.file_errors);
            view.file_errors = self.load_errors.iter().cloned().chain(parse_errors).collect();
        }
        view
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::models::DataState;

    fn make_session() -> DashboardSession {
        let mut session = DashboardSession::new(DashboardConfig::default());
        session.add_files([
            UploadedFile::new(
                "2023.csv",
                "Timestamp;Solar;Grid\n\
                 2023-06-01 10:00;1,5;2\n\
                 2023-06-01 11:00;2,5;2\n",
            ),
            UploadedFile::new(
                "2024.csv",
                "Timestamp;Solar;Grid\n\
                 2024-06-01 10:00;3;1\n\
                 2024-06-02 11:00;4;1\n\
                 2024-07-01 00:00;5;1\n",
            ),
        ]);
        session
    }

    // ── uploads ───────────────────────────────────────────────────────────

    #[test]
    fn test_upload_replaces_same_name() {
        let mut session = make_session();
        session.upload(UploadedFile::new("2023.csv", "Timestamp,Solar\n2023-01-01 00:00,9\n"));

        assert_eq!(session.files().len(), 2);
        assert_eq!(session.files()[0].name, "2023.csv");
        assert!(session.files()[0].content.contains(",9"));
    }

    #[test]
    fn test_load_paths_reports_unreadable_files() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("a.csv"), "Timestamp,Meter\n2024-01-01 00:00,1\n")
            .expect("write a.csv");
        std::fs::write(dir.path().join("b.CSV"), "Timestamp,Meter\n2024-01-02 00:00,2\n")
            .expect("write b.CSV");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write notes");
        std::fs::write(dir.path().join("bad.csv"), [0xff, 0xfe, 0x00]).expect("write bad.csv");

        let mut session = DashboardSession::new(DashboardConfig::default());
        let added = session.load_paths(&[dir.path().to_path_buf()]);
        assert_eq!(added, 2);

        let view = session.render();
        assert_eq!(view.records.len(), 2);
        assert_eq!(view.file_errors.len(), 1);
        assert_eq!(view.file_errors[0].file_name, "bad.csv");
    }

    #[test]
    fn test_remove_file() {
        let mut session = make_session();
        assert!(session.remove_file("2023.csv"));
        assert!(!session.remove_file("2023.csv"));

        let view = session.render();
        assert_eq!(view.options.years, vec![2024]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut session = make_session();
        session.drill_into(2024);
        session.clear();

        assert!(session.files().is_empty());
        assert_eq!(session.selection(), &FilterSelection::default());
        assert_eq!(session.render().state, DataState::NoData);
    }

    // ── drill-down ────────────────────────────────────────────────────────

    #[test]
    fn test_drill_down_walks_every_level() {
        let mut session = make_session();
        assert_eq!(session.render().granularity, Granularity::Year);

        assert!(session.drill_into(2024));
        let view = session.render();
        assert_eq!(view.granularity, Granularity::Month);
        assert_eq!(view.series.iter().map(|r| r.key).collect::<Vec<_>>(), vec![6, 6, 7, 7]);

        assert!(session.drill_into(6));
        assert_eq!(session.render().granularity, Granularity::Day);

        assert!(session.drill_into(2));
        let view = session.render();
        assert_eq!(view.granularity, Granularity::Hour);
        assert_eq!(view.records.len(), 2);

        assert!(!session.drill_into(11));
    }

    #[test]
    fn test_drill_into_rejects_impossible_keys() {
        let mut session = make_session();
        session.drill_into(2024);
        assert!(!session.drill_into(13));
        assert!(!session.drill_into(-1));
        assert_eq!(session.selection().month, None);
    }

    #[test]
    fn test_drill_up_returns_to_top() {
        let mut session = make_session();
        session.set_selection(FilterSelection::default().with_year(2024).with_month(6).with_day(1));

        assert!(session.drill_up());
        assert_eq!(session.selection().granularity(), Granularity::Day);
        assert!(session.drill_up());
        assert_eq!(session.selection().granularity(), Granularity::Month);
        assert!(session.drill_up());
        assert_eq!(session.selection().granularity(), Granularity::Year);
        assert!(!session.drill_up());
    }

    // ── rendering ─────────────────────────────────────────────────────────

    #[test]
    fn test_render_reflects_category_and_hour_filters() {
        let mut session = make_session();
        session.select_categories(["Solar"]);
        session.select_hours([10]);

        let view = session.render();
        assert_eq!(view.records.len(), 2);
        assert!(view.records.iter().all(|r| r.category == "Solar" && r.hour == 10));
        assert_eq!(view.means["Solar"], Some(2.25));

        session.select_hours([]);
        assert_eq!(session.render().records.len(), 5);
    }

    #[test]
    fn test_render_previous_year_series() {
        let mut session = make_session();
        session.select_categories(["Grid"]);
        session.drill_into(2024);

        let view = session.render();
        let previous = view.previous_year.expect("year selected");
        assert_eq!(previous.len(), 1);
        assert_eq!((previous[0].key, previous[0].sum), (6, 4.0));
    }

    #[test]
    fn test_render_is_repeatable() {
        let mut config = DashboardConfig::default();
        config.baseline.enabled = true;
        let mut session = DashboardSession::new(config);
        session.add_files(make_session().files().to_vec());

        let a = session.render();
        let b = session.render();
        assert_eq!(a.series, b.series);
        assert_eq!(a.baselines, b.baselines);
    }
}
