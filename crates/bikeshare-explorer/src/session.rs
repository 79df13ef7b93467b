//! Interactive query loop.
//!
//! Prompts for a city, month and weekday, loads the matching trips and lets
//! the user run reports until they choose to stop. Input is read line by
//! line; end of input ends the session quietly.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use bikeshare_core::catalog::{Catalog, Category};
use bikeshare_core::models::Dataset;
use bikeshare_data::reader;
use bikeshare_data::reports::{self, ReportKind};
use tracing::{error, info};

use crate::render;

const INVALID_RESPONSE: &str = "Invalid response, please try again.";

pub struct Session<'c, R, W> {
    catalog: &'c Catalog,
    data_dir: PathBuf,
    input: R,
    output: W,
}

/// A (city, month, weekday) triple of canonical catalog keys.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Query {
    city: String,
    month: String,
    weekday: String,
}

impl<'c, R: BufRead, W: Write> Session<'c, R, W> {
    pub fn new(catalog: &'c Catalog, data_dir: PathBuf, input: R, output: W) -> Self {
        Self {
            catalog,
            data_dir,
            input,
            output,
        }
    }

    /// Run query cycles until the user declines a new query or input ends.
    pub fn run(&mut self) -> Result<()> {
        writeln!(
            self.output,
            "Welcome to the Bikeshare Data Program, let's explore some data!"
        )?;
        render::separator(&mut self.output)?;

        loop {
            let Some(query) = self.ask_query()? else {
                return Ok(());
            };

            match reader::load(
                self.catalog,
                &self.data_dir,
                &query.city,
                &query.month,
                &query.weekday,
            ) {
                Ok(dataset) if dataset.is_empty() => render::no_data(&mut self.output)?,
                Ok(dataset) => {
                    render::load_summary(&mut self.output, &dataset)?;
                    if self.explore(&dataset)?.is_none() {
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!("Query {:?} failed: {}", query, e);
                    writeln!(self.output, "Could not load trip data: {e}")?;
                }
            }

            match self.ask_yes_no("Do you want to run a new query? (Y/N): ")? {
                Some(true) => continue,
                _ => {
                    writeln!(self.output, "Thank you for using the Bikeshare Data Program!")?;
                    return Ok(());
                }
            }
        }
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    fn ask_query(&mut self) -> Result<Option<Query>> {
        let Some(city) = self.ask_selection(Category::City)? else {
            return Ok(None);
        };
        let Some(month) = self.ask_selection(Category::Month)? else {
            return Ok(None);
        };
        let Some(weekday) = self.ask_selection(Category::Weekday)? else {
            return Ok(None);
        };
        info!("Query selected: {} / {} / {}", city, month, weekday);
        Ok(Some(Query {
            city,
            month,
            weekday,
        }))
    }

    /// Menu prompt for one category, repeated until a confirmed choice.
    fn ask_selection(&mut self, category: Category) -> Result<Option<String>> {
        let mut menu = format!("\nPlease choose a {category} from the available options:\n");
        for entry in self.catalog.entries(category) {
            menu.push_str(&format!("{}. {}\n", entry.number, entry.display_name()));
        }

        loop {
            let Some(answer) = self.read_answer(&menu)? else {
                return Ok(None);
            };
            let key = match self.catalog.resolve(category, &answer) {
                Ok(key) => key.to_string(),
                Err(e) => {
                    writeln!(self.output, "{e}. Invalid input, please try again.")?;
                    continue;
                }
            };

            let name = self
                .catalog
                .entry(category, &key)
                .map(|entry| entry.display_name())
                .unwrap_or_else(|| key.clone());
            let confirm =
                format!("It looks like you are trying to select {name}, is this correct? (Y/N): ");
            match self.ask_yes_no(&confirm)? {
                Some(true) => return Ok(Some(key)),
                Some(false) => continue,
                None => return Ok(None),
            }
        }
    }

    // ── Reports ───────────────────────────────────────────────────────────────

    /// Report menu loop over one dataset. `None` means input ended.
    fn explore(&mut self, dataset: &Dataset) -> Result<Option<()>> {
        let mut menu = String::from("\nWhich data would you like to see?\n");
        for kind in ReportKind::ALL {
            menu.push_str(&format!("{}. {}\n", kind.number(), kind.title()));
        }

        loop {
            let Some(answer) = self.read_answer(&menu)? else {
                return Ok(None);
            };
            let kind = match answer.parse::<ReportKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    writeln!(self.output, "Invalid input, please try again.")?;
                    continue;
                }
            };

            if kind == ReportKind::Raw {
                if self.browse_rows(dataset)?.is_none() {
                    return Ok(None);
                }
            } else {
                let started = Instant::now();
                let report = reports::run_report(kind, dataset);
                render::report(&mut self.output, &report, dataset.columns)?;
                render::elapsed(&mut self.output, started.elapsed())?;
            }
            render::separator(&mut self.output)?;

            match self.ask_yes_no("Would you like additional data from your query? (Y/N) ")? {
                Some(true) => continue,
                Some(false) => return Ok(Some(())),
                None => return Ok(None),
            }
        }
    }

    /// Page through the raw rows five at a time.
    ///
    /// At the end of the data the user may start over from the first row;
    /// only the answer to that question decides whether to restart.
    fn browse_rows(&mut self, dataset: &Dataset) -> Result<Option<()>> {
        writeln!(
            self.output,
            "\nCalculating {}...\n",
            ReportKind::Raw.title()
        )?;
        let mut offset = 0;
        loop {
            let page = reports::page(dataset, offset);
            render::page(&mut self.output, &page, dataset.columns)?;

            let (question, next) = match page.next_offset() {
                Some(next) => ("Would you like to view another 5 rows? (Y/N) ", next),
                None => (
                    "You have reached the end of the raw data, would you like to start over? (Y/N) ",
                    0,
                ),
            };
            match self.ask_yes_no(question)? {
                Some(true) => offset = next,
                Some(false) => return Ok(Some(())),
                None => return Ok(None),
            }
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Print `prompt` and read one trimmed line; `None` at end of input.
    fn read_answer(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask until the answer is y/yes or n/no.
    fn ask_yes_no(&mut self, prompt: &str) -> Result<Option<bool>> {
        loop {
            let Some(answer) = self.read_answer(prompt)? else {
                return Ok(None);
            };
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => writeln!(self.output, "{INVALID_RESPONSE}")?,
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
