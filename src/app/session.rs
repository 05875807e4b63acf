use crate::adapters::export::write_listings_csv;
use crate::app::render::render_report;
use crate::config::{OutputFormat, OutputSettings};
use crate::core::engine::PriceEngine;
use crate::core::{ListingSource, SearchReport, TextModel};
use crate::utils::error::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Terminal front end: one query in, one rendered report out.
pub struct Session<S: ListingSource, M: TextModel> {
    engine: PriceEngine<S, M>,
    output: OutputSettings,
}

impl<S: ListingSource, M: TextModel> Session<S, M> {
    pub fn new(engine: PriceEngine<S, M>, output: OutputSettings) -> Self {
        Self { engine, output }
    }

    /// Runs one search and writes the result. Only errors writing to `out`
    /// or `err` are returned.
    pub async fn handle_query<W: Write, E: Write>(
        &self,
        query: &str,
        out: &mut W,
        err: &mut E,
    ) -> Result<SearchReport> {
        let report = self.engine.run(query).await;

        match self.output.format {
            OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
            OutputFormat::Table => write!(out, "{}", render_report(&report))?,
        }
        for warning in &report.warnings {
            writeln!(err, "Warning: {}", warning)?;
        }

        if let Some(path) = &self.output.export_path {
            if !report.listings.is_empty() {
                if let Err(e) = write_listings_csv(path, &report.listings) {
                    tracing::error!("CSV export to {} failed: {}", path.display(), e);
                    writeln!(err, "Error: {}. {}", e.user_friendly_message(), e.recovery_suggestion())?;
                }
            }
        }

        out.flush()?;
        Ok(report)
    }

    /// Reads queries line by line until EOF or `quit`/`exit`.
    pub async fn run_interactive<R, W, E>(&self, input: R, out: &mut W, err: &mut E) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        E: Write,
    {
        let mut lines = input.lines();
        let mut handled = 0;

        loop {
            write!(err, "Product to search (quit to exit): ")?;
            err.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(err)?;
                break;
            };
            let query = line.trim();
            if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
                break;
            }

            self.handle_query(query, out, err).await?;
            handled += 1;
        }

        tracing::debug!("Interactive session handled {} queries", handled);
        Ok(handled)
    }
}
