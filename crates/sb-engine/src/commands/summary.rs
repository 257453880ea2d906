//! Summary printer

#![allow(clippy::result_large_err)]

use rusqlite::Connection;
use sb_core::{log_op_end, log_op_error, log_op_start, Summary};
use sb_store::errors::{io_error, Result};
use std::io::Write;

/// Run the summary query and write the fixed-width report to `out`
pub fn print_summary(conn: &Connection, out: &mut dyn Write) -> Result<Summary> {
    log_op_start!("print_summary");
    let start = std::time::Instant::now();

    let result = sb_store::load_summary(conn).and_then(|summary| {
        out.write_all(summary.render().as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| io_error("print_summary", e))?;
        Ok(summary)
    });

    match result {
        Ok(summary) => {
            log_op_end!(
                "print_summary",
                duration_ms = start.elapsed().as_millis() as u64
            );
            Ok(summary)
        }
        Err(e) => {
            log_op_error!(
                "print_summary",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(e)
        }
    }
}
