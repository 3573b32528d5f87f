use log::warn;

use super::context::PipelineContext;

/// Log what the producer skipped. Call after joining the producer.
/// Returns `(skipped_count, enumeration_error)`.
pub fn report_enumeration_issues(ctx: &PipelineContext, verbose: bool) -> (usize, Option<String>) {
    let enumeration_error = ctx.enumeration_error.lock().ok().and_then(|mut e| e.take());
    let skipped = match ctx.skipped.lock() {
        Ok(skipped) => {
            if !skipped.is_empty() {
                warn!(
                    "Skipped {} entries due to permission errors or access issues",
                    skipped.len()
                );
                if verbose {
                    for (item, msg) in skipped.iter() {
                        eprintln!("  skipped: {} ({})", item, msg);
                    }
                }
            }
            skipped.len()
        }
        Err(_) => 0,
    };
    (skipped, enumeration_error)
}
