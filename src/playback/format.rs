/// Format milliseconds as `m:ss`. There is no hour component, so an
/// hour-long position renders as `60:00`.
pub fn format_millis(millis: u64) -> String {
    let total_seconds = millis / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}
