use crate::output::csv_sink::{EDGES_FILE, FIRST_EDGES_FILE, NODES_FILE};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Copies a feed, dropping empty records (lines consisting of a lone `,`)
///
/// Returns the number of lines removed.
pub fn clean_feed(input: &Path, output: &Path) -> io::Result<usize> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    let mut removed = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim() == "," {
            removed += 1;
            continue;
        }
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(removed)
}

/// Cleans every feed present in `dir` into a `cleaned_<name>` sibling
///
/// Missing feeds are skipped. Returns the paths written.
pub fn clean_feeds(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for name in [NODES_FILE, FIRST_EDGES_FILE, EDGES_FILE] {
        let input = dir.join(name);
        if !input.exists() {
            continue;
        }

        let output = dir.join(format!("cleaned_{}", name));
        let removed = clean_feed(&input, &output)?;
        info!(
            "Cleaned {} -> {} ({} empty records removed)",
            input.display(),
            output.display(),
            removed
        );
        written.push(output);
    }

    Ok(written)
}
