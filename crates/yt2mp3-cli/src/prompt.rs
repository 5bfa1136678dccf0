//! Terminal prompts for picking a search result and naming the download

use std::io::{self, BufRead, Write};

use thiserror::Error;
use yt2mp3_core::search::SearchResult;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Invalid input: {0:?} is not a number")]
    NotANumber(String),
    #[error("Invalid selection: {index} is not between 0 and {max}")]
    OutOfRange { index: usize, max: usize },
}

/// `0. Title [Uploader]` lines, numbered from zero.
pub fn result_lines(results: &[SearchResult]) -> Vec<String> {
    results
        .iter()
        .enumerate()
        .map(|(idx, r)| format!("{}. {} [{}]", idx, r.title, r.uploader))
        .collect()
}

/// Parse a zero-based choice among `count` results.
pub fn parse_selection(input: &str, count: usize) -> Result<usize, SelectionError> {
    let input = input.trim();
    let index: usize = input
        .parse()
        .map_err(|_| SelectionError::NotANumber(input.to_string()))?;
    if index >= count {
        return Err(SelectionError::OutOfRange {
            index,
            max: count.saturating_sub(1),
        });
    }
    Ok(index)
}

/// Blank means "use the fetched title".
pub fn normalize_title(input: &str) -> Option<String> {
    let title = input.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Print `question: ` and read one line. EOF reads as an empty answer.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{}: ", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// List `results` and ask for one. `results` must not be empty.
pub fn choose_result<'a, R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    results: &'a [SearchResult],
) -> anyhow::Result<&'a SearchResult> {
    writeln!(output, "\nSearch Results:")?;
    for line in result_lines(results) {
        writeln!(output, "{}", line)?;
    }
    let question = format!("Select a result (0-{})", results.len().saturating_sub(1));
    let answer = ask(input, output, &question)?;
    let index = parse_selection(&answer, results.len())?;
    Ok(&results[index])
}

pub fn ask_title<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<String>> {
    let answer = ask(
        input,
        output,
        "Enter a title for the download (leave blank to auto-detect)",
    )?;
    Ok(normalize_title(&answer))
}
