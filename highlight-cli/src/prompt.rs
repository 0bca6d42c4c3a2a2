//! Interactive fallbacks for values not given on the command line.

use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Read one trimmed line; `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask for a folder until `validate` accepts one.
pub fn prompt_folder<R, W, F>(input: &mut R, output: &mut W, mut validate: F) -> Result<PathBuf>
where
    R: BufRead,
    W: Write,
    F: FnMut(&PathBuf) -> Result<()>,
{
    loop {
        write!(output, "Enter the path of the folder containing the images: ")?;
        output.flush()?;

        let Some(line) = read_line(input)? else {
            bail!("no folder given");
        };
        // Paths pasted from a file manager often come quoted.
        let folder = PathBuf::from(line.trim_matches(|c| c == '"' || c == '\''));
        match validate(&folder) {
            Ok(()) => return Ok(folder),
            Err(err) => writeln!(output, "Error: {err:#}")?,
        }
    }
}

/// Collect keywords one per line until an empty line or end of input.
pub fn prompt_keywords<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Vec<String>> {
    writeln!(output, "Enter the words or phrases to highlight, one per line.")?;
    writeln!(output, "Single words like 'bone' or phrases like 'lacrimal suture' both work.")?;
    writeln!(output, "Finish with an empty line:")?;
    output.flush()?;

    let mut keywords = Vec::new();
    while let Some(line) = read_line(input)? {
        if line.is_empty() {
            break;
        }
        keywords.push(line);
    }
    Ok(keywords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::ensure;
    use std::io::Cursor;

    #[test]
    fn keywords_stop_at_blank_line() {
        let mut input = Cursor::new("femur\nsutura lacrimal\n\nignored\n");
        let mut output = Vec::new();
        let words = prompt_keywords(&mut input, &mut output).unwrap();
        assert_eq!(words, ["femur", "sutura lacrimal"]);
    }

    #[test]
    fn keywords_stop_at_end_of_input() {
        let mut input = Cursor::new("tibia");
        let words = prompt_keywords(&mut input, &mut Vec::new()).unwrap();
        assert_eq!(words, ["tibia"]);
    }

    #[test]
    fn folder_is_asked_again_until_valid() {
        let mut input = Cursor::new("/nope\n\"/scans\"\n");
        let mut output = Vec::new();
        let folder = prompt_folder(&mut input, &mut output, |p| {
            ensure!(p == &PathBuf::from("/scans"), "not found");
            Ok(())
        })
        .unwrap();

        assert_eq!(folder, PathBuf::from("/scans"));
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Error: not found"));
    }

    #[test]
    fn folder_prompt_fails_at_end_of_input() {
        let mut input = Cursor::new("");
        assert!(prompt_folder(&mut input, &mut Vec::new(), |_| Ok(())).is_err());
    }
}
