//! Input and output paths where `-` means stdin or stdout.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use centrifuge::ReadAt;

pub const STDIO: &str = "-";

/// Extraction input: a file read in place, or stdin buffered in memory.
pub enum Input {
    File(File),
    Stdin(Cursor<Vec<u8>>),
}

impl Input {
    pub fn open(path: &str) -> Result<Self> {
        if path == STDIO {
            return Ok(Input::Stdin(Cursor::new(read_input(path)?)));
        }
        let file =
            File::open(path).with_context(|| format!("Failed to open input file {:?}", path))?;
        Ok(Input::File(file))
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Input::File(file) => file.read(buf),
            Input::Stdin(cursor) => cursor.read(buf),
        }
    }
}

impl ReadAt for Input {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Input::File(file) => file.read_at(offset, buf),
            Input::Stdin(cursor) => cursor.read_at(offset, buf),
        }
    }
}

/// Read a whole input into memory.
pub fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == STDIO {
        let mut data = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .context("Failed to read from stdin")?;
        return Ok(data);
    }
    fs::read(path).with_context(|| format!("Failed to read input file {:?}", path))
}

/// Write a finished output in one go.
pub fn write_output(path: &str, data: &[u8]) -> Result<()> {
    if path == STDIO {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data).context("Failed to write to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
        return Ok(());
    }
    fs::write(path, data).with_context(|| format!("Failed to write output file {:?}", path))
}

/// Stream into an output. A file output is removed again if `f` fails.
pub fn stream_output<T>(path: &str, f: impl FnOnce(&mut dyn Write) -> Result<T>) -> Result<T> {
    if path == STDIO {
        let mut stdout = io::stdout().lock();
        return f(&mut stdout);
    }

    let mut file =
        File::create(path).with_context(|| format!("Failed to create output file {:?}", path))?;
    match f(&mut file) {
        Ok(value) => Ok(value),
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(Path::new(path));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let path = path.to_str().unwrap();

        write_output(path, b"[]").unwrap();
        assert_eq!(read_input(path).unwrap(), b"[]");
    }

    #[test]
    fn test_input_file_supports_positional_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine_client.so");
        fs::write(&path, b"0123456789").unwrap();

        let mut input = Input::open(path.to_str().unwrap()).unwrap();
        assert_eq!(input.read_u32_le(2).unwrap(), u32::from_le_bytes(*b"2345"));

        let mut head = [0u8; 3];
        input.read_exact(&mut head).unwrap();
        assert_eq!(&head, b"012");
    }

    #[test]
    fn test_missing_input_has_context() {
        let err = Input::open("/nonexistent/engine_client.so").err().unwrap();
        assert!(err.to_string().contains("Failed to open input file"));
    }

    #[test]
    fn test_failed_stream_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.bsp");
        let path_str = path.to_str().unwrap();

        let result: Result<()> = stream_output(path_str, |w| {
            w.write_all(b"partial")?;
            bail!("connection dropped")
        });
        assert!(result.is_err());
        assert!(!path.exists());

        let written = stream_output(path_str, |w| {
            w.write_all(b"complete")?;
            Ok(8)
        })
        .unwrap();
        assert_eq!(written, 8);
        assert_eq!(fs::read(&path).unwrap(), b"complete");
    }
}
