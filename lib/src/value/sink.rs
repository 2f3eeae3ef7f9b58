use std::{fs, io};
use std::path::{Path, PathBuf};

use crate::error::{Result, Chainable};
use crate::value::Value;

/// A destination for rendered output.
///
/// The executor writes literal text and the string form of every action's
/// final value to a `Sink`, in order, as it walks a template. Nothing is
/// buffered on its behalf: everything written before an error stays written.
pub trait Sink {
    /// Called once before anything is written.
    #[inline]
    fn begin(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_str(&mut self, string: &str) -> Result<()>;

    #[inline]
    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::String(s) => self.write_str(s),
            value => self.write_str(&value.to_string()),
        }
    }
}

impl Sink for String {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<()> {
        self.push_str(string);
        Ok(())
    }
}

impl Sink for Vec<u8> {
    #[inline]
    fn write_str(&mut self, string: &str) -> Result<()> {
        self.extend_from_slice(string.as_bytes());
        Ok(())
    }
}

impl Sink for fs::File {
    fn write_str(&mut self, string: &str) -> Result<()> {
        Ok(io::Write::write_all(self, string.as_bytes())?)
    }
}

impl<W: io::Write> Sink for io::BufWriter<W> {
    fn write_str(&mut self, string: &str) -> Result<()> {
        Ok(io::Write::write_all(self, string.as_bytes())?)
    }
}

impl<T: Sink + ?Sized> Sink for &mut T {
    #[inline]
    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    #[inline]
    fn write_str(&mut self, string: &str) -> Result<()> {
        (**self).write_str(string)
    }
}

/// A path sink creates (or truncates) its file in `begin` and appends every
/// write to it.
impl Sink for &Path {
    fn begin(&mut self) -> Result<()> {
        self.create()?;
        Ok(())
    }

    fn write_str(&mut self, string: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(*self)
            .chain(error! {
                "failed to open file for writing",
                "file path" => self.display()
            })?;

        file.write_str(string)
    }
}

impl Sink for PathBuf {
    fn begin(&mut self) -> Result<()> {
        self.as_path().begin()
    }

    fn write_str(&mut self, string: &str) -> Result<()> {
        self.as_path().write_str(string)
    }
}

/// Creates (or truncates) a file at a path and returns a buffered sink to it.
pub trait IntoFileSink {
    fn create(&self) -> Result<io::BufWriter<fs::File>>;
}

impl IntoFileSink for Path {
    fn create(&self) -> Result<io::BufWriter<fs::File>> {
        if let Some(parent) = self.parent() {
            fs::create_dir_all(parent).chain(error! {
                "failed to create output directory",
                "directory" => parent.display(),
            })?;
        }

        let file = fs::File::create(self).chain(error! {
            "failed to open/create file for writing",
            "file path" => self.display()
        })?;

        Ok(io::BufWriter::new(file))
    }
}

impl IntoFileSink for PathBuf {
    fn create(&self) -> Result<io::BufWriter<fs::File>> {
        self.as_path().create()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_written_in_string_form() {
        let mut out = String::new();
        out.write_value(&Value::Null).unwrap();
        out.write_value(&Value::from("a")).unwrap();
        out.write_value(&Value::from(12u8)).unwrap();
        out.write_value(&Value::from(false)).unwrap();
        assert_eq!(out, "a12false");

        let mut bytes = Vec::new();
        (&mut bytes).write_str("xyz").unwrap();
        assert_eq!(bytes, b"xyz");
    }

    #[test]
    fn paths_are_created_then_appended_to() {
        let dir = std::env::temp_dir().join(format!("quill-sink-{}", std::process::id()));
        let mut path = dir.join("nested/out.txt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale contents").unwrap();

        path.begin().unwrap();
        path.write_str("a").unwrap();
        path.as_path().write_value(&Value::from(1u8)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a1");

        let _ = fs::remove_dir_all(&dir);
    }
}
