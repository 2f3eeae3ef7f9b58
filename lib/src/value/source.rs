use std::{fs, io};
use std::path::Path;
use std::sync::Arc;
use std::fmt::Debug;

use either::Either;

use crate::error::{Result, Chainable};

/// An origin of template text.
pub trait Source: Debug {
    /// Reads the source as a string if it is valid UTF-8 or as raw bytes if
    /// it is not.
    fn read(self) -> Result<Either<String, Vec<u8>>>;

    /// Reads the source and requires that it be valid UTF-8.
    fn read_str(self) -> Result<Arc<str>> where Self: Sized {
        let path = self.path().map(|p| p.display().to_string());
        match self.read()? {
            Either::Left(string) => Ok(string.into()),
            Either::Right(_) => err! {
                "template source contained invalid UTF-8",
                "source" => path.unwrap_or_else(|| "<string>".into()),
            },
        }
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}

impl Source for String {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        Ok(Either::Left(self))
    }
}

impl Source for &str {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        Ok(Either::Left(self.to_string()))
    }
}

impl Source for &fs::File {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        use io::Read;

        let mut data = Vec::new();
        let mut file = io::BufReader::new(self);
        file.read_to_end(&mut data)?;

        let value = String::from_utf8(data)
            .map(Either::Left)
            .map_err(|v| v.into_bytes())
            .unwrap_or_else(Either::Right);

        Ok(value)
    }
}

impl Source for &Path {
    fn read(self) -> Result<Either<String, Vec<u8>>> {
        let file = fs::File::open(self).chain(error! {
            "failed to open file for reading",
            "file path" => self.display()
        })?;

        (&file).read()
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_read_as_themselves() {
        assert_eq!(&*"{{.Foo}}".read_str().unwrap(), "{{.Foo}}");
        assert_eq!(&*String::from("text").read_str().unwrap(), "text");
    }

    #[test]
    fn missing_files_are_io_errors() {
        let error = Path::new("/definitely/not/a/template.html").read_str().unwrap_err();
        assert_eq!(error.kind(), crate::error::ErrorKind::Io);
    }
}
